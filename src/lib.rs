// Public modules
pub mod types;
pub mod config;
pub mod cli;
pub mod opencost;
pub mod allocation;
pub mod formatting;
pub mod render;
pub mod slack;
pub mod report;

// Re-export commonly used items
pub use types::*;
pub use config::{load_config, load_config_with_env, EnvironmentProvider, SystemEnvironment, MockEnvironment};
pub use opencost::{AllocationQuery, FetchError, OpenCostClient, RawAllocationReport};
pub use allocation::{filter_namespaces, rank_by_total_cost};
pub use formatting::{format_currency, format_percentage, present, present_row, PresentError};
pub use render::{renderer_for, RenderError, Renderer, TableImageRenderer, TextRenderer, TreemapRenderer};
pub use slack::{PublishError, SlackPublisher, SlackUploadConfig};
pub use report::{run, CostReport, ReportSummary, RunOutcome};
