// Renderers turning a presented table into an artifact
pub mod color;
pub mod raster;
pub mod table_image;
pub mod text;
pub mod treemap;

use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;

use crate::types::{Artifact, PresentedTable, RendererKind};

pub use table_image::TableImageRenderer;
pub use text::TextRenderer;
pub use treemap::TreemapRenderer;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to write artifact: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode image: {0}")]
    Image(#[from] image::ImageError),
}

/// One way of turning the presented table into something publishable.
pub trait Renderer: Send + Sync {
    fn render(&self, table: &PresentedTable) -> Result<Artifact, RenderError>;
}

/// Build the renderer selected by `kind`. File-producing renderers write to
/// `output`.
pub fn renderer_for(kind: RendererKind, output: &Path) -> Box<dyn Renderer> {
    match kind {
        RendererKind::Text => Box::new(TextRenderer),
        RendererKind::Table => Box::new(TableImageRenderer::new(output)),
        RendererKind::Treemap => Box::new(TreemapRenderer::new(output)),
    }
}

/// Per-run artifact path in the temp directory, so concurrent runs never
/// share a file.
pub fn default_output_path(kind: RendererKind) -> PathBuf {
    let stem = match kind {
        RendererKind::Treemap => "namespace-cost-treemap",
        RendererKind::Text | RendererKind::Table => "namespace-costs",
    };
    std::env::temp_dir().join(format!(
        "{}-{}-{}.png",
        stem,
        Utc::now().format("%Y%m%dT%H%M%S"),
        std::process::id()
    ))
}
