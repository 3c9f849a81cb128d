// Allocation reshaping: bucket filtering and cost ranking
pub mod filter;
pub mod rank;

pub use filter::{filter_namespaces, namespace_of};
pub use rank::rank_by_total_cost;
