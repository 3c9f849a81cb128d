use std::cmp::Ordering;

use crate::types::RankedNamespace;

/// Order namespaces by total cost, most expensive first.
///
/// Missing or non-numeric costs rank as zero. The sort is stable, so equal
/// costs keep their input order.
pub fn rank_by_total_cost(mut namespaces: Vec<RankedNamespace>) -> Vec<RankedNamespace> {
    namespaces.sort_by(|a, b| {
        b.metric
            .total_cost_or_zero()
            .partial_cmp(&a.metric.total_cost_or_zero())
            .unwrap_or(Ordering::Equal)
    });
    namespaces
}
