use serde_json::{Map, Value};

use crate::opencost::RawAllocationReport;
use crate::types::{MetricField, NamespaceMetric, RankedNamespace};

/// Namespace label of a bucket record, if it has a non-empty one.
/// Idle, unallocated and unmounted buckets have none.
pub fn namespace_of(record: &Value) -> Option<&str> {
    let ns = record.get("properties")?.get("namespace")?;
    match ns {
        Value::String(s) if !s.is_empty() => Some(s.as_str()),
        _ => None,
    }
}

/// Keep only real namespace buckets from the first window and project the
/// configured fields. `totalCost` is always carried, since ranking and tile
/// areas depend on it even when it is not a displayed column. Output
/// preserves the order buckets appeared in.
pub fn filter_namespaces(report: &RawAllocationReport, fields: &[MetricField]) -> Vec<RankedNamespace> {
    match report.first_window() {
        Some(window) => filter_window(window, fields),
        None => Vec::new(),
    }
}

fn filter_window(window: &Map<String, Value>, fields: &[MetricField]) -> Vec<RankedNamespace> {
    window
        .iter()
        .filter(|(_, record)| namespace_of(record).is_some())
        .map(|(bucket, record)| RankedNamespace {
            namespace: bucket.clone(),
            metric: project(record, fields),
        })
        .collect()
}

fn project(record: &Value, fields: &[MetricField]) -> NamespaceMetric {
    let mut metric = NamespaceMetric::new();
    for field in fields {
        metric.insert(*field, record.get(field.key()).cloned());
    }
    if !fields.contains(&MetricField::TotalCost) {
        metric.insert(MetricField::TotalCost, record.get(MetricField::TotalCost.key()).cloned());
    }
    metric
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report(window: Value) -> RawAllocationReport {
        serde_json::from_value(json!({"code": 200, "status": "success", "data": [window]})).unwrap()
    }

    #[test]
    fn test_namespace_of() {
        assert_eq!(namespace_of(&json!({"properties": {"namespace": "web"}})), Some("web"));
        assert_eq!(namespace_of(&json!({"properties": {"namespace": ""}})), None);
        assert_eq!(namespace_of(&json!({"properties": {"namespace": null}})), None);
        assert_eq!(namespace_of(&json!({"properties": {"cluster": "c1"}})), None);
        assert_eq!(namespace_of(&json!({"totalCost": 3.0})), None);
    }

    #[test]
    fn test_drops_idle_and_unallocated_buckets() {
        let report = report(json!({
            "web": {"properties": {"namespace": "web"}, "totalCost": 10.0, "cpuEfficiency": 0.4},
            "__idle__": {"properties": {"cluster": "c1"}, "totalCost": 50.0},
            "__unallocated__": {"properties": {"namespace": ""}, "totalCost": 1.0},
            "__unmounted__": {"totalCost": 2.0},
            "db": {"properties": {"namespace": "db"}, "totalCost": 20.0}
        }));

        let filtered = filter_namespaces(&report, &MetricField::ALL);
        let names: Vec<&str> = filtered.iter().map(|r| r.namespace.as_str()).collect();
        assert_eq!(names, vec!["web", "db"]);
    }

    #[test]
    fn test_projects_exactly_the_configured_fields() {
        let report = report(json!({
            "web": {
                "properties": {"namespace": "web"},
                "totalCost": 10.0,
                "cpuEfficiency": 0.4,
                "ramEfficiency": null,
                "gpuCost": 99.0
            }
        }));

        let fields = [MetricField::TotalCost, MetricField::CpuEfficiency, MetricField::RamEfficiency, MetricField::CpuCost];
        let filtered = filter_namespaces(&report, &fields);
        let metric = &filtered[0].metric;

        assert_eq!(metric.fields().collect::<Vec<_>>(), fields.to_vec());
        assert_eq!(metric.get(MetricField::TotalCost), Some(&json!(10.0)));
        assert_eq!(metric.get(MetricField::CpuEfficiency), Some(&json!(0.4)));
        assert_eq!(metric.get(MetricField::RamEfficiency), Some(&Value::Null));
        assert_eq!(metric.get(MetricField::CpuCost), None);
        assert_eq!(metric.get(MetricField::TotalEfficiency), None);
    }

    #[test]
    fn test_total_cost_is_carried_when_not_displayed() {
        let report = report(json!({
            "web": {"properties": {"namespace": "web"}, "totalCost": 10.0, "cpuEfficiency": 0.4}
        }));

        let filtered = filter_namespaces(&report, &[MetricField::CpuEfficiency]);
        let metric = &filtered[0].metric;
        assert_eq!(metric.number(MetricField::TotalCost), Some(10.0));
        assert_eq!(
            metric.fields().collect::<Vec<_>>(),
            vec![MetricField::CpuEfficiency, MetricField::TotalCost]
        );
    }

    #[test]
    fn test_only_first_window_is_consulted() {
        let report: RawAllocationReport = serde_json::from_value(json!({
            "status": "success",
            "data": [
                {"web": {"properties": {"namespace": "web"}, "totalCost": 1.0}},
                {"db": {"properties": {"namespace": "db"}, "totalCost": 2.0}}
            ]
        }))
        .unwrap();

        let filtered = filter_namespaces(&report, &MetricField::ALL);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].namespace, "web");
    }

    #[test]
    fn test_empty_report() {
        let empty: RawAllocationReport = serde_json::from_value(json!({"status": "success", "data": []})).unwrap();
        assert!(filter_namespaces(&empty, &MetricField::ALL).is_empty());
        assert!(filter_namespaces(&report(json!({})), &MetricField::ALL).is_empty());
    }
}
