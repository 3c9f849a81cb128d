use std::path::PathBuf;

use anyhow::Result;
use tracing::info;

use crate::allocation::{filter_namespaces, rank_by_total_cost};
use crate::formatting::{format_currency, format_percentage, present, PresentError};
use crate::opencost::{AllocationQuery, OpenCostClient, RawAllocationReport};
use crate::render::{default_output_path, renderer_for};
use crate::slack::{SlackPublisher, SlackUploadConfig};
use crate::types::{Artifact, Config, MetricField, PresentedTable, RankedNamespace};

/// Ranked per-namespace costs for one accumulated window
pub struct CostReport {
    pub config: Config,
    pub ranked: Vec<RankedNamespace>,
}

impl CostReport {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ranked: Vec::new(),
        }
    }

    /// Filter namespace buckets out of the raw response and rank them.
    pub fn from_allocations(config: Config, raw: &RawAllocationReport) -> Self {
        let filtered = filter_namespaces(raw, &config.fields);
        let ranked = rank_by_total_cost(filtered);
        Self { config, ranked }
    }

    pub fn title(&self) -> String {
        match &self.config.cluster_name {
            Some(c) => format!("Namespace costs - {} (last {})", c, self.config.window),
            None => format!("Namespace costs (last {})", self.config.window),
        }
    }

    pub fn present(&self) -> Result<PresentedTable, PresentError> {
        present(self.title(), &self.ranked, &self.config.fields)
    }

    pub fn summary(&self) -> ReportSummary {
        let total_cost: f64 = self.ranked.iter().map(|r| r.metric.total_cost_or_zero()).sum();
        let weighted: Vec<(f64, f64)> = self
            .ranked
            .iter()
            .filter_map(|r| {
                r.metric
                    .number(MetricField::TotalEfficiency)
                    .map(|e| (e, r.metric.total_cost_or_zero()))
            })
            .collect();
        ReportSummary {
            namespace_count: self.ranked.len(),
            total_cost,
            weighted_efficiency: crate::render::color::weighted_mean(&weighted),
            top_namespace: self.ranked.first().map(|r| r.namespace.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportSummary {
    pub namespace_count: usize,
    pub total_cost: f64,
    pub weighted_efficiency: Option<f64>,
    pub top_namespace: Option<String>,
}

impl ReportSummary {
    pub fn is_empty(&self) -> bool {
        self.namespace_count == 0
    }

    pub fn describe(&self) -> String {
        let efficiency = self
            .weighted_efficiency
            .map(format_percentage)
            .unwrap_or_else(|| "n/a".to_string());
        format!(
            "{} namespaces, total {}, cost-weighted efficiency {}, top: {}",
            self.namespace_count,
            format_currency(self.total_cost),
            efficiency,
            self.top_namespace.as_deref().unwrap_or("-")
        )
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Printed(String),
    Rendered(PathBuf),
    Published { path: PathBuf, file_id: String },
}

/// fetch → filter → rank → present → render → publish.
///
/// The publisher is built before anything touches the network, so missing
/// credentials stop the run without a single request.
pub async fn run(config: Config) -> Result<RunOutcome> {
    let publisher = if config.renderer.produces_file() && !config.dry_run {
        Some(SlackPublisher::new(SlackUploadConfig::from_config(&config)?)?)
    } else {
        None
    };

    let client = OpenCostClient::new(&config)?;
    let raw = client
        .fetch_allocations(&AllocationQuery::from_config(&config))
        .await?;

    let report = CostReport::from_allocations(config.clone(), &raw);
    let summary = report.summary();
    info!("Cost report summary: {}", summary.describe());

    let table = report.present()?;

    let output = config
        .output_path
        .clone()
        .unwrap_or_else(|| default_output_path(config.renderer));
    let renderer = renderer_for(config.renderer, &output);

    match renderer.render(&table)? {
        Artifact::Text(text) => Ok(RunOutcome::Printed(text)),
        Artifact::File(path) => match publisher {
            Some(publisher) => {
                let file_id = publisher.upload(&path).await?;
                Ok(RunOutcome::Published { path, file_id })
            }
            None => {
                info!("Dry run, not publishing {}", path.display());
                Ok(RunOutcome::Rendered(path))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{load_config_with_env, MockEnvironment};
    use serde_json::json;

    fn config() -> Config {
        load_config_with_env(&MockEnvironment::new()).unwrap()
    }

    fn raw() -> RawAllocationReport {
        serde_json::from_value(json!({
            "code": 200,
            "status": "success",
            "data": [{
                "__idle__": {"properties": {"cluster": "c"}, "totalCost": 100.0, "totalEfficiency": 0.0},
                "web": {
                    "properties": {"namespace": "web"},
                    "cpuEfficiency": 0.5, "ramEfficiency": 0.25, "totalEfficiency": 0.4,
                    "cpuCost": 2.0, "ramCost": 1.0, "totalCost": 3.0
                },
                "db": {
                    "properties": {"namespace": "db"},
                    "cpuEfficiency": 0.9, "ramEfficiency": 0.7, "totalEfficiency": 0.8,
                    "cpuCost": 5.0, "ramCost": 4.0, "totalCost": 9.0
                }
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_from_allocations_filters_and_ranks() {
        let report = CostReport::from_allocations(config(), &raw());
        let names: Vec<&str> = report.ranked.iter().map(|r| r.namespace.as_str()).collect();
        assert_eq!(names, vec!["db", "web"]);
    }

    #[test]
    fn test_ranks_by_cost_when_cost_is_not_a_column() {
        let mut cfg = config();
        cfg.fields = vec![MetricField::CpuEfficiency, MetricField::TotalEfficiency];
        let raw: RawAllocationReport = serde_json::from_value(json!({
            "code": 200,
            "status": "success",
            "data": [{
                "cheap": {
                    "properties": {"namespace": "cheap"},
                    "cpuEfficiency": 0.1, "totalEfficiency": 0.2, "totalCost": 1.0
                },
                "pricey": {
                    "properties": {"namespace": "pricey"},
                    "cpuEfficiency": 0.3, "totalEfficiency": 0.4, "totalCost": 500.0
                }
            }]
        }))
        .unwrap();

        let report = CostReport::from_allocations(cfg, &raw);
        let names: Vec<&str> = report.ranked.iter().map(|r| r.namespace.as_str()).collect();
        assert_eq!(names, vec!["pricey", "cheap"]);

        let table = report.present().unwrap();
        assert_eq!(table.fields, vec![MetricField::CpuEfficiency, MetricField::TotalEfficiency]);
        assert_eq!(table.rows[0].cell(MetricField::TotalCost), None);
        assert_eq!(table.rows[0].metric.number(MetricField::TotalCost), Some(500.0));
    }

    #[test]
    fn test_summary() {
        let summary = CostReport::from_allocations(config(), &raw()).summary();
        assert_eq!(summary.namespace_count, 2);
        assert_eq!(summary.total_cost, 12.0);
        assert!((summary.weighted_efficiency.unwrap() - 0.7).abs() < 1e-12);
        assert_eq!(summary.top_namespace.as_deref(), Some("db"));
        assert!(summary.describe().contains("$12.00"));
    }

    #[test]
    fn test_empty_report() {
        let report = CostReport::new(config());
        let summary = report.summary();
        assert!(summary.is_empty());
        assert_eq!(summary.weighted_efficiency, None);
        assert!(report.present().unwrap().is_empty());
    }

    #[test]
    fn test_title_mentions_window_and_cluster() {
        let mut cfg = config();
        assert_eq!(CostReport::new(cfg.clone()).title(), "Namespace costs (last 7d)");
        cfg.cluster_name = Some("prod".to_string());
        assert_eq!(CostReport::new(cfg).title(), "Namespace costs - prod (last 7d)");
    }

    #[test]
    fn test_present_uses_configured_fields() {
        let table = CostReport::from_allocations(config(), &raw()).present().unwrap();
        assert_eq!(table.rows[0].cell(MetricField::TotalCost), Some("$9.00"));
        assert_eq!(table.rows[1].cell(MetricField::RamEfficiency), Some("25.00%"));
    }

    #[tokio::test]
    async fn test_run_without_token_fails_before_fetch() {
        let mut cfg = config();
        // Nothing listens here; reaching the network would be a transport error instead.
        cfg.opencost_url = "http://127.0.0.1:9".to_string();
        cfg.slack_channel_id = Some("C1".to_string());
        let err = run(cfg).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<crate::slack::PublishError>(),
            Some(crate::slack::PublishError::MissingToken)
        ));
    }
}
