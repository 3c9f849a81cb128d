use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde_json::Value;

#[derive(Debug, Clone)]
pub struct Config {
    pub opencost_url: String,
    pub opencost_path: String,
    pub window: String,
    pub step: String,
    pub aggregate: String,
    pub include_idle: bool,
    pub request_timeout_secs: u64,
    pub fields: Vec<MetricField>,
    pub renderer: RendererKind,
    pub output_path: Option<PathBuf>,
    pub slack_api_token: Option<String>,
    pub slack_channel_id: Option<String>,
    pub slack_api_url: String,
    pub caption: String,
    pub cluster_name: Option<String>,
    pub dry_run: bool,
}

/// How a metric value is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Ratio,
    Currency,
}

/// A per-namespace field projected out of an allocation bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricField {
    CpuEfficiency,
    RamEfficiency,
    TotalEfficiency,
    CpuCost,
    RamCost,
    TotalCost,
}

impl MetricField {
    pub const ALL: [MetricField; 6] = [
        MetricField::CpuEfficiency,
        MetricField::RamEfficiency,
        MetricField::TotalEfficiency,
        MetricField::CpuCost,
        MetricField::RamCost,
        MetricField::TotalCost,
    ];

    /// Key used by the allocation API.
    pub fn key(&self) -> &'static str {
        match self {
            MetricField::CpuEfficiency => "cpuEfficiency",
            MetricField::RamEfficiency => "ramEfficiency",
            MetricField::TotalEfficiency => "totalEfficiency",
            MetricField::CpuCost => "cpuCost",
            MetricField::RamCost => "ramCost",
            MetricField::TotalCost => "totalCost",
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            MetricField::CpuEfficiency | MetricField::RamEfficiency | MetricField::TotalEfficiency => {
                FieldKind::Ratio
            }
            MetricField::CpuCost | MetricField::RamCost | MetricField::TotalCost => FieldKind::Currency,
        }
    }

    /// Column header used by the renderers.
    pub fn header(&self) -> &'static str {
        match self {
            MetricField::CpuEfficiency => "CPU Eff.",
            MetricField::RamEfficiency => "RAM Eff.",
            MetricField::TotalEfficiency => "Total Eff.",
            MetricField::CpuCost => "CPU Cost",
            MetricField::RamCost => "RAM Cost",
            MetricField::TotalCost => "Total Cost",
        }
    }
}

impl fmt::Display for MetricField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for MetricField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricField::ALL
            .iter()
            .copied()
            .find(|f| f.key() == s.trim())
            .ok_or_else(|| format!("unknown metric field '{}'", s.trim()))
    }
}

/// Raw projection of one namespace bucket. Values are kept as they appeared
/// in the response so that `null` and missing fields pass through untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamespaceMetric {
    values: Vec<(MetricField, Option<Value>)>,
}

impl NamespaceMetric {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, field: MetricField, value: Option<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: MetricField, value: Option<Value>) {
        match self.values.iter_mut().find(|(f, _)| *f == field) {
            Some(slot) => slot.1 = value,
            None => self.values.push((field, value)),
        }
    }

    /// `None` when the field was not projected or was absent in the bucket.
    pub fn get(&self, field: MetricField) -> Option<&Value> {
        self.values
            .iter()
            .find(|(f, _)| *f == field)
            .and_then(|(_, v)| v.as_ref())
    }

    pub fn number(&self, field: MetricField) -> Option<f64> {
        self.get(field).and_then(Value::as_f64)
    }

    pub fn fields(&self) -> impl Iterator<Item = MetricField> + '_ {
        self.values.iter().map(|(f, _)| *f)
    }

    /// Total cost for ordering; absent or non-numeric counts as zero.
    pub fn total_cost_or_zero(&self) -> f64 {
        self.number(MetricField::TotalCost).unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedNamespace {
    pub namespace: String,
    pub metric: NamespaceMetric,
}

/// Display-ready row. The raw metric travels along for renderers that
/// need magnitudes (treemap areas and colours).
#[derive(Debug, Clone, PartialEq)]
pub struct PresentedRow {
    pub namespace: String,
    pub cells: Vec<(MetricField, String)>,
    pub metric: NamespaceMetric,
}

impl PresentedRow {
    pub fn cell(&self, field: MetricField) -> Option<&str> {
        self.cells
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, s)| s.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PresentedTable {
    pub title: String,
    pub fields: Vec<MetricField>,
    pub rows: Vec<PresentedRow>,
}

impl PresentedTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// What a renderer produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    Text(String),
    File(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum RendererKind {
    Text,
    #[default]
    Table,
    Treemap,
}

impl RendererKind {
    pub fn produces_file(&self) -> bool {
        !matches!(self, RendererKind::Text)
    }
}

impl FromStr for RendererKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(RendererKind::Text),
            "table" => Ok(RendererKind::Table),
            "treemap" => Ok(RendererKind::Treemap),
            other => Err(format!("unknown renderer '{}'", other)),
        }
    }
}
