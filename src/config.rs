use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use crate::types::{Config, MetricField, RendererKind};

pub const DEFAULT_OPENCOST_URL: &str = "http://opencost.opencost:9090";
pub const DEFAULT_OPENCOST_PATH: &str = "/model/allocation/compute";
pub const DEFAULT_SLACK_API_URL: &str = "https://slack.com/api";
pub const DEFAULT_CAPTION: &str = "Namespaces with the highest cost";

/// Trait for abstracting environment variable access
pub trait EnvironmentProvider {
    fn get_var(&self, key: &str) -> Option<String>;
}

/// Production implementation using std::env
pub struct SystemEnvironment;

impl EnvironmentProvider for SystemEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Mock implementation for testing
#[derive(Debug, Default)]
pub struct MockEnvironment {
    vars: HashMap<String, String>,
}

impl MockEnvironment {
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
        }
    }

    pub fn set_var<K, V>(&mut self, key: K, value: V) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn with_var<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.set_var(key, value);
        self
    }
}

impl EnvironmentProvider for MockEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn load_config() -> Result<Config> {
    load_config_with_env(&SystemEnvironment)
}

pub fn load_config_with_env<E: EnvironmentProvider>(env: &E) -> Result<Config> {
    let opencost_url = env.get_var("OPENCOST_URL")
        .unwrap_or_else(|| DEFAULT_OPENCOST_URL.to_string())
        .trim_end_matches('/')
        .to_string();
    if opencost_url.is_empty() {
        return Err(anyhow!("OPENCOST_URL must not be empty"));
    }

    let opencost_path = env.get_var("OPENCOST_PATH")
        .unwrap_or_else(|| DEFAULT_OPENCOST_PATH.to_string());
    let opencost_path = if opencost_path.starts_with('/') {
        opencost_path
    } else {
        format!("/{}", opencost_path)
    };

    let window = env.get_var("COST_WINDOW").unwrap_or_else(|| "7d".to_string());
    let step = env.get_var("COST_STEP").unwrap_or_else(|| "1d".to_string());
    let aggregate = env.get_var("COST_AGGREGATE").unwrap_or_else(|| "namespace".to_string());

    let include_idle = env.get_var("COST_INCLUDE_IDLE")
        .map(|v| parse_bool(&v))
        .unwrap_or(true);

    let request_timeout_secs: u64 = env.get_var("REQUEST_TIMEOUT_SECS")
        .unwrap_or_else(|| "30".to_string())
        .parse()
        .context("Invalid REQUEST_TIMEOUT_SECS")?;

    let fields = match env.get_var("REPORT_FIELDS") {
        Some(raw) => parse_fields(&raw)?,
        None => MetricField::ALL.to_vec(),
    };

    let renderer = match env.get_var("RENDERER") {
        Some(raw) => raw.parse::<RendererKind>().map_err(|e| anyhow!("Invalid RENDERER: {}", e))?,
        None => RendererKind::default(),
    };

    let output_path = env.get_var("OUTPUT_PATH")
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);

    // Credentials are optional here; the publisher refuses to start without them.
    let slack_api_token = non_empty(env.get_var("SLACK_API_TOKEN"));
    let slack_channel_id = non_empty(env.get_var("SLACK_CHANNEL_ID"));
    let slack_api_url = env.get_var("SLACK_API_URL")
        .unwrap_or_else(|| DEFAULT_SLACK_API_URL.to_string())
        .trim_end_matches('/')
        .to_string();

    let caption = env.get_var("REPORT_CAPTION").unwrap_or_else(|| DEFAULT_CAPTION.to_string());
    let cluster_name = non_empty(env.get_var("CLUSTER_NAME"));

    Ok(Config {
        opencost_url,
        opencost_path,
        window,
        step,
        aggregate,
        include_idle,
        request_timeout_secs,
        fields,
        renderer,
        output_path,
        slack_api_token,
        slack_channel_id,
        slack_api_url,
        caption,
        cluster_name,
        dry_run: false,
    })
}

fn parse_bool(v: &str) -> bool {
    matches!(v, "1" | "true" | "TRUE" | "True")
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn parse_fields(raw: &str) -> Result<Vec<MetricField>> {
    let mut fields = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let field = name.parse::<MetricField>().map_err(|e| anyhow!("Invalid REPORT_FIELDS: {}", e))?;
        if !fields.contains(&field) {
            fields.push(field);
        }
    }
    if fields.is_empty() {
        return Err(anyhow!("REPORT_FIELDS must name at least one field"));
    }
    Ok(fields)
}
