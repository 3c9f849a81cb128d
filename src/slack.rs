use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::types::Config;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("SLACK_API_TOKEN must be provided to publish the report")]
    MissingToken,
    #[error("SLACK_CHANNEL_ID must be provided to publish the report")]
    MissingChannel,
    #[error("failed to read artifact {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Slack request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Slack {method} failed: {error}")]
    Api { method: String, error: String },
}

/// Everything the publisher needs. Constructing it is the credential check.
#[derive(Debug, Clone, PartialEq)]
pub struct SlackUploadConfig {
    pub token: String,
    pub channel_id: String,
    pub api_url: String,
    pub caption: String,
    pub timeout_secs: u64,
}

impl SlackUploadConfig {
    pub fn from_config(cfg: &Config) -> Result<Self, PublishError> {
        let token = cfg.slack_api_token.clone().ok_or(PublishError::MissingToken)?;
        let channel_id = cfg.slack_channel_id.clone().ok_or(PublishError::MissingChannel)?;
        let caption = match &cfg.cluster_name {
            Some(cluster) => format!("{} ({})", cfg.caption, cluster),
            None => cfg.caption.clone(),
        };
        Ok(Self {
            token,
            channel_id,
            api_url: cfg.slack_api_url.clone(),
            caption,
            timeout_secs: cfg.request_timeout_secs,
        })
    }
}

#[derive(Debug, Deserialize)]
struct UploadUrlResponse {
    ok: bool,
    #[serde(default)]
    upload_url: Option<String>,
    #[serde(default)]
    file_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct FileRef<'a> {
    id: &'a str,
    title: &'a str,
}

#[derive(Debug, Serialize)]
struct CompleteUploadRequest<'a> {
    files: Vec<FileRef<'a>>,
    channel_id: &'a str,
    initial_comment: &'a str,
}

pub struct SlackPublisher {
    http: reqwest::Client,
    cfg: SlackUploadConfig,
}

impl SlackPublisher {
    pub fn new(cfg: SlackUploadConfig) -> Result<Self, PublishError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self { http, cfg })
    }

    pub fn config(&self) -> &SlackUploadConfig {
        &self.cfg
    }

    /// Upload `path` to the configured channel with the caption. Returns the
    /// Slack file id.
    pub async fn upload(&self, path: &Path) -> Result<String, PublishError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| PublishError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "report.png".to_string());

        let (upload_url, file_id) = self.reserve_upload(&filename, bytes.len()).await?;
        self.send_bytes(&upload_url, bytes).await?;
        self.complete_upload(&file_id, &filename).await?;
        info!("Uploaded {} to channel {} as {}", filename, self.cfg.channel_id, file_id);
        Ok(file_id)
    }

    async fn reserve_upload(&self, filename: &str, length: usize) -> Result<(String, String), PublishError> {
        const METHOD: &str = "files.getUploadURLExternal";
        let res = self
            .http
            .post(format!("{}/{}", self.cfg.api_url, METHOD))
            .bearer_auth(&self.cfg.token)
            .form(&[("filename", filename.to_string()), ("length", length.to_string())])
            .send()
            .await?;
        let res = check_status(METHOD, res).await?;
        let body: UploadUrlResponse = res.json().await?;
        if !body.ok {
            return Err(api_error(METHOD, body.error));
        }
        match (body.upload_url, body.file_id) {
            (Some(url), Some(id)) => Ok((url, id)),
            _ => Err(api_error(METHOD, Some("response missing upload_url or file_id".to_string()))),
        }
    }

    async fn send_bytes(&self, upload_url: &str, bytes: Vec<u8>) -> Result<(), PublishError> {
        let res = self
            .http
            .post(upload_url)
            .bearer_auth(&self.cfg.token)
            .body(bytes)
            .send()
            .await?;
        check_status("file upload", res).await?;
        Ok(())
    }

    async fn complete_upload(&self, file_id: &str, title: &str) -> Result<(), PublishError> {
        const METHOD: &str = "files.completeUploadExternal";
        let request = CompleteUploadRequest {
            files: vec![FileRef { id: file_id, title }],
            channel_id: &self.cfg.channel_id,
            initial_comment: &self.cfg.caption,
        };
        let res = self
            .http
            .post(format!("{}/{}", self.cfg.api_url, METHOD))
            .bearer_auth(&self.cfg.token)
            .json(&request)
            .send()
            .await?;
        let res = check_status(METHOD, res).await?;
        let body: ApiResponse = res.json().await?;
        if !body.ok {
            return Err(api_error(METHOD, body.error));
        }
        Ok(())
    }
}

async fn check_status(method: &str, res: reqwest::Response) -> Result<reqwest::Response, PublishError> {
    if res.status().is_success() {
        return Ok(res);
    }
    let status = res.status();
    let body = res.text().await.unwrap_or_default();
    error!("Slack {} returned {} - {}", method, status, body);
    Err(PublishError::Api {
        method: method.to_string(),
        error: format!("HTTP {}", status.as_u16()),
    })
}

fn api_error(method: &str, error: Option<String>) -> PublishError {
    let error = error.unwrap_or_else(|| "unknown_error".to_string());
    error!("Slack {} returned ok=false: {}", method, error);
    PublishError::Api {
        method: method.to_string(),
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{load_config_with_env, MockEnvironment};

    #[test]
    fn test_upload_config_requires_token() {
        let cfg = load_config_with_env(&MockEnvironment::new().with_var("SLACK_CHANNEL_ID", "C1")).unwrap();
        let err = SlackUploadConfig::from_config(&cfg).unwrap_err();
        assert!(matches!(err, PublishError::MissingToken));
        assert!(err.to_string().contains("SLACK_API_TOKEN"));
    }

    #[test]
    fn test_upload_config_requires_channel() {
        let cfg = load_config_with_env(&MockEnvironment::new().with_var("SLACK_API_TOKEN", "xoxb-1")).unwrap();
        assert!(matches!(SlackUploadConfig::from_config(&cfg), Err(PublishError::MissingChannel)));
    }

    #[test]
    fn test_upload_config_caption_includes_cluster() {
        let env = MockEnvironment::new()
            .with_var("SLACK_API_TOKEN", "xoxb-1")
            .with_var("SLACK_CHANNEL_ID", "C1")
            .with_var("CLUSTER_NAME", "prod");
        let cfg = load_config_with_env(&env).unwrap();
        let upload = SlackUploadConfig::from_config(&cfg).unwrap();
        assert_eq!(upload.caption, "Namespaces with the highest cost (prod)");
        assert_eq!(upload.token, "xoxb-1");
        assert_eq!(upload.channel_id, "C1");
    }

    #[test]
    fn test_complete_request_shape() {
        let request = CompleteUploadRequest {
            files: vec![FileRef { id: "F1", title: "costs.png" }],
            channel_id: "C1",
            initial_comment: "caption",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["files"][0]["id"], "F1");
        assert_eq!(json["files"][0]["title"], "costs.png");
        assert_eq!(json["channel_id"], "C1");
        assert_eq!(json["initial_comment"], "caption");
    }
}
