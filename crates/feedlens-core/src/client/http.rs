use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{RemoteClient, RemoteResult};
use crate::config::ApiConfig;
use crate::error::{FeedlensError, RemoteFailure, Result};
use crate::model::{FeedbackItem, InsightsSnapshot};
use crate::retry::with_retry;

const SUBMIT_FALLBACK: &str = "Failed to submit feedback";
const LIST_FALLBACK: &str = "Failed to fetch feedback";
const INSIGHTS_FALLBACK: &str = "Failed to fetch insights";

/// Response of the service's liveness check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
}

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    message: &'a str,
}

/// [`RemoteClient`] speaking JSON over HTTP to the analysis service.
pub struct HttpRemoteClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: usize,
    retry_base_delay_ms: u64,
}

impl std::fmt::Debug for HttpRemoteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRemoteClient")
            .field("base_url", &self.base_url)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl HttpRemoteClient {
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
            retry_base_delay_ms: config.retry_base_delay_ms,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET {base_url}/health
    pub async fn health(&self) -> Result<HealthStatus> {
        self.get_json("/health").await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        with_retry(self.max_retries, self.retry_base_delay_ms, || async {
            let resp = self.client.get(&url).send().await?;
            decode(resp).await
        })
        .await
    }

    /// Single attempt: a POST that timed out may still have been committed.
    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let resp = self.client.post(self.url(path)).json(body).send().await?;
        decode(resp).await
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(FeedlensError::Status {
            status: status.as_u16(),
            body,
        });
    }
    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Reduce any adapter error to the message the store records. A `detail`
/// string in an error body wins; everything else gets the per-call fallback.
fn normalize(err: FeedlensError, fallback: &str) -> RemoteFailure {
    tracing::warn!(error = %err, "{fallback}");
    match err {
        FeedlensError::Status { body, .. } => {
            RemoteFailure::new(detail_from_body(&body).unwrap_or_else(|| fallback.to_string()))
        }
        _ => RemoteFailure::new(fallback),
    }
}

fn detail_from_body(body: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;
    json["detail"]
        .as_str()
        .filter(|d| !d.is_empty())
        .map(|d| d.to_string())
}

impl RemoteClient for HttpRemoteClient {
    /// POST {base_url}/api/feedback
    async fn submit_feedback(&self, message: &str) -> RemoteResult<FeedbackItem> {
        self.post_json("/api/feedback", &SubmitRequest { message })
            .await
            .map_err(|e| normalize(e, SUBMIT_FALLBACK))
    }

    /// GET {base_url}/api/feedback
    async fn list_feedback(&self) -> RemoteResult<Vec<FeedbackItem>> {
        self.get_json("/api/feedback")
            .await
            .map_err(|e| normalize(e, LIST_FALLBACK))
    }

    /// GET {base_url}/api/insights
    async fn get_insights(&self) -> RemoteResult<InsightsSnapshot> {
        self.get_json("/api/insights")
            .await
            .map_err(|e| normalize(e, INSIGHTS_FALLBACK))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_from_body() {
        assert_eq!(
            detail_from_body(r#"{"detail": "Feedback message cannot be empty"}"#).as_deref(),
            Some("Feedback message cannot be empty")
        );
        assert!(detail_from_body(r#"{"detail": ""}"#).is_none());
        assert!(detail_from_body(r#"{"detail": [{"loc": ["body"]}]}"#).is_none());
        assert!(detail_from_body("<html>bad gateway</html>").is_none());
    }

    #[test]
    fn test_normalize_prefers_detail() {
        let err = FeedlensError::Status {
            status: 500,
            body: r#"{"detail": "Failed to retrieve feedback: db locked"}"#.into(),
        };
        let failure = normalize(err, LIST_FALLBACK);
        assert_eq!(failure.message, "Failed to retrieve feedback: db locked");
    }

    #[test]
    fn test_normalize_falls_back() {
        let err = FeedlensError::Status {
            status: 502,
            body: "bad gateway".into(),
        };
        assert_eq!(normalize(err, INSIGHTS_FALLBACK).message, INSIGHTS_FALLBACK);

        let err = FeedlensError::Config("anything else".into());
        assert_eq!(normalize(err, SUBMIT_FALLBACK).message, SUBMIT_FALLBACK);
    }

    #[test]
    fn test_from_config_trims_base_url() {
        let config = ApiConfig {
            base_url: "http://localhost:8001/".into(),
            ..Default::default()
        };
        let client = HttpRemoteClient::from_config(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8001");
        assert_eq!(client.url("/health"), "http://localhost:8001/health");
    }
}
