//! Reqwest client for the remote `run_code` endpoint.

use anyhow::Result;
use hyper::ext::ReasonPhrase;
use reqwest::{Client, StatusCode};
use serde_json::json;

use super::{ExecutionResult, Executor, WireResponse};
use crate::{config::Config, error::RunError};

#[derive(Debug, Clone)]
pub struct RemoteExecutor {
    client: Client,
    base: String,
}

impl RemoteExecutor {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let client = Client::builder().timeout(cfg.request_timeout()).build()?;
        Ok(Self::with_client(client, cfg.api_base_url()))
    }

    pub fn with_client(client: Client, base: impl Into<String>) -> Self {
        Self { client, base: base.into() }
    }

    pub fn endpoint(&self, session_id: &str) -> String {
        format!("{}/api/run_code/{}/", self.base.trim_end_matches('/'), session_id)
    }
}

/// Reason phrase the server sent, else the canonical one, else the numeric code.
fn status_text(status: StatusCode, reason: Option<&[u8]>) -> String {
    reason
        .map(|r| String::from_utf8_lossy(r).trim().to_string())
        .filter(|r| !r.is_empty())
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| status.as_u16().to_string())
}

impl Executor for RemoteExecutor {
    async fn execute(&self, code: &str, session_id: &str) -> Result<ExecutionResult, RunError> {
        let url = self.endpoint(session_id);
        tracing::debug!(%url, code_len = code.len(), "posting code");

        let resp = self
            .client
            .post(&url)
            .json(&json!({ "code": code }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let reason = resp.extensions().get::<ReasonPhrase>().map(|r| r.as_bytes());
            return Err(RunError::Remote { status: status_text(status, reason) });
        }

        let bytes = resp.bytes().await?;
        let wire: WireResponse = serde_json::from_slice(&bytes)?;
        Ok(ExecutionResult::from(wire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_format() {
        let exec = RemoteExecutor::with_client(Client::new(), "https://example.test/");
        assert_eq!(exec.endpoint("200"), "https://example.test/api/run_code/200/");
    }

    #[test]
    fn test_status_text() {
        assert_eq!(status_text(StatusCode::INTERNAL_SERVER_ERROR, None), "Internal Server Error");
        assert_eq!(status_text(StatusCode::NOT_FOUND, Some(b"")), "Not Found");
        assert_eq!(status_text(StatusCode::from_u16(599).unwrap(), None), "599");
        assert_eq!(
            status_text(StatusCode::INTERNAL_SERVER_ERROR, Some(b"Lesson sandbox unavailable")),
            "Lesson sandbox unavailable"
        );
    }
}
