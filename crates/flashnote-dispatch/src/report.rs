//! Diagnostic webhook reporter.
//!
//! Outbound-only: a JSON POST with a title and an arbitrary payload.
//! Nothing awaits the response body and every failure is swallowed with
//! a warning — losing a diagnostic must never fail a branch.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, warn};

use flashnote_core::defaults::REPORT_TITLE_PREFIX;
use flashnote_core::{Error, Reporter, Result};

const REPORT_TIMEOUT_SECS: u64 = 10;

/// [`Reporter`] posting to a configured webhook URL. With no URL
/// configured it degrades to a no-op.
pub struct WebhookReporter {
    client: Client,
    url: Option<String>,
}

impl WebhookReporter {
    pub fn new(url: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REPORT_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client, url })
    }

    /// Read the webhook URL from `FLASHNOTE_REPORT_WEBHOOK_URL`.
    pub fn from_env() -> Result<Self> {
        let url = std::env::var("FLASHNOTE_REPORT_WEBHOOK_URL")
            .ok()
            .filter(|u| !u.is_empty());
        Self::new(url)
    }
}

#[async_trait]
impl Reporter for WebhookReporter {
    async fn report(&self, title: &str, payload: JsonValue) {
        let Some(url) = &self.url else {
            debug!(title, "no report webhook configured, dropping report");
            return;
        };

        let title = if title.starts_with(REPORT_TITLE_PREFIX) {
            title.to_string()
        } else {
            format!("{}{}", REPORT_TITLE_PREFIX, title)
        };

        let body = json!({ "title": title, "payload": payload });
        match self.client.post(url).json(&body).send().await {
            Ok(response) => {
                if !response.status().is_success() {
                    warn!(%title, status = %response.status(), "report webhook rejected");
                }
            }
            Err(e) => warn!(%title, error = %e, "report webhook unreachable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_url_is_a_noop() {
        let reporter = WebhookReporter::new(None).unwrap();
        // Must not panic or block
        reporter.report("weird output", json!({"raw": "x"})).await;
    }

    #[tokio::test]
    async fn unreachable_webhook_is_swallowed() {
        let reporter =
            WebhookReporter::new(Some("http://127.0.0.1:1/unreachable".to_string())).unwrap();
        reporter.report("weird output", json!({"raw": "x"})).await;
    }
}
