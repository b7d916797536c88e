//! Model gateway: the bounded-timeout chat-completion call.
//!
//! All providers speak an OpenAI-compatible chat endpoint; per-provider
//! request quirks are applied by the [`crate::adapter`] strategies before
//! the request leaves this module. The gateway is the pipeline's only
//! suspension point and is bounded by a hard timeout — expiry, a
//! non-success status, and an empty body are all `Error::Gateway`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use flashnote_core::defaults::{GATEWAY_TIMEOUT_SECS, OUTPUT_CLOSE_TAG, OUTPUT_OPEN_TAG};
use flashnote_core::{Error, Result};

use crate::adapter::adapter_for;
use crate::registry::{ConnectionConfig, WorkerDescriptor};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// One chat message on the wire. The `prefix`/`partial` flags are the
/// provider-specific "continue this assistant text" markers; they are
/// only ever set by adapters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial: Option<bool>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
            prefix: None,
            partial: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
            prefix: None,
            partial: None,
        }
    }

    /// Assistant message flagged as a prefix to continue (DeepSeek).
    pub fn assistant_prefix(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
            prefix: Some(true),
            partial: None,
        }
    }

    /// Assistant message flagged as a partial completion (Moonshot).
    pub fn assistant_partial(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
            prefix: None,
            partial: Some(true),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stop: Vec<String>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking: Option<JsonValue>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning_content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// A successful provider reply, normalized so the content always carries
/// the opening and closing sentinel tags.
#[derive(Debug, Clone, PartialEq)]
pub struct RawReply {
    pub content: String,
    pub reasoning: Option<String>,
}

// ---------------------------------------------------------------------------
// Gateway trait
// ---------------------------------------------------------------------------

/// The classification call seam. The HTTP implementation is
/// [`HttpGateway`]; tests script replies through
/// [`crate::mock::MockGateway`].
#[async_trait]
pub trait ClassifierGateway: Send + Sync {
    async fn call(
        &self,
        worker: &WorkerDescriptor,
        connection: &ConnectionConfig,
        messages: Vec<ChatMessage>,
    ) -> Result<RawReply>;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

/// Gateway over `reqwest` with a hard per-call timeout.
pub struct HttpGateway {
    client: Client,
    timeout: Duration,
}

impl HttpGateway {
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(GATEWAY_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Gateway(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client, timeout })
    }

    async fn send(
        &self,
        worker: &WorkerDescriptor,
        connection: &ConnectionConfig,
        messages: Vec<ChatMessage>,
    ) -> Result<RawReply> {
        let adapted = adapter_for(worker.provider).adapt(messages, &worker.model);
        let url = format!(
            "{}{}/chat/completions",
            connection.base_url.trim_end_matches('/'),
            adapted.path_infix,
        );

        let request = ChatRequest {
            model: worker.model.clone(),
            messages: adapted.messages,
            stop: vec![OUTPUT_CLOSE_TAG.to_string()],
            stream: worker.supports_streaming,
            thinking: adapted.thinking,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", connection.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Gateway(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .json::<ApiErrorBody>()
                .await
                .map(|b| b.error.message)
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(Error::Gateway(format!(
                "{} returned {}: {}",
                worker.provider, status, message
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Gateway(format!("failed to parse response: {}", e)))?;

        let message = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| Error::Gateway("no choices in response".to_string()))?;

        let reasoning = message.reasoning_content.filter(|r| !r.trim().is_empty());
        let mut content = message.content.unwrap_or_default().trim().to_string();

        // Some providers co-mingle the answer into reasoning_content when
        // the visible content comes back empty.
        if content.is_empty() {
            if let Some(recovered) = reasoning.as_deref().and_then(extract_output_block) {
                content = recovered;
            }
        }

        if content.is_empty() {
            return Err(Error::Gateway(format!(
                "empty content from {} ({})",
                worker.provider, worker.model
            )));
        }

        Ok(RawReply {
            content: normalize_reply(&content, &worker.persona),
            reasoning,
        })
    }
}

#[async_trait]
impl ClassifierGateway for HttpGateway {
    async fn call(
        &self,
        worker: &WorkerDescriptor,
        connection: &ConnectionConfig,
        messages: Vec<ChatMessage>,
    ) -> Result<RawReply> {
        let started = Instant::now();
        let result = tokio::time::timeout(self.timeout, self.send(worker, connection, messages))
            .await
            .unwrap_or_else(|_| {
                Err(Error::Gateway(format!(
                    "timed out after {}s",
                    self.timeout.as_secs()
                )))
            });

        match &result {
            Ok(_) => debug!(
                provider = %worker.provider,
                model = %worker.model,
                duration_ms = started.elapsed().as_millis() as u64,
                "classification call complete"
            ),
            Err(e) => warn!(
                provider = %worker.provider,
                model = %worker.model,
                duration_ms = started.elapsed().as_millis() as u64,
                error = %e,
                "classification call failed"
            ),
        }
        result
    }
}

// ---------------------------------------------------------------------------
// Reply normalization
// ---------------------------------------------------------------------------

/// Pull an `<output>…</output>` block out of co-mingled reasoning text.
pub fn extract_output_block(text: &str) -> Option<String> {
    let start = text.find(OUTPUT_OPEN_TAG)?;
    let tail = &text[start..];
    match tail.find(OUTPUT_CLOSE_TAG) {
        Some(end) => Some(tail[..end + OUTPUT_CLOSE_TAG.len()].to_string()),
        // Stop sequence may have eaten the closing tag; normalization
        // restores it.
        None => Some(tail.to_string()),
    }
}

/// Repair the common shapes of model output around the sentinel tags:
/// a stop-sequence-consumed closing tag, a truncated `</output`, a
/// missing opening tag (prefix-continuation providers), and one provider
/// family's stray leading full-width question mark.
pub fn normalize_reply(content: &str, persona: &str) -> String {
    let mut content = content.trim().to_string();

    if persona == "zhipu" {
        if let Some(stripped) = content.strip_prefix('？') {
            content = stripped.trim_start().to_string();
        }
    }

    if !content.starts_with(OUTPUT_OPEN_TAG) {
        content = format!("{}\n{}", OUTPUT_OPEN_TAG, content);
    }
    if content.ends_with("</output") {
        content.push('>');
    }
    if !content.ends_with(OUTPUT_CLOSE_TAG) {
        content.push_str(&format!("\n{}", OUTPUT_CLOSE_TAG));
    }
    content
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
