//! Per-provider request adapters.
//!
//! Providers deviate from the plain OpenAI chat shape in small,
//! incompatible ways. Each deviation lives in one strategy object keyed
//! by provider — adding a provider means adding an adapter, never a
//! branch in shared gateway logic.

use serde_json::{json, Value as JsonValue};

use flashnote_core::defaults::OUTPUT_OPEN_TAG;

use crate::gateway::ChatMessage;
use crate::registry::Provider;

/// The request after provider-specific adaptation.
#[derive(Debug, Clone)]
pub struct AdaptedRequest {
    pub messages: Vec<ChatMessage>,
    /// Inserted between the base URL and `/chat/completions`.
    pub path_infix: &'static str,
    /// Extra body field controlling an internal reasoning mode.
    pub thinking: Option<JsonValue>,
}

impl AdaptedRequest {
    fn passthrough(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            path_infix: "",
            thinking: None,
        }
    }
}

/// Strategy applied to the prompt set and request parameters before the
/// gateway sends them.
pub trait ProviderAdapter: Send + Sync {
    fn adapt(&self, messages: Vec<ChatMessage>, model: &str) -> AdaptedRequest;
}

/// Resolve the adapter for a provider.
pub fn adapter_for(provider: Provider) -> &'static dyn ProviderAdapter {
    match provider {
        Provider::Deepseek => &DeepseekAdapter,
        Provider::Moonshot => &MoonshotAdapter,
        Provider::Zhipu => &ZhipuAdapter,
        Provider::AliyunBailian | Provider::Siliconflow => &PassthroughAdapter,
    }
}

/// No deviation: send the prompts as-is.
struct PassthroughAdapter;

impl ProviderAdapter for PassthroughAdapter {
    fn adapt(&self, messages: Vec<ChatMessage>, _model: &str) -> AdaptedRequest {
        AdaptedRequest::passthrough(messages)
    }
}

/// DeepSeek: completion continues an assistant prefix, and prefix mode
/// lives under the `/beta` path.
struct DeepseekAdapter;

impl ProviderAdapter for DeepseekAdapter {
    fn adapt(&self, mut messages: Vec<ChatMessage>, _model: &str) -> AdaptedRequest {
        messages.push(ChatMessage::assistant_prefix(format!(
            "{}\n",
            OUTPUT_OPEN_TAG
        )));
        AdaptedRequest {
            messages,
            path_infix: "/beta",
            thinking: None,
        }
    }
}

/// Moonshot: same continuation idea, flagged as a partial completion.
struct MoonshotAdapter;

impl ProviderAdapter for MoonshotAdapter {
    fn adapt(&self, mut messages: Vec<ChatMessage>, _model: &str) -> AdaptedRequest {
        messages.push(ChatMessage::assistant_partial(format!(
            "{}\n",
            OUTPUT_OPEN_TAG
        )));
        AdaptedRequest::passthrough(messages)
    }
}

/// Zhipu: the glm family reasons by default; classification wants it off.
struct ZhipuAdapter;

impl ProviderAdapter for ZhipuAdapter {
    fn adapt(&self, messages: Vec<ChatMessage>, model: &str) -> AdaptedRequest {
        let thinking = model
            .starts_with("glm-")
            .then(|| json!({"type": "disabled"}));
        AdaptedRequest {
            messages,
            path_infix: "",
            thinking,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_messages() -> Vec<ChatMessage> {
        vec![
            ChatMessage::system("classify"),
            ChatMessage::user("message"),
        ]
    }

    #[test]
    fn passthrough_leaves_request_untouched() {
        let adapted = adapter_for(Provider::AliyunBailian).adapt(base_messages(), "qwen3-max");
        assert_eq!(adapted.messages.len(), 2);
        assert_eq!(adapted.path_infix, "");
        assert!(adapted.thinking.is_none());
    }

    #[test]
    fn deepseek_appends_prefix_and_beta_path() {
        let adapted = adapter_for(Provider::Deepseek).adapt(base_messages(), "deepseek-chat");
        assert_eq!(adapted.path_infix, "/beta");

        let last = adapted.messages.last().unwrap();
        assert_eq!(last.role, "assistant");
        assert_eq!(last.content, "<output>\n");
        assert_eq!(last.prefix, Some(true));
        assert_eq!(last.partial, None);
    }

    #[test]
    fn moonshot_appends_partial() {
        let adapted =
            adapter_for(Provider::Moonshot).adapt(base_messages(), "kimi-k2-turbo-preview");
        assert_eq!(adapted.path_infix, "");

        let last = adapted.messages.last().unwrap();
        assert_eq!(last.partial, Some(true));
        assert_eq!(last.prefix, None);
    }

    #[test]
    fn zhipu_disables_thinking_for_glm_models() {
        let adapted = adapter_for(Provider::Zhipu).adapt(base_messages(), "glm-4.6");
        assert_eq!(adapted.thinking, Some(json!({"type": "disabled"})));
        assert_eq!(adapted.messages.len(), 2);
    }

    #[test]
    fn zhipu_leaves_non_glm_models_alone() {
        let adapted = adapter_for(Provider::Zhipu).adapt(base_messages(), "charglm-3");
        assert!(adapted.thinking.is_none());
    }
}
