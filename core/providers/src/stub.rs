use protocol::{ChatMessage, ProviderConfig, Role, PLAN_INSTRUCTION};
use serde_json::{json, Value};

use crate::provider_trait::{Provider, ProviderError};

/// Offline provider: echoes chat input and answers plan requests with a
/// keyword-derived plan. Useful without a network or credential.
pub struct StubProvider;

impl Provider for StubProvider {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn chat(&self, messages: &[ChatMessage], config: &ProviderConfig) -> Result<String, ProviderError> {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        let plan_request = messages
            .first()
            .is_some_and(|m| m.role == Role::System && m.content == PLAN_INSTRUCTION);
        if plan_request {
            return Ok(stub_plan(last_user).to_string());
        }

        Ok(format!(
            "Stub reply from **{}** ({} messages in context):\n- {}",
            config.model,
            messages.len(),
            last_user
        ))
    }
}

fn stub_plan(prompt: &str) -> Value {
    let lower = prompt.to_ascii_lowercase();
    if let Some(idx) = lower.find("read ") {
        let path = prompt[idx + "read ".len()..].split_whitespace().next().unwrap_or_default();
        if !path.is_empty() {
            return json!([{ "action": "read_file", "arg": path }]);
        }
    }
    if lower.contains("list") || lower.contains("files") {
        return json!([{ "action": "pwd" }, { "action": "list_dir" }]);
    }
    json!([{ "action": "pwd" }])
}
