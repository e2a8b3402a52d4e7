use std::env;
use std::time::Duration;

use protocol::{ChatMessage, ProviderConfig};
use serde_json::{json, Value};

use crate::provider_trait::{Provider, ProviderError};

pub const API_KEY_VAR: &str = "GROQ_API_KEY";
pub const API_KEY_FILE_VAR: &str = "GROQ_API_KEY_FILE";
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai";

const ERROR_BODY_PREVIEW: usize = 300;

/// OpenAI-compatible `/v1/chat/completions` client. Groq is the default
/// endpoint but any compatible base URL works.
pub struct GroqHttpProvider {
    api_key: String,
    base_url: String,
    agent: ureq::Agent,
}

impl GroqHttpProvider {
    pub fn new(api_key: impl Into<String>, base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            agent,
        }
    }

    /// Reads the credential from the environment. Fails before any request is
    /// attempted so the caller can abort at startup.
    pub fn from_env(base_url: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let api_key = resolve_api_key().ok_or(ProviderError::MissingCredential { var: API_KEY_VAR })?;
        Ok(Self::new(api_key, base_url, timeout))
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

impl Provider for GroqHttpProvider {
    fn name(&self) -> &'static str {
        "groq"
    }

    fn chat(&self, messages: &[ChatMessage], config: &ProviderConfig) -> Result<String, ProviderError> {
        let body = json!({
            "model": config.model,
            "messages": messages
                .iter()
                .map(|m| json!({"role": m.role.as_str(), "content": m.content}))
                .collect::<Vec<_>>(),
        });

        let url = self.endpoint();
        tracing::debug!(%url, model = %config.model, messages = messages.len(), "sending chat completion");
        let response = match self
            .agent
            .post(&url)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .set("Content-Type", "application/json")
            .send_json(body)
        {
            Ok(resp) => resp,
            Err(ureq::Error::Status(code, resp)) => {
                let detail = resp.into_string().unwrap_or_default();
                return Err(ProviderError::Request {
                    url,
                    message: format!("status {code}: {}", truncate_chars(detail.trim(), ERROR_BODY_PREVIEW)),
                });
            }
            Err(err) => {
                return Err(ProviderError::Request {
                    url,
                    message: err.to_string(),
                })
            }
        };

        let payload: Value = response
            .into_json()
            .map_err(|err| ProviderError::InvalidResponse(err.to_string()))?;
        extract_reply(&payload)
    }
}

fn extract_reply(payload: &Value) -> Result<String, ProviderError> {
    let choices = payload
        .get("choices")
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::InvalidResponse("missing 'choices' array".to_string()))?;
    choices
        .first()
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .ok_or(ProviderError::EmptyReply)
}

fn resolve_api_key() -> Option<String> {
    resolve_api_key_from(env::var(API_KEY_VAR).ok(), env::var(API_KEY_FILE_VAR).ok())
}

fn resolve_api_key_from(key: Option<String>, key_file: Option<String>) -> Option<String> {
    if let Some(key) = key {
        if !key.trim().is_empty() {
            return Some(key.trim().to_string());
        }
    }
    let raw = std::fs::read_to_string(key_file?).ok()?;
    let key = raw.trim().to_string();
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

fn truncate_chars(input: &str, max_chars: usize) -> String {
    let mut chars = input.chars();
    let out: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{out}...")
    } else {
        out
    }
}
