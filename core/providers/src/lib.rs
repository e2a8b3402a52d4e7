pub mod groq_http;
pub mod provider_trait;
pub mod stub;

use std::time::Duration;

use protocol::{ChatMessage, ProviderConfig};

use crate::groq_http::GroqHttpProvider;
use crate::provider_trait::{Provider, ProviderError};
use crate::stub::StubProvider;

/// Connection settings for providers that talk to a remote endpoint.
#[derive(Clone, Debug)]
pub struct HttpSettings {
    pub base_url: String,
    pub timeout: Duration,
}

pub enum ProviderChoice {
    Groq(GroqHttpProvider),
    Stub(StubProvider),
}

impl ProviderChoice {
    /// Builds the named provider. The HTTP provider requires its credential
    /// to be present; a missing one is reported here rather than per request.
    pub fn by_name(name: &str, http: &HttpSettings) -> Result<Self, ProviderError> {
        match name {
            "groq" | "openai" => Ok(Self::Groq(GroqHttpProvider::from_env(&http.base_url, http.timeout)?)),
            "stub" | "offline" => Ok(Self::Stub(StubProvider)),
            other => Err(ProviderError::UnknownProvider(other.to_string())),
        }
    }
}

impl Provider for ProviderChoice {
    fn name(&self) -> &'static str {
        match self {
            Self::Groq(inner) => inner.name(),
            Self::Stub(inner) => inner.name(),
        }
    }

    fn chat(&self, messages: &[ChatMessage], config: &ProviderConfig) -> Result<String, ProviderError> {
        match self {
            Self::Groq(inner) => inner.chat(messages, config),
            Self::Stub(inner) => inner.chat(messages, config),
        }
    }
}
