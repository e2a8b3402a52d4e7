use protocol::{ChatMessage, ProviderConfig};

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{var} not set")]
    MissingCredential { var: &'static str },
    #[error("unknown provider '{0}' (expected 'groq' or 'stub')")]
    UnknownProvider(String),
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },
    #[error("provider returned invalid JSON: {0}")]
    InvalidResponse(String),
    #[error("provider returned no text content")]
    EmptyReply,
}

/// A blocking chat-completion gateway: ordered messages in, one reply out.
pub trait Provider {
    fn name(&self) -> &'static str;

    fn chat(&self, messages: &[ChatMessage], config: &ProviderConfig) -> Result<String, ProviderError>;
}

impl<P: Provider + ?Sized> Provider for &P {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn chat(&self, messages: &[ChatMessage], config: &ProviderConfig) -> Result<String, ProviderError> {
        (**self).chat(messages, config)
    }
}
