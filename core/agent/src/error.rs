use providers::provider_trait::ProviderError;

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Invalid checkpoint number.")]
    InvalidCheckpoint,
    #[error("Agent returned invalid plan.")]
    InvalidPlan { reason: String },
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl AgentError {
    pub(crate) fn invalid_plan(reason: impl Into<String>) -> Self {
        Self::InvalidPlan { reason: reason.into() }
    }
}
