use actions::traits::ActionBackend;
use protocol::{ChatMessage, ProviderConfig, PLAN_INSTRUCTION};
use providers::provider_trait::Provider;

use crate::error::AgentError;
use crate::plan::{Plan, PlanReport, PlanSupervisor};
use crate::session::{Exchange, Session};

/// Routes chat turns and agent requests to the provider and action backend.
/// Holds no conversation state of its own.
pub struct Orchestrator<P, A>
where
    P: Provider,
    A: ActionBackend,
{
    provider: P,
    action_backend: A,
    provider_config: ProviderConfig,
}

impl<P, A> Orchestrator<P, A>
where
    P: Provider,
    A: ActionBackend,
{
    pub fn new(provider: P, action_backend: A, provider_config: ProviderConfig) -> Self {
        Self {
            provider,
            action_backend,
            provider_config,
        }
    }

    pub fn provider_config(&self) -> &ProviderConfig {
        &self.provider_config
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn chat_turn(&self, session: &mut Session, input: &str) -> Result<Exchange, AgentError> {
        let result = session.exchange(input, |messages| self.provider.chat(messages, &self.provider_config));
        match &result {
            Ok(exchange) => tracing::debug!(checkpoint = exchange.checkpoint, "chat turn complete"),
            Err(err) => tracing::warn!(error = %err, "chat turn failed; session unchanged"),
        }
        result
    }

    /// Shorthand input becomes a one-step plan directly; anything else is
    /// sent to the model together with the plan instruction.
    pub fn propose_plan(&self, request: &str) -> Result<Plan, AgentError> {
        if let Some(plan) = Plan::shorthand(request) {
            return Ok(plan);
        }

        let messages = [ChatMessage::system(PLAN_INSTRUCTION), ChatMessage::user(request)];
        let reply = self
            .provider
            .chat(&messages, &self.provider_config)
            .inspect_err(|err| tracing::warn!(error = %err, "plan request failed"))?;
        Plan::parse(&reply).inspect_err(|err| {
            if let AgentError::InvalidPlan { reason } = err {
                tracing::debug!(%reason, "rejected plan reply");
            }
        })
    }

    pub fn execute_plan<S>(&self, plan: &Plan, supervisor: &mut S) -> PlanReport
    where
        S: PlanSupervisor + ?Sized,
    {
        plan.execute(&self.action_backend, supervisor)
    }

    /// Plans and runs one agent request. Never touches the chat transcript.
    pub fn handle_agent_request<S>(&self, request: &str, supervisor: &mut S) -> Result<PlanReport, AgentError>
    where
        S: PlanSupervisor + ?Sized,
    {
        let plan = self.propose_plan(request)?;
        tracing::debug!(steps = plan.len(), "executing plan");
        Ok(self.execute_plan(&plan, supervisor))
    }
}
