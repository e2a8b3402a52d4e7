use actions::{ActionBackend, ActionDenied};
use protocol::{ActionKind, AgentStep};
use serde_json::Value;

use crate::error::AgentError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlanEntry {
    Step(AgentStep),
    /// Kept in position so it can be reported when execution reaches it.
    Invalid(Value),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Plan {
    entries: Vec<PlanEntry>,
}

impl Plan {
    pub fn single(step: AgentStep) -> Self {
        Self {
            entries: vec![PlanEntry::Step(step)],
        }
    }

    /// Recognizes `pwd`, `list_dir` and `read_file <path>` typed directly,
    /// which skip the model entirely.
    pub fn shorthand(input: &str) -> Option<Self> {
        ActionKind::ALL.into_iter().find_map(|kind| {
            if kind.takes_argument() {
                let path = input.strip_prefix(kind.as_str())?.strip_prefix(' ')?;
                Some(Self::single(AgentStep::new(kind, Some(path.to_string()))))
            } else {
                (input == kind.as_str()).then(|| Self::single(AgentStep::new(kind, None)))
            }
        })
    }

    /// Parses a model reply. The reply must be a JSON array; elements that
    /// are not well-formed steps become [`PlanEntry::Invalid`].
    pub fn parse(reply: &str) -> Result<Self, AgentError> {
        let value: Value = serde_json::from_str(strip_code_fence(reply))
            .map_err(|err| AgentError::invalid_plan(err.to_string()))?;
        let Value::Array(items) = value else {
            return Err(AgentError::invalid_plan("expected a JSON array of steps"));
        };

        let entries = items
            .into_iter()
            .map(|item| {
                if !item.is_object() {
                    return PlanEntry::Invalid(item);
                }
                match serde_json::from_value::<AgentStep>(item.clone()) {
                    Ok(step) => PlanEntry::Step(step),
                    Err(_) => PlanEntry::Invalid(item),
                }
            })
            .collect();
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Runs entries in order. Every step needs the supervisor's approval;
    /// a declined or malformed step never stops the ones after it.
    pub fn execute<A, S>(&self, backend: &A, supervisor: &mut S) -> PlanReport
    where
        A: ActionBackend + ?Sized,
        S: PlanSupervisor + ?Sized,
    {
        let mut outcomes = Vec::with_capacity(self.entries.len());
        for (index, entry) in self.entries.iter().enumerate() {
            let outcome = match entry {
                PlanEntry::Invalid(raw) => {
                    tracing::debug!(index, step = %raw, "skipping malformed plan step");
                    StepOutcome::Invalid
                }
                PlanEntry::Step(step) => {
                    if supervisor.approve(step) {
                        StepOutcome::Executed {
                            step: step.clone(),
                            result: backend.execute(step),
                        }
                    } else {
                        StepOutcome::Skipped(step.clone())
                    }
                }
            };
            supervisor.report(&outcome);
            outcomes.push(outcome);
        }
        PlanReport { outcomes }
    }
}

fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(body) = trimmed.strip_prefix("```").and_then(|b| b.strip_suffix("```")) else {
        return trimmed;
    };
    // drop the info string, e.g. ```json
    match body.split_once('\n') {
        Some((_, rest)) => rest.trim(),
        None => body.trim(),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Invalid,
    Skipped(AgentStep),
    Executed {
        step: AgentStep,
        result: Result<String, ActionDenied>,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlanReport {
    pub outcomes: Vec<StepOutcome>,
}

impl PlanReport {
    pub fn executed(&self) -> impl Iterator<Item = &AgentStep> {
        self.outcomes.iter().filter_map(|o| match o {
            StepOutcome::Executed { step, .. } => Some(step),
            _ => None,
        })
    }
}

/// The human in the loop: approves each proposed step and sees each outcome
/// as soon as it happens.
pub trait PlanSupervisor {
    /// Shows the proposed step and returns whether to run it.
    fn approve(&mut self, step: &AgentStep) -> bool;

    fn report(&mut self, outcome: &StepOutcome);
}
