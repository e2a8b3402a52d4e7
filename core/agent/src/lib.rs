pub mod error;
pub mod orchestrator;
pub mod plan;
pub mod session;

pub use crate::error::AgentError;
pub use crate::orchestrator::Orchestrator;
pub use crate::plan::{Plan, PlanEntry, PlanReport, PlanSupervisor, StepOutcome};
pub use crate::session::{parse_checkpoint_index, Checkpoint, Exchange, Session};
