pub mod execution;
pub mod matrix;
pub mod outcome;
pub mod resolver;

pub use execution::{PendingExecutions, SkillExecution};
pub use matrix::{classify, OutcomeTemplate};
pub use outcome::InteractionOutcome;
pub use resolver::resolve_pending;
