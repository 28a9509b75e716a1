//! Decision engine: pattern graphs driving non-player skill selection

pub mod condition;
pub mod cursor;
pub mod engine;
pub mod graph;
pub mod loader;

pub use condition::{Condition, ConditionContext};
pub use cursor::{PatternCursor, TelegraphPhase};
pub use engine::DecisionAction;
pub use graph::{PatternGraph, PatternNode, PatternTransition};
pub use loader::{load_pattern, parse_pattern};
