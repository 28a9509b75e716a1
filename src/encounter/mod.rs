//! Encounter orchestration: the tick loop and its event stream

pub mod arena;
pub mod events;

pub use arena::{check_encounter_end, Arena};
pub use events::{CombatEvent, CombatEventLog, CombatEventType, EncounterOutcome};
