//! Error taxonomy for the combat core
//!
//! Gating and transition failures are local and non-fatal: the request is
//! dropped and the caller is told why. Pattern definition failures are fatal
//! at load time. Invariant violations signal a broken ordering guarantee and
//! must never be silently corrected.

use crate::combat::skill::SkillKind;
use crate::combat::state::SkillState;
use crate::core::types::CombatantId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CombatError {
    #[error("invalid transition: cannot start {requested:?} from {current:?}")]
    InvalidTransition {
        current: SkillState,
        requested: SkillKind,
    },

    #[error("insufficient stamina: need {required}, have {available}")]
    InsufficientResource { required: f32, available: f32 },

    #[error("invalid pattern definition: {0}")]
    InvalidPatternDefinition(String),

    #[error("target lost for combatant {0:?}")]
    TargetLost(CombatantId),

    #[error("state invariant violation: {0}")]
    StateInvariantViolation(String),

    #[error("combatant not found: {0:?}")]
    CombatantNotFound(CombatantId),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("pattern asset parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, CombatError>;
