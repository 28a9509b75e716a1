//! Skill lifecycle states
//!
//! Exactly one state is active per combatant at all times. Transitions are
//! atomic and always run through the state machine; nothing else may swap
//! the current state.

use serde::{Deserialize, Serialize};

/// Lifecycle state of the skill a combatant is performing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillState {
    /// Idle; the only state that accepts a new skill request
    Uncharged,
    /// Time-gated windup; cancelable with refund
    Charging,
    /// Continuous accuracy ramp for aimed skills; cancelable with refund
    Aiming,
    /// Fully wound, awaiting the activation trigger
    Charged,
    /// Committed, non-cancelable lead-in to Active
    Startup,
    /// The hit is registered with the resolver during this state
    Active,
    /// Defensive exposure window; intercepts exactly one incoming hit
    Waiting,
    /// Post-action lockout (also where stun and knockdown park a combatant)
    Recovery,
}

impl SkillState {
    /// Only an idle combatant accepts a new skill request
    pub fn accepts_request(&self) -> bool {
        matches!(self, SkillState::Uncharged)
    }

    /// Pre-commit states: cancel is allowed and the reserved cost returns
    pub fn is_cancelable(&self) -> bool {
        matches!(
            self,
            SkillState::Charging | SkillState::Aiming | SkillState::Charged
        )
    }

    /// Startup onward the skill is committed; only a forced transition
    /// (CC, resolution outcome) interrupts it
    pub fn is_committed(&self) -> bool {
        matches!(
            self,
            SkillState::Startup | SkillState::Active | SkillState::Waiting
        )
    }

    /// A windup an opponent can read (telegraph-visible states)
    pub fn is_winding_up(&self) -> bool {
        matches!(
            self,
            SkillState::Charging | SkillState::Aiming | SkillState::Charged
        )
    }
}
