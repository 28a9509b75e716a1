//! Resolved interaction outcomes
//!
//! Computed from the pre-resolution snapshot, applied once, then handed to
//! the event log for external consumption. Never retained by the core.

use crate::combat::skill::SkillKind;
use crate::core::types::CombatantId;
use crate::resolve::matrix::OutcomeTemplate;

/// Result of resolving one offensive execution against its target
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionOutcome {
    pub attacker: CombatantId,
    pub defender: CombatantId,
    pub offense: SkillKind,
    /// Defensive kind whose Waiting window this hit was judged against
    pub defense: Option<SkillKind>,
    pub template: OutcomeTemplate,
    pub damage_to_defender: f32,
    /// Reflected or raced damage landing on the attacker
    pub damage_to_attacker: f32,
    /// Punishment fed into the defender's CC meter
    pub cc_to_defender: f32,
}

impl InteractionOutcome {
    /// Zero-effect scaffold; the resolver fills in the deltas.
    pub fn new(
        attacker: CombatantId,
        defender: CombatantId,
        offense: SkillKind,
        defense: Option<SkillKind>,
        template: OutcomeTemplate,
    ) -> Self {
        Self {
            attacker,
            defender,
            offense,
            defense,
            template,
            damage_to_defender: 0.0,
            damage_to_attacker: 0.0,
            cc_to_defender: 0.0,
        }
    }
}
