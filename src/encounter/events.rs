//! Discrete events emitted per tick for presentation layers
//!
//! Telegraph cues, skill lifecycle, resolver outcomes, and status
//! thresholds come out of the encounter loop as log entries. Consumers
//! decide whether and how to display them.

use crate::combat::crowd_control::CcTrigger;
use crate::combat::skill::SkillKind;
use crate::core::types::{CombatantId, Tick};
use crate::resolve::matrix::OutcomeTemplate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatEvent {
    pub tick: Tick,
    pub event_type: CombatEventType,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CombatEventType {
    EncounterStarted,
    /// Advance warning cue, emitted before the skill's wind-up begins
    TelegraphBegun {
        combatant: CombatantId,
        cue: String,
        lead_seconds: f32,
    },
    ChargingBegun {
        combatant: CombatantId,
        skill: SkillKind,
    },
    SkillActivated {
        combatant: CombatantId,
        skill: SkillKind,
    },
    InteractionResolved {
        attacker: CombatantId,
        defender: CombatantId,
        template: OutcomeTemplate,
        damage_to_defender: f32,
        damage_to_attacker: f32,
    },
    ThresholdCrossed {
        combatant: CombatantId,
        trigger: CcTrigger,
    },
    CombatantDowned {
        combatant: CombatantId,
    },
    EncounterEnded {
        outcome: EncounterOutcome,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncounterOutcome {
    PlayerVictory,
    HostileVictory,
    /// Both sides downed within the same resolution pass
    MutualDown,
}

/// Events from a single tick
#[derive(Debug, Clone, Default)]
pub struct CombatEventLog {
    pub events: Vec<CombatEvent>,
}

impl CombatEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event_type: CombatEventType, description: String, tick: Tick) {
        self.events.push(CombatEvent {
            tick,
            event_type,
            description,
        });
    }
}
