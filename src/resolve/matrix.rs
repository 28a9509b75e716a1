//! Offense-versus-defense interaction matrix
//!
//! A fixed, total lookup over (offensive kind, defensive kind). Heavy is the
//! hard-breaking offense: it punches through both defensive skills. Ranged
//! projectiles are absorbed or returned without exposing the shooter to a
//! melee stun.

use crate::combat::skill::{SkillClass, SkillKind};
use serde::{Deserialize, Serialize};

/// How one offensive hit interacts with the defense (or absence of one)
/// it faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeTemplate {
    /// No live defensive window: full damage, full CC gain
    Unguarded,
    /// Defense absorbs the hit; zero damage; one-shot consumed.
    /// `stun_attacker` holds for melee offenses caught on the guard.
    BlockHolds { stun_attacker: bool },
    /// Hard-breaking offense: damage leaks through scaled, defender is
    /// knocked down regardless of remaining stamina
    BlockBroken,
    /// Hit returned to the attacker, who is knocked down
    Reflected,
    /// Resolver-produced: this execution lost a simultaneous-offense speed
    /// race and never landed
    Interrupted,
}

/// Classify one offensive execution against the defense it faces.
///
/// `defense` is the defensive kind holding a live, unconsumed Waiting
/// window, or `None` for an unguarded target. Total over all valid inputs.
pub fn classify(offense: SkillKind, defense: Option<SkillKind>) -> OutcomeTemplate {
    debug_assert_eq!(offense.class(), SkillClass::Offensive);

    let Some(defense) = defense else {
        return OutcomeTemplate::Unguarded;
    };

    match (offense, defense) {
        // Heavy breaks every defensive skill
        (SkillKind::Heavy, SkillKind::Block) | (SkillKind::Heavy, SkillKind::Reflect) => {
            OutcomeTemplate::BlockBroken
        }

        // Block absorbs everything else; melee attackers bounce off stunned
        (SkillKind::Light, SkillKind::Block) | (SkillKind::GapCloser, SkillKind::Block) => {
            OutcomeTemplate::BlockHolds {
                stun_attacker: true,
            }
        }
        (SkillKind::Ranged, SkillKind::Block) => OutcomeTemplate::BlockHolds {
            stun_attacker: false,
        },

        // Reflect returns everything it can catch
        (SkillKind::Light, SkillKind::Reflect)
        | (SkillKind::Ranged, SkillKind::Reflect)
        | (SkillKind::GapCloser, SkillKind::Reflect) => OutcomeTemplate::Reflected,

        // Defensive kinds never appear as offense; non-defensive kinds never
        // hold a Waiting window
        _ => OutcomeTemplate::Unguarded,
    }
}
