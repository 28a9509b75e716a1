//! Skill kinds and the read-only equipment boundary
//!
//! `SkillProfile` and `Loadout` are the core's view of external equipment
//! data: timings, costs, ranges and the deterministic speed value used for
//! simultaneous-offense tie-breaks. The core never mutates them.

use crate::combat::constants::{
    SPEED_MOD_GAP_CLOSER, SPEED_MOD_HEAVY, SPEED_MOD_LIGHT, SPEED_MOD_RANGED,
};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Action archetype a combatant can perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillKind {
    /// Fast strike; charged windup
    Light,
    /// Slow strike; breaks blocks
    Heavy,
    /// One-shot defensive interception
    Block,
    /// One-shot defensive counter, returns damage
    Reflect,
    /// Aimed projectile; accuracy ramps while aiming
    Ranged,
    /// Instantaneous closer; no windup
    GapCloser,
}

/// Offensive skills register hits; defensive skills hold a Waiting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillClass {
    Offensive,
    Defensive,
}

impl SkillKind {
    pub fn class(&self) -> SkillClass {
        match self {
            SkillKind::Light | SkillKind::Heavy | SkillKind::Ranged | SkillKind::GapCloser => {
                SkillClass::Offensive
            }
            SkillKind::Block | SkillKind::Reflect => SkillClass::Defensive,
        }
    }

    /// Kind-specific speed modifier for the tie-break, added to the
    /// implement's base speed
    pub fn speed_modifier(&self) -> f32 {
        match self {
            SkillKind::Light => SPEED_MOD_LIGHT,
            SkillKind::Heavy => SPEED_MOD_HEAVY,
            SkillKind::Ranged => SPEED_MOD_RANGED,
            SkillKind::GapCloser => SPEED_MOD_GAP_CLOSER,
            // Defensive skills never enter the speed race
            SkillKind::Block | SkillKind::Reflect => 0.0,
        }
    }

    /// Instantaneous skills skip Charging/Charged and commit directly
    pub fn is_instant(&self) -> bool {
        matches!(self, SkillKind::GapCloser | SkillKind::Block | SkillKind::Reflect)
    }

    /// Aimed skills replace the binary charge with a continuous accuracy ramp
    pub fn is_aimed(&self) -> bool {
        matches!(self, SkillKind::Ranged)
    }

    pub const ALL: [SkillKind; 6] = [
        SkillKind::Light,
        SkillKind::Heavy,
        SkillKind::Block,
        SkillKind::Reflect,
        SkillKind::Ranged,
        SkillKind::GapCloser,
    ];
}

/// Per-skill timings and costs, sourced from external equipment data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillProfile {
    /// Stamina reserved at request time
    pub stamina_cost: f32,
    /// Unscaled damage of a clean hit
    pub base_damage: f32,
    /// Maximum distance at which the skill may be requested
    pub range: f32,
    /// Windup before the skill is fully charged (unused for instant/aimed)
    pub charge_seconds: f32,
    /// Committed, non-cancelable lead-in to Active
    pub startup_seconds: f32,
    /// Ticks worth of time the hit stays registered
    pub active_seconds: f32,
    /// Post-action lockout
    pub recovery_seconds: f32,
    /// Exposure window cap for defensive skills
    pub waiting_seconds: f32,
}

impl SkillProfile {
    pub fn light() -> Self {
        Self {
            stamina_cost: 10.0,
            base_damage: 8.0,
            range: 1.5,
            charge_seconds: 0.4,
            startup_seconds: 0.1,
            active_seconds: 0.1,
            recovery_seconds: 0.5,
            waiting_seconds: 0.0,
        }
    }

    pub fn heavy() -> Self {
        Self {
            stamina_cost: 25.0,
            base_damage: 22.0,
            range: 1.8,
            charge_seconds: 1.2,
            startup_seconds: 0.3,
            active_seconds: 0.1,
            recovery_seconds: 1.1,
            waiting_seconds: 0.0,
        }
    }

    pub fn block() -> Self {
        Self {
            stamina_cost: 5.0,
            base_damage: 0.0,
            range: 0.0,
            charge_seconds: 0.0,
            startup_seconds: 0.1,
            active_seconds: 0.1,
            recovery_seconds: 0.4,
            waiting_seconds: 2.0,
        }
    }

    pub fn reflect() -> Self {
        Self {
            stamina_cost: 15.0,
            base_damage: 0.0,
            range: 0.0,
            charge_seconds: 0.0,
            startup_seconds: 0.2,
            active_seconds: 0.1,
            recovery_seconds: 0.8,
            waiting_seconds: 0.8,
        }
    }

    pub fn ranged() -> Self {
        Self {
            stamina_cost: 12.0,
            base_damage: 14.0,
            range: 12.0,
            charge_seconds: 0.0,
            startup_seconds: 0.2,
            active_seconds: 0.1,
            recovery_seconds: 0.9,
            waiting_seconds: 0.0,
        }
    }

    pub fn gap_closer() -> Self {
        Self {
            stamina_cost: 18.0,
            base_damage: 6.0,
            range: 6.0,
            charge_seconds: 0.0,
            startup_seconds: 0.2,
            active_seconds: 0.1,
            recovery_seconds: 0.7,
            waiting_seconds: 0.0,
        }
    }

    pub fn for_kind(kind: SkillKind) -> Self {
        match kind {
            SkillKind::Light => Self::light(),
            SkillKind::Heavy => Self::heavy(),
            SkillKind::Block => Self::block(),
            SkillKind::Reflect => Self::reflect(),
            SkillKind::Ranged => Self::ranged(),
            SkillKind::GapCloser => Self::gap_closer(),
        }
    }
}

/// A combatant's equipped skill set - read-only lookup over external data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loadout {
    /// Base speed of the equipped implement (tie-break input)
    pub weapon_speed: f32,
    profiles: AHashMap<SkillKind, SkillProfile>,
}

impl Loadout {
    /// Standard loadout: every kind at its default profile
    pub fn standard(weapon_speed: f32) -> Self {
        let profiles = SkillKind::ALL
            .iter()
            .map(|&kind| (kind, SkillProfile::for_kind(kind)))
            .collect();
        Self {
            weapon_speed,
            profiles,
        }
    }

    /// Loadout restricted to the given kinds
    pub fn with_kinds(weapon_speed: f32, kinds: &[SkillKind]) -> Self {
        let profiles = kinds
            .iter()
            .map(|&kind| (kind, SkillProfile::for_kind(kind)))
            .collect();
        Self {
            weapon_speed,
            profiles,
        }
    }

    pub fn profile(&self, kind: SkillKind) -> Option<&SkillProfile> {
        self.profiles.get(&kind)
    }

    pub fn knows(&self, kind: SkillKind) -> bool {
        self.profiles.contains_key(&kind)
    }

    /// Deterministic tie-break speed for one skill kind
    pub fn speed_for(&self, kind: SkillKind) -> f32 {
        self.weapon_speed + kind.speed_modifier()
    }
}
