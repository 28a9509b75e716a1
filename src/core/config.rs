//! Encounter configuration with documented tunables
//!
//! All pacing values are collected here with explanations of their purpose
//! and how they interact with each other. Fixed rule constants (thresholds,
//! scaling factors, policy switches) live in `combat::constants`.

/// Configuration for one encounter
///
/// These values have been tuned to produce readable combat pacing.
/// Changing them affects feel, not correctness: every rule in the core is
/// expressed against seconds and meter units, never against tick counts.
#[derive(Debug, Clone)]
pub struct CombatConfig {
    // === TIME ===
    /// Simulated seconds advanced per tick
    ///
    /// The resolution window is exactly one tick wide: skill activations
    /// registered during a tick are settled at the end of that same tick.
    pub tick_seconds: f32,

    // === STAMINA ===
    /// Stamina drained per second while a defensive skill holds its
    /// Waiting exposure window
    ///
    /// At the default (8.0), a combatant with full stamina (100) can hold a
    /// block for about twelve seconds before forced Recovery.
    pub waiting_drain_per_second: f32,

    /// Stamina recovered per second while resting (Uncharged and idle)
    ///
    /// There is no passive regeneration while a skill is anywhere in its
    /// lifecycle. This is deliberate: committing to offense spends a real,
    /// slowly recovered currency.
    pub rest_regen_per_second: f32,

    // === CROWD CONTROL ===
    /// CC meter decay per second while below a triggered threshold
    pub cc_decay_per_second: f32,

    /// Forced-disable duration when the CC meter crosses its knockback
    /// threshold
    pub knockback_disable_seconds: f32,

    /// Forced-disable duration when the CC meter crosses its knockdown
    /// threshold (the meter resets to zero at the same moment)
    pub knockdown_disable_seconds: f32,

    /// Extra Recovery lockout applied to an attacker stunned by a held block
    pub stun_recovery_seconds: f32,

    // === DECISION ENGINE ===
    /// Default telegraph lead when a pattern node does not override it
    ///
    /// The cue event is emitted this many seconds before the node's skill
    /// request is issued, so the warning is observable strictly before
    /// commitment.
    pub telegraph_lead_seconds: f32,

    // === COORDINATION ===
    /// Concurrent attack-permission slots per defended target
    ///
    /// Caps how many pattern-driven combatants may press one defender at
    /// once. Others hold formation until a slot frees up or expires.
    pub attack_slot_capacity: usize,

    /// Seconds an attack slot may be held before automatic expiry
    pub attack_slot_expiry_seconds: f32,

    /// Ring positions maintained around one defended target
    pub formation_slot_count: usize,

    /// Seconds a combatant keeps its formation slot assignment before it
    /// may be reassigned (anti-thrashing)
    pub formation_reassign_cooldown_seconds: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            tick_seconds: 0.1,
            waiting_drain_per_second: 8.0,
            rest_regen_per_second: 12.0,
            cc_decay_per_second: 5.0,
            knockback_disable_seconds: 0.6,
            knockdown_disable_seconds: 2.5,
            stun_recovery_seconds: 1.5,
            telegraph_lead_seconds: 0.8,
            attack_slot_capacity: 2,
            attack_slot_expiry_seconds: 4.0,
            formation_slot_count: 6,
            formation_reassign_cooldown_seconds: 3.0,
        }
    }
}
