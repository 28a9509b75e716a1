//! Combat rule constants - all fixed values in one place
//!
//! These are rules, not pacing: changing them changes what the combat
//! system *means*. Pacing tunables live in `core::config::CombatConfig`.

// Meters
pub const STAMINA_MAX: f32 = 100.0;
pub const CC_METER_MAX: f32 = 100.0;

// CC thresholds - edge-triggered, see combat::crowd_control
pub const CC_KNOCKBACK_THRESHOLD: f32 = 50.0;
pub const CC_KNOCKDOWN_THRESHOLD: f32 = 100.0;

// CC gain per received hit
pub const CC_GAIN_UNGUARDED: f32 = 25.0;
pub const CC_GAIN_PARTIAL_GUARD: f32 = 12.0;

// Interaction matrix scaling
/// Damage fraction that leaks through a block broken by a heavy attack
pub const BLOCK_BREAK_DAMAGE_FACTOR: f32 = 0.5;
/// Damage fraction returned to the attacker by a successful reflect
pub const REFLECT_RETURN_FACTOR: f32 = 1.0;

// Speed tie-break modifiers, added to the implement's base speed.
// Deterministic per kind: never rolled per tick.
pub const SPEED_MOD_LIGHT: f32 = 2.0;
pub const SPEED_MOD_HEAVY: f32 = -1.5;
pub const SPEED_MOD_RANGED: f32 = 0.5;
pub const SPEED_MOD_GAP_CLOSER: f32 = 1.0;

/// Stamina reserved at request time is returned in full when a skill is
/// canceled during Charging or Aiming. Once Startup begins the cost is
/// committed and never refunded.
///
/// This is a policy choice, fixed here so behavior never depends on which
/// code path performed the cancel.
pub const REFUND_CANCELED_CHARGE: bool = true;

// Aiming accuracy ramp (fraction per second, clamped at 1.0)
pub const AIM_ACCURACY_PER_SECOND: f32 = 0.4;
/// Minimum accuracy before a ranged skill may activate
pub const AIM_MIN_ACCURACY: f32 = 0.2;
/// Accuracy at which the decision engine stops holding an aimed shot
pub const AIM_RELEASE_ACCURACY: f32 = 0.9;
