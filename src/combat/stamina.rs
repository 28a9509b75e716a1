//! Stamina meter
//!
//! Stamina only moves three ways: a skill's cost is reserved at request and
//! either committed or refunded, a Waiting window drains continuously, and
//! an idle combatant regains it while resting. There is no passive regen
//! while a skill is anywhere in its lifecycle.

use crate::combat::constants::STAMINA_MAX;
use crate::core::error::CombatError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaminaMeter {
    current: f32,
    max: f32,
    /// Cost taken at request time, returnable until Startup commits it
    reserved: f32,
}

impl Default for StaminaMeter {
    fn default() -> Self {
        Self::new(STAMINA_MAX)
    }
}

impl StaminaMeter {
    pub fn new(max: f32) -> Self {
        Self {
            current: max,
            max,
            reserved: 0.0,
        }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn is_depleted(&self) -> bool {
        self.current <= 0.0
    }

    /// Take a skill's cost up front. Fails without mutating when the meter
    /// cannot cover it.
    pub fn reserve(&mut self, cost: f32) -> Result<(), CombatError> {
        if self.current < cost {
            return Err(CombatError::InsufficientResource {
                required: cost,
                available: self.current,
            });
        }
        self.current -= cost;
        self.reserved += cost;
        Ok(())
    }

    /// The reserved cost is spent for good (Startup reached).
    pub fn commit(&mut self) {
        self.reserved = 0.0;
    }

    /// Return the reserved cost (cancel during Charging/Aiming).
    pub fn refund(&mut self) {
        self.current = (self.current + self.reserved).min(self.max);
        self.reserved = 0.0;
    }

    /// Continuous drain while holding a Waiting window (clamped at zero)
    pub fn drain(&mut self, amount: f32) {
        self.current = (self.current - amount).max(0.0);
    }

    /// Recovery while resting (clamped at max)
    pub fn regen(&mut self, amount: f32) {
        self.current = (self.current + amount).min(self.max);
    }
}
