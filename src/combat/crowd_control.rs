//! Crowd-control meter
//!
//! Accumulated punishment on a scalar [0, 100]. Crossing 50 is a knockback,
//! crossing 100 is a knockdown. Both are edge-triggered: sitting above a
//! threshold does not re-fire it. Knockback re-arms only after decaying back
//! below 50; knockdown resets the meter to zero outright.

use crate::combat::constants::{CC_KNOCKBACK_THRESHOLD, CC_KNOCKDOWN_THRESHOLD, CC_METER_MAX};
use serde::{Deserialize, Serialize};

/// Threshold crossing produced by a CC gain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CcTrigger {
    /// Short forced disable; meter keeps its value
    Knockback,
    /// Long forced disable; meter resets to zero
    Knockdown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CcMeter {
    value: f32,
    /// Knockback fires once per crossing; re-arms below the threshold
    knockback_armed: bool,
}

impl Default for CcMeter {
    fn default() -> Self {
        Self {
            value: 0.0,
            knockback_armed: true,
        }
    }
}

impl CcMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Add punishment and report a threshold crossing, if any.
    ///
    /// Knockdown wins when a single gain crosses both thresholds.
    pub fn add(&mut self, amount: f32) -> Option<CcTrigger> {
        self.value = (self.value + amount).clamp(0.0, CC_METER_MAX);

        if self.value >= CC_KNOCKDOWN_THRESHOLD {
            self.value = 0.0;
            self.knockback_armed = true;
            return Some(CcTrigger::Knockdown);
        }

        if self.knockback_armed && self.value >= CC_KNOCKBACK_THRESHOLD {
            self.knockback_armed = false;
            return Some(CcTrigger::Knockback);
        }

        None
    }

    /// Passive decay. Dropping back below the knockback threshold re-arms
    /// the edge so a later climb can fire it again.
    pub fn decay(&mut self, amount: f32) {
        self.value = (self.value - amount).max(0.0);
        if self.value < CC_KNOCKBACK_THRESHOLD {
            self.knockback_armed = true;
        }
    }
}
