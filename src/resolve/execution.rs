//! Pending skill executions
//!
//! A `SkillExecution` is a transient value describing one offensive skill
//! attempt in flight. It is created when a machine enters Active, settled by
//! the resolver within the same tick, and never persisted past resolution.

use crate::combat::skill::SkillKind;
use crate::core::types::{CombatantId, Tick};

/// One offensive skill attempt awaiting resolution
#[derive(Debug, Clone, PartialEq)]
pub struct SkillExecution {
    pub attacker: CombatantId,
    pub target: CombatantId,
    pub kind: SkillKind,
    /// Tick the windup began
    pub charge_started: Tick,
    /// Tick the skill went Active
    pub activation_tick: Tick,
    /// Deterministic tie-break value (implement base + kind modifier)
    pub speed: f32,
    /// Aim ramp at activation; 1.0 for non-aimed skills
    pub accuracy: f32,
}

/// Per-tick registration buffer for executions.
///
/// Cleared after every resolution pass; the backing allocation is kept and
/// reused across ticks.
#[derive(Debug, Default)]
pub struct PendingExecutions {
    executions: Vec<SkillExecution>,
}

impl PendingExecutions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, execution: SkillExecution) {
        self.executions.push(execution);
    }

    pub fn is_empty(&self) -> bool {
        self.executions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.executions.len()
    }

    pub fn as_slice(&self) -> &[SkillExecution] {
        &self.executions
    }

    pub fn as_mut_vec(&mut self) -> &mut Vec<SkillExecution> {
        &mut self.executions
    }

    /// Discard settled executions, keeping capacity for the next tick.
    pub fn clear(&mut self) {
        self.executions.clear();
    }
}
