//! Per-combatant position inside a shared pattern graph

use crate::core::types::Tick;
use crate::pattern::graph::{NodeIndex, PatternGraph};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Telegraph bookkeeping for the current node. The cue fires once, ahead
/// of the skill request, and the request is held until the lead elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelegraphPhase {
    /// Cue not yet emitted for this node visit
    Pending,
    /// Cue emitted at this tick; skill request waits for the lead window
    Announced(Tick),
    /// Skill request already issued for this node visit
    Committed,
}

/// Mutable decision state for one combatant
#[derive(Debug, Clone)]
pub struct PatternCursor {
    pub node: NodeIndex,
    pub entered_at: Tick,
    /// Hits this combatant suffered since entering the node (or last reset)
    pub hits_taken: u32,
    /// Hits this combatant landed since entering the node (or last reset)
    pub hits_dealt: u32,
    pub telegraph: TelegraphPhase,
    /// Private stream so chance guards replay identically per combatant
    pub rng: ChaCha8Rng,
}

impl PatternCursor {
    pub fn new(graph: &PatternGraph, seed: u64, now: Tick) -> Self {
        Self {
            node: graph.entry(),
            entered_at: now,
            hits_taken: 0,
            hits_dealt: 0,
            telegraph: TelegraphPhase::Pending,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Move to a node and rebase the dwell clock. Counters survive unless
    /// the transition asked for a reset.
    pub fn enter(&mut self, node: NodeIndex, now: Tick, reset_hit_counters: bool) {
        self.node = node;
        self.entered_at = now;
        self.telegraph = TelegraphPhase::Pending;
        if reset_hit_counters {
            self.hits_taken = 0;
            self.hits_dealt = 0;
        }
    }

    pub fn seconds_in_node(&self, now: Tick, tick_seconds: f32) -> f32 {
        now.saturating_sub(self.entered_at) as f32 * tick_seconds
    }

    pub fn record_hit_taken(&mut self) {
        self.hits_taken += 1;
    }

    pub fn record_hit_dealt(&mut self) {
        self.hits_dealt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::skill::SkillKind;
    use crate::pattern::graph::PatternNode;

    fn one_node_graph() -> PatternGraph {
        let node = PatternNode {
            name: "opener".into(),
            skill: SkillKind::Light,
            guards: Vec::new(),
            transitions: Vec::new(),
            default_after_seconds: 1.0,
            default_target: 0,
            telegraph_cue: "cue_opener".into(),
            telegraph_lead_seconds: None,
        };
        PatternGraph::new(vec![node], 0).unwrap()
    }

    #[test]
    fn test_enter_resets_dwell_and_telegraph() {
        let graph = one_node_graph();
        let mut cursor = PatternCursor::new(&graph, 7, 0);
        cursor.telegraph = TelegraphPhase::Committed;
        cursor.record_hit_taken();
        cursor.enter(0, 40, false);
        assert_eq!(cursor.entered_at, 40);
        assert_eq!(cursor.telegraph, TelegraphPhase::Pending);
        assert_eq!(cursor.hits_taken, 1);
        cursor.enter(0, 50, true);
        assert_eq!(cursor.hits_taken, 0);
    }

    #[test]
    fn test_seconds_in_node() {
        let graph = one_node_graph();
        let cursor = PatternCursor::new(&graph, 7, 10);
        assert!((cursor.seconds_in_node(25, 0.1) - 1.5).abs() < 1e-6);
        // Clock never goes negative even if ticks are rebased
        assert_eq!(cursor.seconds_in_node(5, 0.1), 0.0);
    }
}
