//! Pattern graph definition data
//!
//! Immutable, shared, loaded once at encounter setup. Many combatants
//! reference one graph; per-combatant runtime state lives in
//! `pattern::cursor` and holds only indices into this arena.

use crate::combat::skill::SkillKind;
use crate::core::error::CombatError;
use crate::pattern::condition::Condition;
use serde::{Deserialize, Serialize};

pub type NodeIndex = usize;

/// One edge out of a node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternTransition {
    pub target: NodeIndex,
    /// Checked in descending order; first fully satisfied guard set wins
    pub priority: i32,
    pub guards: Vec<Condition>,
    /// Take resets the cursor's hit counters ("punish after N hits")
    #[serde(default)]
    pub reset_hit_counters: bool,
}

/// One node: the skill to attempt while here, plus the edges away
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternNode {
    pub name: String,
    pub skill: SkillKind,
    /// All must hold before the node's skill request is issued
    pub guards: Vec<Condition>,
    pub transitions: Vec<PatternTransition>,
    /// Time-based default: taken when nothing else fired within the window
    pub default_after_seconds: f32,
    pub default_target: NodeIndex,
    /// Presentation cue identifier emitted ahead of commitment
    pub telegraph_cue: String,
    /// Overrides the config-wide telegraph lead when set
    pub telegraph_lead_seconds: Option<f32>,
}

/// Validated, immutable pattern definition
#[derive(Debug, Clone)]
pub struct PatternGraph {
    nodes: Vec<PatternNode>,
    entry: NodeIndex,
}

impl PatternGraph {
    /// Validate and seal a graph. Fails fast on structural defects so a
    /// broken asset can never start an encounter.
    pub fn new(mut nodes: Vec<PatternNode>, entry: NodeIndex) -> Result<Self, CombatError> {
        if nodes.is_empty() {
            return Err(CombatError::InvalidPatternDefinition(
                "pattern has zero nodes".into(),
            ));
        }
        if entry >= nodes.len() {
            return Err(CombatError::InvalidPatternDefinition(format!(
                "entry node {} out of range ({} nodes)",
                entry,
                nodes.len()
            )));
        }
        for (i, node) in nodes.iter().enumerate() {
            if node.default_target >= nodes.len() {
                return Err(CombatError::InvalidPatternDefinition(format!(
                    "node '{}' default target {} out of range",
                    node.name, node.default_target
                )));
            }
            for t in &node.transitions {
                if t.target >= nodes.len() {
                    return Err(CombatError::InvalidPatternDefinition(format!(
                        "node '{}' transition target {} out of range",
                        node.name, t.target
                    )));
                }
                if t.target == i && t.guards.is_empty() {
                    return Err(CombatError::InvalidPatternDefinition(format!(
                        "node '{}' has an unguarded self-transition",
                        node.name
                    )));
                }
            }
        }

        // Reachability from the entry node; orphans are authoring errors.
        let mut reachable = vec![false; nodes.len()];
        let mut stack = vec![entry];
        while let Some(i) = stack.pop() {
            if reachable[i] {
                continue;
            }
            reachable[i] = true;
            stack.push(nodes[i].default_target);
            stack.extend(nodes[i].transitions.iter().map(|t| t.target));
        }
        if let Some(orphan) = reachable.iter().position(|r| !r) {
            return Err(CombatError::InvalidPatternDefinition(format!(
                "node '{}' is unreachable from the entry node",
                nodes[orphan].name
            )));
        }

        // Fix the evaluation order once so the engine never re-sorts.
        for node in &mut nodes {
            node.transitions.sort_by(|a, b| b.priority.cmp(&a.priority));
        }

        Ok(Self { nodes, entry })
    }

    pub fn entry(&self) -> NodeIndex {
        self.entry
    }

    pub fn node(&self, index: NodeIndex) -> &PatternNode {
        &self.nodes[index]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
