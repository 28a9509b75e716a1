//! Load pattern graphs from TOML files
//!
//! Assets name nodes by string; the loader resolves names to indices and
//! hands the result to `PatternGraph::new`, so every structural check in
//! the graph constructor also applies to loaded assets.

use crate::combat::skill::SkillKind;
use crate::core::error::{CombatError, Result};
use crate::pattern::condition::Condition;
use crate::pattern::graph::{PatternGraph, PatternNode, PatternTransition};
use ahash::AHashMap;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct PatternFile {
    entry: String,
    #[serde(rename = "node")]
    nodes: Vec<NodeDef>,
}

#[derive(Debug, Deserialize)]
struct NodeDef {
    name: String,
    skill: SkillKind,
    #[serde(default)]
    guards: Vec<Condition>,
    #[serde(default, rename = "transition")]
    transitions: Vec<TransitionDef>,
    default_after_seconds: f32,
    default_target: String,
    telegraph_cue: String,
    telegraph_lead_seconds: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct TransitionDef {
    target: String,
    #[serde(default)]
    priority: i32,
    #[serde(default)]
    guards: Vec<Condition>,
    #[serde(default)]
    reset_hit_counters: bool,
}

/// Parse a pattern graph from TOML text.
pub fn parse_pattern(content: &str) -> Result<PatternGraph> {
    let file: PatternFile = toml::from_str(content)?;

    let mut index: AHashMap<&str, usize> = AHashMap::new();
    for (i, node) in file.nodes.iter().enumerate() {
        if index.insert(node.name.as_str(), i).is_some() {
            return Err(CombatError::InvalidPatternDefinition(format!(
                "duplicate node name '{}'",
                node.name
            )));
        }
    }
    let resolve = |name: &str| -> Result<usize> {
        index.get(name).copied().ok_or_else(|| {
            CombatError::InvalidPatternDefinition(format!("unknown node name '{name}'"))
        })
    };

    let entry = resolve(&file.entry)?;
    let mut nodes = Vec::with_capacity(file.nodes.len());
    for def in &file.nodes {
        let transitions = def
            .transitions
            .iter()
            .map(|t| {
                Ok(PatternTransition {
                    target: resolve(&t.target)?,
                    priority: t.priority,
                    guards: t.guards.clone(),
                    reset_hit_counters: t.reset_hit_counters,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        nodes.push(PatternNode {
            name: def.name.clone(),
            skill: def.skill,
            guards: def.guards.clone(),
            transitions,
            default_after_seconds: def.default_after_seconds,
            default_target: resolve(&def.default_target)?,
            telegraph_cue: def.telegraph_cue.clone(),
            telegraph_lead_seconds: def.telegraph_lead_seconds,
        });
    }

    PatternGraph::new(nodes, entry)
}

/// Load a pattern graph from a TOML file on disk.
pub fn load_pattern(path: &Path) -> Result<PatternGraph> {
    let content = fs::read_to_string(path)?;
    parse_pattern(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BRUISER_PATTERN: &str = r#"
        entry = "probe"

        [[node]]
        name = "probe"
        skill = "light"
        default_after_seconds = 3.0
        default_target = "probe"
        telegraph_cue = "cue_probe"
        guards = [{ kind = "opponent_within", distance = 2.0 }]

        [[node.transition]]
        target = "punish"
        priority = 10
        guards = [{ kind = "hits_taken_at_least", count = 3 }]
        reset_hit_counters = true

        [[node]]
        name = "punish"
        skill = "heavy"
        default_after_seconds = 2.0
        default_target = "probe"
        telegraph_cue = "cue_punish"
        telegraph_lead_seconds = 1.2
    "#;

    #[test]
    fn test_parse_bruiser_pattern() {
        let graph = parse_pattern(BRUISER_PATTERN).unwrap();
        assert_eq!(graph.len(), 2);
        let probe = graph.node(graph.entry());
        assert_eq!(probe.name, "probe");
        assert_eq!(probe.skill, SkillKind::Light);
        assert_eq!(probe.transitions.len(), 1);
        assert!(probe.transitions[0].reset_hit_counters);
        assert_eq!(graph.node(1).telegraph_lead_seconds, Some(1.2));
    }

    #[test]
    fn test_unknown_target_name_rejected() {
        let bad = r#"
            entry = "probe"

            [[node]]
            name = "probe"
            skill = "light"
            default_after_seconds = 3.0
            default_target = "missing"
            telegraph_cue = "cue_probe"
        "#;
        let err = parse_pattern(bad).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_duplicate_node_name_rejected() {
        let bad = r#"
            entry = "probe"

            [[node]]
            name = "probe"
            skill = "light"
            default_after_seconds = 3.0
            default_target = "probe"
            telegraph_cue = "a"

            [[node]]
            name = "probe"
            skill = "heavy"
            default_after_seconds = 3.0
            default_target = "probe"
            telegraph_cue = "b"
        "#;
        assert!(parse_pattern(bad).is_err());
    }

    #[test]
    fn test_unguarded_self_default_allowed() {
        // A node may idle on itself via the time default; only unguarded
        // explicit self-transitions are rejected.
        let graph = parse_pattern(BRUISER_PATTERN).unwrap();
        assert_eq!(graph.node(0).default_target, 0);
    }
}
