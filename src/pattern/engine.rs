//! Pattern graph evaluation
//!
//! Read-only over combat state; every decision comes back as a
//! `DecisionAction` for the encounter loop to apply. The engine never
//! touches a state machine or meter directly.

use crate::combat::combatant::Combatant;
use crate::combat::constants::AIM_RELEASE_ACCURACY;
use crate::combat::skill::SkillKind;
use crate::combat::state::SkillState;
use crate::core::config::CombatConfig;
use crate::core::types::Tick;
use crate::pattern::condition::{evaluate_all, ConditionContext};
use crate::pattern::cursor::{PatternCursor, TelegraphPhase};
use crate::pattern::graph::PatternGraph;

/// What the engine wants done this tick, in emission order
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionAction {
    /// Announce the upcoming skill to presentation layers
    EmitTelegraph { cue: String, lead_seconds: f32 },
    /// Begin the named skill on the combatant's state machine
    RequestSkill(SkillKind),
    /// Release a Charged or sufficiently aimed skill
    Activate,
    /// Abandon an in-progress wind-up (node changed underneath it)
    CancelSkill,
}

/// Evaluate one combatant's cursor for this tick.
///
/// Order matters: transitions are checked before the current node's skill
/// so a freshly entered node telegraphs from its own cue, and activation
/// is checked last so a skill charged under the old node still fires if
/// no transition stole the tick.
pub fn evaluate(
    graph: &PatternGraph,
    cursor: &mut PatternCursor,
    own: &Combatant,
    opponent: Option<&Combatant>,
    attack_slot_held: bool,
    config: &CombatConfig,
    now: Tick,
) -> Vec<DecisionAction> {
    let mut actions = Vec::new();

    if take_transition(graph, cursor, own, opponent, attack_slot_held, config, now)
        && own.machine.state().is_cancelable()
    {
        // The wind-up belonged to the old node; drop it so the new node's
        // skill is free to telegraph.
        actions.push(DecisionAction::CancelSkill);
    }

    let node = graph.node(cursor.node);
    match own.machine.state() {
        SkillState::Uncharged if !own.is_disabled() => {
            let ctx = context(cursor, own, opponent, attack_slot_held, config, now);
            if evaluate_all(&node.guards, &ctx, &mut cursor.rng) {
                let lead = node
                    .telegraph_lead_seconds
                    .unwrap_or(config.telegraph_lead_seconds);
                match cursor.telegraph {
                    TelegraphPhase::Pending => {
                        actions.push(DecisionAction::EmitTelegraph {
                            cue: node.telegraph_cue.clone(),
                            lead_seconds: lead,
                        });
                        cursor.telegraph = TelegraphPhase::Announced(now);
                    }
                    TelegraphPhase::Announced(at) => {
                        let waited = now.saturating_sub(at) as f32 * config.tick_seconds;
                        if waited >= lead {
                            actions.push(DecisionAction::RequestSkill(node.skill));
                            cursor.telegraph = TelegraphPhase::Committed;
                        }
                    }
                    TelegraphPhase::Committed => {}
                }
            }
        }
        SkillState::Charged => actions.push(DecisionAction::Activate),
        SkillState::Aiming if own.machine.accuracy() >= AIM_RELEASE_ACCURACY => {
            actions.push(DecisionAction::Activate);
        }
        _ => {}
    }

    actions
}

/// Walk the node's transitions in priority order and move the cursor on
/// the first satisfied guard set, falling back to the time default.
/// Returns true when the cursor moved.
fn take_transition(
    graph: &PatternGraph,
    cursor: &mut PatternCursor,
    own: &Combatant,
    opponent: Option<&Combatant>,
    attack_slot_held: bool,
    config: &CombatConfig,
    now: Tick,
) -> bool {
    let node = graph.node(cursor.node);
    let ctx = context(cursor, own, opponent, attack_slot_held, config, now);
    for t in &node.transitions {
        if evaluate_all(&t.guards, &ctx, &mut cursor.rng) {
            tracing::debug!(
                combatant = ?own.id,
                from = %node.name,
                to = %graph.node(t.target).name,
                "pattern transition"
            );
            cursor.enter(t.target, now, t.reset_hit_counters);
            return true;
        }
    }
    if ctx.seconds_in_node >= node.default_after_seconds {
        tracing::debug!(
            combatant = ?own.id,
            from = %node.name,
            to = %graph.node(node.default_target).name,
            "pattern default transition"
        );
        cursor.enter(node.default_target, now, false);
        return true;
    }
    false
}

fn context<'a>(
    cursor: &PatternCursor,
    own: &'a Combatant,
    opponent: Option<&'a Combatant>,
    attack_slot_held: bool,
    config: &CombatConfig,
    now: Tick,
) -> ConditionContext<'a> {
    ConditionContext {
        own,
        opponent,
        hits_taken: cursor.hits_taken,
        hits_dealt: cursor.hits_dealt,
        seconds_in_node: cursor.seconds_in_node(now, config.tick_seconds),
        attack_slot_held,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::combatant::{Archetype, Combatant};
    use crate::combat::skill::Loadout;
    use crate::core::types::{Team, Vec2};
    use crate::pattern::condition::Condition;
    use crate::pattern::graph::{PatternNode, PatternTransition};

    fn node(name: &str, skill: SkillKind, default_target: usize) -> PatternNode {
        PatternNode {
            name: name.into(),
            skill,
            guards: Vec::new(),
            transitions: Vec::new(),
            default_after_seconds: 1.0,
            default_target,
            telegraph_cue: format!("cue_{name}"),
            telegraph_lead_seconds: None,
        }
    }

    fn fighter(name: &str) -> Combatant {
        Combatant::new(name, Team::Hostile, Archetype::Bruiser, Loadout::standard(10.0))
            .at(Vec2::new(0.0, 0.0))
    }

    fn run(
        graph: &PatternGraph,
        cursor: &mut PatternCursor,
        own: &Combatant,
        config: &CombatConfig,
        now: Tick,
    ) -> Vec<DecisionAction> {
        evaluate(graph, cursor, own, None, false, config, now)
    }

    #[test]
    fn test_telegraph_precedes_request() {
        let config = CombatConfig::default();
        let graph = PatternGraph::new(vec![node("opener", SkillKind::Light, 0)], 0).unwrap();
        let mut cursor = PatternCursor::new(&graph, 1, 0);
        let own = fighter("grunt");

        let first = run(&graph, &mut cursor, &own, &config, 0);
        assert_eq!(
            first,
            vec![DecisionAction::EmitTelegraph {
                cue: "cue_opener".into(),
                lead_seconds: config.telegraph_lead_seconds,
            }]
        );

        // One tick after the cue the lead window has not elapsed yet.
        assert!(run(&graph, &mut cursor, &own, &config, 1).is_empty());

        // telegraph_lead_seconds 0.8 at 0.1s ticks: request fires at tick 8.
        let at_lead = run(&graph, &mut cursor, &own, &config, 8);
        assert_eq!(at_lead, vec![DecisionAction::RequestSkill(SkillKind::Light)]);

        // Committed: no duplicate request while the node is unchanged.
        assert!(run(&graph, &mut cursor, &own, &config, 9).is_empty());
    }

    #[test]
    fn test_guarded_transition_beats_default() {
        let config = CombatConfig::default();
        let mut opener = node("opener", SkillKind::Light, 1);
        opener.transitions.push(PatternTransition {
            target: 1,
            priority: 5,
            guards: vec![Condition::HitsTakenAtLeast { count: 2 }],
            reset_hit_counters: true,
        });
        let punish = node("punish", SkillKind::Heavy, 0);
        let graph = PatternGraph::new(vec![opener, punish], 0).unwrap();
        let mut cursor = PatternCursor::new(&graph, 1, 0);
        let own = fighter("grunt");

        cursor.record_hit_taken();
        run(&graph, &mut cursor, &own, &config, 1);
        assert_eq!(cursor.node, 0);

        cursor.record_hit_taken();
        run(&graph, &mut cursor, &own, &config, 2);
        assert_eq!(cursor.node, 1);
        assert_eq!(cursor.hits_taken, 0, "transition asked for a counter reset");
    }

    #[test]
    fn test_time_default_prevents_deadlock() {
        let config = CombatConfig::default();
        let mut stuck = node("stuck", SkillKind::Light, 1);
        stuck.transitions.push(PatternTransition {
            target: 1,
            priority: 5,
            // Never true without an opponent in the context.
            guards: vec![Condition::OpponentDisabled],
            reset_hit_counters: false,
        });
        let idle = node("idle", SkillKind::Block, 0);
        let graph = PatternGraph::new(vec![stuck, idle], 0).unwrap();
        let mut cursor = PatternCursor::new(&graph, 1, 0);
        let own = fighter("grunt");

        // default_after_seconds 1.0 at 0.1s ticks: default fires at tick 10.
        run(&graph, &mut cursor, &own, &config, 9);
        assert_eq!(cursor.node, 0);
        run(&graph, &mut cursor, &own, &config, 10);
        assert_eq!(cursor.node, 1);
    }

    #[test]
    fn test_charged_machine_activates() {
        let config = CombatConfig::default();
        let graph = PatternGraph::new(vec![node("opener", SkillKind::Light, 0)], 0).unwrap();
        let mut cursor = PatternCursor::new(&graph, 1, 0);
        let mut own = fighter("grunt");

        own.request_skill(SkillKind::Light, None, 0).unwrap();
        // Light charge is 0.4s; a half second finishes it.
        let loadout = own.loadout.clone();
        own.machine.update(0.5, &loadout, &mut own.stamina, 0.0);
        cursor.telegraph = TelegraphPhase::Committed;

        let actions = run(&graph, &mut cursor, &own, &config, 5);
        assert_eq!(actions, vec![DecisionAction::Activate]);
    }

    #[test]
    fn test_node_change_cancels_windup() {
        let config = CombatConfig::default();
        let mut opener = node("opener", SkillKind::Heavy, 0);
        opener.transitions.push(PatternTransition {
            target: 1,
            priority: 5,
            guards: vec![Condition::HitsTakenAtLeast { count: 1 }],
            reset_hit_counters: false,
        });
        let turtle = node("turtle", SkillKind::Block, 0);
        let graph = PatternGraph::new(vec![opener, turtle], 0).unwrap();
        let mut cursor = PatternCursor::new(&graph, 1, 0);
        let mut own = fighter("grunt");

        own.request_skill(SkillKind::Heavy, None, 0).unwrap();
        cursor.telegraph = TelegraphPhase::Committed;
        cursor.record_hit_taken();

        let actions = run(&graph, &mut cursor, &own, &config, 1);
        assert_eq!(actions[0], DecisionAction::CancelSkill);
        assert_eq!(cursor.node, 1);
    }
}
