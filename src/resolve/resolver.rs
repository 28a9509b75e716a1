//! Interaction resolution pass
//!
//! Settles every pending execution for the tick in two phases: a read-only
//! collect phase that classifies each hit against a snapshot of
//! pre-resolution state, then an apply phase that mutates combatants. No
//! outcome ever observes another outcome's mutation within the same pass.
//!
//! The resolution window is exactly one tick wide; there is no epsilon
//! widening across ticks.

use crate::combat::combatant::Combatant;
use crate::combat::constants::{
    BLOCK_BREAK_DAMAGE_FACTOR, CC_GAIN_PARTIAL_GUARD, CC_GAIN_UNGUARDED, REFLECT_RETURN_FACTOR,
};
use crate::combat::machine::ForcedCause;
use crate::combat::skill::SkillKind;
use crate::core::config::CombatConfig;
use crate::core::types::CombatantId;
use crate::resolve::execution::{PendingExecutions, SkillExecution};
use crate::resolve::matrix::{classify, OutcomeTemplate};
use crate::resolve::outcome::InteractionOutcome;
use ahash::{AHashMap, AHashSet};
use ordered_float::OrderedFloat;

/// Pre-resolution view of one combatant, frozen before any mutation
#[derive(Debug, Clone, Copy)]
struct Snapshot {
    alive: bool,
    /// Defensive kind holding a live, unconsumed Waiting window
    guard: Option<SkillKind>,
}

/// Settle all executions registered this tick.
///
/// Returns the outcomes in the order they were applied; callers feed them to
/// the event log and discard them.
pub fn resolve_pending(
    combatants: &mut [Combatant],
    pending: &mut PendingExecutions,
    config: &CombatConfig,
) -> Vec<InteractionOutcome> {
    if pending.is_empty() {
        return Vec::new();
    }

    let index: AHashMap<CombatantId, usize> = combatants
        .iter()
        .enumerate()
        .map(|(i, c)| (c.id, i))
        .collect();

    // ===== COLLECT (read-only) =====
    let snapshots: AHashMap<CombatantId, Snapshot> = combatants
        .iter()
        .map(|c| {
            (
                c.id,
                Snapshot {
                    alive: c.is_alive(),
                    guard: if c.machine.guard_available() {
                        c.machine.current_kind()
                    } else {
                        None
                    },
                },
            )
        })
        .collect();

    let executions = pending.as_mut_vec();

    // Drop executions whose participants are gone or dead: target loss is a
    // safe fallback, never an error surfaced to the attacker.
    executions.retain(|e| {
        let attacker_ok = snapshots.get(&e.attacker).map_or(false, |s| s.alive);
        let target_ok = snapshots.get(&e.target).map_or(false, |s| s.alive);
        if !target_ok {
            tracing::debug!(attacker = ?e.attacker, target = ?e.target, "hit dropped, target lost");
        }
        attacker_ok && target_ok
    });

    // Deterministic settlement order: faster first, then attacker id.
    executions.sort_by(|a, b| {
        OrderedFloat(b.speed)
            .cmp(&OrderedFloat(a.speed))
            .then(a.attacker.cmp(&b.attacker))
    });

    // Simultaneous-offense speed race: when two executions target each
    // other, the strictly faster one lands and the slower is interrupted.
    // Exact ties land both.
    let mut interrupted: AHashSet<CombatantId> = AHashSet::new();
    for i in 0..executions.len() {
        for j in (i + 1)..executions.len() {
            let (fast, slow) = (&executions[i], &executions[j]);
            let mutual = fast.attacker == slow.target && fast.target == slow.attacker;
            if mutual && fast.speed > slow.speed {
                interrupted.insert(slow.attacker);
            }
        }
    }

    // One-shot defense: the first hit a Waiting defender faces in this pass
    // consumes the guard; later hits in the same pass land unguarded.
    let mut guard_spent: AHashSet<CombatantId> = AHashSet::new();
    let mut outcomes: Vec<InteractionOutcome> = Vec::with_capacity(executions.len());

    for execution in executions.iter() {
        if interrupted.contains(&execution.attacker) {
            outcomes.push(InteractionOutcome::new(
                execution.attacker,
                execution.target,
                execution.kind,
                None,
                OutcomeTemplate::Interrupted,
            ));
            continue;
        }
        outcomes.push(classify_execution(
            execution,
            &snapshots,
            &mut guard_spent,
            combatants,
            &index,
        ));
    }

    // ===== APPLY (mutate) =====
    for outcome in &outcomes {
        apply_outcome(outcome, combatants, &index, config);
    }

    pending.clear();
    outcomes
}

fn classify_execution(
    execution: &SkillExecution,
    snapshots: &AHashMap<CombatantId, Snapshot>,
    guard_spent: &mut AHashSet<CombatantId>,
    combatants: &[Combatant],
    index: &AHashMap<CombatantId, usize>,
) -> InteractionOutcome {
    let defense = snapshots
        .get(&execution.target)
        .and_then(|s| s.guard)
        .filter(|_| !guard_spent.contains(&execution.target));

    let template = classify(execution.kind, defense);
    if defense.is_some() {
        guard_spent.insert(execution.target);
    }

    let mut outcome = InteractionOutcome::new(
        execution.attacker,
        execution.target,
        execution.kind,
        defense,
        template,
    );

    // Damage comes from the attacker's read-only equipment data, scaled by
    // aim accuracy at activation.
    let damage = index
        .get(&execution.attacker)
        .and_then(|&i| combatants[i].loadout.profile(execution.kind))
        .map(|p| p.base_damage * execution.accuracy)
        .unwrap_or(0.0);

    match template {
        OutcomeTemplate::Unguarded => {
            outcome.damage_to_defender = damage;
            outcome.cc_to_defender = CC_GAIN_UNGUARDED;
        }
        OutcomeTemplate::BlockHolds { .. } => {}
        OutcomeTemplate::BlockBroken => {
            outcome.damage_to_defender = damage * BLOCK_BREAK_DAMAGE_FACTOR;
            outcome.cc_to_defender = CC_GAIN_PARTIAL_GUARD;
        }
        OutcomeTemplate::Reflected => {
            outcome.damage_to_attacker = damage * REFLECT_RETURN_FACTOR;
        }
        OutcomeTemplate::Interrupted => {}
    }

    outcome
}

fn apply_outcome(
    outcome: &InteractionOutcome,
    combatants: &mut [Combatant],
    index: &AHashMap<CombatantId, usize>,
    config: &CombatConfig,
) {
    let (Some(&attacker_idx), Some(&defender_idx)) = (
        index.get(&outcome.attacker),
        index.get(&outcome.defender),
    ) else {
        return;
    };

    tracing::debug!(
        attacker = ?outcome.attacker,
        defender = ?outcome.defender,
        template = ?outcome.template,
        damage = outcome.damage_to_defender,
        "interaction resolved"
    );

    match outcome.template {
        OutcomeTemplate::Unguarded => {
            let defender = &mut combatants[defender_idx];
            if defender.is_alive() {
                defender.apply_damage(outcome.damage_to_defender);
                if defender.is_alive() {
                    defender.receive_cc(outcome.cc_to_defender, config);
                }
            }
        }

        OutcomeTemplate::BlockHolds { stun_attacker } => {
            let defender = &mut combatants[defender_idx];
            defender.machine.consume_guard();
            defender.force_transition(ForcedCause::GuardSpent);
            if stun_attacker {
                combatants[attacker_idx].force_transition(ForcedCause::Stun {
                    recovery_seconds: config.stun_recovery_seconds,
                });
            }
        }

        OutcomeTemplate::BlockBroken => {
            let defender = &mut combatants[defender_idx];
            defender.machine.consume_guard();
            if defender.is_alive() {
                defender.apply_damage(outcome.damage_to_defender);
                defender.cc.add(outcome.cc_to_defender);
            }
            // Knocked down even though the defense "won" stamina-wise.
            if combatants[defender_idx].is_alive() {
                combatants[defender_idx].apply_knockdown(config);
            }
        }

        OutcomeTemplate::Reflected => {
            let defender = &mut combatants[defender_idx];
            defender.machine.consume_guard();
            defender.force_transition(ForcedCause::GuardSpent);
            let attacker = &mut combatants[attacker_idx];
            if attacker.is_alive() {
                attacker.apply_damage(outcome.damage_to_attacker);
                if attacker.is_alive() {
                    attacker.apply_knockdown(config);
                }
            }
        }

        OutcomeTemplate::Interrupted => {
            combatants[attacker_idx].force_transition(ForcedCause::Interrupted {
                recovery_seconds: 0.0,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::combatant::Archetype;
    use crate::combat::skill::Loadout;
    use crate::combat::state::SkillState;
    use crate::core::types::{Team, Vec2};

    fn arena_pair() -> (Vec<Combatant>, CombatantId, CombatantId) {
        let a = Combatant::new(
            "attacker",
            Team::Player,
            Archetype::Bruiser,
            Loadout::standard(10.0),
        )
        .at(Vec2::new(0.0, 0.0));
        let b = Combatant::new(
            "defender",
            Team::Hostile,
            Archetype::Bruiser,
            Loadout::standard(10.0),
        )
        .at(Vec2::new(1.0, 0.0));
        let (ida, idb) = (a.id, b.id);
        (vec![a, b], ida, idb)
    }

    fn execution(
        attacker: CombatantId,
        target: CombatantId,
        kind: SkillKind,
        speed: f32,
    ) -> SkillExecution {
        SkillExecution {
            attacker,
            target,
            kind,
            charge_started: 0,
            activation_tick: 1,
            speed,
            accuracy: 1.0,
        }
    }

    /// Drive a combatant's machine into a live Waiting window.
    fn raise_guard(combatant: &mut Combatant, kind: SkillKind) {
        combatant.request_skill(kind, None, 0).unwrap();
        let config = CombatConfig::default();
        for _ in 0..10 {
            if combatant.machine.state() == SkillState::Waiting {
                return;
            }
            combatant.update(&config);
        }
        panic!("guard never raised");
    }

    #[test]
    fn test_unguarded_hit_applies_damage_and_cc() {
        let config = CombatConfig::default();
        let (mut combatants, ida, idb) = arena_pair();
        let mut pending = PendingExecutions::new();
        pending.register(execution(ida, idb, SkillKind::Light, 12.0));

        let outcomes = resolve_pending(&mut combatants, &mut pending, &config);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].template, OutcomeTemplate::Unguarded);
        assert!(combatants[1].health < combatants[1].max_health);
        assert!(combatants[1].cc.value() > 0.0);
        assert!(pending.is_empty());
    }

    #[test]
    fn test_block_holds_stuns_attacker_zero_damage() {
        let config = CombatConfig::default();
        let (mut combatants, ida, idb) = arena_pair();
        raise_guard(&mut combatants[1], SkillKind::Block);

        let mut pending = PendingExecutions::new();
        pending.register(execution(ida, idb, SkillKind::Light, 12.0));
        let outcomes = resolve_pending(&mut combatants, &mut pending, &config);

        assert_eq!(
            outcomes[0].template,
            OutcomeTemplate::BlockHolds {
                stun_attacker: true
            }
        );
        assert_eq!(combatants[1].health, combatants[1].max_health);
        // Defender's Waiting ended, one-shot consumed
        assert_eq!(combatants[1].machine.state(), SkillState::Recovery);
        // Attacker stunned into Recovery
        assert_eq!(combatants[0].machine.state(), SkillState::Recovery);
    }

    #[test]
    fn test_heavy_breaks_block_despite_stamina() {
        let config = CombatConfig::default();
        let (mut combatants, ida, idb) = arena_pair();
        raise_guard(&mut combatants[1], SkillKind::Block);
        assert!(combatants[1].stamina.current() > 0.0);

        let mut pending = PendingExecutions::new();
        pending.register(execution(ida, idb, SkillKind::Heavy, 8.0));
        let outcomes = resolve_pending(&mut combatants, &mut pending, &config);

        assert_eq!(outcomes[0].template, OutcomeTemplate::BlockBroken);
        let expected =
            crate::combat::skill::SkillProfile::heavy().base_damage * BLOCK_BREAK_DAMAGE_FACTOR;
        assert!((combatants[1].max_health - combatants[1].health - expected).abs() < 0.001);
        // Knocked down regardless of remaining stamina
        assert!(combatants[1].is_disabled());
        assert_eq!(combatants[1].machine.state(), SkillState::Recovery);
    }

    #[test]
    fn test_reflect_returns_damage_and_knocks_down_attacker() {
        let config = CombatConfig::default();
        let (mut combatants, ida, idb) = arena_pair();
        raise_guard(&mut combatants[1], SkillKind::Reflect);

        let mut pending = PendingExecutions::new();
        pending.register(execution(ida, idb, SkillKind::Light, 12.0));
        let outcomes = resolve_pending(&mut combatants, &mut pending, &config);

        assert_eq!(outcomes[0].template, OutcomeTemplate::Reflected);
        assert_eq!(combatants[1].health, combatants[1].max_health);
        assert!(combatants[0].health < combatants[0].max_health);
        assert!(combatants[0].is_disabled());
    }

    #[test]
    fn test_one_shot_block_second_hit_lands() {
        let config = CombatConfig::default();
        let (mut combatants, ida, idb) = arena_pair();
        let c = Combatant::new(
            "second",
            Team::Player,
            Archetype::Skirmisher,
            Loadout::standard(9.0),
        );
        let idc = c.id;
        combatants.push(c);
        raise_guard(&mut combatants[1], SkillKind::Block);

        let mut pending = PendingExecutions::new();
        pending.register(execution(ida, idb, SkillKind::Light, 12.0));
        pending.register(execution(idc, idb, SkillKind::Light, 11.0));
        let outcomes = resolve_pending(&mut combatants, &mut pending, &config);

        // Faster hit consumed the guard; the slower one landed normally
        assert_eq!(
            outcomes[0].template,
            OutcomeTemplate::BlockHolds {
                stun_attacker: true
            }
        );
        assert_eq!(outcomes[1].template, OutcomeTemplate::Unguarded);
        assert!(combatants[1].health < combatants[1].max_health);
    }

    #[test]
    fn test_speed_race_faster_interrupts_slower() {
        let config = CombatConfig::default();
        let (mut combatants, ida, idb) = arena_pair();

        let mut pending = PendingExecutions::new();
        pending.register(execution(ida, idb, SkillKind::Light, 12.0));
        pending.register(execution(idb, ida, SkillKind::Heavy, 8.5));
        let outcomes = resolve_pending(&mut combatants, &mut pending, &config);

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].template, OutcomeTemplate::Unguarded);
        assert_eq!(outcomes[0].attacker, ida);
        assert_eq!(outcomes[1].template, OutcomeTemplate::Interrupted);
        assert_eq!(outcomes[1].attacker, idb);
        // Only the faster hit dealt damage
        assert!(combatants[1].health < combatants[1].max_health);
        assert_eq!(combatants[0].health, combatants[0].max_health);
        assert_eq!(combatants[1].machine.state(), SkillState::Recovery);
    }

    #[test]
    fn test_speed_tie_both_land() {
        let config = CombatConfig::default();
        let (mut combatants, ida, idb) = arena_pair();

        let mut pending = PendingExecutions::new();
        pending.register(execution(ida, idb, SkillKind::Light, 12.0));
        pending.register(execution(idb, ida, SkillKind::Light, 12.0));
        let outcomes = resolve_pending(&mut combatants, &mut pending, &config);

        assert_eq!(outcomes.len(), 2);
        assert!(combatants[0].health < combatants[0].max_health);
        assert!(combatants[1].health < combatants[1].max_health);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let config = CombatConfig::default();

        let run = || {
            let (mut combatants, _, _) = arena_pair();
            // Pin ids so both runs see identical inputs
            combatants[0].id = CombatantId(uuid::Uuid::from_u128(1));
            combatants[1].id = CombatantId(uuid::Uuid::from_u128(2));
            let mut pending = PendingExecutions::new();
            pending.register(execution(
                combatants[0].id,
                combatants[1].id,
                SkillKind::Light,
                12.0,
            ));
            pending.register(execution(
                combatants[1].id,
                combatants[0].id,
                SkillKind::Heavy,
                8.5,
            ));
            resolve_pending(&mut combatants, &mut pending, &config)
        };

        let (first, second) = (run(), run());
        assert_eq!(first, second);
    }

    #[test]
    fn test_dead_target_hit_is_dropped() {
        let config = CombatConfig::default();
        let (mut combatants, ida, idb) = arena_pair();
        combatants[1].apply_damage(1000.0);

        let mut pending = PendingExecutions::new();
        pending.register(execution(ida, idb, SkillKind::Light, 12.0));
        let outcomes = resolve_pending(&mut combatants, &mut pending, &config);
        assert!(outcomes.is_empty());
    }
}
