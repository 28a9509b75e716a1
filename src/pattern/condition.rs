//! Guard condition evaluation
//!
//! The condition set is closed and enumerable, so it is a tagged variant
//! with one evaluation arm per kind. Everything except `Chance` is a pure
//! function of current combat state; `Chance` draws from the combatant's
//! seeded stream and is reproducible run to run.

use crate::combat::combatant::Combatant;
use crate::combat::skill::SkillKind;
use crate::combat::state::SkillState;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Guard condition on a pattern node or transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    HealthBelow { percent: f32 },
    HealthAbove { percent: f32 },
    /// Hits received since the cursor's counters last reset
    HitsTakenAtLeast { count: u32 },
    /// Hits landed since the cursor's counters last reset
    HitsDealtAtLeast { count: u32 },
    OpponentCharging,
    OpponentUsing { skill: SkillKind },
    OpponentDisabled,
    OpponentWithin { distance: f32 },
    OpponentBeyond { distance: f32 },
    StaminaAtLeast { amount: f32 },
    /// Own machine idle, kind known, cost covered, not disabled
    SkillReady { skill: SkillKind },
    TimeInNodeAtLeast { seconds: f32 },
    Chance { probability: f32 },
    /// Coordination layer granted this combatant an attack slot
    AttackSlotHeld,
}

/// Read-only view the decision engine evaluates against
pub struct ConditionContext<'a> {
    pub own: &'a Combatant,
    pub opponent: Option<&'a Combatant>,
    pub hits_taken: u32,
    pub hits_dealt: u32,
    pub seconds_in_node: f32,
    pub attack_slot_held: bool,
}

impl<'a> ConditionContext<'a> {
    fn health_percent(&self) -> f32 {
        if self.own.max_health > 0.0 {
            self.own.health / self.own.max_health * 100.0
        } else {
            0.0
        }
    }

    fn opponent_distance(&self) -> Option<f32> {
        self.opponent.map(|o| self.own.distance_to(o))
    }
}

/// Evaluate one condition. Opponent predicates are false when the target
/// is gone; the engine handles target loss as its own fallback.
pub fn evaluate(condition: &Condition, ctx: &ConditionContext, rng: &mut ChaCha8Rng) -> bool {
    match condition {
        Condition::HealthBelow { percent } => ctx.health_percent() < *percent,
        Condition::HealthAbove { percent } => ctx.health_percent() > *percent,

        Condition::HitsTakenAtLeast { count } => ctx.hits_taken >= *count,
        Condition::HitsDealtAtLeast { count } => ctx.hits_dealt >= *count,

        Condition::OpponentCharging => ctx
            .opponent
            .map_or(false, |o| o.machine.state().is_winding_up()),

        Condition::OpponentUsing { skill } => ctx
            .opponent
            .map_or(false, |o| o.machine.current_kind() == Some(*skill)),

        Condition::OpponentDisabled => ctx.opponent.map_or(false, |o| o.is_disabled()),

        Condition::OpponentWithin { distance } => ctx
            .opponent_distance()
            .map_or(false, |d| d <= *distance),

        Condition::OpponentBeyond { distance } => ctx
            .opponent_distance()
            .map_or(false, |d| d > *distance),

        Condition::StaminaAtLeast { amount } => ctx.own.stamina.current() >= *amount,

        Condition::SkillReady { skill } => {
            ctx.own.machine.state() == SkillState::Uncharged
                && !ctx.own.is_disabled()
                && ctx
                    .own
                    .loadout
                    .profile(*skill)
                    .map_or(false, |p| ctx.own.stamina.current() >= p.stamina_cost)
        }

        Condition::TimeInNodeAtLeast { seconds } => ctx.seconds_in_node >= *seconds,

        Condition::Chance { probability } => rng.gen::<f32>() < *probability,

        Condition::AttackSlotHeld => ctx.attack_slot_held,
    }
}

/// All guards must hold for the set to be satisfied.
pub fn evaluate_all(
    conditions: &[Condition],
    ctx: &ConditionContext,
    rng: &mut ChaCha8Rng,
) -> bool {
    conditions.iter().all(|c| evaluate(c, ctx, rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::combatant::Archetype;
    use crate::combat::skill::Loadout;
    use crate::core::types::{Team, Vec2};
    use rand::SeedableRng;

    fn fighters() -> (Combatant, Combatant) {
        let own = Combatant::new(
            "own",
            Team::Hostile,
            Archetype::Bruiser,
            Loadout::standard(10.0),
        )
        .at(Vec2::new(0.0, 0.0));
        let opponent = Combatant::new(
            "opponent",
            Team::Player,
            Archetype::Bruiser,
            Loadout::standard(10.0),
        )
        .at(Vec2::new(3.0, 0.0));
        (own, opponent)
    }

    fn ctx<'a>(own: &'a Combatant, opponent: &'a Combatant) -> ConditionContext<'a> {
        ConditionContext {
            own,
            opponent: Some(opponent),
            hits_taken: 0,
            hits_dealt: 0,
            seconds_in_node: 0.0,
            attack_slot_held: false,
        }
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    #[test]
    fn test_health_thresholds() {
        let (mut own, opponent) = fighters();
        own.apply_damage(60.0);
        let context = ctx(&own, &opponent);
        assert!(evaluate(
            &Condition::HealthBelow { percent: 50.0 },
            &context,
            &mut rng()
        ));
        assert!(!evaluate(
            &Condition::HealthAbove { percent: 50.0 },
            &context,
            &mut rng()
        ));
    }

    #[test]
    fn test_distance_predicates() {
        let (own, opponent) = fighters();
        let context = ctx(&own, &opponent);
        assert!(evaluate(
            &Condition::OpponentWithin { distance: 5.0 },
            &context,
            &mut rng()
        ));
        assert!(evaluate(
            &Condition::OpponentBeyond { distance: 2.0 },
            &context,
            &mut rng()
        ));
        assert!(!evaluate(
            &Condition::OpponentWithin { distance: 1.0 },
            &context,
            &mut rng()
        ));
    }

    #[test]
    fn test_opponent_predicates_false_without_target() {
        let (own, _) = fighters();
        let context = ConditionContext {
            own: &own,
            opponent: None,
            hits_taken: 0,
            hits_dealt: 0,
            seconds_in_node: 0.0,
            attack_slot_held: false,
        };
        assert!(!evaluate(&Condition::OpponentCharging, &context, &mut rng()));
        assert!(!evaluate(
            &Condition::OpponentWithin { distance: 100.0 },
            &context,
            &mut rng()
        ));
    }

    #[test]
    fn test_opponent_charging_detected() {
        let (own, mut opponent) = fighters();
        opponent
            .request_skill(SkillKind::Heavy, None, 0)
            .unwrap();
        let context = ctx(&own, &opponent);
        assert!(evaluate(&Condition::OpponentCharging, &context, &mut rng()));
        assert!(evaluate(
            &Condition::OpponentUsing {
                skill: SkillKind::Heavy
            },
            &context,
            &mut rng()
        ));
    }

    #[test]
    fn test_skill_ready_requires_stamina() {
        let (mut own, opponent) = fighters();
        {
            let context = ctx(&own, &opponent);
            assert!(evaluate(
                &Condition::SkillReady {
                    skill: SkillKind::Heavy
                },
                &context,
                &mut rng()
            ));
        }
        own.stamina.drain(90.0);
        let context = ctx(&own, &opponent);
        assert!(!evaluate(
            &Condition::SkillReady {
                skill: SkillKind::Heavy
            },
            &context,
            &mut rng()
        ));
    }

    #[test]
    fn test_chance_is_reproducible() {
        let (own, opponent) = fighters();
        let context = ctx(&own, &opponent);
        let condition = Condition::Chance { probability: 0.5 };

        let draw = |seed: u64| {
            let mut r = ChaCha8Rng::seed_from_u64(seed);
            (0..32)
                .map(|_| evaluate(&condition, &context, &mut r))
                .collect::<Vec<bool>>()
        };
        assert_eq!(draw(42), draw(42));
    }

    #[test]
    fn test_hit_counters() {
        let (own, opponent) = fighters();
        let mut context = ctx(&own, &opponent);
        context.hits_taken = 3;
        assert!(evaluate(
            &Condition::HitsTakenAtLeast { count: 3 },
            &context,
            &mut rng()
        ));
        assert!(!evaluate(
            &Condition::HitsDealtAtLeast { count: 1 },
            &context,
            &mut rng()
        ));
    }

    #[test]
    fn test_condition_toml_roundtrip() {
        let toml_src = r#"
            kind = "opponent_within"
            distance = 2.5
        "#;
        let condition: Condition = toml::from_str(toml_src).unwrap();
        assert_eq!(condition, Condition::OpponentWithin { distance: 2.5 });
    }
}
