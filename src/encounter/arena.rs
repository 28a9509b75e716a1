//! Encounter loop
//!
//! Each tick: decision -> machine/meter update -> resolution -> post.
//! The order is fixed; determinism depends on it. All cross-combatant
//! mutation happens inside the resolver, everything else mutates only
//! the combatant being stepped.

use crate::combat::combatant::Combatant;
use crate::combat::machine::{ForcedCause, MachineEvent};
use crate::combat::skill::{SkillClass, SkillKind};
use crate::coordination::attack_slots::AttackSlotBoard;
use crate::coordination::formation::FormationRing;
use crate::core::config::CombatConfig;
use crate::core::error::{CombatError, Result};
use crate::core::types::{CombatantId, Team, Tick, Vec2};
use crate::encounter::events::{CombatEventLog, CombatEventType, EncounterOutcome};
use crate::pattern::cursor::{PatternCursor, TelegraphPhase};
use crate::pattern::engine::{self, DecisionAction};
use crate::pattern::graph::PatternGraph;
use crate::resolve::execution::{PendingExecutions, SkillExecution};
use crate::resolve::matrix::OutcomeTemplate;
use crate::resolve::resolver::resolve_pending;
use ahash::{AHashMap, AHashSet};
use ordered_float::OrderedFloat;
use std::sync::Arc;

/// How close a gap closer carries its user to the target
const GAP_CLOSER_STOP_DISTANCE: f32 = 1.2;

/// Pattern graph plus the per-combatant cursor over it
struct PatternDriver {
    graph: Arc<PatternGraph>,
    cursor: PatternCursor,
}

/// Complete encounter state
pub struct Arena {
    pub config: CombatConfig,
    pub tick: Tick,
    combatants: Vec<Combatant>,
    drivers: AHashMap<CombatantId, PatternDriver>,
    slots: AttackSlotBoard,
    formation: FormationRing,
    pending: PendingExecutions,
    outcome: Option<EncounterOutcome>,
    /// Full encounter log; per-tick slices are also returned by `run_tick`
    pub log: Vec<crate::encounter::events::CombatEvent>,
}

impl Arena {
    pub fn new(config: CombatConfig) -> Self {
        let slots = AttackSlotBoard::new(&config);
        let formation = FormationRing::new(&config);
        let mut arena = Self {
            config,
            tick: 0,
            combatants: Vec::new(),
            drivers: AHashMap::new(),
            slots,
            formation,
            pending: PendingExecutions::new(),
            outcome: None,
            log: Vec::new(),
        };
        arena.log.push(crate::encounter::events::CombatEvent {
            tick: 0,
            event_type: CombatEventType::EncounterStarted,
            description: "encounter started".into(),
        });
        arena
    }

    /// Add an externally driven (player input) combatant.
    pub fn spawn(&mut self, combatant: Combatant) -> CombatantId {
        let id = combatant.id;
        self.combatants.push(combatant);
        id
    }

    /// Add a pattern-driven combatant. The seed fixes its chance-guard
    /// stream, so identical seeds replay identical decisions.
    pub fn spawn_patterned(
        &mut self,
        combatant: Combatant,
        graph: Arc<PatternGraph>,
        seed: u64,
    ) -> CombatantId {
        let id = self.spawn(combatant);
        let cursor = PatternCursor::new(&graph, seed, self.tick);
        self.drivers.insert(id, PatternDriver { graph, cursor });
        id
    }

    pub fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.iter().find(|c| c.id == id)
    }

    pub fn combatant_mut(&mut self, id: CombatantId) -> Option<&mut Combatant> {
        self.combatants.iter_mut().find(|c| c.id == id)
    }

    pub fn combatants(&self) -> &[Combatant] {
        &self.combatants
    }

    pub fn outcome(&self) -> Option<EncounterOutcome> {
        self.outcome
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// Player input entry point.
    pub fn request_skill(&mut self, id: CombatantId, kind: SkillKind) -> Result<()> {
        let distance = {
            let c = self
                .combatant(id)
                .ok_or(CombatError::CombatantNotFound(id))?;
            let target = c
                .target
                .and_then(|t| self.combatant(t))
                .filter(|t| t.is_alive());
            if kind.class() == SkillClass::Offensive && target.is_none() {
                return Err(CombatError::TargetLost(id));
            }
            target.map(|t| c.distance_to(t))
        };
        let now = self.tick;
        let combatant = self
            .combatant_mut(id)
            .ok_or(CombatError::CombatantNotFound(id))?;
        combatant.request_skill(kind, distance, now)
    }

    pub fn cancel_skill(&mut self, id: CombatantId) -> Result<()> {
        self.combatant_mut(id)
            .ok_or(CombatError::CombatantNotFound(id))?
            .cancel_current_skill()
    }

    pub fn activate_skill(&mut self, id: CombatantId) -> Result<()> {
        self.combatant_mut(id)
            .ok_or(CombatError::CombatantNotFound(id))?
            .activate()
    }

    /// Run one complete tick.
    pub fn run_tick(&mut self) -> CombatEventLog {
        let mut events = CombatEventLog::new();
        if self.is_finished() {
            return events;
        }

        // ===== PHASE 1: DECISION =====
        self.phase_decision(&mut events);

        // ===== PHASE 2: MACHINE / METER UPDATE =====
        self.phase_update(&mut events);

        // ===== PHASE 3: RESOLUTION =====
        self.phase_resolution(&mut events);

        // ===== PHASE 4: POST-TICK =====
        self.phase_post(&mut events);

        self.log.extend(events.events.iter().cloned());
        self.tick += 1;
        events
    }

    fn phase_decision(&mut self, events: &mut CombatEventLog) {
        let now = self.tick;

        // Retargeting first: lost targets are replaced by the nearest
        // opposing survivor, and an abandoned wind-up cancels now, before
        // any decision reads state.
        for i in 0..self.combatants.len() {
            if !self.combatants[i].is_alive() {
                continue;
            }
            let target_alive = self.combatants[i].target.is_some_and(|t| {
                self.combatants.iter().any(|c| c.id == t && c.is_alive())
            });
            if target_alive {
                continue;
            }
            let own_pos = self.combatants[i].position;
            let enemy_team = self.combatants[i].team.opposing();
            let replacement = self
                .combatants
                .iter()
                .filter(|c| c.team == enemy_team && c.is_alive())
                .min_by_key(|c| OrderedFloat(own_pos.distance(&c.position)))
                .map(|c| c.id);
            let lost = self.combatants[i].target.is_some();
            self.combatants[i].target = replacement;
            if lost && self.combatants[i].machine.state().is_cancelable() {
                tracing::debug!(combatant = ?self.combatants[i].id, "target lost, wind-up canceled");
                self.combatants[i].force_transition(ForcedCause::Cancel);
            }
        }

        let driven: Vec<usize> = (0..self.combatants.len())
            .filter(|&i| {
                self.combatants[i].is_alive() && self.drivers.contains_key(&self.combatants[i].id)
            })
            .collect();

        for i in driven {
            let id = self.combatants[i].id;
            let target = self.combatants[i].target;

            // Advisory coordination: request/refresh the attack slot and a
            // ring position every decision tick.
            let mut slot_held = false;
            if let Some(t) = target {
                let archetype = self.combatants[i].archetype;
                slot_held = self.slots.request(t, id, archetype);
                if let Some(target_pos) = self.position_of(t) {
                    let own_pos = self.combatants[i].position;
                    self.formation.assign(t, id, own_pos, target_pos);
                }
            }

            let actions = {
                let Some(driver) = self.drivers.get_mut(&id) else {
                    continue;
                };
                let graph = Arc::clone(&driver.graph);
                let own = &self.combatants[i];
                let opponent = target.and_then(|t| self.combatants.iter().find(|c| c.id == t));
                engine::evaluate(
                    &graph,
                    &mut driver.cursor,
                    own,
                    opponent,
                    slot_held,
                    &self.config,
                    now,
                )
            };

            for action in actions {
                match action {
                    DecisionAction::EmitTelegraph { cue, lead_seconds } => {
                        let description =
                            format!("{} telegraphs '{}'", self.combatants[i].name, cue);
                        events.push(
                            CombatEventType::TelegraphBegun {
                                combatant: id,
                                cue,
                                lead_seconds,
                            },
                            description,
                            now,
                        );
                    }
                    DecisionAction::RequestSkill(kind) => {
                        let distance = target
                            .and_then(|t| self.position_of(t))
                            .map(|p| self.combatants[i].position.distance(&p));
                        match self.combatants[i].request_skill(kind, distance, now) {
                            Ok(()) => {
                                let description = format!(
                                    "{} begins {:?}",
                                    self.combatants[i].name, kind
                                );
                                events.push(
                                    CombatEventType::ChargingBegun {
                                        combatant: id,
                                        skill: kind,
                                    },
                                    description,
                                    now,
                                );
                            }
                            Err(err) => {
                                // Refused requests retry next tick or fall
                                // through to the node's time default.
                                tracing::debug!(combatant = ?id, %err, "skill request refused");
                                if let Some(driver) = self.drivers.get_mut(&id) {
                                    driver.cursor.telegraph = TelegraphPhase::Pending;
                                }
                            }
                        }
                    }
                    DecisionAction::Activate => {
                        if let Err(err) = self.combatants[i].activate() {
                            tracing::debug!(combatant = ?id, %err, "activation refused");
                        }
                    }
                    DecisionAction::CancelSkill => {
                        if let Err(err) = self.combatants[i].cancel_current_skill() {
                            tracing::debug!(combatant = ?id, %err, "cancel refused");
                        }
                    }
                }
            }
        }
    }

    fn phase_update(&mut self, events: &mut CombatEventLog) {
        let now = self.tick;
        for i in 0..self.combatants.len() {
            if !self.combatants[i].is_alive() {
                continue;
            }
            let machine_events = self.combatants[i].update(&self.config);
            for event in machine_events {
                if let MachineEvent::Activated(kind) = event {
                    self.on_activated(i, kind, events, now);
                }
            }
        }
    }

    fn on_activated(&mut self, i: usize, kind: SkillKind, events: &mut CombatEventLog, now: Tick) {
        let id = self.combatants[i].id;
        let description = format!("{} activates {:?}", self.combatants[i].name, kind);
        events.push(
            CombatEventType::SkillActivated {
                combatant: id,
                skill: kind,
            },
            description,
            now,
        );

        if kind.class() != SkillClass::Offensive {
            return;
        }
        let Some(target) = self.combatants[i].target else {
            return;
        };

        if kind == SkillKind::GapCloser {
            if let Some(target_pos) = self.position_of(target) {
                let own_pos = self.combatants[i].position;
                let away = (own_pos - target_pos).normalize();
                self.combatants[i].position = target_pos + away * GAP_CLOSER_STOP_DISTANCE;
            }
        }

        let combatant = &self.combatants[i];
        let accuracy = if kind.is_aimed() {
            combatant.machine.accuracy()
        } else {
            1.0
        };
        self.pending.register(SkillExecution {
            attacker: id,
            target,
            kind,
            charge_started: combatant.machine.charge_started(),
            activation_tick: now,
            speed: combatant.loadout.speed_for(kind),
            accuracy,
        });
    }

    fn phase_resolution(&mut self, events: &mut CombatEventLog) {
        let now = self.tick;
        let pre: Vec<(CombatantId, bool, bool)> = self
            .combatants
            .iter()
            .map(|c| (c.id, c.is_alive(), c.is_disabled()))
            .collect();

        // A machine holds one state, so one attacker can register at most one
        // execution per tick. A duplicate means the phase ordering broke;
        // drop the duplicates rather than resolve garbage.
        let executions = self.pending.as_mut_vec();
        let before = executions.len();
        let mut seen: AHashSet<CombatantId> = AHashSet::with_capacity(before);
        executions.retain(|e| seen.insert(e.attacker));
        if executions.len() < before {
            let err = CombatError::StateInvariantViolation(format!(
                "combatant registered multiple executions on tick {now}"
            ));
            tracing::error!(%err, "dropping duplicate executions");
        }

        let outcomes = resolve_pending(&mut self.combatants, &mut self.pending, &self.config);

        for outcome in &outcomes {
            let description = format!(
                "{:?} vs {:?}: {:?}",
                outcome.offense, outcome.defense, outcome.template
            );
            events.push(
                CombatEventType::InteractionResolved {
                    attacker: outcome.attacker,
                    defender: outcome.defender,
                    template: outcome.template,
                    damage_to_defender: outcome.damage_to_defender,
                    damage_to_attacker: outcome.damage_to_attacker,
                },
                description,
                now,
            );

            // Pattern hit counters. A "hit" is damage landing, not a guarded
            // or raced attempt.
            match outcome.template {
                OutcomeTemplate::Unguarded | OutcomeTemplate::BlockBroken => {
                    if let Some(driver) = self.drivers.get_mut(&outcome.defender) {
                        driver.cursor.record_hit_taken();
                    }
                    if let Some(driver) = self.drivers.get_mut(&outcome.attacker) {
                        driver.cursor.record_hit_dealt();
                    }
                }
                OutcomeTemplate::Reflected => {
                    if let Some(driver) = self.drivers.get_mut(&outcome.attacker) {
                        driver.cursor.record_hit_taken();
                    }
                }
                OutcomeTemplate::BlockHolds { .. } | OutcomeTemplate::Interrupted => {}
            }
        }

        for (id, was_alive, was_disabled) in pre {
            let Some(combatant) = self.combatant(id) else {
                continue;
            };
            if !was_disabled {
                if let Some(disable) = &combatant.disable {
                    let description =
                        format!("{} suffers {:?}", combatant.name, disable.trigger);
                    let trigger = disable.trigger;
                    events.push(
                        CombatEventType::ThresholdCrossed {
                            combatant: id,
                            trigger,
                        },
                        description,
                        now,
                    );
                }
            }
            if was_alive && !combatant.is_alive() {
                let description = format!("{} is downed", combatant.name);
                events.push(CombatEventType::CombatantDowned { combatant: id }, description, now);
            }
        }
    }

    fn phase_post(&mut self, events: &mut CombatEventLog) {
        let dt = self.config.tick_seconds;
        self.slots.update(dt);
        self.formation.update(dt);

        let dead: Vec<CombatantId> = self
            .combatants
            .iter()
            .filter(|c| !c.is_alive())
            .map(|c| c.id)
            .collect();
        for id in dead {
            self.slots.remove_combatant(id);
            self.formation.remove_combatant(id);
            self.drivers.remove(&id);
        }

        if let Some(outcome) = check_encounter_end(&self.combatants) {
            self.outcome = Some(outcome);
            events.push(
                CombatEventType::EncounterEnded { outcome },
                format!("encounter ended: {:?}", outcome),
                self.tick,
            );
        }
    }

    fn position_of(&self, id: CombatantId) -> Option<Vec2> {
        self.combatant(id).map(|c| c.position)
    }
}

/// Encounter end check: a side with no living combatant has lost.
pub fn check_encounter_end(combatants: &[Combatant]) -> Option<EncounterOutcome> {
    let player_alive = combatants
        .iter()
        .any(|c| c.team == Team::Player && c.is_alive());
    let hostile_alive = combatants
        .iter()
        .any(|c| c.team == Team::Hostile && c.is_alive());
    match (player_alive, hostile_alive) {
        (true, true) => None,
        (true, false) => Some(EncounterOutcome::PlayerVictory),
        (false, true) => Some(EncounterOutcome::HostileVictory),
        (false, false) => Some(EncounterOutcome::MutualDown),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::combatant::Archetype;
    use crate::combat::skill::Loadout;
    use crate::combat::state::SkillState;

    fn fighter(name: &str, team: Team, position: Vec2) -> Combatant {
        Combatant::new(name, team, Archetype::Bruiser, Loadout::standard(10.0)).at(position)
    }

    #[test]
    fn test_check_encounter_end_variants() {
        let alive = fighter("a", Team::Player, Vec2::default());
        let mut dead = fighter("b", Team::Hostile, Vec2::default());
        dead.health = 0.0;

        assert_eq!(
            check_encounter_end(&[alive.clone(), dead.clone()]),
            Some(EncounterOutcome::PlayerVictory)
        );
        let mut dead_player = alive.clone();
        dead_player.health = 0.0;
        assert_eq!(
            check_encounter_end(&[dead_player, dead]),
            Some(EncounterOutcome::MutualDown)
        );
        let both = [
            fighter("a", Team::Player, Vec2::default()),
            fighter("b", Team::Hostile, Vec2::default()),
        ];
        assert_eq!(check_encounter_end(&both), None);
    }

    #[test]
    fn test_retarget_picks_nearest_survivor() {
        let mut arena = Arena::new(CombatConfig::default());
        let player = arena.spawn(fighter("hero", Team::Player, Vec2::new(0.0, 0.0)));
        let near = arena.spawn(fighter("near", Team::Hostile, Vec2::new(1.0, 0.0)));
        let _far = arena.spawn(fighter("far", Team::Hostile, Vec2::new(9.0, 0.0)));

        arena.run_tick();
        assert_eq!(arena.combatant(player).unwrap().target, Some(near));
    }

    #[test]
    fn test_player_request_flows_to_execution() {
        let mut arena = Arena::new(CombatConfig::default());
        let hero = arena.spawn(fighter("hero", Team::Player, Vec2::new(0.0, 0.0)));
        let grunt = arena.spawn(fighter("grunt", Team::Hostile, Vec2::new(1.0, 0.0)));

        arena.run_tick();
        arena.request_skill(hero, SkillKind::Light).unwrap();
        assert_eq!(
            arena.combatant(hero).unwrap().machine.state(),
            SkillState::Charging
        );

        // Light: 0.4s charge at 0.1s ticks, then activate, 0.1s startup.
        let mut saw_hit = false;
        for _ in 0..20 {
            if arena.combatant(hero).unwrap().machine.state() == SkillState::Charged {
                arena.activate_skill(hero).unwrap();
            }
            let log = arena.run_tick();
            if log.events.iter().any(|e| {
                matches!(e.event_type, CombatEventType::InteractionResolved { attacker, .. } if attacker == hero)
            }) {
                saw_hit = true;
                break;
            }
        }
        assert!(saw_hit, "light attack should resolve against the grunt");
        assert!(arena.combatant(grunt).unwrap().health < arena.combatant(grunt).unwrap().max_health);
    }

    #[test]
    fn test_offensive_request_without_target_is_target_lost() {
        let mut arena = Arena::new(CombatConfig::default());
        let hero = arena.spawn(fighter("hero", Team::Player, Vec2::new(0.0, 0.0)));

        // No hostiles exist, so no target is ever acquired.
        arena.run_tick();
        assert!(matches!(
            arena.request_skill(hero, SkillKind::Light),
            Err(CombatError::TargetLost(id)) if id == hero
        ));
        // Defensive skills need no target.
        arena.request_skill(hero, SkillKind::Block).unwrap();
    }

    #[test]
    fn test_finished_arena_stops_ticking() {
        let mut arena = Arena::new(CombatConfig::default());
        arena.spawn(fighter("hero", Team::Player, Vec2::new(0.0, 0.0)));
        let mut grunt = fighter("grunt", Team::Hostile, Vec2::new(1.0, 0.0));
        grunt.health = 0.0;
        arena.spawn(grunt);

        let log = arena.run_tick();
        assert!(log
            .events
            .iter()
            .any(|e| matches!(e.event_type, CombatEventType::EncounterEnded { .. })));
        assert!(arena.is_finished());
        let tick = arena.tick;
        assert!(arena.run_tick().events.is_empty());
        assert_eq!(arena.tick, tick, "finished encounters do not advance");
    }
}
