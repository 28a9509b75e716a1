//! Combatant aggregate
//!
//! One participant in an encounter: identity, skill state machine, meters,
//! loadout reference and a weak target handle. State and meters are mutated
//! only by the combatant's own machine and, during resolution, by the
//! interaction resolver.

use crate::combat::crowd_control::{CcMeter, CcTrigger};
use crate::combat::machine::{ForcedCause, MachineEvent, SkillStateMachine};
use crate::combat::skill::{Loadout, SkillKind};
use crate::combat::stamina::StaminaMeter;
use crate::combat::state::SkillState;
use crate::core::config::CombatConfig;
use crate::core::error::CombatError;
use crate::core::types::{CombatantId, Team, Tick, Vec2};
use serde::{Deserialize, Serialize};

/// Behavioral archetype, used for attack-slot priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    /// Front-line pressure; highest claim on attack slots
    Bruiser,
    /// Mobile harasser
    Skirmisher,
    /// Stand-off ranged attacker; lowest slot priority
    Sniper,
}

impl Archetype {
    /// Higher wins contested slot claims
    pub fn slot_priority(&self) -> u8 {
        match self {
            Archetype::Bruiser => 3,
            Archetype::Skirmisher => 2,
            Archetype::Sniper => 1,
        }
    }
}

/// Active forced-disable interval from a CC threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisableStatus {
    pub trigger: CcTrigger,
    pub remaining_seconds: f32,
}

#[derive(Debug, Clone)]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    pub team: Team,
    pub archetype: Archetype,
    pub position: Vec2,
    pub loadout: Loadout,
    pub machine: SkillStateMachine,
    pub stamina: StaminaMeter,
    pub cc: CcMeter,
    pub health: f32,
    pub max_health: f32,
    /// Weak lookup handle; the target may have left the encounter
    pub target: Option<CombatantId>,
    pub disable: Option<DisableStatus>,
}

impl Combatant {
    pub fn new(name: impl Into<String>, team: Team, archetype: Archetype, loadout: Loadout) -> Self {
        Self {
            id: CombatantId::new(),
            name: name.into(),
            team,
            archetype,
            position: Vec2::default(),
            loadout,
            machine: SkillStateMachine::new(),
            stamina: StaminaMeter::default(),
            cc: CcMeter::new(),
            health: 100.0,
            max_health: 100.0,
            target: None,
            disable: None,
        }
    }

    pub fn at(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn targeting(mut self, target: CombatantId) -> Self {
        self.target = Some(target);
        self
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Under a forced-disable interval: no new skill requests
    pub fn is_disabled(&self) -> bool {
        self.disable.is_some()
    }

    /// Resting: idle and unhindered. The only state with stamina regen.
    pub fn is_resting(&self) -> bool {
        self.machine.state() == SkillState::Uncharged && self.disable.is_none()
    }

    /// Player/decision entry point for starting a skill
    pub fn request_skill(
        &mut self,
        kind: SkillKind,
        distance_to_target: Option<f32>,
        now: Tick,
    ) -> Result<(), CombatError> {
        if !self.is_alive() {
            return Err(CombatError::InvalidTransition {
                current: self.machine.state(),
                requested: kind,
            });
        }
        let disabled = self.is_disabled();
        self.machine.request_skill(
            kind,
            &self.loadout,
            &mut self.stamina,
            distance_to_target,
            disabled,
            now,
        )
    }

    pub fn cancel_current_skill(&mut self) -> Result<(), CombatError> {
        self.machine.cancel(&self.loadout, &mut self.stamina)
    }

    pub fn activate(&mut self) -> Result<(), CombatError> {
        self.machine.activate(&self.loadout, &mut self.stamina)
    }

    pub fn force_transition(&mut self, cause: ForcedCause) {
        self.machine
            .force_transition(cause, &self.loadout, &mut self.stamina);
    }

    /// Advance the machine, the disable timer and the meters by one tick.
    pub fn update(&mut self, config: &CombatConfig) -> Vec<MachineEvent> {
        let dt = config.tick_seconds;

        if let Some(disable) = &mut self.disable {
            disable.remaining_seconds -= dt;
            if disable.remaining_seconds <= 0.0 {
                self.disable = None;
            }
        } else {
            // No passive decay while a threshold-triggered disable holds.
            self.cc.decay(config.cc_decay_per_second * dt);
        }

        let waiting_drain = if self.machine.state() == SkillState::Waiting {
            config.waiting_drain_per_second * dt
        } else {
            0.0
        };
        let events = self
            .machine
            .update(dt, &self.loadout, &mut self.stamina, waiting_drain);

        if self.is_resting() {
            self.stamina.regen(config.rest_regen_per_second * dt);
        }

        events
    }

    pub fn apply_damage(&mut self, amount: f32) {
        self.health = (self.health - amount).max(0.0);
        if !self.is_alive() {
            // A dead combatant stops acting; park the machine cleanly.
            self.force_transition(ForcedCause::Cancel);
        }
    }

    /// Feed punishment into the CC meter and apply the resulting disable.
    ///
    /// Knockback leaves an in-progress charge untouched; knockdown cancels
    /// it through the forced Recovery path.
    pub fn receive_cc(&mut self, amount: f32, config: &CombatConfig) -> Option<CcTrigger> {
        let trigger = self.cc.add(amount)?;
        match trigger {
            CcTrigger::Knockback => {
                self.disable = Some(DisableStatus {
                    trigger,
                    remaining_seconds: config.knockback_disable_seconds,
                });
            }
            CcTrigger::Knockdown => self.apply_knockdown(config),
        }
        Some(trigger)
    }

    /// Forced knockdown, bypassing the CC meter (broken block, reflect).
    pub fn apply_knockdown(&mut self, config: &CombatConfig) {
        self.disable = Some(DisableStatus {
            trigger: CcTrigger::Knockdown,
            remaining_seconds: config.knockdown_disable_seconds,
        });
        self.force_transition(ForcedCause::Knockdown {
            recovery_seconds: config.knockdown_disable_seconds,
        });
    }

    pub fn distance_to(&self, other: &Combatant) -> f32 {
        self.position.distance(&other.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::constants::CC_KNOCKBACK_THRESHOLD;

    fn duelist(team: Team) -> Combatant {
        Combatant::new("duelist", team, Archetype::Bruiser, Loadout::standard(10.0))
    }

    #[test]
    fn test_knockback_preserves_charge() {
        let config = CombatConfig::default();
        let mut c = duelist(Team::Player);
        c.request_skill(SkillKind::Heavy, None, 0).unwrap();
        assert_eq!(c.machine.state(), SkillState::Charging);

        let trigger = c.receive_cc(CC_KNOCKBACK_THRESHOLD, &config);
        assert_eq!(trigger, Some(CcTrigger::Knockback));
        assert!(c.is_disabled());
        // Charge in progress survives a knockback
        assert_eq!(c.machine.state(), SkillState::Charging);
    }

    #[test]
    fn test_knockdown_cancels_charge() {
        let config = CombatConfig::default();
        let mut c = duelist(Team::Player);
        c.request_skill(SkillKind::Heavy, None, 0).unwrap();

        let trigger = c.receive_cc(150.0, &config);
        assert_eq!(trigger, Some(CcTrigger::Knockdown));
        assert_eq!(c.machine.state(), SkillState::Recovery);
        assert!(c.is_disabled());
    }

    #[test]
    fn test_disabled_combatant_cannot_request() {
        let config = CombatConfig::default();
        let mut c = duelist(Team::Player);
        c.receive_cc(CC_KNOCKBACK_THRESHOLD, &config);
        assert!(c.is_disabled());

        assert!(matches!(
            c.request_skill(SkillKind::Light, None, 0),
            Err(CombatError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_disable_expires() {
        let config = CombatConfig::default();
        let mut c = duelist(Team::Player);
        c.receive_cc(CC_KNOCKBACK_THRESHOLD, &config);
        assert!(c.is_disabled());

        let ticks = (config.knockback_disable_seconds / config.tick_seconds) as u32 + 2;
        for _ in 0..ticks {
            c.update(&config);
        }
        assert!(!c.is_disabled());
    }

    #[test]
    fn test_no_cc_decay_while_disabled() {
        let config = CombatConfig::default();
        let mut c = duelist(Team::Player);
        c.receive_cc(CC_KNOCKBACK_THRESHOLD, &config);
        let value_before = c.cc.value();
        c.update(&config);
        // Disabled this tick: the meter held its value
        assert_eq!(c.cc.value(), value_before);
    }

    #[test]
    fn test_rest_regen_only_when_idle() {
        let config = CombatConfig::default();
        let mut c = duelist(Team::Player);
        c.stamina.drain(50.0);

        c.request_skill(SkillKind::Heavy, None, 0).unwrap();
        let engaged = c.stamina.current();
        c.update(&config);
        assert!(c.stamina.current() <= engaged + 0.001);

        c.cancel_current_skill().unwrap();
        let idle = c.stamina.current();
        c.update(&config);
        assert!(c.stamina.current() > idle);
    }

    #[test]
    fn test_death_parks_machine() {
        let mut c = duelist(Team::Hostile);
        c.request_skill(SkillKind::Heavy, None, 0).unwrap();
        c.apply_damage(500.0);
        assert!(!c.is_alive());
        assert_eq!(c.machine.state(), SkillState::Uncharged);
        assert!(c.request_skill(SkillKind::Light, None, 0).is_err());
    }

    #[test]
    fn test_archetype_priority_ordering() {
        assert!(Archetype::Bruiser.slot_priority() > Archetype::Skirmisher.slot_priority());
        assert!(Archetype::Skirmisher.slot_priority() > Archetype::Sniper.slot_priority());
    }
}
