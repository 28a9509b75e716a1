//! Per-combatant skill state machine
//!
//! Every state change, requested or forced, funnels through one private
//! `transition()` that runs the outgoing state's exit hook before the
//! incoming state's enter hook. Callers never swap the state directly, so
//! cleanup (refunds, movement locks, guard flags) can never be skipped.

use crate::combat::constants::{AIM_ACCURACY_PER_SECOND, AIM_MIN_ACCURACY, REFUND_CANCELED_CHARGE};
use crate::combat::skill::{Loadout, SkillClass, SkillKind};
use crate::combat::stamina::StaminaMeter;
use crate::combat::state::SkillState;
use crate::core::error::CombatError;
use crate::core::types::Tick;

/// Why a forced transition was applied
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ForcedCause {
    /// Block held against the attacker; extended Recovery lockout
    Stun { recovery_seconds: f32 },
    /// CC meter crossed its top threshold; cancels any charge
    Knockdown { recovery_seconds: f32 },
    /// Slower half of a simultaneous-offense pair
    Interrupted { recovery_seconds: f32 },
    /// Defensive window spent its one-shot; normal Recovery follows
    GuardSpent,
    /// Target loss, manual cancel or disable during windup
    Cancel,
}

/// Observable result of one `update` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineEvent {
    /// Charging finished; awaiting the activation trigger
    ChargeComplete(SkillKind),
    /// Entered Active; the hit must be registered with the resolver
    Activated(SkillKind),
    /// Defensive skill entered its exposure window
    WaitingStarted(SkillKind),
    /// Exposure window timed out with no hit faced
    WaitingExpired,
    /// Stamina hit zero mid-Waiting; forced Recovery, no block credit
    WaitingDepleted,
    /// Recovery lockout finished; back to Uncharged
    Recovered,
}

#[derive(Debug, Clone)]
pub struct SkillStateMachine {
    state: SkillState,
    kind: Option<SkillKind>,
    /// Seconds remaining in the current timed state
    timer: f32,
    /// Aim accuracy ramp, 0.0 to 1.0 (Aiming only)
    accuracy: f32,
    /// One-shot defense already spent for the current Waiting window
    guard_consumed: bool,
    /// Set by enter hooks of committed states, cleared by every exit hook
    movement_locked: bool,
    /// Tick at which the current skill was requested
    charge_started: Tick,
}

impl Default for SkillStateMachine {
    fn default() -> Self {
        Self {
            state: SkillState::Uncharged,
            kind: None,
            timer: 0.0,
            accuracy: 0.0,
            guard_consumed: false,
            movement_locked: false,
            charge_started: 0,
        }
    }
}

impl SkillStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SkillState {
        self.state
    }

    pub fn current_kind(&self) -> Option<SkillKind> {
        self.kind
    }

    pub fn movement_locked(&self) -> bool {
        self.movement_locked
    }

    pub fn accuracy(&self) -> f32 {
        self.accuracy
    }

    pub fn charge_started(&self) -> Tick {
        self.charge_started
    }

    /// A live, unspent defensive window the resolver may assign a hit to
    pub fn guard_available(&self) -> bool {
        self.state == SkillState::Waiting && !self.guard_consumed
    }

    /// Resolver marks the one-shot defense as spent for this window.
    pub fn consume_guard(&mut self) {
        self.guard_consumed = true;
    }

    /// Begin a skill. Fails without any state change unless the machine is
    /// Uncharged, the loadout knows the kind, the combatant is not disabled,
    /// any range precondition holds, and stamina covers the cost.
    pub fn request_skill(
        &mut self,
        kind: SkillKind,
        loadout: &Loadout,
        stamina: &mut StaminaMeter,
        distance_to_target: Option<f32>,
        disabled: bool,
        now: Tick,
    ) -> Result<(), CombatError> {
        if disabled || !self.state.accepts_request() {
            return Err(CombatError::InvalidTransition {
                current: self.state,
                requested: kind,
            });
        }

        let profile = loadout
            .profile(kind)
            .ok_or(CombatError::InvalidTransition {
                current: self.state,
                requested: kind,
            })?;

        // Range precondition only binds offensive skills with a reach.
        if kind.class() == SkillClass::Offensive && profile.range > 0.0 {
            if let Some(distance) = distance_to_target {
                if distance > profile.range {
                    return Err(CombatError::InvalidTransition {
                        current: self.state,
                        requested: kind,
                    });
                }
            }
        }

        stamina.reserve(profile.stamina_cost)?;

        self.kind = Some(kind);
        self.charge_started = now;

        let first = if kind.is_aimed() {
            SkillState::Aiming
        } else if kind.is_instant() {
            SkillState::Startup
        } else {
            SkillState::Charging
        };
        self.transition(first, loadout, stamina);
        Ok(())
    }

    /// Fire a fully wound skill: Charged -> Startup, or Aiming -> Startup
    /// once the minimum accuracy is reached.
    pub fn activate(
        &mut self,
        loadout: &Loadout,
        stamina: &mut StaminaMeter,
    ) -> Result<(), CombatError> {
        let ready = match self.state {
            SkillState::Charged => true,
            SkillState::Aiming => self.accuracy >= AIM_MIN_ACCURACY,
            _ => false,
        };
        if !ready {
            return Err(CombatError::InvalidTransition {
                current: self.state,
                requested: self.kind.unwrap_or(SkillKind::Light),
            });
        }
        self.transition(SkillState::Startup, loadout, stamina);
        Ok(())
    }

    /// Cancel a pre-commit skill back to Uncharged. Committed states refuse.
    pub fn cancel(
        &mut self,
        loadout: &Loadout,
        stamina: &mut StaminaMeter,
    ) -> Result<(), CombatError> {
        if self.state == SkillState::Uncharged {
            return Ok(());
        }
        if !self.state.is_cancelable() {
            return Err(CombatError::InvalidTransition {
                current: self.state,
                requested: self.kind.unwrap_or(SkillKind::Light),
            });
        }
        self.transition(SkillState::Uncharged, loadout, stamina);
        Ok(())
    }

    /// Externally forced interruption (resolver outcome, CC trigger, target
    /// loss). Runs the same exit/enter hook pair as every other transition.
    pub fn force_transition(
        &mut self,
        cause: ForcedCause,
        loadout: &Loadout,
        stamina: &mut StaminaMeter,
    ) {
        tracing::debug!(state = ?self.state, ?cause, "forced transition");
        match cause {
            ForcedCause::Cancel => {
                self.transition(SkillState::Uncharged, loadout, stamina);
            }
            ForcedCause::GuardSpent => {
                self.transition(SkillState::Recovery, loadout, stamina);
            }
            ForcedCause::Stun { recovery_seconds }
            | ForcedCause::Knockdown { recovery_seconds }
            | ForcedCause::Interrupted { recovery_seconds } => {
                self.transition(SkillState::Recovery, loadout, stamina);
                // Forced lockouts override the profile's recovery span.
                self.timer = self.timer.max(recovery_seconds);
            }
        }
    }

    /// Advance timers and charge progress by `dt` seconds.
    ///
    /// `waiting_drain` is the stamina drained over this step while holding a
    /// Waiting window; the caller computes it from config so the machine
    /// stays free of pacing knowledge.
    pub fn update(
        &mut self,
        dt: f32,
        loadout: &Loadout,
        stamina: &mut StaminaMeter,
        waiting_drain: f32,
    ) -> Vec<MachineEvent> {
        let mut events = Vec::new();

        match self.state {
            SkillState::Uncharged | SkillState::Charged => {}

            SkillState::Aiming => {
                self.accuracy = (self.accuracy + AIM_ACCURACY_PER_SECOND * dt).min(1.0);
            }

            SkillState::Charging => {
                self.timer -= dt;
                if self.timer <= 0.0 {
                    let kind = self.kind.expect("charging without a kind");
                    self.transition(SkillState::Charged, loadout, stamina);
                    events.push(MachineEvent::ChargeComplete(kind));
                }
            }

            SkillState::Startup => {
                self.timer -= dt;
                if self.timer <= 0.0 {
                    let kind = self.kind.expect("startup without a kind");
                    self.transition(SkillState::Active, loadout, stamina);
                    events.push(MachineEvent::Activated(kind));
                }
            }

            SkillState::Active => {
                self.timer -= dt;
                if self.timer <= 0.0 {
                    let kind = self.kind.expect("active without a kind");
                    if kind.class() == SkillClass::Defensive {
                        self.transition(SkillState::Waiting, loadout, stamina);
                        events.push(MachineEvent::WaitingStarted(kind));
                    } else {
                        self.transition(SkillState::Recovery, loadout, stamina);
                    }
                }
            }

            SkillState::Waiting => {
                stamina.drain(waiting_drain);
                self.timer -= dt;
                if stamina.is_depleted() {
                    // Partial execution: no hit credit, no refund.
                    self.transition(SkillState::Recovery, loadout, stamina);
                    events.push(MachineEvent::WaitingDepleted);
                } else if self.timer <= 0.0 {
                    self.transition(SkillState::Recovery, loadout, stamina);
                    events.push(MachineEvent::WaitingExpired);
                }
            }

            SkillState::Recovery => {
                self.timer -= dt;
                if self.timer <= 0.0 {
                    self.transition(SkillState::Uncharged, loadout, stamina);
                    events.push(MachineEvent::Recovered);
                }
            }
        }

        events
    }

    /// The single transition routine: exit hook of the old state, then state
    /// swap, then enter hook of the new state. No other code assigns
    /// `self.state`.
    fn transition(&mut self, to: SkillState, loadout: &Loadout, stamina: &mut StaminaMeter) {
        let from = self.state;
        self.exit_hook(from, to, stamina);
        self.state = to;
        self.enter_hook(to, loadout, stamina);
        tracing::trace!(?from, ?to, "skill state transition");
    }

    fn exit_hook(&mut self, from: SkillState, to: SkillState, stamina: &mut StaminaMeter) {
        // Guaranteed cleanup: restrictions never outlive their state.
        self.movement_locked = false;

        // Leaving a pre-commit state anywhere but forward into the
        // lifecycle means the windup was abandoned.
        let abandoned = from.is_cancelable()
            && !matches!(to, SkillState::Charged | SkillState::Startup | SkillState::Active);
        if abandoned {
            if REFUND_CANCELED_CHARGE {
                stamina.refund();
            } else {
                stamina.commit();
            }
        }

        if from == SkillState::Waiting {
            self.guard_consumed = false;
        }
        // Abandoning an aim loses the ramp; firing (Startup) keeps it so
        // the resolver can scale damage by it.
        if from == SkillState::Aiming && to != SkillState::Startup {
            self.accuracy = 0.0;
        }
    }

    fn enter_hook(&mut self, to: SkillState, loadout: &Loadout, stamina: &mut StaminaMeter) {
        let profile = self.kind.and_then(|k| loadout.profile(k));
        match to {
            SkillState::Uncharged => {
                self.kind = None;
                self.timer = 0.0;
                self.accuracy = 0.0;
            }
            SkillState::Charging => {
                self.timer = profile.map(|p| p.charge_seconds).unwrap_or(0.0);
            }
            SkillState::Aiming => {
                self.accuracy = 0.0;
            }
            SkillState::Charged => {
                self.timer = 0.0;
            }
            SkillState::Startup => {
                // Commitment point: the reserved cost is spent for good.
                stamina.commit();
                self.movement_locked = true;
                self.timer = profile.map(|p| p.startup_seconds).unwrap_or(0.0);
            }
            SkillState::Active => {
                self.movement_locked = true;
                self.timer = profile.map(|p| p.active_seconds).unwrap_or(0.0);
            }
            SkillState::Waiting => {
                self.movement_locked = true;
                self.guard_consumed = false;
                self.timer = profile.map(|p| p.waiting_seconds).unwrap_or(0.0);
            }
            SkillState::Recovery => {
                self.movement_locked = true;
                self.timer = profile.map(|p| p.recovery_seconds).unwrap_or(0.0);
            }
        }
    }
}
