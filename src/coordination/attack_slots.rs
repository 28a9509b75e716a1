//! Bounded "permission to attack now" slots per defender
//!
//! Caps how many attackers may press one defender at once. Advisory: the
//! decision engine consults the board through a guard condition, the
//! state machine never sees it.

use crate::combat::combatant::Archetype;
use crate::core::config::CombatConfig;
use crate::core::types::CombatantId;
use ahash::AHashMap;

#[derive(Debug, Clone)]
struct AttackSlot {
    holder: CombatantId,
    priority: u8,
    remaining_seconds: f32,
}

/// Slot bookkeeping for every defender under pressure
#[derive(Debug, Clone)]
pub struct AttackSlotBoard {
    capacity: usize,
    expiry_seconds: f32,
    slots: AHashMap<CombatantId, Vec<AttackSlot>>,
}

impl AttackSlotBoard {
    pub fn new(config: &CombatConfig) -> Self {
        Self {
            capacity: config.attack_slot_capacity,
            expiry_seconds: config.attack_slot_expiry_seconds,
            slots: AHashMap::new(),
        }
    }

    /// Ask for permission to attack `defender`. Re-requesting while holding
    /// refreshes the expiry timer. A full board is preempted only by a
    /// strictly higher archetype priority; the lowest holder is evicted.
    pub fn request(
        &mut self,
        defender: CombatantId,
        attacker: CombatantId,
        archetype: Archetype,
    ) -> bool {
        let priority = archetype.slot_priority();
        let slots = self.slots.entry(defender).or_default();

        if let Some(slot) = slots.iter_mut().find(|s| s.holder == attacker) {
            slot.remaining_seconds = self.expiry_seconds;
            return true;
        }
        if slots.len() < self.capacity {
            slots.push(AttackSlot {
                holder: attacker,
                priority,
                remaining_seconds: self.expiry_seconds,
            });
            return true;
        }

        let weakest = slots
            .iter()
            .enumerate()
            .min_by_key(|(_, s)| s.priority)
            .map(|(i, s)| (i, s.priority));
        if let Some((index, held_priority)) = weakest {
            if priority > held_priority {
                tracing::debug!(?defender, evicted = ?slots[index].holder, "attack slot preempted");
                slots[index] = AttackSlot {
                    holder: attacker,
                    priority,
                    remaining_seconds: self.expiry_seconds,
                };
                return true;
            }
        }
        false
    }

    pub fn holds(&self, defender: CombatantId, attacker: CombatantId) -> bool {
        self.slots
            .get(&defender)
            .is_some_and(|slots| slots.iter().any(|s| s.holder == attacker))
    }

    pub fn release(&mut self, defender: CombatantId, attacker: CombatantId) {
        if let Some(slots) = self.slots.get_mut(&defender) {
            slots.retain(|s| s.holder != attacker);
        }
    }

    /// Drop every slot a combatant holds or defends. Called on death.
    pub fn remove_combatant(&mut self, id: CombatantId) {
        self.slots.remove(&id);
        for slots in self.slots.values_mut() {
            slots.retain(|s| s.holder != id);
        }
    }

    /// Tick expiry timers; slots not refreshed within the window lapse.
    pub fn update(&mut self, dt: f32) {
        for slots in self.slots.values_mut() {
            for slot in slots.iter_mut() {
                slot.remaining_seconds -= dt;
            }
            slots.retain(|s| s.remaining_seconds > 0.0);
        }
        self.slots.retain(|_, slots| !slots.is_empty());
    }

    pub fn held_against(&self, defender: CombatantId) -> usize {
        self.slots.get(&defender).map_or(0, |s| s.len())
    }
}
