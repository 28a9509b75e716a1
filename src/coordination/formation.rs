//! Spatial formation positions around a target
//!
//! A fixed ring of stand-off positions per defender. Assignment is
//! sticky: once a combatant holds a ring slot it keeps it until released
//! or reassigned, and reassignment is rate limited so crowds do not
//! shuffle every tick.

use crate::core::config::CombatConfig;
use crate::core::types::{CombatantId, Vec2};
use ahash::AHashMap;

/// Stand-off distance from the target for ring positions
pub const RING_RADIUS: f32 = 2.0;

#[derive(Debug, Clone)]
struct Ring {
    slots: Vec<Option<CombatantId>>,
}

/// Formation bookkeeping across all defenders
#[derive(Debug, Clone)]
pub struct FormationRing {
    slot_count: usize,
    reassign_cooldown_seconds: f32,
    rings: AHashMap<CombatantId, Ring>,
    /// Per-holder time until the next reassignment is allowed
    cooldowns: AHashMap<CombatantId, f32>,
    held: AHashMap<CombatantId, (CombatantId, usize)>,
}

impl FormationRing {
    pub fn new(config: &CombatConfig) -> Self {
        Self {
            slot_count: config.formation_slot_count,
            reassign_cooldown_seconds: config.formation_reassign_cooldown_seconds,
            rings: AHashMap::new(),
            cooldowns: AHashMap::new(),
            held: AHashMap::new(),
        }
    }

    /// Claim a ring slot around `target` for `holder`, preferring the slot
    /// nearest the holder's current bearing. Returns the assigned slot
    /// index, or None when the ring is full or the holder is still on
    /// reassignment cooldown for a different target.
    pub fn assign(
        &mut self,
        target: CombatantId,
        holder: CombatantId,
        holder_position: Vec2,
        target_position: Vec2,
    ) -> Option<usize> {
        if let Some(&(held_target, slot)) = self.held.get(&holder) {
            if held_target == target {
                return Some(slot);
            }
            if self.cooldowns.get(&holder).copied().unwrap_or(0.0) > 0.0 {
                return None;
            }
            self.release(holder);
        }

        let slot_count = self.slot_count;
        let ring = self
            .rings
            .entry(target)
            .or_insert_with(|| Ring { slots: vec![None; slot_count] });

        // Walk slots outward from the one facing the holder.
        let preferred = preferred_slot(holder_position, target_position, slot_count);
        let slot = (0..slot_count)
            .map(|offset| (preferred + offset) % slot_count)
            .find(|&i| ring.slots[i].is_none())?;

        ring.slots[slot] = Some(holder);
        self.held.insert(holder, (target, slot));
        self.cooldowns.insert(holder, self.reassign_cooldown_seconds);
        Some(slot)
    }

    /// World-space stand position for a held slot.
    pub fn slot_position(&self, holder: CombatantId, target_position: Vec2) -> Option<Vec2> {
        let &(_, slot) = self.held.get(&holder)?;
        let angle = std::f32::consts::TAU * slot as f32 / self.slot_count as f32;
        Some(Vec2::new(
            target_position.x + RING_RADIUS * angle.cos(),
            target_position.y + RING_RADIUS * angle.sin(),
        ))
    }

    pub fn release(&mut self, holder: CombatantId) {
        if let Some((target, slot)) = self.held.remove(&holder) {
            if let Some(ring) = self.rings.get_mut(&target) {
                ring.slots[slot] = None;
            }
        }
    }

    /// Drop a combatant entirely, both as holder and as ringed target.
    pub fn remove_combatant(&mut self, id: CombatantId) {
        self.release(id);
        if let Some(ring) = self.rings.remove(&id) {
            for holder in ring.slots.into_iter().flatten() {
                self.held.remove(&holder);
            }
        }
        self.cooldowns.remove(&id);
    }

    pub fn update(&mut self, dt: f32) {
        for remaining in self.cooldowns.values_mut() {
            *remaining -= dt;
        }
        self.cooldowns.retain(|_, remaining| *remaining > 0.0);
    }

    pub fn holders_around(&self, target: CombatantId) -> usize {
        self.rings
            .get(&target)
            .map_or(0, |ring| ring.slots.iter().flatten().count())
    }
}

fn preferred_slot(holder_position: Vec2, target_position: Vec2, slot_count: usize) -> usize {
    let delta = holder_position - target_position;
    if delta.length() < f32::EPSILON {
        return 0;
    }
    let angle = delta.y.atan2(delta.x).rem_euclid(std::f32::consts::TAU);
    let raw = (angle / std::f32::consts::TAU * slot_count as f32).round() as usize;
    raw % slot_count
}
