//! Advisory arbitration of scarce shared resources among AI combatants

pub mod attack_slots;
pub mod formation;

pub use attack_slots::AttackSlotBoard;
pub use formation::FormationRing;
