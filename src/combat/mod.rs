pub mod combatant;
pub mod constants;
pub mod crowd_control;
pub mod machine;
pub mod skill;
pub mod stamina;
pub mod state;

pub use combatant::{Archetype, Combatant, DisableStatus};
pub use crowd_control::{CcMeter, CcTrigger};
pub use machine::{ForcedCause, MachineEvent, SkillStateMachine};
pub use skill::{Loadout, SkillClass, SkillKind, SkillProfile};
pub use stamina::StaminaMeter;
pub use state::SkillState;
