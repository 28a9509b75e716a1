pub mod config;
pub mod error;
pub mod types;

pub use config::CombatConfig;
pub use error::{CombatError, Result};
pub use types::{CombatantId, Team, Tick, Vec2};
