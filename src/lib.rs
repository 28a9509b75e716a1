//! Skirmish - deterministic real-time combat resolution core

pub mod combat;
pub mod coordination;
pub mod core;
pub mod encounter;
pub mod pattern;
pub mod resolve;
