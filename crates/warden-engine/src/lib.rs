//! Event-and-timer driven engine for the WARDEN combat agent.
//!
//! Owns a hecs world mirroring visible creatures, drains host events at
//! tick boundaries, runs the decision systems in a fixed order, and
//! produces `AgentSnapshot`s. Completely headless, enabling
//! deterministic testing.

pub mod engine;
pub mod persist;
pub mod systems;
pub mod volume;

pub use engine::{CombatEngine, EngineConfig};
pub use warden_core as core;

#[cfg(test)]
mod tests;
