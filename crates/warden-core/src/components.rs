//! ECS components for the engine's creature mirror.
//!
//! Components are plain data structs with no methods.
//! Decision logic lives in warden-brain, wiring in warden-engine systems.

use serde::{Deserialize, Serialize};

/// Creature display name, the key for cross-session learning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
}

/// Live vitals mirrored from the game client.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Vitals {
    /// Health as a percentage in [0, 100].
    pub health_pct: f64,
    /// Current speed (tiles/sec equivalent).
    pub speed: f64,
    /// Unhasted base speed.
    pub base_speed: f64,
    pub alive: bool,
    pub walking: bool,
}

/// Marks an entity as a hostile creature.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Hostile;

// Position (TilePoint) and Facing (Direction) are defined in types.rs
// and used as components directly.
