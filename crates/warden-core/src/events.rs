//! Creature lifecycle, movement, and combat events delivered by the host.
//!
//! Events are drained in arrival order at each tick boundary; within one
//! event, subsystems consume it in a fixed declared order (tracker first,
//! then feedback, then the threat cache). See `warden-engine`.

use serde::{Deserialize, Serialize};

use crate::access::CreatureSnapshot;
use crate::types::{CreatureId, Direction, TilePoint};

/// A single host-delivered event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CreatureEvent {
    /// A creature became visible.
    Appeared { snapshot: CreatureSnapshot },
    /// A creature stepped to a new tile.
    Moved {
        id: CreatureId,
        to: TilePoint,
        walking: bool,
    },
    /// A creature changed facing without moving.
    Turned { id: CreatureId, facing: Direction },
    /// A creature's health percentage changed.
    HealthChanged { id: CreatureId, health_pct: f64 },
    /// The agent took damage, attributed to a creature when known.
    DamageTaken {
        attacker: Option<CreatureId>,
        amount: u32,
    },
    /// A missile/beam effect was observed leaving a creature.
    MissileObserved {
        from: Option<CreatureId>,
        origin: TilePoint,
    },
    /// A creature died.
    Died { id: CreatureId },
    /// A creature left visibility without dying.
    Vanished { id: CreatureId },
}
