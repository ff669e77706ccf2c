//! Fundamental geometric and timing types.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::constants::TICK_MS;

/// Stable identifier assigned by the game client to each creature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CreatureId(pub u32);

impl std::fmt::Display for CreatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Tile coordinates in world space.
/// x = East, y = South (screen convention), z = floor level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TilePoint {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl TilePoint {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Horizontal offset from `self` to `other`.
    pub fn delta_2d(&self, other: &TilePoint) -> IVec2 {
        IVec2::new(other.x - self.x, other.y - self.y)
    }

    /// Chebyshev (king-move) distance, the natural tile metric.
    /// Different floors are treated as unreachable.
    pub fn chebyshev_distance(&self, other: &TilePoint) -> i32 {
        if self.z != other.z {
            return i32::MAX;
        }
        let d = self.delta_2d(other);
        d.x.abs().max(d.y.abs())
    }

    pub fn same_floor(&self, other: &TilePoint) -> bool {
        self.z == other.z
    }
}

/// Discrete 8-way facing direction as reported by the game client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    North,
    East,
    South,
    West,
    NorthEast,
    SouthEast,
    SouthWest,
    NorthWest,
}

impl Direction {
    /// Decode the client's raw 0-7 direction code.
    pub fn from_raw(raw: u8) -> Option<Direction> {
        match raw {
            0 => Some(Direction::North),
            1 => Some(Direction::East),
            2 => Some(Direction::South),
            3 => Some(Direction::West),
            4 => Some(Direction::NorthEast),
            5 => Some(Direction::SouthEast),
            6 => Some(Direction::SouthWest),
            7 => Some(Direction::NorthWest),
            _ => None,
        }
    }

    /// Unit step in tile space. y grows southward.
    pub fn unit(&self) -> IVec2 {
        match self {
            Direction::North => IVec2::new(0, -1),
            Direction::East => IVec2::new(1, 0),
            Direction::South => IVec2::new(0, 1),
            Direction::West => IVec2::new(-1, 0),
            Direction::NorthEast => IVec2::new(1, -1),
            Direction::SouthEast => IVec2::new(1, 1),
            Direction::SouthWest => IVec2::new(-1, 1),
            Direction::NorthWest => IVec2::new(-1, -1),
        }
    }

    pub fn is_diagonal(&self) -> bool {
        matches!(
            self,
            Direction::NorthEast
                | Direction::SouthEast
                | Direction::SouthWest
                | Direction::NorthWest
        )
    }
}

/// Engine time tracking.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SimTime {
    /// Current tick number (increments by 1 each tick).
    pub tick: u64,
    /// Elapsed engine time in milliseconds.
    pub elapsed_ms: u64,
}

impl SimTime {
    /// Advance by one tick.
    pub fn advance(&mut self) {
        self.tick += 1;
        self.elapsed_ms += TICK_MS;
    }

    pub fn now_ms(&self) -> u64 {
        self.elapsed_ms
    }
}
