//! Enumeration types used throughout the agent.

use serde::{Deserialize, Serialize};

/// Observed movement archetype for a creature type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementPattern {
    /// Not enough samples to tell.
    #[default]
    Unknown,
    /// Barely moves; turret-style attacker.
    Static,
    /// Closes distance toward the agent.
    Chase,
    /// Keeps distance, retreats when approached.
    Kite,
    /// No stable pattern.
    Erratic,
}

/// Danger aggregate for a position or creature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DangerLevel {
    #[default]
    None,
    Low,
    Moderate,
    High,
    Critical,
}

/// Coarse classification of the current encounter by nearby hostile count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScenarioKind {
    #[default]
    Idle,
    Single,
    Few,
    Moderate,
    Swarm,
    Overwhelming,
}

impl ScenarioKind {
    /// Map a nearby live hostile count onto a scenario.
    pub fn from_hostile_count(count: usize) -> ScenarioKind {
        match count {
            0 => ScenarioKind::Idle,
            1 => ScenarioKind::Single,
            2..=3 => ScenarioKind::Few,
            4..=6 => ScenarioKind::Moderate,
            7..=10 => ScenarioKind::Swarm,
            _ => ScenarioKind::Overwhelming,
        }
    }
}

/// Load-shedding tier driven by visible hostile count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VolumeLevel {
    #[default]
    Normal,
    Elevated,
    High,
    Extreme,
}

impl VolumeLevel {
    pub fn from_hostile_count(count: usize) -> VolumeLevel {
        use crate::constants::*;
        if count >= VOLUME_EXTREME_COUNT {
            VolumeLevel::Extreme
        } else if count >= VOLUME_HIGH_COUNT {
            VolumeLevel::High
        } else if count >= VOLUME_ELEVATED_COUNT {
            VolumeLevel::Elevated
        } else {
            VolumeLevel::Normal
        }
    }
}

/// Lifecycle of a queued attack prediction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredictionOutcome {
    #[default]
    Pending,
    /// Corroborating damage arrived inside the correlation window.
    Correct,
    /// Damage arrived with no matching prediction.
    Missed,
    /// The window passed without corroborating damage.
    FalsePositive,
}

/// Reason tag attached to a prediction, also the feedback category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackKind {
    /// Directional beam/wave attack along the attacker's facing.
    Wave,
    /// Adjacent-tile strike.
    Melee,
}
