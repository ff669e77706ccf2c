//! Volume adaptation — the engine's only load-shedding mechanism.
//!
//! Under high hostile counts, sampling intervals and cache TTLs widen
//! and per-cycle tracker updates are round-robined by a deterministic
//! hash of creature id against a rotating cycle slot, bounding per-tick
//! cost.

use warden_core::constants::*;
use warden_core::enums::VolumeLevel;
use warden_core::types::CreatureId;

/// Current load-shedding state.
#[derive(Debug, Default)]
pub struct VolumeState {
    level: VolumeLevel,
    cycle: u64,
}

impl VolumeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-tier from the visible hostile count. Returns true on change.
    pub fn update(&mut self, hostile_count: usize) -> bool {
        let next = VolumeLevel::from_hostile_count(hostile_count);
        let changed = next != self.level;
        self.level = next;
        changed
    }

    pub fn level(&self) -> VolumeLevel {
        self.level
    }

    /// Main-update interval, widened under load.
    pub fn sample_interval_ms(&self) -> u64 {
        MAIN_UPDATE_INTERVAL_MS * self.interval_factor()
    }

    /// Threat-cache freshness window, widened under load.
    pub fn cache_ttl_ms(&self) -> u64 {
        THREAT_CACHE_TTL_MS * self.interval_factor()
    }

    /// Cooldown-estimator smoothing, slowed under load so sparse
    /// samples don't whip the estimate around.
    pub fn cooldown_alpha(&self) -> f64 {
        match self.level {
            VolumeLevel::Normal | VolumeLevel::Elevated => COOLDOWN_EWMA_ALPHA,
            VolumeLevel::High => 0.20,
            VolumeLevel::Extreme => 0.15,
        }
    }

    /// Whether this creature gets a tracker update this cycle.
    pub fn should_update(&self, id: CreatureId) -> bool {
        let stride = self.stride();
        if stride <= 1 {
            return true;
        }
        let hash = (id.0 as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15) >> 32;
        hash % stride == self.cycle % stride
    }

    /// Rotate the round-robin slot. Called once per main update.
    pub fn advance_cycle(&mut self) {
        self.cycle = self.cycle.wrapping_add(1);
    }

    fn interval_factor(&self) -> u64 {
        match self.level {
            VolumeLevel::Normal => 1,
            VolumeLevel::Elevated => 2,
            VolumeLevel::High => 3,
            VolumeLevel::Extreme => 4,
        }
    }

    fn stride(&self) -> u64 {
        self.interval_factor()
    }
}
