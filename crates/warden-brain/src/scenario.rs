//! Per-scenario engagement policy profiles.
//!
//! Consolidates the lock/switch tuning applied at each encounter scale.

use warden_core::enums::ScenarioKind;

/// Engagement policy for one scenario.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenarioProfile {
    /// Minimum time between approved target switches (ms).
    pub switch_cooldown_ms: u64,
    /// Priority bonus granted to the currently locked target.
    pub stickiness_bonus: f64,
    /// Fractional priority margin a challenger must exceed.
    pub switch_margin: f64,
    /// The larger margin applied while the locked target is visibly
    /// losing health.
    pub progress_margin: f64,
    /// Whether rapid target alternation is tolerated at this scale.
    pub tolerate_zigzag: bool,
    /// Hard cap on approved switches per rolling minute.
    pub max_switches_per_min: u32,
    /// Whether an attack command hard-locks the target until it dies.
    pub require_engagement_lock: bool,
}

/// Get the engagement policy for a scenario.
pub fn profile(kind: ScenarioKind) -> ScenarioProfile {
    match kind {
        ScenarioKind::Idle => ScenarioProfile {
            switch_cooldown_ms: 0,
            stickiness_bonus: 0.0,
            switch_margin: 0.0,
            progress_margin: 0.0,
            tolerate_zigzag: true,
            max_switches_per_min: 60,
            require_engagement_lock: false,
        },
        ScenarioKind::Single => ScenarioProfile {
            switch_cooldown_ms: 2_500,
            stickiness_bonus: 120.0,
            switch_margin: 0.30,
            progress_margin: 0.80,
            tolerate_zigzag: false,
            max_switches_per_min: 8,
            require_engagement_lock: true,
        },
        ScenarioKind::Few => ScenarioProfile {
            switch_cooldown_ms: 2_000,
            stickiness_bonus: 100.0,
            switch_margin: 0.25,
            progress_margin: 0.70,
            tolerate_zigzag: false,
            max_switches_per_min: 10,
            require_engagement_lock: true,
        },
        ScenarioKind::Moderate => ScenarioProfile {
            switch_cooldown_ms: 1_500,
            stickiness_bonus: 80.0,
            switch_margin: 0.20,
            progress_margin: 0.60,
            tolerate_zigzag: false,
            max_switches_per_min: 12,
            require_engagement_lock: true,
        },
        ScenarioKind::Swarm => ScenarioProfile {
            switch_cooldown_ms: 1_000,
            stickiness_bonus: 50.0,
            switch_margin: 0.15,
            progress_margin: 0.40,
            tolerate_zigzag: true,
            max_switches_per_min: 20,
            require_engagement_lock: false,
        },
        ScenarioKind::Overwhelming => ScenarioProfile {
            switch_cooldown_ms: 800,
            stickiness_bonus: 30.0,
            switch_margin: 0.10,
            progress_margin: 0.30,
            tolerate_zigzag: true,
            max_switches_per_min: 30,
            require_engagement_lock: false,
        },
    }
}
