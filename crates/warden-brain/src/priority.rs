//! Multi-factor target priority scoring.
//!
//! A pure function of candidate state: no registry access, no side
//! effects beyond the optional diagnostic breakdown.

use warden_core::constants::*;

use crate::feedback::AdaptiveWeights;
use crate::tracker::Trajectory;

// Distance tiers (tiles) and their bonuses.
const MELEE_RANGE: i32 = 1;
const CLOSE_RANGE: i32 = 3;
const MEDIUM_RANGE: i32 = 6;
const MELEE_BONUS: f64 = 80.0;
const CLOSE_BONUS: f64 = 55.0;
const MEDIUM_BONUS: f64 = 30.0;
const FAR_BONUS: f64 = 10.0;

// Health tiers (percent).
const CRITICAL_HEALTH_PCT: f64 = 15.0;
const LOW_HEALTH_PCT: f64 = 30.0;
const MEDIUM_HEALTH_PCT: f64 = 60.0;
const CRITICAL_HEALTH_BONUS: f64 = 70.0;
const LOW_HEALTH_BONUS: f64 = 45.0;
const MEDIUM_HEALTH_BONUS: f64 = 20.0;

// Tracker-derived tiers.
const HIGH_DPS_BONUS: f64 = 40.0;
const MID_DPS_BONUS: f64 = 20.0;
const MANY_HITS: u32 = 5;
const SOME_HITS: u32 = 2;
const MANY_HITS_BONUS: f64 = 15.0;
const SOME_HITS_BONUS: f64 = 8.0;
const RECENT_ATTACK_MS: u64 = 2_000;
const STALE_ATTACK_MS: u64 = 5_000;
const RECENT_ATTACK_BONUS: f64 = 25.0;
const STALE_ATTACK_BONUS: f64 = 10.0;
const MANY_WAVES_BONUS: f64 = 20.0;
const SOME_WAVES_BONUS: f64 = 10.0;

// Imminence. The single largest bonus; the full amount requires the
// cooldown to be mostly elapsed.
const IMMINENT_BONUS: f64 = 150.0;
const IMMINENT_PARTIAL_BONUS: f64 = 90.0;
const SOON_THRESHOLD_MS: f64 = 1_000.0;
const SOON_BONUS: f64 = 60.0;
const IMMINENT_COOLDOWN_RATIO: f64 = 0.8;

// Geometry.
const FACING_BONUS: f64 = 25.0;
const WAVE_PATH_BONUS: f64 = 35.0;

// Classification.
const CLASS_DANGER_SCALE: f64 = 15.0;
const WAVE_ATTACKER_BONUS: f64 = 10.0;
const AGGRESSIVE_BONUS: f64 = 10.0;

// Trajectory.
const APPROACHING_BONUS: f64 = 15.0;
const FLEEING_PENALTY: f64 = 20.0;

/// Everything the scorer needs to know about one candidate.
#[derive(Debug, Clone)]
pub struct PriorityContext {
    pub distance_tiles: i32,
    pub health_pct: f64,

    // Tracker-derived.
    pub dps: f64,
    pub hit_count: u32,
    pub ms_since_last_attack: Option<u64>,
    pub wave_count: u32,

    // Prediction-derived.
    pub imminent: bool,
    pub time_to_attack_ms: f64,
    /// elapsed-since-last-attack / predicted cooldown, in [0, ∞).
    pub cooldown_ratio: f64,
    pub facing_player: bool,
    pub player_in_wave_path: bool,

    // Classification-derived.
    pub class_danger: f64,
    pub is_wave_attacker: bool,
    pub is_aggressive: bool,

    pub trajectory: Trajectory,

    pub weights: AdaptiveWeights,
    /// Feedback-loop multiplier in [0.5, 1.5].
    pub adaptive_multiplier: f64,
}

/// Additive breakdown of a score, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PriorityBreakdown {
    pub base: f64,
    pub distance: f64,
    pub health: f64,
    pub tracker: f64,
    pub imminent: f64,
    pub geometry: f64,
    pub class: f64,
    pub trajectory: f64,
    pub multiplier: f64,
}

/// Final score plus optional breakdown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriorityScore {
    pub value: f64,
    pub breakdown: Option<PriorityBreakdown>,
}

/// Score one candidate. Set `with_breakdown` to capture the factor
/// decomposition for diagnostics.
pub fn score(ctx: &PriorityContext, with_breakdown: bool) -> PriorityScore {
    let distance = distance_bonus(ctx.distance_tiles) * ctx.weights.distance;
    let health = health_bonus(ctx.health_pct);
    let tracker = tracker_bonus(ctx) * ctx.weights.danger;
    let imminent = imminence_bonus(ctx) * ctx.weights.imminent;

    let mut geometry = 0.0;
    if ctx.facing_player {
        geometry += FACING_BONUS;
    }
    if ctx.player_in_wave_path {
        geometry += WAVE_PATH_BONUS;
    }

    let mut class = ctx.class_danger.clamp(0.0, 4.0) * CLASS_DANGER_SCALE;
    if ctx.is_wave_attacker {
        class += WAVE_ATTACKER_BONUS;
    }
    if ctx.is_aggressive {
        class += AGGRESSIVE_BONUS;
    }

    let trajectory = match ctx.trajectory {
        Trajectory::Approaching => APPROACHING_BONUS,
        Trajectory::Holding => 0.0,
        Trajectory::Fleeing => -FLEEING_PENALTY,
    };

    let multiplier = ctx.adaptive_multiplier.clamp(MIN_WEIGHT, MAX_WEIGHT);
    let raw =
        (PRIORITY_BASE + distance + health + tracker + imminent + geometry + class + trajectory)
            * multiplier;
    let value = raw.clamp(0.0, PRIORITY_MAX);

    let breakdown = with_breakdown.then_some(PriorityBreakdown {
        base: PRIORITY_BASE,
        distance,
        health,
        tracker,
        imminent,
        geometry,
        class,
        trajectory,
        multiplier,
    });

    PriorityScore { value, breakdown }
}

fn distance_bonus(distance: i32) -> f64 {
    if distance <= MELEE_RANGE {
        MELEE_BONUS
    } else if distance <= CLOSE_RANGE {
        CLOSE_BONUS
    } else if distance <= MEDIUM_RANGE {
        MEDIUM_BONUS
    } else {
        FAR_BONUS
    }
}

fn health_bonus(health_pct: f64) -> f64 {
    if health_pct < CRITICAL_HEALTH_PCT {
        CRITICAL_HEALTH_BONUS
    } else if health_pct < LOW_HEALTH_PCT {
        LOW_HEALTH_BONUS
    } else if health_pct < MEDIUM_HEALTH_PCT {
        MEDIUM_HEALTH_BONUS
    } else {
        0.0
    }
}

fn tracker_bonus(ctx: &PriorityContext) -> f64 {
    let mut bonus = 0.0;
    if ctx.dps > HIGH_DPS {
        bonus += HIGH_DPS_BONUS;
    } else if ctx.dps > HIGH_DPS / 2.0 {
        bonus += MID_DPS_BONUS;
    }
    if ctx.hit_count >= MANY_HITS {
        bonus += MANY_HITS_BONUS;
    } else if ctx.hit_count >= SOME_HITS {
        bonus += SOME_HITS_BONUS;
    }
    if let Some(since) = ctx.ms_since_last_attack {
        if since < RECENT_ATTACK_MS {
            bonus += RECENT_ATTACK_BONUS;
        } else if since < STALE_ATTACK_MS {
            bonus += STALE_ATTACK_BONUS;
        }
    }
    if ctx.wave_count >= WAVE_COUNT_THRESHOLD {
        bonus += MANY_WAVES_BONUS;
    } else if ctx.wave_count >= 1 {
        bonus += SOME_WAVES_BONUS;
    }
    bonus
}

fn imminence_bonus(ctx: &PriorityContext) -> f64 {
    if ctx.imminent && ctx.time_to_attack_ms < IMMINENT_THRESHOLD_MS {
        if ctx.cooldown_ratio >= IMMINENT_COOLDOWN_RATIO {
            IMMINENT_BONUS
        } else {
            IMMINENT_PARTIAL_BONUS
        }
    } else if ctx.time_to_attack_ms < SOON_THRESHOLD_MS {
        SOON_BONUS
    } else {
        0.0
    }
}
