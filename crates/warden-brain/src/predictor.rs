//! Attack prediction — geometric and temporal reasoning.
//!
//! Pure functions that decide whether a hostile is lined up on a point,
//! whether a point sits inside a directional attack corridor, and how
//! soon the next attack is due. No registry access — callers pass plain
//! data in.

use glam::IVec2;

use warden_core::constants::*;
use warden_core::enums::DangerLevel;
use warden_core::types::{Direction, TilePoint};

/// Position-danger totals at which each level engages.
const DANGER_CRITICAL_TOTAL: f64 = 6.0;
const DANGER_HIGH_TOTAL: f64 = 4.0;
const DANGER_MODERATE_TOTAL: f64 = 2.0;

/// True if `target` lies within the ±1-tile cone in front of a creature
/// at `pos` facing `facing`. Orthogonal facings accept anything ahead on
/// the facing axis within one tile of lateral offset; diagonal facings
/// require both signed offsets to match the facing quadrant.
pub fn is_facing_position(pos: TilePoint, facing: Direction, target: TilePoint) -> bool {
    if !pos.same_floor(&target) {
        return false;
    }
    let delta = pos.delta_2d(&target);
    if delta == IVec2::ZERO {
        return true;
    }
    let u = facing.unit();
    if facing.is_diagonal() {
        delta.x * u.x > 0 && delta.y * u.y > 0
    } else {
        let along = delta.x * u.x + delta.y * u.y;
        let lateral = (delta.x * u.y.abs()).abs() + (delta.y * u.x.abs()).abs();
        along >= 1 && lateral <= 1
    }
}

/// True if `pos` lies inside the wave footprint cast from `source`
/// along `facing`: within `range` tiles along the direction vector and
/// within `width` tiles of the center line. Tiles behind the source are
/// never in the path.
pub fn is_position_in_wave_path(
    pos: TilePoint,
    source: TilePoint,
    facing: Direction,
    range: i32,
    width: i32,
) -> bool {
    if !pos.same_floor(&source) {
        return false;
    }
    let delta = source.delta_2d(&pos);
    let u = facing.unit();
    if facing.is_diagonal() {
        if delta.x * u.x < 0 || delta.y * u.y < 0 {
            return false;
        }
        let along = delta.x.abs().max(delta.y.abs());
        let lateral = (delta.x.abs() - delta.y.abs()).abs();
        along <= range && lateral <= width
    } else {
        let along = delta.x * u.x + delta.y * u.y;
        let lateral = (delta.x * u.y.abs()).abs() + (delta.y * u.x.abs()).abs();
        (0..=range).contains(&along) && lateral <= width
    }
}

/// Input to wave-attack prediction for a single hostile.
#[derive(Debug, Clone)]
pub struct AttackContext {
    /// Creature position and facing.
    pub position: TilePoint,
    pub facing: Direction,
    /// The point being attacked (the agent's position).
    pub target: TilePoint,
    pub now_ms: u64,
    /// Tracker confidence for this creature, in [0, 1].
    pub tracker_confidence: f64,
    /// Best cooldown estimate (record estimator if seeded, else the
    /// learned pattern, else the default).
    pub cooldown_ms: f64,
    pub coefficient_of_variation: f64,
    pub last_wave_ms: Option<u64>,
    /// Whether this creature type is believed to wave-attack at all.
    pub has_wave_attack: bool,
}

/// Output of wave-attack prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavePrediction {
    pub imminent: bool,
    pub confidence: f64,
    pub time_to_attack_ms: f64,
}

/// Predict whether a hostile's next wave attack is imminent.
pub fn predict_wave_attack(ctx: &AttackContext) -> WavePrediction {
    if !ctx.has_wave_attack {
        return WavePrediction {
            imminent: false,
            confidence: 0.8,
            time_to_attack_ms: f64::INFINITY,
        };
    }

    if !is_facing_position(ctx.position, ctx.facing, ctx.target) {
        return WavePrediction {
            imminent: false,
            confidence: 0.7,
            time_to_attack_ms: f64::INFINITY,
        };
    }

    let cooldown = if ctx.cooldown_ms > 0.0 {
        ctx.cooldown_ms
    } else {
        DEFAULT_WAVE_COOLDOWN_MS
    };
    // No attack seen yet: assume the cooldown has elapsed (worst case).
    let elapsed = ctx
        .last_wave_ms
        .map(|t| ctx.now_ms.saturating_sub(t) as f64)
        .unwrap_or(cooldown);
    let time_to_attack_ms = (cooldown - elapsed).max(0.0);

    let mut confidence = 0.5 + 0.3 * ctx.tracker_confidence.clamp(0.0, 1.0) + 0.2;
    if elapsed >= 0.8 * cooldown {
        confidence += 0.15;
    }
    let variance_penalty =
        (VARIANCE_PENALTY_SCALE * ctx.coefficient_of_variation).min(VARIANCE_PENALTY_CAP);
    confidence *= 1.0 - variance_penalty;
    confidence = confidence.clamp(PREDICTION_MIN_CONFIDENCE, PREDICTION_MAX_CONFIDENCE);

    WavePrediction {
        imminent: time_to_attack_ms < IMMINENT_THRESHOLD_MS,
        confidence,
        time_to_attack_ms,
    }
}

/// One hostile's corridor, as seen by position-danger aggregation.
#[derive(Debug, Clone, Copy)]
pub struct CorridorThreat {
    pub position: TilePoint,
    pub facing: Direction,
    pub range: i32,
    pub width: i32,
    pub time_to_attack_ms: f64,
    /// Static danger from the learned pattern, 1-4.
    pub danger: f64,
}

/// Aggregate danger at `position` from every hostile whose predicted
/// wave would cross it within the horizon, weighted by urgency.
pub fn predict_position_danger(
    position: TilePoint,
    threats: &[CorridorThreat],
) -> (DangerLevel, f64) {
    let mut total = 0.0;
    for threat in threats {
        if threat.time_to_attack_ms > POSITION_DANGER_HORIZON_MS {
            continue;
        }
        if !is_position_in_wave_path(
            position,
            threat.position,
            threat.facing,
            threat.range,
            threat.width,
        ) {
            continue;
        }
        let urgency = (1.0 - threat.time_to_attack_ms / POSITION_DANGER_HORIZON_MS).max(0.0);
        total += threat.danger * urgency;
    }

    let level = if total >= DANGER_CRITICAL_TOTAL {
        DangerLevel::Critical
    } else if total >= DANGER_HIGH_TOTAL {
        DangerLevel::High
    } else if total >= DANGER_MODERATE_TOTAL {
        DangerLevel::Moderate
    } else if total > 0.0 {
        DangerLevel::Low
    } else {
        DangerLevel::None
    };
    (level, total)
}
