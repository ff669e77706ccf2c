//! Real-time threat cache — who is about to attack, cached for O(1)
//! polling by avoidance logic.
//!
//! Event-invalidated and TTL-bounded: any creature event that could
//! change the answer clears it, and even untouched entries expire so
//! cooldown elapse alone refreshes the view.

use hecs::World;

use warden_core::components::{Hostile, Identity, Vitals};
use warden_core::constants::*;
use warden_core::state::ThreatView;
use warden_core::types::{CreatureId, Direction, TilePoint};

use warden_brain::patterns::{PatternBook, PatternEntry};
use warden_brain::predictor::{predict_wave_attack, AttackContext, CorridorThreat};
use warden_brain::tracker::BehaviorTracker;

/// Minimum prediction confidence that counts toward the aggregate.
const THREAT_MIN_CONFIDENCE: f64 = 0.3;

/// The cached aggregate plus freshness bookkeeping.
#[derive(Debug)]
pub struct ThreatCache {
    view: ThreatView,
    computed_ms: Option<u64>,
    ttl_ms: u64,
}

impl Default for ThreatCache {
    fn default() -> Self {
        Self {
            view: ThreatView::default(),
            computed_ms: None,
            ttl_ms: THREAT_CACHE_TTL_MS,
        }
    }
}

impl ThreatCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fresh(&self, now: u64) -> bool {
        self.computed_ms
            .is_some_and(|t| now.saturating_sub(t) <= self.ttl_ms)
    }

    pub fn invalidate(&mut self) {
        self.computed_ms = None;
    }

    pub fn set_ttl(&mut self, ttl_ms: u64) {
        self.ttl_ms = ttl_ms;
    }

    pub fn store(&mut self, view: ThreatView, now: u64) {
        self.view = view;
        self.computed_ms = Some(now);
    }

    pub fn view(&self) -> &ThreatView {
        &self.view
    }
}

/// Recompute the aggregate over every visible hostile.
pub fn compute(
    world: &World,
    tracker: &BehaviorTracker,
    patterns: &PatternBook,
    own_pos: TilePoint,
    now: u64,
) -> ThreatView {
    let default_pattern = PatternEntry::default();
    let mut view = ThreatView::default();

    let mut query =
        world.query::<(&Hostile, &CreatureId, &Identity, &TilePoint, &Direction, &Vitals)>();
    for (_entity, (_hostile, id, identity, pos, facing, vitals)) in query.iter() {
        if !vitals.alive || !pos.same_floor(&own_pos) {
            continue;
        }
        let record = tracker.get(*id);
        let pattern = patterns.get(&identity.name).unwrap_or(&default_pattern);
        let ctx = attack_context(*pos, *facing, own_pos, record, pattern, now);
        let prediction = predict_wave_attack(&ctx);
        if prediction.imminent && prediction.confidence >= THREAT_MIN_CONFIDENCE {
            view.threat_count += 1;
            view.total_threat += prediction.confidence * pattern.danger;
            view.highest_confidence = view.highest_confidence.max(prediction.confidence);
        }
    }
    view.immediate_threat = view.threat_count > 0;
    view
}

/// Corridor descriptions for position-danger queries: every hostile
/// believed wave-capable, with its best time-to-attack estimate.
pub fn corridor_threats(
    world: &World,
    tracker: &BehaviorTracker,
    patterns: &PatternBook,
    now: u64,
) -> Vec<CorridorThreat> {
    let default_pattern = PatternEntry::default();
    let mut threats = Vec::new();

    let mut query =
        world.query::<(&Hostile, &CreatureId, &Identity, &TilePoint, &Direction, &Vitals)>();
    for (_entity, (_hostile, id, identity, pos, facing, vitals)) in query.iter() {
        if !vitals.alive {
            continue;
        }
        let pattern = patterns.get(&identity.name).unwrap_or(&default_pattern);
        if !pattern.has_wave_attack {
            continue;
        }
        let record = tracker.get(*id);
        let cooldown = cooldown_estimate(record, pattern);
        let elapsed = record
            .and_then(|r| r.last_wave_ms)
            .map(|t| now.saturating_sub(t) as f64)
            .unwrap_or(cooldown);
        threats.push(CorridorThreat {
            position: *pos,
            facing: *facing,
            range: pattern.wave_range,
            width: pattern.wave_width,
            time_to_attack_ms: (cooldown - elapsed).max(0.0),
            danger: pattern.danger,
        });
    }
    threats
}

/// Build the predictor input for one hostile, preferring the record's
/// own estimator over the learned pattern.
pub fn attack_context(
    position: TilePoint,
    facing: Direction,
    own_pos: TilePoint,
    record: Option<&warden_brain::tracker::TrackRecord>,
    pattern: &PatternEntry,
    now: u64,
) -> AttackContext {
    let cooldown_ms = cooldown_estimate(record, pattern);
    let coefficient_of_variation = match record {
        Some(r) if r.cooldown.is_seeded() => r.cooldown.coefficient_of_variation(),
        _ => pattern.coefficient_of_variation(),
    };
    AttackContext {
        position,
        facing,
        target: own_pos,
        now_ms: now,
        tracker_confidence: record.map(|r| r.confidence()).unwrap_or(0.0),
        cooldown_ms,
        coefficient_of_variation,
        last_wave_ms: record.and_then(|r| r.last_wave_ms),
        has_wave_attack: pattern.has_wave_attack,
    }
}

fn cooldown_estimate(
    record: Option<&warden_brain::tracker::TrackRecord>,
    pattern: &PatternEntry,
) -> f64 {
    match record {
        Some(r) if r.cooldown.is_seeded() => r.cooldown.mean_ms(),
        _ if pattern.wave_cooldown_ms > 0.0 => pattern.wave_cooldown_ms,
        _ => DEFAULT_WAVE_COOLDOWN_MS,
    }
}
