//! Per-creature behavior tracking.
//!
//! Maintains a bounded time-window history per visible hostile plus the
//! derived counters everything downstream feeds on: stationary/chase/
//! facing ratios, turn frequency, attack timing, damage output. Records
//! exist only while their creature is alive and visible; per-type
//! aggregates are finalized on untrack and outlive the record.

use std::collections::{HashMap, VecDeque};

use warden_core::access::CreatureSnapshot;
use warden_core::constants::*;
use warden_core::types::{CreatureId, Direction, TilePoint};

use crate::cooldown::CooldownEstimator;
use crate::predictor::is_facing_position;

/// One timestamped observation of a tracked creature.
#[derive(Debug, Clone, Copy)]
pub struct CreatureSample {
    pub at_ms: u64,
    pub position: TilePoint,
    pub facing: Direction,
    pub health_pct: f64,
}

/// Result of feeding an observed attack into a record's estimator,
/// handed to the pattern book for cross-session learning.
#[derive(Debug, Clone, Copy)]
pub struct WaveObservation {
    /// The raw interval, when one could be measured.
    pub interval_ms: Option<f64>,
    pub mean_ms: f64,
    pub variance: f64,
    pub range_tiles: i32,
}

/// Per-type statistics finalized when a record is removed.
#[derive(Debug, Clone)]
pub struct TypeAggregate {
    pub name: String,
    pub avg_speed: f64,
    pub dps: f64,
    pub total_damage: u64,
    pub wave_count: u32,
    pub avg_attack_range: Option<f64>,
    pub observed_ms: u64,
}

/// Rolling state for one visible hostile.
#[derive(Debug, Clone)]
pub struct TrackRecord {
    pub id: CreatureId,
    pub name: String,
    samples: VecDeque<CreatureSample>,

    // Movement counters over the sample stream.
    pub movement_samples: u32,
    stationary_count: u32,
    chase_count: u32,
    facing_count: u32,
    direction_changes: u32,

    // Combat counters.
    pub wave_count: u32,
    pub total_damage: u64,
    pub hit_count: u32,
    pub last_attack_ms: Option<u64>,
    pub last_wave_ms: Option<u64>,
    attack_range_sum: f64,
    attack_range_samples: u32,

    pub cooldown: CooldownEstimator,

    avg_speed: f64,
    health_drop_rate: f64,
    first_seen_ms: u64,
    last_update_ms: u64,
}

impl TrackRecord {
    fn new(snap: &CreatureSnapshot, now: u64) -> Self {
        let mut record = Self {
            id: snap.id,
            name: snap.name.clone(),
            samples: VecDeque::new(),
            movement_samples: 0,
            stationary_count: 0,
            chase_count: 0,
            facing_count: 0,
            direction_changes: 0,
            wave_count: 0,
            total_damage: 0,
            hit_count: 0,
            last_attack_ms: None,
            last_wave_ms: None,
            attack_range_sum: 0.0,
            attack_range_samples: 0,
            cooldown: CooldownEstimator::default(),
            avg_speed: 0.0,
            health_drop_rate: 0.0,
            first_seen_ms: now,
            last_update_ms: now,
        };
        record.samples.push_back(CreatureSample {
            at_ms: now,
            position: snap.position,
            facing: snap.facing,
            health_pct: snap.health_pct,
        });
        record
    }

    /// Append one observation and refresh the derived counters.
    fn update(&mut self, snap: &CreatureSnapshot, own_pos: TilePoint, now: u64, window_ms: u64) {
        let prev = match self.samples.back().copied() {
            Some(s) => s,
            None => {
                self.samples.push_back(CreatureSample {
                    at_ms: now,
                    position: snap.position,
                    facing: snap.facing,
                    health_pct: snap.health_pct,
                });
                self.last_update_ms = now;
                return;
            }
        };

        self.movement_samples += 1;

        let dt_ms = now.saturating_sub(prev.at_ms).max(1);
        let moved = prev.position.chebyshev_distance(&snap.position);

        if moved == 0 {
            self.stationary_count += 1;
        } else if moved != i32::MAX {
            let speed = moved as f64 * 1000.0 / dt_ms as f64;
            self.avg_speed = SPEED_EWMA_ALPHA * speed + (1.0 - SPEED_EWMA_ALPHA) * self.avg_speed;
        }

        let dist_prev = prev.position.chebyshev_distance(&own_pos);
        let dist_now = snap.position.chebyshev_distance(&own_pos);
        if dist_now < dist_prev {
            self.chase_count += 1;
        }

        if is_facing_position(snap.position, snap.facing, own_pos) {
            self.facing_count += 1;
        }

        if snap.facing != prev.facing {
            self.direction_changes += 1;
        }

        if snap.health_pct < prev.health_pct {
            let rate = (prev.health_pct - snap.health_pct) * 1000.0 / dt_ms as f64;
            self.health_drop_rate = HEALTH_RATE_EWMA_ALPHA * rate
                + (1.0 - HEALTH_RATE_EWMA_ALPHA) * self.health_drop_rate;
        }

        self.samples.push_back(CreatureSample {
            at_ms: now,
            position: snap.position,
            facing: snap.facing,
            health_pct: snap.health_pct,
        });
        self.last_update_ms = now;

        let horizon = now.saturating_sub(window_ms);
        while let Some(front) = self.samples.front() {
            if front.at_ms < horizon && self.samples.len() > 1 {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Feed an observed attack (wave/missile) into the estimator.
    pub fn record_wave(&mut self, now: u64, range_tiles: i32) -> WaveObservation {
        // Intervals outside this band are double-fired events or gaps
        // across separate volleys, not a cooldown signal.
        let interval_ms = self.last_wave_ms.and_then(|t| {
            let dt = now.saturating_sub(t) as f64;
            (200.0..=30_000.0).contains(&dt).then_some(dt)
        });
        if let Some(dt) = interval_ms {
            self.cooldown.observe(dt);
        }
        self.wave_count += 1;
        self.last_wave_ms = Some(now);
        self.last_attack_ms = Some(now);
        if range_tiles > 0 && range_tiles != i32::MAX {
            self.attack_range_sum += range_tiles as f64;
            self.attack_range_samples += 1;
        }
        WaveObservation {
            interval_ms,
            mean_ms: self.cooldown.mean_ms(),
            variance: self.cooldown.variance(),
            range_tiles,
        }
    }

    /// Attribute received damage to this creature.
    pub fn record_damage(&mut self, amount: u32, now: u64) {
        self.total_damage += amount as u64;
        self.hit_count += 1;
        self.last_attack_ms = Some(now);
    }

    // --- Derived ratios ---

    pub fn stationary_ratio(&self) -> f64 {
        ratio(self.stationary_count, self.movement_samples)
    }

    pub fn chase_ratio(&self) -> f64 {
        ratio(self.chase_count, self.movement_samples)
    }

    pub fn facing_ratio(&self) -> f64 {
        ratio(self.facing_count, self.movement_samples)
    }

    /// Facing changes per observed second.
    pub fn turn_frequency(&self) -> f64 {
        self.direction_changes as f64 / self.observed_secs()
    }

    /// Waves per observed second.
    pub fn wave_rate(&self) -> f64 {
        self.wave_count as f64 / self.observed_secs()
    }

    /// Damage dealt to the agent per observed second.
    pub fn dps(&self) -> f64 {
        self.total_damage as f64 / self.observed_secs()
    }

    pub fn avg_attack_range(&self) -> Option<f64> {
        (self.attack_range_samples > 0)
            .then(|| self.attack_range_sum / self.attack_range_samples as f64)
    }

    pub fn avg_speed(&self) -> f64 {
        self.avg_speed
    }

    pub fn health_drop_rate(&self) -> f64 {
        self.health_drop_rate
    }

    pub fn observed_ms(&self) -> u64 {
        self.last_update_ms.saturating_sub(self.first_seen_ms)
    }

    fn observed_secs(&self) -> f64 {
        (self.observed_ms().max(1_000)) as f64 / 1000.0
    }

    pub fn last_update_ms(&self) -> u64 {
        self.last_update_ms
    }

    pub fn latest_sample(&self) -> Option<&CreatureSample> {
        self.samples.back()
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Confidence grows asymptotically with sample count toward the cap;
    /// records below `LOW_CONFIDENCE_SAMPLES` stay visibly low.
    pub fn confidence(&self) -> f64 {
        let s = self.movement_samples as f64;
        TRACK_CONFIDENCE_CAP * s / (s + LOW_CONFIDENCE_SAMPLES as f64)
    }

    /// Whether the creature has been closing or opening distance lately.
    /// Compares the oldest in-window sample against the newest.
    pub fn trajectory(&self, own_pos: TilePoint) -> Trajectory {
        let (Some(first), Some(last)) = (self.samples.front(), self.samples.back()) else {
            return Trajectory::Holding;
        };
        let then = first.position.chebyshev_distance(&own_pos);
        let now = last.position.chebyshev_distance(&own_pos);
        if then == i32::MAX || now == i32::MAX {
            return Trajectory::Holding;
        }
        if now + 1 < then {
            Trajectory::Approaching
        } else if now > then + 1 {
            Trajectory::Fleeing
        } else {
            Trajectory::Holding
        }
    }

    fn finalize(&self, now: u64) -> TypeAggregate {
        let _ = now;
        TypeAggregate {
            name: self.name.clone(),
            avg_speed: self.avg_speed,
            dps: self.dps(),
            total_damage: self.total_damage,
            wave_count: self.wave_count,
            avg_attack_range: self.avg_attack_range(),
            observed_ms: self.observed_ms(),
        }
    }
}

/// Distance trend of a creature relative to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trajectory {
    Approaching,
    Holding,
    Fleeing,
}

fn ratio(count: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        (count as f64 / total as f64).min(1.0)
    }
}

/// The id-keyed record registry. Owned by the engine, mutated only from
/// the single control thread.
#[derive(Debug, Default)]
pub struct BehaviorTracker {
    records: HashMap<CreatureId, TrackRecord>,
}

impl BehaviorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a creature. Dead or already-tracked creatures no-op.
    /// Returns true if a record was created.
    pub fn track(&mut self, snap: &CreatureSnapshot, now: u64) -> bool {
        if !snap.alive || self.records.contains_key(&snap.id) {
            return false;
        }
        self.records.insert(snap.id, TrackRecord::new(snap, now));
        true
    }

    /// Append an observation. Creates the record on first sight;
    /// dead creatures no-op.
    pub fn update(&mut self, snap: &CreatureSnapshot, own_pos: TilePoint, now: u64) {
        if !snap.alive {
            return;
        }
        match self.records.get_mut(&snap.id) {
            Some(record) => record.update(snap, own_pos, now, ANALYSIS_WINDOW_MS),
            None => {
                self.track(snap, now);
            }
        }
    }

    /// Stop tracking and finalize per-type aggregates.
    pub fn untrack(&mut self, id: CreatureId, now: u64) -> Option<TypeAggregate> {
        self.records.remove(&id).map(|r| r.finalize(now))
    }

    /// Drop records with no update for longer than the stale timeout.
    pub fn sweep_stale(&mut self, now: u64) -> Vec<(CreatureId, TypeAggregate)> {
        let stale: Vec<CreatureId> = self
            .records
            .iter()
            .filter(|(_, r)| now.saturating_sub(r.last_update_ms) > STALE_TIMEOUT_MS)
            .map(|(id, _)| *id)
            .collect();
        stale
            .into_iter()
            .filter_map(|id| self.untrack(id, now).map(|agg| (id, agg)))
            .collect()
    }

    /// Retune every record's cooldown smoothing (volume adaptation).
    pub fn set_cooldown_alpha(&mut self, alpha: f64) {
        for record in self.records.values_mut() {
            record.cooldown.set_alpha(alpha);
        }
    }

    pub fn get(&self, id: CreatureId) -> Option<&TrackRecord> {
        self.records.get(&id)
    }

    pub fn get_mut(&mut self, id: CreatureId) -> Option<&mut TrackRecord> {
        self.records.get_mut(&id)
    }

    pub fn contains(&self, id: CreatureId) -> bool {
        self.records.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CreatureId, &TrackRecord)> {
        self.records.iter()
    }
}
