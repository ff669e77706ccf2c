//! Behavior classification — tracker ratios to a combat archetype.
//!
//! Classification is cached per creature-type name and only recomputed
//! once a record has accumulated enough movement samples; below the
//! threshold the previous cached result is returned unchanged
//! (stale-but-valid).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use warden_core::constants::*;
use warden_core::enums::MovementPattern;

use crate::patterns::normalize_name;
use crate::tracker::TrackRecord;

/// Behavioral archetype derived for a creature type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureClass {
    /// Lowercase creature-type name.
    pub name: String,
    pub is_ranged: bool,
    pub is_melee: bool,
    pub is_wave_attacker: bool,
    pub is_aggressive: bool,
    pub is_passive: bool,
    pub is_fast: bool,
    pub movement: MovementPattern,
    /// Tiles the agent should hold against this type.
    pub preferred_distance: i32,
    /// Danger score in [1, 4].
    pub danger: f64,
    pub confidence: f64,
    /// Movement samples behind this classification.
    pub samples: u32,
    pub updated_ms: u64,
}

impl CreatureClass {
    fn unknown(name: &str) -> Self {
        Self {
            name: normalize_name(name),
            is_ranged: false,
            is_melee: false,
            is_wave_attacker: false,
            is_aggressive: false,
            is_passive: false,
            is_fast: false,
            movement: MovementPattern::Unknown,
            preferred_distance: 2,
            danger: 1.0,
            confidence: 0.0,
            samples: 0,
            updated_ms: 0,
        }
    }
}

/// Name-keyed classification cache.
#[derive(Debug, Default)]
pub struct BehaviorClassifier {
    cache: HashMap<String, CreatureClass>,
}

impl BehaviorClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a creature from its record. Below the minimum sample
    /// count the cached result is returned unchanged.
    pub fn classify(&mut self, record: &TrackRecord, now: u64) -> &CreatureClass {
        let key = normalize_name(&record.name);
        if record.movement_samples < CLASSIFY_MIN_SAMPLES {
            return self
                .cache
                .entry(key)
                .or_insert_with(|| CreatureClass::unknown(&record.name));
        }
        let class = compute_class(record, now);
        self.cache.insert(key.clone(), class);
        &self.cache[&key]
    }

    pub fn get(&self, name: &str) -> Option<&CreatureClass> {
        self.cache.get(&normalize_name(name))
    }

    /// The full classification table, for observability.
    pub fn table(&self) -> impl Iterator<Item = &CreatureClass> {
        self.cache.values()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

fn compute_class(record: &TrackRecord, now: u64) -> CreatureClass {
    let stationary = record.stationary_ratio();
    let chase = record.chase_ratio();
    let facing = record.facing_ratio();
    let wave_rate = record.wave_rate();
    let attack_range = record.avg_attack_range().unwrap_or(0.0);

    // Ranged/melee rules, first match wins.
    let (is_ranged, is_melee, preferred_distance) = if stationary > 0.5 && attack_range > 3.0 {
        (true, false, 4)
    } else if stationary > 0.6 && chase < 0.3 {
        (true, false, 5)
    } else if chase > 0.6 {
        (false, true, 1)
    } else {
        (false, false, 2)
    };

    let is_wave_attacker =
        wave_rate >= WAVE_RATE_THRESHOLD || record.wave_count >= WAVE_COUNT_THRESHOLD;
    let is_aggressive = facing > 0.4 && record.wave_count > 2;
    let is_passive = facing < 0.2 && record.wave_count == 0;
    let is_fast = record.avg_speed() > FAST_SPEED_TILES_PER_SEC;

    let movement = if stationary > 0.7 {
        MovementPattern::Static
    } else if chase > 0.5 {
        MovementPattern::Chase
    } else if stationary < 0.3 && chase < 0.3 {
        MovementPattern::Kite
    } else {
        MovementPattern::Erratic
    };

    let dps = record.dps();
    let mut danger: f64 = 1.0;
    if dps > HIGH_DPS {
        danger += 2.0;
    } else if dps > HIGH_DPS / 2.0 {
        danger += 1.0;
    }
    if is_wave_attacker {
        danger += 1.0;
        if wave_rate > 0.5 {
            danger += 1.0;
        }
    }
    if is_fast {
        danger += 0.5;
    }
    if is_aggressive {
        danger += 0.5;
    }
    danger = danger.min(4.0);

    let confidence =
        (0.3 + (record.movement_samples as f64 / 100.0) * 0.65).min(CLASSIFY_CONFIDENCE_CAP);

    CreatureClass {
        name: normalize_name(&record.name),
        is_ranged,
        is_melee,
        is_wave_attacker,
        is_aggressive,
        is_passive,
        is_fast,
        movement,
        preferred_distance,
        danger,
        confidence,
        samples: record.movement_samples,
        updated_ms: now,
    }
}
