//! Learned per-creature-type patterns, persisted across sessions.
//!
//! The book is keyed by normalized (lowercase, trimmed) creature-type
//! name; normalization happens here and nowhere else. Entries outlive
//! the creature records they were learned from and decay toward
//! defaults after long absence.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use warden_core::constants::*;

use crate::classifier::CreatureClass;
use crate::tracker::{TypeAggregate, WaveObservation};

/// Canonical pattern key for a creature-type name.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Learned combat pattern for one creature type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternEntry {
    pub wave_cooldown_ms: f64,
    pub cooldown_variance: f64,
    pub wave_range: i32,
    pub wave_width: i32,
    pub preferred_distance: i32,
    /// Danger level in [1, 4].
    pub danger: f64,
    /// Unknown types are assumed capable of wave attacks until a
    /// confident classification says otherwise.
    pub has_wave_attack: bool,
    pub last_seen_ms: u64,
    pub confidence: f64,
}

impl Default for PatternEntry {
    fn default() -> Self {
        Self {
            wave_cooldown_ms: DEFAULT_WAVE_COOLDOWN_MS,
            cooldown_variance: 0.0,
            wave_range: DEFAULT_WAVE_RANGE,
            wave_width: DEFAULT_WAVE_WIDTH,
            preferred_distance: 2,
            danger: DEFAULT_DANGER,
            has_wave_attack: true,
            last_seen_ms: 0,
            confidence: 0.1,
        }
    }
}

impl PatternEntry {
    pub fn coefficient_of_variation(&self) -> f64 {
        if self.wave_cooldown_ms > 0.0 {
            self.cooldown_variance.sqrt() / self.wave_cooldown_ms
        } else {
            0.0
        }
    }
}

/// Auto-tuner output: a proposed danger adjustment for one type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DangerSuggestion {
    pub name: String,
    pub current: f64,
    pub suggested: f64,
}

/// The persisted pattern repository.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternBook {
    entries: HashMap<String, PatternEntry>,
}

impl PatternBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&PatternEntry> {
        self.entries.get(&normalize_name(name))
    }

    /// Fetch-or-create the entry for a type, stamping last-seen.
    pub fn entry(&mut self, name: &str, now: u64) -> &mut PatternEntry {
        let entry = self.entries.entry(normalize_name(name)).or_default();
        entry.last_seen_ms = now;
        entry
    }

    /// Stamp a sighting without otherwise touching the entry.
    pub fn touch(&mut self, name: &str, now: u64) {
        self.entry(name, now);
    }

    /// Fold an observed attack into the learned pattern. This is the
    /// cross-session learning path: every observation bumps confidence.
    pub fn observe_wave(&mut self, name: &str, obs: &WaveObservation, now: u64) {
        let entry = self.entry(name, now);
        if obs.mean_ms > 0.0 {
            entry.wave_cooldown_ms = obs.mean_ms;
            entry.cooldown_variance = obs.variance;
        }
        if obs.range_tiles > 0 && obs.range_tiles != i32::MAX {
            entry.wave_range = entry.wave_range.max(obs.range_tiles);
        }
        entry.has_wave_attack = true;
        entry.confidence = (entry.confidence + PATTERN_CONFIDENCE_STEP).min(PATTERN_CONFIDENCE_CAP);
    }

    /// Fold a finalized record's aggregates into the pattern when the
    /// record is removed. The aggregate outlives the record here.
    pub fn absorb_aggregate(&mut self, agg: &TypeAggregate, now: u64) {
        let entry = self.entry(&agg.name, now);
        if let Some(range) = agg.avg_attack_range {
            entry.wave_range = entry.wave_range.max(range.round() as i32);
        }
        if agg.wave_count > 0 {
            entry.has_wave_attack = true;
        }
    }

    /// Sync classifier output into the pattern. A confident
    /// classification may clear the conservative wave assumption.
    pub fn apply_class(&mut self, class: &CreatureClass, now: u64) {
        let entry = self.entry(&class.name, now);
        entry.preferred_distance = class.preferred_distance;
        if class.confidence >= 0.5 {
            entry.has_wave_attack = class.is_wave_attacker;
        }
    }

    /// Decay long-unseen entries toward defaults. Returns how many
    /// entries were decayed.
    pub fn decay(&mut self, now: u64) -> usize {
        let mut decayed = 0;
        for entry in self.entries.values_mut() {
            if now.saturating_sub(entry.last_seen_ms) > PATTERN_DECAY_AFTER_MS {
                entry.confidence *= PATTERN_DECAY_FACTOR;
                entry.danger += (DEFAULT_DANGER - entry.danger) * 0.1;
                decayed += 1;
            }
        }
        decayed
    }

    /// Compare a freshly observed danger score against the stored one.
    pub fn suggest_danger(&self, name: &str, observed: f64) -> Option<DangerSuggestion> {
        let entry = self.get(name)?;
        let observed = observed.clamp(1.0, 4.0);
        ((observed - entry.danger).abs() >= 0.5).then(|| DangerSuggestion {
            name: normalize_name(name),
            current: entry.danger,
            suggested: observed,
        })
    }

    /// Apply a danger suggestion. Unforced application nudges halfway
    /// toward the suggestion; forced application overwrites.
    pub fn apply_suggestion(&mut self, suggestion: &DangerSuggestion, force: bool, now: u64) -> bool {
        let entry = self.entry(&suggestion.name, now);
        let before = entry.danger;
        if force {
            entry.danger = suggestion.suggested.clamp(1.0, 4.0);
        } else {
            entry.danger =
                (entry.danger + (suggestion.suggested - entry.danger) * 0.5).clamp(1.0, 4.0);
        }
        (entry.danger - before).abs() > f64::EPSILON
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PatternEntry)> {
        self.entries.iter()
    }
}
