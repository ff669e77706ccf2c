//! Combat feedback — closed-loop correlation of predictions against
//! actually-received damage.
//!
//! Each emitted prediction is queued; attributed damage inside the
//! correlation window confirms it, expiry marks it a false positive.
//! Confirmations and misses nudge the adaptive weight multipliers the
//! priority scorer consumes.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use warden_core::constants::*;
use warden_core::enums::{AttackKind, PredictionOutcome};
use warden_core::types::CreatureId;

/// A queued, not-yet-resolved prediction.
#[derive(Debug, Clone, Copy)]
pub struct PendingPrediction {
    pub id: CreatureId,
    pub kind: AttackKind,
    pub predicted_at_ms: u64,
    pub confidence: f64,
}

/// Adaptive multipliers applied to priority-score factor groups.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveWeights {
    pub distance: f64,
    pub danger: f64,
    pub imminent: f64,
}

impl Default for AdaptiveWeights {
    fn default() -> Self {
        Self {
            distance: 1.0,
            danger: 1.0,
            imminent: 1.0,
        }
    }
}

impl AdaptiveWeights {
    fn clamp_all(&mut self) {
        self.distance = self.distance.clamp(MIN_WEIGHT, MAX_WEIGHT);
        self.danger = self.danger.clamp(MIN_WEIGHT, MAX_WEIGHT);
        self.imminent = self.imminent.clamp(MIN_WEIGHT, MAX_WEIGHT);
    }
}

#[derive(Debug, Clone, Copy)]
struct CategoryStats {
    correct: u64,
    false_positives: u64,
    ewma_accuracy: f64,
}

impl Default for CategoryStats {
    fn default() -> Self {
        Self {
            correct: 0,
            false_positives: 0,
            // Neutral prior: neither trusted nor distrusted.
            ewma_accuracy: 0.5,
        }
    }
}

impl CategoryStats {
    fn observe(&mut self, hit: bool) {
        let sample = if hit { 1.0 } else { 0.0 };
        self.ewma_accuracy =
            ACCURACY_EWMA_ALPHA * sample + (1.0 - ACCURACY_EWMA_ALPHA) * self.ewma_accuracy;
    }
}

/// Process-wide feedback state.
#[derive(Debug, Default)]
pub struct CombatFeedback {
    pending: VecDeque<PendingPrediction>,
    wave: CategoryStats,
    melee: CategoryStats,
    missed: u64,
    weights: AdaptiveWeights,
}

impl CombatFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an emitted prediction. An unresolved prediction for the
    /// same creature and kind is replaced, not duplicated.
    pub fn record_prediction(&mut self, id: CreatureId, kind: AttackKind, confidence: f64, now: u64) {
        self.pending
            .retain(|p| !(p.id == id && p.kind == kind));
        self.pending.push_back(PendingPrediction {
            id,
            kind,
            predicted_at_ms: now,
            confidence,
        });
        while self.pending.len() > PREDICTION_QUEUE_CAP {
            self.pending.pop_front();
        }
    }

    /// Correlate attributed damage against the queue. `kind_hint` is
    /// the engine's guess at the attack kind (by attacker distance),
    /// used only when no prediction matched.
    pub fn on_damage(
        &mut self,
        attacker: CreatureId,
        kind_hint: AttackKind,
        now: u64,
    ) -> PredictionOutcome {
        let matched = self.pending.iter().position(|p| {
            p.id == attacker && now.saturating_sub(p.predicted_at_ms) <= CORRELATION_WINDOW_MS
        });
        if let Some(p) = matched.and_then(|idx| self.pending.remove(idx)) {
            self.category_mut(p.kind).correct += 1;
            self.category_mut(p.kind).observe(true);
            let delta = FEEDBACK_LEARNING_RATE * p.confidence;
            self.adjust_weight(p.kind, delta);
            PredictionOutcome::Correct
        } else {
            // Damage we failed to predict: value observed threat more.
            self.missed += 1;
            self.category_mut(kind_hint).observe(false);
            self.weights.danger += 0.5 * FEEDBACK_LEARNING_RATE;
            self.weights.clamp_all();
            PredictionOutcome::Missed
        }
    }

    /// Expire predictions whose window passed with no corroborating
    /// damage. Returns how many became false positives.
    pub fn expire(&mut self, now: u64) -> u32 {
        let mut expired = 0;
        loop {
            match self.pending.front() {
                Some(front) if now.saturating_sub(front.predicted_at_ms) > CORRELATION_WINDOW_MS => {}
                _ => break,
            }
            let Some(p) = self.pending.pop_front() else {
                break;
            };
            self.category_mut(p.kind).false_positives += 1;
            self.category_mut(p.kind).observe(false);
            let delta = 0.5 * FEEDBACK_LEARNING_RATE * p.confidence;
            self.adjust_weight(p.kind, -delta);
            expired += 1;
        }
        expired
    }

    /// Drop pending predictions for a creature that left the world.
    pub fn forget(&mut self, id: CreatureId) {
        self.pending.retain(|p| p.id != id);
    }

    fn category_mut(&mut self, kind: AttackKind) -> &mut CategoryStats {
        match kind {
            AttackKind::Wave => &mut self.wave,
            AttackKind::Melee => &mut self.melee,
        }
    }

    fn adjust_weight(&mut self, kind: AttackKind, delta: f64) {
        match kind {
            AttackKind::Wave => self.weights.imminent += delta,
            AttackKind::Melee => self.weights.danger += delta,
        }
        self.weights.clamp_all();
    }

    /// Combined EWMA accuracy across categories, in [0, 1].
    pub fn overall_accuracy(&self) -> f64 {
        (self.wave.ewma_accuracy + self.melee.ewma_accuracy) / 2.0
    }

    /// Multiplier for final priority scores, bounded to [0.5, 1.5].
    /// Neutral (0.5 accuracy) maps to 1.0.
    pub fn priority_multiplier(&self) -> f64 {
        (0.5 + self.overall_accuracy()).clamp(MIN_WEIGHT, MAX_WEIGHT)
    }

    pub fn weights(&self) -> AdaptiveWeights {
        self.weights
    }

    pub fn correct_total(&self) -> u64 {
        self.wave.correct + self.melee.correct
    }

    pub fn false_positive_total(&self) -> u64 {
        self.wave.false_positives + self.melee.false_positives
    }

    pub fn missed_total(&self) -> u64 {
        self.missed
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
