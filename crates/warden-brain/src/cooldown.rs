//! EWMA attack-cooldown estimation.
//!
//! One estimator per tracked creature, fed with observed inter-attack
//! intervals. The mean is the predicted cooldown; the coefficient of
//! variation becomes a confidence penalty in the predictor.

use warden_core::constants::COOLDOWN_EWMA_ALPHA;

/// Online mean/variance estimator for attack intervals.
#[derive(Debug, Clone)]
pub struct CooldownEstimator {
    mean_ms: f64,
    variance: f64,
    alpha: f64,
    samples: u32,
}

impl Default for CooldownEstimator {
    fn default() -> Self {
        Self::new(COOLDOWN_EWMA_ALPHA)
    }
}

impl CooldownEstimator {
    pub fn new(alpha: f64) -> Self {
        Self {
            mean_ms: 0.0,
            variance: 0.0,
            alpha,
            samples: 0,
        }
    }

    /// Feed one observed inter-attack interval (ms).
    /// The first sample seeds the mean with zero variance.
    pub fn observe(&mut self, interval_ms: f64) {
        if interval_ms <= 0.0 {
            return;
        }
        if self.samples == 0 {
            self.mean_ms = interval_ms;
            self.variance = 0.0;
        } else {
            let delta = interval_ms - self.mean_ms;
            self.mean_ms = self.alpha * interval_ms + (1.0 - self.alpha) * self.mean_ms;
            self.variance = (1.0 - self.alpha) * self.variance + self.alpha * delta * delta;
        }
        self.samples += 1;
    }

    /// Predicted cooldown (ms). Zero until seeded.
    pub fn mean_ms(&self) -> f64 {
        self.mean_ms
    }

    pub fn variance(&self) -> f64 {
        self.variance
    }

    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }

    /// `sqrt(variance) / mean` — the relative jitter of the interval.
    pub fn coefficient_of_variation(&self) -> f64 {
        if self.mean_ms > 0.0 {
            self.std_dev() / self.mean_ms
        } else {
            0.0
        }
    }

    pub fn samples(&self) -> u32 {
        self.samples
    }

    pub fn is_seeded(&self) -> bool {
        self.samples > 0
    }

    /// Retune the smoothing factor (volume adaptation widens it under load).
    pub fn set_alpha(&mut self, alpha: f64) {
        self.alpha = alpha.clamp(0.01, 1.0);
    }
}
