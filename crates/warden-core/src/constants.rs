//! Agent constants and tuning parameters.

/// Engine tick rate (Hz).
pub const TICK_RATE: u32 = 10;

/// Milliseconds per tick.
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

// --- Behavior tracking ---

/// Rolling analysis window per tracked creature (ms).
pub const ANALYSIS_WINDOW_MS: u64 = 10_000;

/// A record with no update for this long is considered stale and dropped.
pub const STALE_TIMEOUT_MS: u64 = 12_000;

/// Below this many movement samples a record is low-confidence.
pub const LOW_CONFIDENCE_SAMPLES: u32 = 50;

/// Asymptotic cap on tracker confidence.
pub const TRACK_CONFIDENCE_CAP: f64 = 0.9;

/// EWMA alpha for instantaneous speed samples.
pub const SPEED_EWMA_ALPHA: f64 = 0.2;

/// EWMA alpha for health-change-rate samples.
pub const HEALTH_RATE_EWMA_ALPHA: f64 = 0.2;

// --- Cooldown estimation ---

/// Default EWMA alpha for attack-interval estimation.
pub const COOLDOWN_EWMA_ALPHA: f64 = 0.25;

/// Fallback wave cooldown before any interval has been observed (ms).
pub const DEFAULT_WAVE_COOLDOWN_MS: f64 = 2_000.0;

// --- Prediction ---

/// A predicted attack closer than this is imminent (ms).
pub const IMMINENT_THRESHOLD_MS: f64 = 500.0;

/// Confidence penalty per unit of cooldown coefficient-of-variation.
pub const VARIANCE_PENALTY_SCALE: f64 = 0.28;

/// Hard cap on the variance penalty.
pub const VARIANCE_PENALTY_CAP: f64 = 0.45;

/// Prediction confidence clamp bounds.
pub const PREDICTION_MIN_CONFIDENCE: f64 = 0.05;
pub const PREDICTION_MAX_CONFIDENCE: f64 = 0.95;

/// Default wave footprint when nothing has been learned yet (tiles).
pub const DEFAULT_WAVE_RANGE: i32 = 5;
pub const DEFAULT_WAVE_WIDTH: i32 = 1;

/// Horizon for position-danger aggregation (ms).
pub const POSITION_DANGER_HORIZON_MS: f64 = 1_000.0;

// --- Pattern book ---

/// Per-observation confidence gain for a learned pattern.
pub const PATTERN_CONFIDENCE_STEP: f64 = 0.02;

/// Cap on learned-pattern confidence.
pub const PATTERN_CONFIDENCE_CAP: f64 = 0.99;

/// Danger level assumed for never-seen creature types.
pub const DEFAULT_DANGER: f64 = 2.0;

/// Patterns unseen for this long start decaying (ms). Seven days.
pub const PATTERN_DECAY_AFTER_MS: u64 = 7 * 24 * 3_600_000;

/// Confidence multiplier applied per decay pass to long-unseen patterns.
pub const PATTERN_DECAY_FACTOR: f64 = 0.9;

/// Interval between decay passes (ms). Hourly.
pub const PATTERN_DECAY_INTERVAL_MS: u64 = 3_600_000;

// --- Classification ---

/// Minimum movement samples before (re)classification.
pub const CLASSIFY_MIN_SAMPLES: u32 = 15;

/// DPS above which a creature earns the full danger bump.
pub const HIGH_DPS: f64 = 30.0;

/// Average speed above which a creature is flagged fast (tiles/sec).
pub const FAST_SPEED_TILES_PER_SEC: f64 = 1.6;

/// Wave-attacker thresholds: sustained rate (waves/sec) or absolute count.
pub const WAVE_RATE_THRESHOLD: f64 = 0.3;
pub const WAVE_COUNT_THRESHOLD: u32 = 3;

/// Cap on classification confidence.
pub const CLASSIFY_CONFIDENCE_CAP: f64 = 0.95;

// --- Combat feedback ---

/// Window inside which received damage corroborates a prediction (ms).
pub const CORRELATION_WINDOW_MS: u64 = 2_000;

/// Cap on the pending-prediction queue.
pub const PREDICTION_QUEUE_CAP: usize = 32;

/// EWMA alpha for per-category prediction accuracy.
pub const ACCURACY_EWMA_ALPHA: f64 = 0.15;

/// Adaptive weight bounds.
pub const MIN_WEIGHT: f64 = 0.5;
pub const MAX_WEIGHT: f64 = 1.5;

/// Base learning rate for adaptive weight nudges.
pub const FEEDBACK_LEARNING_RATE: f64 = 0.1;

// --- Scenario / engagement ---

/// Radius inside which hostiles count toward the scenario (tiles).
pub const ENGAGEMENT_RADIUS_TILES: i32 = 7;

/// Minimum interval between scenario re-detections (ms).
pub const SCENARIO_DETECT_INTERVAL_MS: u64 = 200;

/// Below this health the locked target is in the finishing-kill band
/// and switching away is unconditionally blocked.
pub const FINISHING_KILL_HEALTH_PCT: f64 = 45.0;

/// Health drop since lock that counts as "making progress".
pub const PROGRESS_HEALTH_DELTA_PCT: f64 = 8.0;

/// Priority bonus for the actively-engaged target.
pub const ENGAGEMENT_PRIORITY_BONUS: f64 = 150.0;

/// Priority bonus for candidates in the finishing-kill band.
pub const FINISHING_PRIORITY_BONUS: f64 = 60.0;

/// Player-move ring length inspected by the zigzag detector.
pub const ZIGZAG_WINDOW: usize = 8;

/// Fraction of direction reversals that flags zigzag.
pub const ZIGZAG_REVERSAL_RATIO: f64 = 0.5;

/// Consecutive target switches that flag zigzag on their own.
pub const ZIGZAG_SWITCH_BURST: u32 = 3;

/// Rolling window for the switches-per-minute cap (ms).
pub const SWITCH_RATE_WINDOW_MS: u64 = 60_000;

// --- Engine cadence ---

/// Main periodic update interval (ms).
pub const MAIN_UPDATE_INTERVAL_MS: u64 = 500;

/// Auto-tune pass interval (ms).
pub const AUTO_TUNE_INTERVAL_MS: u64 = 30_000;

/// Pattern persistence interval (ms).
pub const PERSIST_INTERVAL_MS: u64 = 60_000;

/// Threat cache freshness window at Normal volume (ms).
pub const THREAT_CACHE_TTL_MS: u64 = 400;

// --- Volume adaptation ---

/// Hostile counts at which load-shedding tiers engage.
pub const VOLUME_ELEVATED_COUNT: usize = 6;
pub const VOLUME_HIGH_COUNT: usize = 10;
pub const VOLUME_EXTREME_COUNT: usize = 15;

// --- Priority scoring ---

/// Base score granted to every candidate.
pub const PRIORITY_BASE: f64 = 100.0;

/// Final priority clamp.
pub const PRIORITY_MAX: f64 = 1_000.0;
