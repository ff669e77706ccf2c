//! Observability views — the agent state exposed to collaborators each tick.

use serde::{Deserialize, Serialize};

use crate::enums::{ScenarioKind, VolumeLevel};
use crate::types::{CreatureId, SimTime};

/// Complete agent state produced after each tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub time: SimTime,
    pub scenario: ScenarioKind,
    pub volume: VolumeLevel,
    pub target: Option<TargetView>,
    pub threat: ThreatView,
    pub stats: SessionStats,
}

/// The currently approved target, with the arbiter's reasoning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetView {
    pub id: CreatureId,
    pub name: String,
    pub priority: f64,
    /// Why this target was chosen or kept.
    pub reason: String,
}

/// Cached aggregate of who is about to attack, for O(1) polling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreatView {
    /// At least one hostile has an imminent predicted attack.
    pub immediate_threat: bool,
    /// Confidence-and-danger weighted threat total.
    pub total_threat: f64,
    /// Number of hostiles with an imminent prediction.
    pub threat_count: u32,
    /// Highest single prediction confidence.
    pub highest_confidence: f64,
}

/// Session statistics counters. Failures in this core are observable
/// only here, never surfaced as errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub events_ingested: u64,
    pub access_failures: u64,
    pub creatures_tracked: u64,
    pub creatures_untracked: u64,
    pub predictions_made: u64,
    pub predictions_correct: u64,
    pub predictions_missed: u64,
    pub predictions_false_positive: u64,
    /// Overall EWMA prediction accuracy in [0, 1].
    pub prediction_accuracy: f64,
    pub switches_allowed: u64,
    pub switches_denied: u64,
    pub engagements_started: u64,
    pub engagements_ended: u64,
    pub scenario_changes: u64,
}
