//! Upkeep — stale-record sweep and pattern decay.

use std::collections::HashMap;

use hecs::{Entity, World};
use tracing::debug;

use warden_core::state::SessionStats;
use warden_core::types::CreatureId;

use warden_brain::engagement::EngagementManager;
use warden_brain::feedback::CombatFeedback;
use warden_brain::patterns::PatternBook;
use warden_brain::tracker::BehaviorTracker;

use super::threat_cache::ThreatCache;

/// Drop records (and their world mirror) for creatures with no update
/// inside the stale timeout. Returns how many were removed.
#[allow(clippy::too_many_arguments)]
pub fn sweep_stale(
    world: &mut World,
    entities: &mut HashMap<CreatureId, Entity>,
    tracker: &mut BehaviorTracker,
    patterns: &mut PatternBook,
    feedback: &mut CombatFeedback,
    engagement: &mut EngagementManager,
    threat: &mut ThreatCache,
    now: u64,
    stats: &mut SessionStats,
) -> usize {
    let removed = tracker.sweep_stale(now);
    for (id, agg) in &removed {
        if let Some(entity) = entities.remove(id) {
            let _ = world.despawn(entity);
        }
        patterns.absorb_aggregate(agg, now);
        feedback.forget(*id);
        if engagement.engaged_id() == Some(*id) {
            stats.engagements_ended += 1;
        }
        engagement.invalidate(*id);
        stats.creatures_untracked += 1;
        debug!(id = %id, name = %agg.name, "dropped stale record");
    }
    if !removed.is_empty() {
        threat.invalidate();
    }
    removed.len()
}

/// Decay long-unseen patterns toward defaults.
pub fn decay_patterns(patterns: &mut PatternBook, now: u64) -> usize {
    let decayed = patterns.decay(now);
    if decayed > 0 {
        debug!(decayed, "decayed long-unseen patterns");
    }
    decayed
}
