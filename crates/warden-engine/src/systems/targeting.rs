//! Target selection — scoring, scenario modifiers, switch arbitration.
//!
//! Orchestrates one full `optimal_target` pass: detect the scenario,
//! score every candidate in engagement radius, apply the engagement
//! manager's priority modifiers, then ask it to approve or veto a
//! switch away from the currently locked target.

use std::collections::HashMap;

use hecs::{Entity, World};
use tracing::debug;

use warden_core::components::{Hostile, Identity, Vitals};
use warden_core::constants::*;
use warden_core::state::{SessionStats, TargetView};
use warden_core::types::{CreatureId, Direction, TilePoint};

use warden_brain::classifier::BehaviorClassifier;
use warden_brain::engagement::EngagementManager;
use warden_brain::feedback::CombatFeedback;
use warden_brain::patterns::{PatternBook, PatternEntry};
use warden_brain::predictor::{is_facing_position, is_position_in_wave_path, predict_wave_attack};
use warden_brain::priority::{score, PriorityContext};
use warden_brain::tracker::{BehaviorTracker, Trajectory};

use super::threat_cache::attack_context;

struct Candidate {
    id: CreatureId,
    name: String,
    priority: f64,
    health_pct: f64,
}

/// Run one target-selection pass. Returns the approved target, which
/// is either a newly locked candidate or the still-locked current one.
#[allow(clippy::too_many_arguments)]
pub fn run(
    world: &World,
    entities: &HashMap<CreatureId, Entity>,
    tracker: &BehaviorTracker,
    classifier: &BehaviorClassifier,
    patterns: &PatternBook,
    feedback: &CombatFeedback,
    engagement: &mut EngagementManager,
    own_pos: TilePoint,
    now: u64,
    stats: &mut SessionStats,
) -> Option<TargetView> {
    let hostile_count = count_hostiles(world, own_pos);
    let (_, changed) = engagement.detect_scenario(hostile_count, now);
    if changed {
        stats.scenario_changes += 1;
        debug!(scenario = ?engagement.scenario(), count = hostile_count, "scenario changed");
    }

    let candidates = gather_candidates(
        world, tracker, classifier, patterns, feedback, engagement, own_pos, now,
    );

    // Release the soft lock once its creature has left the world
    // mirror; stepping out of engagement radius is not a release. A
    // held engagement is never released here at all: death, despawn,
    // the stale sweep, and `stop_attack` are the only exits.
    if !engagement.is_engaged() {
        if let Some(lock_id) = engagement.target_lock().map(|l| l.id) {
            if !entities.contains_key(&lock_id) {
                engagement.invalidate(lock_id);
            }
        }
    }

    let best = candidates
        .iter()
        .max_by(|a, b| a.priority.total_cmp(&b.priority))?;

    let current = engagement
        .target_lock()
        .and_then(|lock| candidates.iter().find(|c| c.id == lock.id));

    let (current_priority, current_health) = current
        .map(|c| (c.priority, c.health_pct))
        .unwrap_or((0.0, 100.0));

    let decision = engagement.should_allow_switch(
        best.id,
        best.priority,
        best.health_pct,
        current_priority,
        current_health,
        now,
    );

    let chosen = if decision.allowed {
        if current.is_some_and(|c| c.id != best.id) {
            stats.switches_allowed += 1;
            debug!(from = %current.map(|c| c.id).unwrap_or(best.id), to = %best.id, reason = decision.reason, "target switch");
        }
        engagement.lock_target(best.id, best.health_pct, now);
        best
    } else {
        stats.switches_denied += 1;
        // Held on the current target; it must exist for a veto.
        current?
    };

    Some(TargetView {
        id: chosen.id,
        name: chosen.name.clone(),
        priority: chosen.priority,
        reason: decision.reason.to_string(),
    })
}

/// Count live hostiles within engagement radius (the scenario input).
pub fn count_hostiles(world: &World, own_pos: TilePoint) -> usize {
    let mut query = world.query::<(&Hostile, &TilePoint, &Vitals)>();
    query
        .iter()
        .filter(|(_, (_, pos, vitals))| {
            vitals.alive && pos.chebyshev_distance(&own_pos) <= ENGAGEMENT_RADIUS_TILES
        })
        .count()
}

/// Score every live hostile within engagement radius.
#[allow(clippy::too_many_arguments)]
fn gather_candidates(
    world: &World,
    tracker: &BehaviorTracker,
    classifier: &BehaviorClassifier,
    patterns: &PatternBook,
    feedback: &CombatFeedback,
    engagement: &EngagementManager,
    own_pos: TilePoint,
    now: u64,
) -> Vec<Candidate> {
    let default_pattern = PatternEntry::default();
    let weights = feedback.weights();
    let multiplier = feedback.priority_multiplier();
    let mut candidates = Vec::new();

    let mut query =
        world.query::<(&Hostile, &CreatureId, &Identity, &TilePoint, &Direction, &Vitals)>();
    for (_entity, (_hostile, id, identity, pos, facing, vitals)) in query.iter() {
        if !vitals.alive {
            continue;
        }
        let distance = pos.chebyshev_distance(&own_pos);
        if distance == i32::MAX || distance > ENGAGEMENT_RADIUS_TILES {
            continue;
        }

        let record = tracker.get(*id);
        let class = classifier.get(&identity.name);
        let pattern = patterns.get(&identity.name).unwrap_or(&default_pattern);

        let ctx = attack_context(*pos, *facing, own_pos, record, pattern, now);
        let prediction = predict_wave_attack(&ctx);
        let cooldown_ratio = if ctx.cooldown_ms > 0.0 {
            ctx.last_wave_ms
                .map(|t| now.saturating_sub(t) as f64 / ctx.cooldown_ms)
                .unwrap_or(1.0)
        } else {
            0.0
        };

        let priority_ctx = PriorityContext {
            distance_tiles: distance,
            health_pct: vitals.health_pct,
            dps: record.map(|r| r.dps()).unwrap_or(0.0),
            hit_count: record.map(|r| r.hit_count).unwrap_or(0),
            ms_since_last_attack: record
                .and_then(|r| r.last_attack_ms)
                .map(|t| now.saturating_sub(t)),
            wave_count: record.map(|r| r.wave_count).unwrap_or(0),
            imminent: prediction.imminent,
            time_to_attack_ms: prediction.time_to_attack_ms,
            cooldown_ratio,
            facing_player: is_facing_position(*pos, *facing, own_pos),
            player_in_wave_path: is_position_in_wave_path(
                own_pos,
                *pos,
                *facing,
                pattern.wave_range,
                pattern.wave_width,
            ),
            class_danger: class.map(|c| c.danger).unwrap_or(pattern.danger),
            is_wave_attacker: class
                .map(|c| c.is_wave_attacker)
                .unwrap_or(pattern.has_wave_attack),
            is_aggressive: class.map(|c| c.is_aggressive).unwrap_or(false),
            trajectory: record
                .map(|r| r.trajectory(own_pos))
                .unwrap_or(Trajectory::Holding),
            weights,
            adaptive_multiplier: multiplier,
        };

        let base = score(&priority_ctx, false).value;
        let priority = engagement.modify_priority(*id, base, vitals.health_pct);

        candidates.push(Candidate {
            id: *id,
            name: identity.name.clone(),
            priority,
            health_pct: vitals.health_pct,
        });
    }
    candidates
}
