//! Event ingestion — applies host events to the creature mirror and
//! the behavior tracker.
//!
//! Events are handled to completion in arrival order. Within one event
//! the consumers run in declared order: world mirror, then tracker,
//! then feedback, then threat-cache invalidation. A creature the world
//! no longer resolves is a silent no-op, counted in stats.

use std::collections::HashMap;

use hecs::{Entity, World};
use tracing::{debug, trace};

use warden_core::access::CreatureSnapshot;
use warden_core::components::{Hostile, Identity, Vitals};
use warden_core::enums::{AttackKind, PredictionOutcome};
use warden_core::events::CreatureEvent;
use warden_core::state::SessionStats;
use warden_core::types::{CreatureId, Direction, TilePoint};

use warden_brain::engagement::EngagementManager;
use warden_brain::feedback::CombatFeedback;
use warden_brain::patterns::PatternBook;
use warden_brain::tracker::BehaviorTracker;

use super::threat_cache::ThreatCache;
use super::world_snapshot;

/// Apply one host event.
#[allow(clippy::too_many_arguments)]
pub fn apply(
    event: CreatureEvent,
    world: &mut World,
    entities: &mut HashMap<CreatureId, Entity>,
    tracker: &mut BehaviorTracker,
    patterns: &mut PatternBook,
    feedback: &mut CombatFeedback,
    engagement: &mut EngagementManager,
    threat: &mut ThreatCache,
    own_pos: TilePoint,
    now: u64,
    stats: &mut SessionStats,
) {
    stats.events_ingested += 1;
    match event {
        CreatureEvent::Appeared { snapshot } => {
            on_appeared(snapshot, world, entities, tracker, patterns, now, stats);
            threat.invalidate();
        }
        CreatureEvent::Moved { id, to, walking } => {
            let Some(&entity) = entities.get(&id) else {
                stats.access_failures += 1;
                return;
            };
            if let Ok(mut pos) = world.get::<&mut TilePoint>(entity) {
                *pos = to;
            }
            if let Ok(mut vitals) = world.get::<&mut Vitals>(entity) {
                vitals.walking = walking;
            }
            refresh_tracker(world, id, entity, tracker, own_pos, now, stats);
            threat.invalidate();
        }
        CreatureEvent::Turned { id, facing } => {
            let Some(&entity) = entities.get(&id) else {
                stats.access_failures += 1;
                return;
            };
            if let Ok(mut dir) = world.get::<&mut Direction>(entity) {
                *dir = facing;
            }
            refresh_tracker(world, id, entity, tracker, own_pos, now, stats);
            threat.invalidate();
        }
        CreatureEvent::HealthChanged { id, health_pct } => {
            let Some(&entity) = entities.get(&id) else {
                stats.access_failures += 1;
                return;
            };
            if let Ok(mut vitals) = world.get::<&mut Vitals>(entity) {
                vitals.health_pct = health_pct.clamp(0.0, 100.0);
            }
            refresh_tracker(world, id, entity, tracker, own_pos, now, stats);
        }
        CreatureEvent::DamageTaken { attacker, amount } => {
            let Some(id) = attacker else {
                trace!(amount, "unattributed damage");
                return;
            };
            // Kind hint by attacker distance: adjacent strikes are melee.
            let distance = entities
                .get(&id)
                .and_then(|&e| world.get::<&TilePoint>(e).ok().map(|p| *p))
                .map(|p| p.chebyshev_distance(&own_pos));
            let kind = match distance {
                Some(d) if d <= 1 => AttackKind::Melee,
                _ => AttackKind::Wave,
            };
            match feedback.on_damage(id, kind, now) {
                PredictionOutcome::Correct => stats.predictions_correct += 1,
                PredictionOutcome::Missed => stats.predictions_missed += 1,
                _ => {}
            }
            if let Some(record) = tracker.get_mut(id) {
                record.record_damage(amount, now);
                // A hit from range is an observed ranged attack and
                // feeds the cooldown estimator.
                if let Some(d) = distance.filter(|d| *d > 1 && *d != i32::MAX) {
                    let obs = record.record_wave(now, d);
                    patterns.observe_wave(&record.name.clone(), &obs, now);
                }
            }
            threat.invalidate();
        }
        CreatureEvent::MissileObserved { from, origin } => {
            let Some(id) = from else {
                trace!(?origin, "missile with unknown source");
                return;
            };
            if let Some(record) = tracker.get_mut(id) {
                let range = origin.chebyshev_distance(&own_pos);
                let range = if range == i32::MAX { 0 } else { range };
                let obs = record.record_wave(now, range);
                patterns.observe_wave(&record.name.clone(), &obs, now);
            }
            threat.invalidate();
        }
        CreatureEvent::Died { id } => {
            remove_creature(
                id, "died", world, entities, tracker, patterns, feedback, engagement, threat, now,
                stats,
            );
        }
        CreatureEvent::Vanished { id } => {
            remove_creature(
                id, "vanished", world, entities, tracker, patterns, feedback, engagement, threat,
                now, stats,
            );
        }
    }
}

fn on_appeared(
    snapshot: CreatureSnapshot,
    world: &mut World,
    entities: &mut HashMap<CreatureId, Entity>,
    tracker: &mut BehaviorTracker,
    patterns: &mut PatternBook,
    now: u64,
    stats: &mut SessionStats,
) {
    if let Some(&entity) = entities.get(&snapshot.id) {
        // Re-sighting of a creature we already mirror: refresh in
        // place. A re-sight reporting alive=false stops updates and
        // lets the record go stale.
        if let Ok(mut pos) = world.get::<&mut TilePoint>(entity) {
            *pos = snapshot.position;
        }
        if let Ok(mut facing) = world.get::<&mut Direction>(entity) {
            *facing = snapshot.facing;
        }
        if let Ok(mut vitals) = world.get::<&mut Vitals>(entity) {
            vitals.health_pct = snapshot.health_pct;
            vitals.alive = snapshot.alive;
        }
        return;
    }
    if !snapshot.alive {
        stats.access_failures += 1;
        return;
    }
    let entity = world.spawn((
        snapshot.id,
        Identity {
            name: snapshot.name.clone(),
        },
        snapshot.position,
        snapshot.facing,
        Vitals {
            health_pct: snapshot.health_pct,
            speed: snapshot.speed,
            base_speed: snapshot.base_speed,
            alive: snapshot.alive,
            walking: snapshot.walking,
        },
        Hostile,
    ));
    entities.insert(snapshot.id, entity);
    patterns.touch(&snapshot.name, now);
    if tracker.track(&snapshot, now) {
        stats.creatures_tracked += 1;
        debug!(id = %snapshot.id, name = %snapshot.name, "tracking creature");
    }
}

fn refresh_tracker(
    world: &World,
    id: CreatureId,
    entity: Entity,
    tracker: &mut BehaviorTracker,
    own_pos: TilePoint,
    now: u64,
    stats: &mut SessionStats,
) {
    match world_snapshot(world, id, entity) {
        Some(snap) => tracker.update(&snap, own_pos, now),
        None => stats.access_failures += 1,
    }
}

/// Tear down everything that references a creature.
#[allow(clippy::too_many_arguments)]
pub fn remove_creature(
    id: CreatureId,
    cause: &str,
    world: &mut World,
    entities: &mut HashMap<CreatureId, Entity>,
    tracker: &mut BehaviorTracker,
    patterns: &mut PatternBook,
    feedback: &mut CombatFeedback,
    engagement: &mut EngagementManager,
    threat: &mut ThreatCache,
    now: u64,
    stats: &mut SessionStats,
) {
    if let Some(entity) = entities.remove(&id) {
        let _ = world.despawn(entity);
    }
    if let Some(agg) = tracker.untrack(id, now) {
        patterns.absorb_aggregate(&agg, now);
        stats.creatures_untracked += 1;
        debug!(
            id = %id,
            name = %agg.name,
            cause,
            dps = agg.dps,
            waves = agg.wave_count,
            "untracked creature"
        );
    }
    feedback.forget(id);
    if engagement.engaged_id() == Some(id) {
        stats.engagements_ended += 1;
    }
    engagement.invalidate(id);
    threat.invalidate();
}
