//! Engine systems, run in a fixed order from `CombatEngine::tick`.

pub mod auto_tune;
pub mod ingest;
pub mod targeting;
pub mod threat_cache;
pub mod upkeep;

use hecs::{Entity, World};

use warden_core::access::CreatureSnapshot;
use warden_core::components::{Identity, Vitals};
use warden_core::types::{CreatureId, Direction, TilePoint};

/// Rebuild a plain snapshot from the mirrored world entity.
/// Returns None if any component is missing (entity being torn down).
pub(crate) fn world_snapshot(world: &World, id: CreatureId, entity: Entity) -> Option<CreatureSnapshot> {
    let name = world.get::<&Identity>(entity).ok()?.name.clone();
    let position = *world.get::<&TilePoint>(entity).ok()?;
    let facing = *world.get::<&Direction>(entity).ok()?;
    let vitals = *world.get::<&Vitals>(entity).ok()?;
    Some(CreatureSnapshot {
        id,
        name,
        position,
        facing,
        health_pct: vitals.health_pct,
        speed: vitals.speed,
        base_speed: vitals.base_speed,
        alive: vitals.alive,
        walking: vitals.walking,
    })
}
