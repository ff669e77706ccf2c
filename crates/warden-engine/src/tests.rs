//! Tests for the engine: event ingestion, target locking, threat
//! polling, persistence, load shedding, and invariants under churn.

use std::cell::RefCell;
use std::rc::Rc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use warden_core::access::CreatureSnapshot;
use warden_core::enums::{ScenarioKind, VolumeLevel};
use warden_core::events::CreatureEvent;
use warden_core::types::{CreatureId, Direction, TilePoint};

use crate::engine::{CombatEngine, EngineConfig};
use crate::persist::{MemoryStore, NullStore, PatternStore, StoreError};

fn tile(x: i32, y: i32) -> TilePoint {
    TilePoint::new(x, y, 0)
}

fn snapshot(id: u32, name: &str, pos: TilePoint, facing: Direction) -> CreatureSnapshot {
    CreatureSnapshot {
        id: CreatureId(id),
        name: name.to_string(),
        position: pos,
        facing,
        health_pct: 100.0,
        speed: 1.0,
        base_speed: 1.0,
        alive: true,
        walking: false,
    }
}

fn appeared(id: u32, name: &str, pos: TilePoint, facing: Direction) -> CreatureEvent {
    CreatureEvent::Appeared {
        snapshot: snapshot(id, name, pos, facing),
    }
}

fn engine() -> CombatEngine {
    CombatEngine::new(EngineConfig::default(), Box::new(MemoryStore::new()))
}

// ---- Lifecycle ----

#[test]
fn test_appeared_creates_records() {
    let mut engine = engine();
    engine.queue_events([
        appeared(1, "Orc", tile(2, 0), Direction::West),
        appeared(2, "Orc", tile(3, 0), Direction::West),
        appeared(3, "Troll", tile(0, 4), Direction::North),
    ]);
    let snap = engine.tick();
    assert_eq!(engine.tracked_count(), 3);
    assert_eq!(snap.stats.creatures_tracked, 3);
    assert_eq!(snap.stats.events_ingested, 3);
}

#[test]
fn test_death_removes_record_but_keeps_learning() {
    let mut engine = engine();
    engine.queue_event(appeared(1, "Orc", tile(2, 0), Direction::West));
    engine.tick();
    // Walk the creature around to accumulate classification samples.
    for i in 0..30 {
        let x = 2 + (i % 2);
        engine.queue_event(CreatureEvent::Moved {
            id: CreatureId(1),
            to: tile(x, 0),
            walking: true,
        });
        engine.tick();
    }
    assert!(engine
        .classification_table()
        .iter()
        .any(|c| c.name == "orc" && c.samples > 0));

    engine.queue_event(CreatureEvent::Died { id: CreatureId(1) });
    let snap = engine.tick();
    assert_eq!(engine.tracked_count(), 0);
    assert_eq!(snap.stats.creatures_untracked, 1);
    // Name-keyed learning outlives the record.
    assert!(engine.classification_table().iter().any(|c| c.name == "orc"));
    assert!(engine.patterns().get("orc").is_some());
    assert!(snap.target.is_none() || snap.target.as_ref().is_some_and(|t| t.id != CreatureId(1)));
}

#[test]
fn test_dead_resight_goes_stale() {
    let mut engine = engine();
    engine.queue_event(appeared(1, "Ghost", tile(2, 0), Direction::West));
    engine.tick();
    assert_eq!(engine.tracked_count(), 1);

    // Host re-sight reports the creature dead without a Died event.
    let mut dead = snapshot(1, "Ghost", tile(2, 0), Direction::West);
    dead.alive = false;
    engine.queue_event(CreatureEvent::Appeared { snapshot: dead });

    // 15 seconds of ticks: no updates land, the record goes stale.
    for _ in 0..150 {
        engine.tick();
    }
    assert_eq!(engine.tracked_count(), 0, "stale record must be swept");
}

// ---- Targeting ----

#[test]
fn test_target_acquired_and_sticky() {
    let mut engine = engine();
    engine.queue_events([
        appeared(1, "Orc", tile(1, 0), Direction::West),
        appeared(2, "Orc", tile(4, 0), Direction::West),
        appeared(3, "Orc", tile(0, 5), Direction::North),
    ]);
    engine.tick();
    let target = engine.optimal_target().expect("three candidates in range");
    // The adjacent hostile wins on distance.
    assert_eq!(target.id, CreatureId(1));

    // Repeated polls hold the same target under the soft lock.
    for _ in 0..10 {
        engine.tick();
        let held = engine.optimal_target().expect("target still present");
        assert_eq!(held.id, CreatureId(1), "soft lock must resist re-targeting");
    }
    assert_eq!(engine.scenario(), ScenarioKind::Few);
}

#[test]
fn test_engagement_lock_survives_better_candidates() {
    let mut engine = engine();
    engine.queue_events([
        appeared(1, "Orc", tile(4, 0), Direction::West),
        appeared(2, "Orc", tile(5, 0), Direction::West),
    ]);
    engine.tick();
    assert!(engine.start_attack(CreatureId(1)));
    assert!(engine.is_engaged(), "Few-scale scenarios require the hard lock");

    // A far more attractive candidate appears adjacent, even wounded.
    let mut tasty = snapshot(3, "Rat", tile(1, 0), Direction::West);
    tasty.health_pct = 20.0;
    engine.queue_event(CreatureEvent::Appeared { snapshot: tasty });
    for _ in 0..20 {
        engine.tick();
        let target = engine.optimal_target().expect("candidates present");
        assert_eq!(
            target.id,
            CreatureId(1),
            "engagement lock must veto every switch"
        );
    }

    // Only the engaged target's death releases the lock.
    engine.queue_event(CreatureEvent::Died { id: CreatureId(1) });
    engine.tick();
    assert!(!engine.is_engaged());
    let target = engine.optimal_target().expect("two candidates remain");
    assert_ne!(target.id, CreatureId(1));
}

#[test]
fn test_engagement_survives_target_leaving_radius() {
    let mut engine = engine();
    engine.queue_events([
        appeared(1, "Orc", tile(3, 0), Direction::West),
        appeared(2, "Orc", tile(2, 0), Direction::West),
    ]);
    engine.tick();
    assert!(engine.start_attack(CreatureId(1)));
    assert!(engine.is_engaged());

    // The engaged orc retreats beyond engagement radius while staying
    // alive and visible.
    engine.queue_event(CreatureEvent::Moved {
        id: CreatureId(1),
        to: tile(12, 0),
        walking: true,
    });
    for _ in 0..10 {
        engine.tick();
        assert!(
            engine.is_engaged(),
            "lock must survive the target leaving radius"
        );
        // No other target may be selected while the lock is held.
        let target = engine.optimal_target();
        assert!(target.is_none() || target.is_some_and(|t| t.id == CreatureId(1)));
    }

    // Back in range, the engaged target is re-approved.
    engine.queue_event(CreatureEvent::Moved {
        id: CreatureId(1),
        to: tile(3, 0),
        walking: true,
    });
    engine.tick();
    let target = engine.optimal_target().expect("engaged target back in range");
    assert_eq!(target.id, CreatureId(1));
}

#[test]
fn test_stop_attack_releases_engagement() {
    let mut engine = engine();
    engine.queue_event(appeared(1, "Orc", tile(2, 0), Direction::West));
    engine.tick();
    engine.start_attack(CreatureId(1));
    assert!(engine.is_engaged());
    engine.stop_attack("player cancelled");
    assert!(!engine.is_engaged());
    assert_eq!(engine.stats().engagements_ended, 1);
}

#[test]
fn test_swarm_attack_does_not_count_engagement() {
    let mut engine = engine();
    for id in 0..8u32 {
        engine.queue_event(appeared(
            id,
            "Rat",
            tile(1 + (id as i32 % 4), 1 + (id as i32 / 4)),
            Direction::North,
        ));
    }
    engine.tick();
    assert_eq!(engine.scenario(), ScenarioKind::Swarm);

    // Swarm scenarios take no hard lock; the counters must not move.
    assert!(engine.start_attack(CreatureId(0)));
    assert!(!engine.is_engaged());
    assert_eq!(engine.stats().engagements_started, 0);
    engine.stop_attack("executor gave up");
    assert_eq!(engine.stats().engagements_ended, 0);
}

#[test]
fn test_no_target_when_idle() {
    let mut engine = engine();
    let snap = engine.tick();
    assert_eq!(snap.scenario, ScenarioKind::Idle);
    assert!(engine.optimal_target().is_none());
}

// ---- Threat polling ----

#[test]
fn test_immediate_threat_from_facing_hostile() {
    let mut engine = engine();
    // Unknown type: conservatively assumed wave-capable and ready.
    engine.queue_event(appeared(1, "Warlock", tile(3, 0), Direction::West));
    engine.tick();
    let threat = engine.immediate_threat();
    assert!(threat.immediate_threat);
    assert!(threat.threat_count >= 1);
    assert!(threat.highest_confidence > 0.0);
}

#[test]
fn test_no_threat_when_facing_away() {
    let mut engine = engine();
    engine.queue_event(appeared(1, "Warlock", tile(3, 0), Direction::East));
    engine.tick();
    let threat = engine.immediate_threat();
    assert!(!threat.immediate_threat);
    assert_eq!(threat.threat_count, 0);
}

#[test]
fn test_position_danger_in_corridor() {
    let mut engine = engine();
    engine.queue_event(appeared(1, "Warlock", tile(3, 0), Direction::West));
    engine.tick();
    // (1,0) sits in the westward corridor from (3,0).
    let (dangerous, total) = engine.is_position_dangerous(tile(1, 0));
    assert!(dangerous);
    assert!(total > 0.0);
    // A tile far out of any corridor is safe.
    let (dangerous, total) = engine.is_position_dangerous(tile(10, 10));
    assert!(!dangerous);
    assert_eq!(total, 0.0);
}

// ---- Feedback loop ----

#[test]
fn test_prediction_confirmed_by_damage() {
    let mut engine = engine();
    engine.queue_event(appeared(1, "Warlock", tile(3, 0), Direction::West));
    let snap = engine.tick();
    assert!(snap.stats.predictions_made >= 1, "facing hostile must be predicted");

    engine.queue_event(CreatureEvent::DamageTaken {
        attacker: Some(CreatureId(1)),
        amount: 40,
    });
    let snap = engine.tick();
    assert_eq!(snap.stats.predictions_correct, 1);
}

#[test]
fn test_unpredicted_damage_counts_missed() {
    let mut engine = engine();
    // Facing away: no prediction gets recorded.
    engine.queue_event(appeared(1, "Warlock", tile(3, 0), Direction::East));
    engine.tick();
    engine.queue_event(CreatureEvent::DamageTaken {
        attacker: Some(CreatureId(1)),
        amount: 40,
    });
    let snap = engine.tick();
    assert_eq!(snap.stats.predictions_missed, 1);
}

#[test]
fn test_ranged_damage_feeds_cooldown_learning() {
    let mut engine = engine();
    engine.queue_event(appeared(1, "Hydra", tile(4, 0), Direction::West));
    engine.tick();
    // Two missiles two seconds apart teach the wave cooldown.
    engine.queue_event(CreatureEvent::MissileObserved {
        from: Some(CreatureId(1)),
        origin: tile(4, 0),
    });
    for _ in 0..20 {
        engine.tick();
    }
    engine.queue_event(CreatureEvent::MissileObserved {
        from: Some(CreatureId(1)),
        origin: tile(4, 0),
    });
    engine.tick();
    let entry = engine.patterns().get("hydra").expect("pattern learned");
    assert!((entry.wave_cooldown_ms - 2000.0).abs() < 150.0);
    assert!(entry.confidence > 0.1);
}

// ---- Persistence ----

/// Test-only store handle that exposes the saved blob.
#[derive(Clone, Default)]
struct SharedStore {
    blob: Rc<RefCell<Option<Vec<u8>>>>,
}

impl PatternStore for SharedStore {
    fn load(&mut self) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.blob.borrow().clone())
    }

    fn save(&mut self, blob: &[u8]) -> Result<(), StoreError> {
        *self.blob.borrow_mut() = Some(blob.to_vec());
        Ok(())
    }
}

#[test]
fn test_patterns_survive_engine_restart() {
    let store = SharedStore::default();

    let mut engine = CombatEngine::new(EngineConfig::default(), Box::new(store.clone()));
    engine.queue_event(appeared(1, "Hydra", tile(4, 0), Direction::West));
    engine.tick();
    engine.queue_event(CreatureEvent::MissileObserved {
        from: Some(CreatureId(1)),
        origin: tile(4, 0),
    });
    for _ in 0..20 {
        engine.tick();
    }
    engine.queue_event(CreatureEvent::MissileObserved {
        from: Some(CreatureId(1)),
        origin: tile(4, 0),
    });
    engine.tick();
    engine.flush_patterns();
    assert!(store.blob.borrow().is_some());

    // A fresh engine sees the learned pattern.
    let revived = CombatEngine::new(EngineConfig::default(), Box::new(store.clone()));
    let entry = revived.patterns().get("hydra").expect("pattern restored");
    assert!((entry.wave_cooldown_ms - 2000.0).abs() < 150.0);
}

#[test]
fn test_unavailable_store_degrades_to_memory() {
    let mut engine = CombatEngine::new(EngineConfig::default(), Box::new(NullStore));
    engine.queue_event(appeared(1, "Orc", tile(2, 0), Direction::West));
    let snap = engine.tick();
    assert_eq!(snap.stats.creatures_tracked, 1);
    // Persistence failures stay internal.
    engine.flush_patterns();
    assert!(engine.patterns().get("orc").is_some());
}

// ---- Volume adaptation ----

#[test]
fn test_volume_tiers_with_crowd() {
    let mut engine = engine();
    for id in 0..16u32 {
        engine.queue_event(appeared(
            id,
            "Rat",
            tile(1 + (id as i32 % 4), 1 + (id as i32 / 4)),
            Direction::North,
        ));
    }
    let snap = engine.tick();
    assert_eq!(snap.volume, VolumeLevel::Extreme);
    assert_eq!(snap.scenario, ScenarioKind::Overwhelming);

    // Thin the crowd back down.
    for id in 4..16u32 {
        engine.queue_event(CreatureEvent::Died { id: CreatureId(id) });
    }
    let snap = engine.tick();
    assert_eq!(snap.volume, VolumeLevel::Normal);
}

// ---- Snapshot ----

#[test]
fn test_snapshot_serializes() {
    let mut engine = engine();
    engine.queue_events([
        appeared(1, "Orc", tile(1, 0), Direction::West),
        appeared(2, "Troll", tile(3, 2), Direction::North),
    ]);
    engine.tick();
    engine.optimal_target();
    let snap = engine.tick();
    let json = serde_json::to_string(&snap).unwrap();
    assert!(json.contains("\"scenario\""));
    assert!(json.contains("\"stats\""));
}

// ---- Invariants under churn ----

#[test]
fn test_random_churn_invariants() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut engine = engine();
    let mut alive: Vec<u32> = Vec::new();
    let mut engaged: Option<u32> = None;

    for step in 0..600 {
        match rng.gen_range(0..10) {
            0..=2 => {
                let id = rng.gen_range(0..24u32);
                if !alive.contains(&id) {
                    alive.push(id);
                    let pos = tile(rng.gen_range(-6..=6), rng.gen_range(-6..=6));
                    let facing = Direction::from_raw(rng.gen_range(0..8)).unwrap();
                    let name = if id % 2 == 0 { "Orc" } else { "Hydra" };
                    engine.queue_event(appeared(id, name, pos, facing));
                }
            }
            3..=5 => {
                if !alive.is_empty() {
                    let id = alive[rng.gen_range(0..alive.len())];
                    engine.queue_event(CreatureEvent::Moved {
                        id: CreatureId(id),
                        to: tile(rng.gen_range(-6..=6), rng.gen_range(-6..=6)),
                        walking: true,
                    });
                }
            }
            6 => {
                if !alive.is_empty() {
                    let idx = rng.gen_range(0..alive.len());
                    let id = alive.swap_remove(idx);
                    engine.queue_event(CreatureEvent::Died { id: CreatureId(id) });
                    if engaged == Some(id) {
                        engaged = None;
                    }
                }
            }
            7 => {
                if !alive.is_empty() {
                    let id = alive[rng.gen_range(0..alive.len())];
                    engine.queue_event(CreatureEvent::DamageTaken {
                        attacker: Some(CreatureId(id)),
                        amount: rng.gen_range(1..60),
                    });
                }
            }
            8 => {
                if engaged.is_none() && !alive.is_empty() && step > 5 {
                    let id = alive[rng.gen_range(0..alive.len())];
                    if engine.start_attack(CreatureId(id)) && engine.is_engaged() {
                        engaged = Some(id);
                    }
                }
            }
            _ => {}
        }

        engine.tick();

        // Records exist only for visible creatures.
        assert!(
            engine.tracked_count() <= alive.len(),
            "step {step}: {} records for {} alive creatures",
            engine.tracked_count(),
            alive.len()
        );

        // The engagement lock is never switched away from.
        if engine.is_engaged() {
            if let (Some(expected), Some(target)) = (engaged, engine.optimal_target()) {
                assert_eq!(
                    target.id,
                    CreatureId(expected),
                    "step {step}: engagement lock violated"
                );
            }
        } else {
            engaged = None;
        }
    }
}
