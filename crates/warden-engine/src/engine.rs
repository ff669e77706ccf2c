//! The combat engine — event queue, tick loop, and public agent API.
//!
//! Single-threaded and cooperative: host events are queued and drained
//! at the next tick boundary, periodic passes (main update, auto-tune,
//! pattern decay, persistence) fire on tick timestamps, and every
//! mutation completes before control returns to the caller.

use std::collections::{HashMap, VecDeque};

use hecs::{Entity, World};
use tracing::{debug, warn};

use warden_core::components::Vitals;
use warden_core::constants::*;
use warden_core::enums::{AttackKind, DangerLevel, ScenarioKind};
use warden_core::events::CreatureEvent;
use warden_core::state::{AgentSnapshot, SessionStats, TargetView, ThreatView};
use warden_core::types::{CreatureId, SimTime, TilePoint};

use warden_brain::classifier::{BehaviorClassifier, CreatureClass};
use warden_brain::engagement::EngagementManager;
use warden_brain::feedback::CombatFeedback;
use warden_brain::patterns::{DangerSuggestion, PatternBook, PatternEntry};
use warden_brain::predictor::{predict_position_danger, predict_wave_attack};
use warden_brain::tracker::BehaviorTracker;

use crate::persist::PatternStore;
use crate::systems;
use crate::systems::threat_cache::{attack_context, ThreatCache};
use crate::volume::VolumeState;

/// Minimum confidence for a prediction to enter the feedback queue.
const RECORD_PREDICTION_CONFIDENCE: f64 = 0.3;

/// Configuration for a new engine.
pub struct EngineConfig {
    /// Starting position of the controlled agent.
    pub own_position: TilePoint,
    pub auto_tune_interval_ms: u64,
    pub persist_interval_ms: u64,
    pub pattern_decay_interval_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            own_position: TilePoint::default(),
            auto_tune_interval_ms: AUTO_TUNE_INTERVAL_MS,
            persist_interval_ms: PERSIST_INTERVAL_MS,
            pattern_decay_interval_ms: PATTERN_DECAY_INTERVAL_MS,
        }
    }
}

/// The engine. Owns the creature mirror and all decision state.
pub struct CombatEngine {
    world: World,
    entities: HashMap<CreatureId, Entity>,
    time: SimTime,
    config: EngineConfig,
    own_pos: TilePoint,

    tracker: BehaviorTracker,
    classifier: BehaviorClassifier,
    patterns: PatternBook,
    feedback: CombatFeedback,
    engagement: EngagementManager,
    threat: ThreatCache,
    volume: VolumeState,

    stats: SessionStats,
    events: VecDeque<CreatureEvent>,
    store: Box<dyn PatternStore>,
    current_target: Option<TargetView>,

    next_main_ms: u64,
    next_auto_tune_ms: u64,
    next_decay_ms: u64,
    next_persist_ms: u64,
}

impl CombatEngine {
    /// Create an engine, loading learned patterns from the store.
    /// An unavailable or corrupt store degrades to in-memory defaults.
    pub fn new(config: EngineConfig, mut store: Box<dyn PatternStore>) -> Self {
        let patterns = match store.load() {
            Ok(Some(blob)) => match serde_json::from_slice(&blob) {
                Ok(book) => book,
                Err(error) => {
                    warn!(%error, "corrupt pattern blob, starting from defaults");
                    PatternBook::new()
                }
            },
            Ok(None) => PatternBook::new(),
            Err(error) => {
                warn!(%error, "pattern store unavailable, in-memory patterns only");
                PatternBook::new()
            }
        };

        let own_pos = config.own_position;
        Self {
            world: World::new(),
            entities: HashMap::new(),
            time: SimTime::default(),
            own_pos,
            tracker: BehaviorTracker::new(),
            classifier: BehaviorClassifier::new(),
            patterns,
            feedback: CombatFeedback::new(),
            engagement: EngagementManager::new(),
            threat: ThreatCache::new(),
            volume: VolumeState::new(),
            stats: SessionStats::default(),
            events: VecDeque::new(),
            store,
            current_target: None,
            next_main_ms: 0,
            next_auto_tune_ms: config.auto_tune_interval_ms,
            next_decay_ms: config.pattern_decay_interval_ms,
            next_persist_ms: config.persist_interval_ms,
            config,
        }
    }

    /// Queue a host event for processing at the next tick boundary.
    pub fn queue_event(&mut self, event: CreatureEvent) {
        self.events.push_back(event);
    }

    /// Queue multiple events.
    pub fn queue_events(&mut self, events: impl IntoIterator<Item = CreatureEvent>) {
        self.events.extend(events);
    }

    /// Report the agent's own position (from the local actor accessor).
    pub fn set_own_position(&mut self, pos: TilePoint) {
        if pos != self.own_pos && pos.same_floor(&self.own_pos) {
            self.engagement.note_own_move(self.own_pos.delta_2d(&pos));
        }
        self.own_pos = pos;
    }

    /// Advance the engine by one tick and return the resulting snapshot.
    pub fn tick(&mut self) -> AgentSnapshot {
        let now = self.time.now_ms();
        let untracked_before = self.stats.creatures_untracked;

        // 1. Drain host events in arrival order.
        while let Some(event) = self.events.pop_front() {
            systems::ingest::apply(
                event,
                &mut self.world,
                &mut self.entities,
                &mut self.tracker,
                &mut self.patterns,
                &mut self.feedback,
                &mut self.engagement,
                &mut self.threat,
                self.own_pos,
                now,
                &mut self.stats,
            );
        }

        // A target that left the world mid-interval must not linger in
        // the snapshot until the next selection pass.
        let target_gone = self
            .current_target
            .as_ref()
            .is_some_and(|t| !self.entities.contains_key(&t.id));
        if target_gone {
            self.current_target = None;
        }

        // 2. Volume adaptation from the visible hostile count.
        let hostile_count = systems::targeting::count_hostiles(&self.world, self.own_pos);
        if self.volume.update(hostile_count) {
            self.tracker.set_cooldown_alpha(self.volume.cooldown_alpha());
            self.threat.set_ttl(self.volume.cache_ttl_ms());
            debug!(level = ?self.volume.level(), hostile_count, "volume level changed");
        }

        // 3. Main periodic pass: sampling, prediction, cache refresh.
        if now >= self.next_main_ms {
            self.run_main_update(now);
            systems::upkeep::sweep_stale(
                &mut self.world,
                &mut self.entities,
                &mut self.tracker,
                &mut self.patterns,
                &mut self.feedback,
                &mut self.engagement,
                &mut self.threat,
                now,
                &mut self.stats,
            );
            self.next_main_ms = now + self.volume.sample_interval_ms();
        }

        // 4. Auto-tune pass.
        if now >= self.next_auto_tune_ms {
            systems::auto_tune::run(&self.classifier, &mut self.patterns, now);
            self.next_auto_tune_ms = now + self.config.auto_tune_interval_ms;
        }

        // 5. Pattern decay.
        if now >= self.next_decay_ms {
            systems::upkeep::decay_patterns(&mut self.patterns, now);
            self.next_decay_ms = now + self.config.pattern_decay_interval_ms;
        }

        // 6. Persistence, pulled forward when a record was finalized
        // this tick (its aggregates just landed in the pattern book).
        if now >= self.next_persist_ms || self.stats.creatures_untracked > untracked_before {
            self.save_patterns();
            self.next_persist_ms = now + self.config.persist_interval_ms;
        }

        self.time.advance();
        self.snapshot()
    }

    /// One full sampling/prediction pass over the mirrored creatures.
    fn run_main_update(&mut self, now: u64) {
        let ids: Vec<(CreatureId, Entity)> =
            self.entities.iter().map(|(id, e)| (*id, *e)).collect();
        let default_pattern = PatternEntry::default();

        for (id, entity) in ids {
            if !self.volume.should_update(id) {
                continue;
            }
            let Some(snap) = systems::world_snapshot(&self.world, id, entity) else {
                self.stats.access_failures += 1;
                continue;
            };
            self.tracker.update(&snap, self.own_pos, now);

            let Some(record) = self.tracker.get(id) else {
                continue;
            };
            let class = self.classifier.classify(record, now);

            let pattern = self.patterns.get(&snap.name).unwrap_or(&default_pattern);
            let ctx = attack_context(
                snap.position,
                snap.facing,
                self.own_pos,
                Some(record),
                pattern,
                now,
            );
            let prediction = predict_wave_attack(&ctx);
            if prediction.imminent && prediction.confidence >= RECORD_PREDICTION_CONFIDENCE {
                let distance = snap.position.chebyshev_distance(&self.own_pos);
                let kind = if distance <= 1 && class.is_melee {
                    AttackKind::Melee
                } else {
                    AttackKind::Wave
                };
                self.feedback
                    .record_prediction(id, kind, prediction.confidence, now);
                self.stats.predictions_made += 1;
            }
        }

        self.stats.predictions_false_positive += self.feedback.expire(now) as u64;

        let view = systems::threat_cache::compute(
            &self.world,
            &self.tracker,
            &self.patterns,
            self.own_pos,
            now,
        );
        self.threat.store(view, now);
        self.volume.advance_cycle();

        self.current_target = systems::targeting::run(
            &self.world,
            &self.entities,
            &self.tracker,
            &self.classifier,
            &self.patterns,
            &self.feedback,
            &mut self.engagement,
            self.own_pos,
            now,
            &mut self.stats,
        );
    }

    // --- Public agent API ---

    /// Run target selection now and return the approved target.
    pub fn optimal_target(&mut self) -> Option<TargetView> {
        let now = self.time.now_ms();
        self.current_target = systems::targeting::run(
            &self.world,
            &self.entities,
            &self.tracker,
            &self.classifier,
            &self.patterns,
            &self.feedback,
            &mut self.engagement,
            self.own_pos,
            now,
            &mut self.stats,
        );
        self.current_target.clone()
    }

    /// O(1)-amortized threat poll; recomputes only on a stale cache.
    pub fn immediate_threat(&mut self) -> ThreatView {
        let now = self.time.now_ms();
        if !self.threat.is_fresh(now) {
            let view = systems::threat_cache::compute(
                &self.world,
                &self.tracker,
                &self.patterns,
                self.own_pos,
                now,
            );
            self.threat.store(view, now);
        }
        self.threat.view().clone()
    }

    /// Would standing at `pos` put the agent inside a predicted attack?
    pub fn is_position_dangerous(&self, pos: TilePoint) -> (bool, f64) {
        let now = self.time.now_ms();
        let threats =
            systems::threat_cache::corridor_threats(&self.world, &self.tracker, &self.patterns, now);
        let (level, total) = predict_position_danger(pos, &threats);
        (level >= DangerLevel::Moderate, total)
    }

    /// The attack executor committed to a target. Under lock-requiring
    /// scenarios this engages the hard lock.
    pub fn start_attack(&mut self, id: CreatureId) -> bool {
        let Some(&entity) = self.entities.get(&id) else {
            return false;
        };
        let health = self
            .world
            .get::<&Vitals>(entity)
            .map(|v| v.health_pct)
            .unwrap_or(100.0);
        let now = self.time.now_ms();
        // Swarm-scale scenarios take no hard lock, so only an actual
        // engagement moves the counter; otherwise starts could never
        // balance against ends.
        let was_engaged = self.engagement.is_engaged();
        self.engagement.start_engagement(id, health, now);
        if self.engagement.is_engaged() && !was_engaged {
            self.stats.engagements_started += 1;
        }
        debug!(id = %id, engaged = self.engagement.is_engaged(), "attack started");
        true
    }

    /// The attack ended (kill, cancel, executor gave up).
    pub fn stop_attack(&mut self, reason: &str) {
        if self.engagement.end_engagement().is_some() {
            self.stats.engagements_ended += 1;
            debug!(reason, "engagement ended");
        }
    }

    pub fn is_engaged(&self) -> bool {
        self.engagement.is_engaged()
    }

    /// Auto-tuner API: propose a danger adjustment for a type.
    pub fn suggest_danger(&self, name: &str) -> Option<DangerSuggestion> {
        let class = self.classifier.get(name)?;
        self.patterns.suggest_danger(name, class.danger)
    }

    /// Apply the current danger suggestion for a type, if any.
    pub fn apply_danger_suggestion(&mut self, name: &str, force: bool) -> bool {
        let Some(suggestion) = self.suggest_danger(name) else {
            return false;
        };
        let now = self.time.now_ms();
        self.patterns.apply_suggestion(&suggestion, force, now)
    }

    /// Flush learned patterns to the store immediately (host shutdown).
    pub fn flush_patterns(&mut self) {
        self.save_patterns();
    }

    // --- Observability ---

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Combined EWMA prediction accuracy from the feedback loop.
    pub fn prediction_accuracy(&self) -> f64 {
        self.feedback.overall_accuracy()
    }

    pub fn scenario(&self) -> ScenarioKind {
        self.engagement.scenario()
    }

    pub fn classification_table(&self) -> Vec<&CreatureClass> {
        self.classifier.table().collect()
    }

    pub fn patterns(&self) -> &PatternBook {
        &self.patterns
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn tracked_count(&self) -> usize {
        self.tracker.len()
    }

    fn snapshot(&self) -> AgentSnapshot {
        let mut stats = self.stats.clone();
        stats.prediction_accuracy = self.feedback.overall_accuracy();
        AgentSnapshot {
            time: self.time,
            scenario: self.engagement.scenario(),
            volume: self.volume.level(),
            target: self.current_target.clone(),
            threat: self.threat.view().clone(),
            stats,
        }
    }

    /// Serialize the pattern book into the store. Failures degrade to
    /// in-memory-only operation.
    fn save_patterns(&mut self) {
        match serde_json::to_vec(&self.patterns) {
            Ok(blob) => {
                if let Err(error) = self.store.save(&blob) {
                    warn!(%error, "pattern persistence failed");
                }
            }
            Err(error) => warn!(%error, "pattern serialization failed"),
        }
    }
}
