//! Scenario detection and the target-lock/engagement-lock state machine.
//!
//! Owns the single process-wide engagement state; every proposed target
//! switch must pass through `should_allow_switch`. The hard invariant:
//! while an engagement lock is held on X, no proposal for Y != X is
//! approved until X dies, is removed, or is otherwise invalidated.

use std::collections::VecDeque;

use glam::IVec2;

use warden_core::constants::*;
use warden_core::enums::ScenarioKind;
use warden_core::types::CreatureId;

use crate::scenario::{profile, ScenarioProfile};

/// A held lock on a target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetLock {
    pub id: CreatureId,
    pub locked_at_ms: u64,
    pub health_at_lock: f64,
}

/// Verdict on a proposed target switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchDecision {
    pub allowed: bool,
    pub reason: &'static str,
}

impl SwitchDecision {
    fn allow(reason: &'static str) -> Self {
        Self {
            allowed: true,
            reason,
        }
    }

    fn deny(reason: &'static str) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }
}

/// Process-wide engagement state. All mutation goes through this API.
#[derive(Debug, Default)]
pub struct EngagementManager {
    scenario: ScenarioKind,
    last_detect_ms: Option<u64>,
    target_lock: Option<TargetLock>,
    engagement: Option<TargetLock>,
    consecutive_switches: u32,
    switch_times: VecDeque<u64>,
    own_moves: VecDeque<IVec2>,
}

impl EngagementManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-classify the encounter from the nearby hostile count.
    /// Rate-limited; inside the limit the previous scenario is kept.
    /// Returns the active scenario and whether it changed.
    pub fn detect_scenario(&mut self, hostile_count: usize, now: u64) -> (ScenarioKind, bool) {
        if let Some(last) = self.last_detect_ms {
            if now.saturating_sub(last) < SCENARIO_DETECT_INTERVAL_MS {
                return (self.scenario, false);
            }
        }
        self.last_detect_ms = Some(now);
        let next = ScenarioKind::from_hostile_count(hostile_count);
        let changed = next != self.scenario;
        self.scenario = next;
        (next, changed)
    }

    pub fn scenario(&self) -> ScenarioKind {
        self.scenario
    }

    pub fn active_profile(&self) -> ScenarioProfile {
        profile(self.scenario)
    }

    /// Approve or veto a proposed switch to `candidate_id`.
    ///
    /// `current_priority` and `current_health` describe the currently
    /// locked target (priority already stickiness-adjusted); they are
    /// ignored when no lock is held.
    pub fn should_allow_switch(
        &self,
        candidate_id: CreatureId,
        candidate_priority: f64,
        candidate_health: f64,
        current_priority: f64,
        current_health: f64,
        now: u64,
    ) -> SwitchDecision {
        // Engagement lock is absolute: only the engaged target passes.
        if let Some(eng) = &self.engagement {
            return if candidate_id == eng.id {
                SwitchDecision::allow("already engaged on candidate")
            } else {
                SwitchDecision::deny("engagement lock held")
            };
        }

        let Some(lock) = &self.target_lock else {
            return SwitchDecision::allow("no current target");
        };
        if candidate_id == lock.id {
            return SwitchDecision::allow("same target");
        }

        let profile = self.active_profile();

        // A locked target about to die is always finished first.
        if current_health < FINISHING_KILL_HEALTH_PCT {
            return SwitchDecision::deny("locked target in finishing band");
        }

        if now.saturating_sub(lock.locked_at_ms) < profile.switch_cooldown_ms {
            return SwitchDecision::deny("switch cooldown active");
        }

        if self.switches_in_window(now) >= profile.max_switches_per_min {
            return SwitchDecision::deny("switch rate cap reached");
        }

        if !profile.tolerate_zigzag && self.zigzag_detected() {
            return SwitchDecision::deny("zigzag suppression");
        }

        // A nearly-dead challenger may be finished off without the
        // usual margin, as long as it already outranks the lock.
        if candidate_health < FINISHING_KILL_HEALTH_PCT && candidate_priority > current_priority {
            return SwitchDecision::allow("finishing weakened candidate");
        }

        let making_progress =
            lock.health_at_lock - current_health >= PROGRESS_HEALTH_DELTA_PCT;
        let margin = if making_progress {
            profile.progress_margin
        } else {
            profile.switch_margin
        };
        if candidate_priority > current_priority * (1.0 + margin) {
            SwitchDecision::allow("priority margin exceeded")
        } else {
            SwitchDecision::deny("insufficient priority margin")
        }
    }

    /// Lock onto a target. Locking a new id counts as a switch;
    /// re-locking the same id keeps the original lock time and health.
    pub fn lock_target(&mut self, id: CreatureId, health_pct: f64, now: u64) {
        match &self.target_lock {
            Some(lock) if lock.id == id => {
                // Holding one target through a full switch cooldown
                // ends any zigzag burst.
                if now.saturating_sub(lock.locked_at_ms)
                    >= self.active_profile().switch_cooldown_ms
                {
                    self.consecutive_switches = 0;
                }
            }
            Some(_) => {
                self.consecutive_switches += 1;
                self.push_switch(now);
                self.target_lock = Some(TargetLock {
                    id,
                    locked_at_ms: now,
                    health_at_lock: health_pct,
                });
            }
            None => {
                self.consecutive_switches = 0;
                self.target_lock = Some(TargetLock {
                    id,
                    locked_at_ms: now,
                    health_at_lock: health_pct,
                });
            }
        }
    }

    pub fn clear_target_lock(&mut self) {
        self.target_lock = None;
        self.consecutive_switches = 0;
    }

    /// An attack command was issued. Under a lock-requiring scenario
    /// this pins the target until it becomes invalid.
    pub fn start_engagement(&mut self, id: CreatureId, health_pct: f64, now: u64) {
        let lock = TargetLock {
            id,
            locked_at_ms: now,
            health_at_lock: health_pct,
        };
        if self.active_profile().require_engagement_lock {
            self.engagement = Some(lock);
        }
        self.lock_target(id, health_pct, now);
    }

    /// The attack ended (target died, player cancelled, executor gave
    /// up). Returns the released engagement, if one was held.
    pub fn end_engagement(&mut self) -> Option<TargetLock> {
        self.engagement.take()
    }

    pub fn is_engaged(&self) -> bool {
        self.engagement.is_some()
    }

    pub fn engaged_id(&self) -> Option<CreatureId> {
        self.engagement.as_ref().map(|e| e.id)
    }

    pub fn target_lock(&self) -> Option<&TargetLock> {
        self.target_lock.as_ref()
    }

    /// A creature died or left the world: release any lock on it.
    pub fn invalidate(&mut self, id: CreatureId) {
        if self.engagement.as_ref().is_some_and(|e| e.id == id) {
            self.engagement = None;
        }
        if self.target_lock.as_ref().is_some_and(|l| l.id == id) {
            self.target_lock = None;
            self.consecutive_switches = 0;
        }
    }

    /// Apply stickiness/engagement/finishing bonuses to a base score
    /// before final candidate ranking.
    pub fn modify_priority(&self, id: CreatureId, base_priority: f64, health_pct: f64) -> f64 {
        let mut priority = base_priority;
        if self.target_lock.as_ref().is_some_and(|l| l.id == id) {
            priority += self.active_profile().stickiness_bonus;
        }
        if self.engagement.as_ref().is_some_and(|e| e.id == id) {
            priority += ENGAGEMENT_PRIORITY_BONUS;
        }
        if health_pct < FINISHING_KILL_HEALTH_PCT {
            priority += FINISHING_PRIORITY_BONUS;
        }
        priority
    }

    /// Record one step of the agent's own movement for zigzag detection.
    pub fn note_own_move(&mut self, delta: IVec2) {
        if delta == IVec2::ZERO {
            return;
        }
        self.own_moves.push_back(delta);
        while self.own_moves.len() > ZIGZAG_WINDOW {
            self.own_moves.pop_front();
        }
    }

    /// Rapid target alternation, or at least half of recent consecutive
    /// move pairs reversing direction.
    pub fn zigzag_detected(&self) -> bool {
        if self.consecutive_switches >= ZIGZAG_SWITCH_BURST {
            return true;
        }
        if self.own_moves.len() < 4 {
            return false;
        }
        let mut reversals = 0;
        let mut pairs = 0;
        let moves: Vec<IVec2> = self.own_moves.iter().copied().collect();
        for pair in moves.windows(2) {
            pairs += 1;
            let dot = pair[0].x * pair[1].x + pair[0].y * pair[1].y;
            if dot < 0 {
                reversals += 1;
            }
        }
        pairs > 0 && reversals as f64 / pairs as f64 >= ZIGZAG_REVERSAL_RATIO
    }

    pub fn consecutive_switches(&self) -> u32 {
        self.consecutive_switches
    }

    fn push_switch(&mut self, now: u64) {
        self.switch_times.push_back(now);
        let horizon = now.saturating_sub(SWITCH_RATE_WINDOW_MS);
        while let Some(front) = self.switch_times.front() {
            if *front < horizon {
                self.switch_times.pop_front();
            } else {
                break;
            }
        }
    }

    fn switches_in_window(&self, now: u64) -> u32 {
        let horizon = now.saturating_sub(SWITCH_RATE_WINDOW_MS);
        self.switch_times.iter().filter(|t| **t >= horizon).count() as u32
    }
}
