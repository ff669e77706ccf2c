//! Guarded access to host creature handles.
//!
//! The game client hands out creature handles whose methods can fail at
//! any moment (the creature despawned between the event and the read).
//! The core never touches a handle directly: it goes through the
//! `CreatureAccess` capability trait and works with plain-data
//! `CreatureSnapshot`s captured at event time. A failed capture is a
//! documented early-exit for the caller, never a panic.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{CreatureId, Direction, TilePoint};

/// Why a creature handle could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessError {
    /// The handle no longer resolves to a live entity.
    #[error("creature handle no longer resolves")]
    Gone,
    /// The creature has no readable position (e.g. mid-teleport).
    #[error("creature has no position")]
    NoPosition,
    /// The handle returned inconsistent or out-of-range data.
    #[error("creature handle returned invalid data")]
    Invalid,
}

/// Narrow capability interface over a host creature handle.
///
/// Every accessor returns `Result` so the adapter layer surfaces
/// host-side failures explicitly instead of swallowing them.
pub trait CreatureAccess {
    fn id(&self) -> Result<CreatureId, AccessError>;
    fn name(&self) -> Result<String, AccessError>;
    fn position(&self) -> Result<TilePoint, AccessError>;
    fn facing(&self) -> Result<Direction, AccessError>;
    fn health_pct(&self) -> Result<f64, AccessError>;
    fn speed(&self) -> Result<f64, AccessError>;
    fn base_speed(&self) -> Result<f64, AccessError>;
    fn alive(&self) -> Result<bool, AccessError>;
    fn walking(&self) -> Result<bool, AccessError>;
}

/// Plain-data capture of a creature at a moment in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureSnapshot {
    pub id: CreatureId,
    pub name: String,
    pub position: TilePoint,
    pub facing: Direction,
    pub health_pct: f64,
    pub speed: f64,
    pub base_speed: f64,
    pub alive: bool,
    pub walking: bool,
}

impl CreatureSnapshot {
    /// Capture a snapshot through the guarded accessor.
    /// Any single failed read fails the whole capture.
    pub fn capture(access: &impl CreatureAccess) -> Result<CreatureSnapshot, AccessError> {
        let health_pct = access.health_pct()?;
        if !(0.0..=100.0).contains(&health_pct) {
            return Err(AccessError::Invalid);
        }
        Ok(CreatureSnapshot {
            id: access.id()?,
            name: access.name()?,
            position: access.position()?,
            facing: access.facing()?,
            health_pct,
            speed: access.speed()?,
            base_speed: access.base_speed()?,
            alive: access.alive()?,
            walking: access.walking()?,
        })
    }
}
