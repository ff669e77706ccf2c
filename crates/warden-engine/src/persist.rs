//! Pattern persistence over an opaque key-value blob store.
//!
//! The host provides some durable keyed storage; the engine only needs
//! load/save of one blob. When the store is unavailable the engine
//! falls back to an in-memory default pattern set.

use thiserror::Error;

/// Why a store operation failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backing store is not ready or not configured.
    #[error("pattern store unavailable")]
    Unavailable,
    /// The store rejected the operation.
    #[error("pattern store operation failed: {0}")]
    Io(String),
}

/// Opaque blob storage for the learned pattern book.
pub trait PatternStore {
    fn load(&mut self) -> Result<Option<Vec<u8>>, StoreError>;
    fn save(&mut self, blob: &[u8]) -> Result<(), StoreError>;
}

/// In-memory store, for tests and session-only operation.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blob: Option<Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an existing blob (e.g. carried over from a
    /// previous engine instance in tests).
    pub fn with_blob(blob: Vec<u8>) -> Self {
        Self { blob: Some(blob) }
    }

    pub fn blob(&self) -> Option<&[u8]> {
        self.blob.as_deref()
    }
}

impl PatternStore for MemoryStore {
    fn load(&mut self) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.blob.clone())
    }

    fn save(&mut self, blob: &[u8]) -> Result<(), StoreError> {
        self.blob = Some(blob.to_vec());
        Ok(())
    }
}

/// A store that is never available. The engine degrades to
/// in-memory-only patterns.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStore;

impl PatternStore for NullStore {
    fn load(&mut self) -> Result<Option<Vec<u8>>, StoreError> {
        Err(StoreError::Unavailable)
    }

    fn save(&mut self, _blob: &[u8]) -> Result<(), StoreError> {
        Err(StoreError::Unavailable)
    }
}
