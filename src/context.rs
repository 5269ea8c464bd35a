//! Shared engine context: the process-wide caches a search session needs.
//!
//! One `EngineContext` is built at startup and shared by reference (or
//! `Arc`) across all search workers. The transposition table and the
//! endgame registry are safely shared; material caches are cheap and
//! per-worker, so each worker requests its own.

use std::error::Error;
use std::fmt;

use crate::endgame::EndgameRegistry;
use crate::material::MaterialCache;
use crate::tt::TranspositionTable;

/// Largest accepted hash size in mebibytes (32 TiB).
pub const MAX_HASH_MB: usize = 33_554_432;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Requested hash size is zero or above [`MAX_HASH_MB`].
    InvalidHashSize(usize),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidHashSize(mb) => {
                write!(f, "invalid hash size: {mb} MiB (must be 1..={MAX_HASH_MB})")
            }
        }
    }
}

impl Error for ConfigError {}

/// Process-wide evaluation and search caches.
pub struct EngineContext {
    tt: TranspositionTable,
    endgames: EndgameRegistry,
}

impl EngineContext {
    /// Build a context with a transposition table of `hash_mb` mebibytes
    /// and a fully populated endgame registry.
    pub fn new(hash_mb: usize) -> Result<Self, ConfigError> {
        if hash_mb == 0 || hash_mb > MAX_HASH_MB {
            return Err(ConfigError::InvalidHashSize(hash_mb));
        }
        #[cfg(feature = "logging")]
        log::info!("engine context initialized, hash {hash_mb} MiB");
        Ok(EngineContext {
            tt: TranspositionTable::new(hash_mb),
            endgames: EndgameRegistry::new(),
        })
    }

    #[must_use]
    pub fn tt(&self) -> &TranspositionTable {
        &self.tt
    }

    /// Exclusive table access, for resize and clear between searches.
    pub fn tt_mut(&mut self) -> &mut TranspositionTable {
        &mut self.tt
    }

    #[must_use]
    pub fn endgames(&self) -> &EndgameRegistry {
        &self.endgames
    }

    /// Fresh material cache for one search worker. Workers keep their own
    /// cache rather than contending on a shared one.
    #[must_use]
    pub fn material_cache(&self) -> MaterialCache {
        MaterialCache::new()
    }

    /// Start a new search: ages the transposition table by one generation.
    pub fn new_search(&self) {
        self.tt.new_search();
    }
}
