//! Core type definitions for the loader

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Game identifier type, owned by the catalog
pub type GameId = String;

/// Minimal game descriptor handed over by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameDescriptor {
    /// Stable, globally unique game identifier
    pub id: GameId,

    /// Module path resolved through the registry allow-list
    pub module_path: String,

    /// Display title, unused by the loader
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl GameDescriptor {
    pub fn new(id: impl Into<GameId>, module_path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            module_path: module_path.into(),
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Parse a catalog export (a JSON array of descriptors)
    pub fn list_from_json(json: &str) -> Result<Vec<GameDescriptor>> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Statistics for loader diagnostics
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct LoaderStats {
    /// Number of cached components (fresh or not yet swept)
    pub cached: usize,

    /// Number of loads currently in flight
    pub loading: usize,

    /// Number of identifiers with a failure record
    pub failed: usize,

    /// Lookups served from cache
    pub hits: u64,

    /// Lookups that had to join or start a load
    pub misses: u64,

    /// Lookups that joined an existing in-flight load
    pub deduplicated: u64,

    /// Loads actually started
    pub loads_started: u64,

    /// Number of entries evicted due to TTL expiration
    pub evictions_ttl: u64,
}

impl LoaderStats {
    /// Calculate cache hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

impl fmt::Display for LoaderStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LoaderStats {{ cached: {}, loading: {}, failed: {}, hits: {}, misses: {}, hit_rate: {:.2}%, loads: {} }}",
            self.cached,
            self.loading,
            self.failed,
            self.hits,
            self.misses,
            self.hit_rate(),
            self.loads_started
        )
    }
}

/// Per-identifier state, derived from map membership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadState {
    /// Nothing known about this identifier
    Unloaded,

    /// A load is in flight
    Loading,

    /// Cached and fresh
    Loaded,

    /// Cached but past its TTL; the next lookup reloads
    Stale,

    /// Last attempt failed, retry still allowed
    Failed { retry_count: u32 },

    /// Retry ceiling reached or error not retryable; only a cache clear recovers
    Exhausted,
}

impl LoadState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoadState::Exhausted)
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadState::Unloaded => write!(f, "unloaded"),
            LoadState::Loading => write!(f, "loading"),
            LoadState::Loaded => write!(f, "loaded"),
            LoadState::Stale => write!(f, "stale"),
            LoadState::Failed { retry_count } => write!(f, "failed ({} attempts)", retry_count),
            LoadState::Exhausted => write!(f, "exhausted"),
        }
    }
}
