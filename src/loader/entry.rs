//! Cache entry management with TTL support

use crate::loader::types::GameId;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// A loaded component and the time it was loaded
#[derive(Debug)]
pub struct CacheEntry<C> {
    /// Game identifier this entry belongs to
    pub identifier: GameId,

    /// The module's default export
    pub artifact: Arc<C>,

    /// Monotonic load time, used for freshness
    pub loaded_at: Instant,

    /// Wall-clock load time, for diagnostics
    pub loaded_at_utc: DateTime<Utc>,
}

impl<C> Clone for CacheEntry<C> {
    fn clone(&self) -> Self {
        Self {
            identifier: self.identifier.clone(),
            artifact: Arc::clone(&self.artifact),
            loaded_at: self.loaded_at,
            loaded_at_utc: self.loaded_at_utc,
        }
    }
}

impl<C> CacheEntry<C> {
    /// Create an entry stamped with the current time
    pub fn new(identifier: GameId, artifact: Arc<C>) -> Self {
        Self {
            identifier,
            artifact,
            loaded_at: Instant::now(),
            loaded_at_utc: Utc::now(),
        }
    }

    /// Fresh iff strictly less than `ttl` has passed since load
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.age() < ttl
    }

    pub fn age(&self) -> Duration {
        Instant::now().saturating_duration_since(self.loaded_at)
    }

    /// Time left before the entry goes stale
    pub fn time_until_expiration(&self, ttl: Duration) -> Option<Duration> {
        ttl.checked_sub(self.age()).filter(|d| !d.is_zero())
    }
}
