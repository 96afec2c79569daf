//! Failure tracking per game identifier

use crate::error::LoaderError;
use crate::loader::types::GameId;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Most recent failure and consecutive failure count for one game
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureRecord {
    pub identifier: GameId,

    /// Error of the latest failed attempt
    #[serde(serialize_with = "serialize_error")]
    pub last_error: LoaderError,

    /// When the latest failure was recorded
    pub timestamp: DateTime<Utc>,

    /// Consecutive failures since the last success, starting at 1
    pub retry_count: u32,

    /// False when the error class can never succeed on retry
    pub retryable: bool,
}

impl FailureRecord {
    /// First failure for `identifier`
    pub fn new(identifier: GameId, error: LoaderError) -> Self {
        Self {
            identifier,
            retryable: error.is_retryable(),
            last_error: error,
            timestamp: Utc::now(),
            retry_count: 1,
        }
    }

    /// Record a further consecutive failure
    pub fn record(&mut self, error: LoaderError) {
        self.retryable = error.is_retryable();
        self.last_error = error;
        self.timestamp = Utc::now();
        self.retry_count = self.retry_count.saturating_add(1);
    }

    pub fn can_retry(&self, max_retries: u32) -> bool {
        self.retryable && self.retry_count < max_retries
    }

    /// Error to hand back when a retry is refused
    pub fn refusal(&self) -> LoaderError {
        if self.retryable {
            LoaderError::MaxRetriesExceeded {
                identifier: self.identifier.clone(),
                attempts: self.retry_count,
            }
        } else {
            self.last_error.clone()
        }
    }
}

fn serialize_error<S: serde::Serializer>(
    error: &LoaderError,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&error.to_string())
}
