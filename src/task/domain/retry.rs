//! Retry backoff table.

use super::RetriesExhausted;
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

/// Ordered backoff delays in milliseconds, indexed by retry attempt.
///
/// Attempt `i` waits `intervals[i]` milliseconds before becoming due again.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RetrySchedule(Vec<u32>);

impl RetrySchedule {
    /// Backoff table applied when the caller does not configure one.
    pub const DEFAULT_INTERVALS_MS: [u32; 5] = [100, 200, 300, 500, 1000];

    /// Creates a schedule from millisecond delays.
    #[must_use]
    pub fn from_millis(intervals: impl IntoIterator<Item = u32>) -> Self {
        Self(intervals.into_iter().collect())
    }

    /// Returns the delay applied before the given zero-based retry attempt.
    ///
    /// # Errors
    ///
    /// Returns [`RetriesExhausted`] when the table has no entry for
    /// `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Result<TimeDelta, RetriesExhausted> {
        usize::try_from(attempt)
            .ok()
            .and_then(|index| self.0.get(index))
            .map(|millis| TimeDelta::milliseconds(i64::from(*millis)))
            .ok_or(RetriesExhausted {
                attempt,
                limit: self.len(),
            })
    }

    /// Returns the number of configured attempts.
    #[must_use]
    pub fn len(&self) -> u32 {
        u32::try_from(self.0.len()).unwrap_or(u32::MAX)
    }

    /// Returns `true` when no retry delays are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the raw millisecond delays.
    #[must_use]
    pub fn as_millis(&self) -> &[u32] {
        &self.0
    }
}

impl Default for RetrySchedule {
    fn default() -> Self {
        Self::from_millis(Self::DEFAULT_INTERVALS_MS)
    }
}
