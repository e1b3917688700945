//! Usage tracking trait: per-user daily request quotas.

use crate::error::UsageError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A user's usage for the current day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub user_id: String,

    /// Requests recorded today
    pub count: u32,

    /// Daily limit; `0` means unlimited
    pub limit: u32,

    /// The plan the limit came from (e.g. "free", "pro")
    pub plan: String,
}

impl UsageSnapshot {
    /// True when a limit is set and today's count has reached it.
    pub fn is_exhausted(&self) -> bool {
        self.limit > 0 && self.count >= self.limit
    }

    /// Requests left today, or `None` when unlimited.
    pub fn remaining(&self) -> Option<u32> {
        (self.limit > 0).then(|| self.limit.saturating_sub(self.count))
    }
}

/// Persistence for daily usage counters.
///
/// Implementations: in-memory (tests, single process). A database-backed
/// store would implement the same calls.
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Today's usage for a user.
    async fn get_usage(&self, user_id: &str) -> std::result::Result<UsageSnapshot, UsageError>;

    /// Record one request for a user and return the new snapshot.
    async fn increment_usage(&self, user_id: &str) -> std::result::Result<UsageSnapshot, UsageError>;

    /// Clear counters left over from previous days; returns how many were
    /// cleared. Stores that key counters by day need not override this.
    async fn reset_daily_usage(&self) -> std::result::Result<usize, UsageError> {
        Ok(0)
    }
}
