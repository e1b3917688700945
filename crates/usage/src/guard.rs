//! Quota pre-flight and post-flight around an agent run.

use appforge_core::usage::{UsageSnapshot, UsageStore};
use std::sync::Arc;
use tracing::{debug, warn};

/// The user has used up today's requests.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Daily AI limit reached. Please try again tomorrow.")]
pub struct QuotaExceeded {
    pub usage: UsageSnapshot,
}

/// Wraps a [`UsageStore`] with fail-open semantics.
///
/// A store that errors never blocks a run, and a failed increment never
/// fails one.
#[derive(Clone)]
pub struct UsageGuard {
    store: Option<Arc<dyn UsageStore>>,
}

impl UsageGuard {
    pub fn new(store: Arc<dyn UsageStore>) -> Self {
        Self { store: Some(store) }
    }

    /// A guard that allows everything and records nothing.
    pub fn disabled() -> Self {
        Self { store: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Clear stale daily counters before a quota check. Failures are
    /// logged and swallowed.
    pub async fn reset_daily(&self) {
        let Some(store) = &self.store else {
            return;
        };

        match store.reset_daily_usage().await {
            Ok(0) => {}
            Ok(cleared) => debug!(cleared, "Cleared previous days' usage counters"),
            Err(e) => warn!(error = %e, "Failed to reset daily usage"),
        }
    }

    /// Reject when a limit is set and today's count has reached it.
    pub async fn check_quota(&self, user_id: &str) -> Result<(), QuotaExceeded> {
        let Some(store) = &self.store else {
            return Ok(());
        };

        match store.get_usage(user_id).await {
            Ok(usage) if usage.is_exhausted() => {
                debug!(user_id, count = usage.count, limit = usage.limit, "Quota exhausted");
                Err(QuotaExceeded { usage })
            }
            Ok(_) => Ok(()),
            Err(e) => {
                warn!(user_id, error = %e, "Usage tracking not available, allowing request");
                Ok(())
            }
        }
    }

    /// Count one request. Failures are logged and swallowed.
    pub async fn record_usage(&self, user_id: &str) {
        let Some(store) = &self.store else {
            return;
        };

        if let Err(e) = store.increment_usage(user_id).await {
            warn!(user_id, error = %e, "Failed to record AI request");
        }
    }

    /// Today's usage, when a store is configured.
    pub async fn usage(&self, user_id: &str) -> Option<UsageSnapshot> {
        let store = self.store.as_ref()?;
        match store.get_usage(user_id).await {
            Ok(usage) => Some(usage),
            Err(e) => {
                warn!(user_id, error = %e, "Failed to read usage");
                None
            }
        }
    }
}
