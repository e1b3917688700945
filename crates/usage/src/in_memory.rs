//! In-memory usage store, useful for tests and single-process deployments.

use appforge_config::UsageConfig;
use appforge_core::error::UsageError;
use appforge_core::usage::{UsageSnapshot, UsageStore};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

pub const DEFAULT_PLAN: &str = "free";

type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

#[derive(Debug, Clone)]
struct DayCount {
    day: NaiveDate,
    count: u32,
}

/// Counts requests per user per UTC day.
///
/// Counters from a previous day read as zero and are replaced on the next
/// increment. [`UsageStore::reset_daily_usage`] drops them outright.
pub struct InMemoryUsageStore {
    counts: Arc<RwLock<HashMap<String, DayCount>>>,
    limits: UsageConfig,
    today: Clock,
}

impl InMemoryUsageStore {
    /// A store where every user gets `default_limit` requests a day.
    pub fn new(default_limit: u32) -> Self {
        Self::from_config(&UsageConfig {
            daily_limit: default_limit,
            ..UsageConfig::default()
        })
    }

    /// Limits from `[usage]`. Users absent from `user_plans` are on
    /// [`DEFAULT_PLAN`]; plans absent from `plan_limits` get `daily_limit`.
    pub fn from_config(config: &UsageConfig) -> Self {
        Self {
            counts: Arc::new(RwLock::new(HashMap::new())),
            limits: config.clone(),
            today: Arc::new(|| Utc::now().date_naive()),
        }
    }

    /// Replace the UTC day source.
    pub fn with_clock(mut self, today: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.today = Arc::new(today);
        self
    }

    fn plan_and_limit(&self, user_id: &str) -> (String, u32) {
        let plan = self
            .limits
            .user_plans
            .get(user_id)
            .map_or(DEFAULT_PLAN, String::as_str);
        (plan.to_string(), self.limits.limit_for_plan(plan))
    }
}

#[async_trait]
impl UsageStore for InMemoryUsageStore {
    async fn get_usage(&self, user_id: &str) -> Result<UsageSnapshot, UsageError> {
        let today = (self.today)();
        let count = self
            .counts
            .read()
            .await
            .get(user_id)
            .filter(|c| c.day == today)
            .map_or(0, |c| c.count);
        let (plan, limit) = self.plan_and_limit(user_id);

        Ok(UsageSnapshot {
            user_id: user_id.to_string(),
            count,
            limit,
            plan,
        })
    }

    async fn increment_usage(&self, user_id: &str) -> Result<UsageSnapshot, UsageError> {
        let today = (self.today)();
        let count = {
            let mut counts = self.counts.write().await;
            let entry = counts
                .entry(user_id.to_string())
                .or_insert(DayCount { day: today, count: 0 });
            if entry.day != today {
                *entry = DayCount { day: today, count: 0 };
            }
            entry.count = entry.count.saturating_add(1);
            entry.count
        };
        let (plan, limit) = self.plan_and_limit(user_id);
        debug!(user_id, count, limit, "Recorded AI request");

        Ok(UsageSnapshot {
            user_id: user_id.to_string(),
            count,
            limit,
            plan,
        })
    }

    async fn reset_daily_usage(&self) -> Result<usize, UsageError> {
        let today = (self.today)();
        let mut counts = self.counts.write().await;
        let before = counts.len();
        counts.retain(|_, c| c.day == today);
        Ok(before - counts.len())
    }
}
