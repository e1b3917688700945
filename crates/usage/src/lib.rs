//! Usage tracking for AppForge.
//!
//! - [`InMemoryUsageStore`]: per-user daily counters keyed by UTC day
//! - [`UsageGuard`]: the quota check before a run and the increment after

pub mod guard;
pub mod in_memory;

pub use guard::{QuotaExceeded, UsageGuard};
pub use in_memory::InMemoryUsageStore;
