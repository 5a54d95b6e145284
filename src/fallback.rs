//! Single choke point for every silent default the service applies.
//!
//! The dashboard keeps working when Jira misbehaves or a caller sends an odd
//! type filter, but each of those substitutions is logged here and counted so a
//! zero on the chart can be told apart from a zero caused by a failed call.

use std::sync::atomic::{AtomicU64, Ordering};

use log::warn;
use serde::Serialize;

#[derive(Debug)]
pub enum Fallback<'a> {
    /// A `type` value outside All/Bug/Task was replaced with Bug.
    UnknownTypeFilter { raw: &'a str },
    /// A count request failed or returned something unusable; reported as 0.
    DegradedCount { jql: &'a str, reason: String },
}

#[derive(Debug, Default)]
pub struct FallbackMonitor {
    unknown_type_filter: AtomicU64,
    degraded_counts: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackSnapshot {
    pub unknown_type_filter: u64,
    pub degraded_counts: u64,
}

impl FallbackMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: &Fallback<'_>) {
        match event {
            Fallback::UnknownTypeFilter { raw } => {
                self.unknown_type_filter.fetch_add(1, Ordering::Relaxed);
                warn!("Unknown type filter {raw:?}, falling back to Bug");
            }
            Fallback::DegradedCount { jql, reason } => {
                self.degraded_counts.fetch_add(1, Ordering::Relaxed);
                warn!("Approximate count degraded to 0 for JQL [{jql}]: {reason}");
            }
        }
    }

    pub fn snapshot(&self) -> FallbackSnapshot {
        FallbackSnapshot {
            unknown_type_filter: self.unknown_type_filter.load(Ordering::Relaxed),
            degraded_counts: self.degraded_counts.load(Ordering::Relaxed),
        }
    }
}
