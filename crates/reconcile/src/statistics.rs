//! Outcome counters shared by all workers of a run

use crate::error::SyncError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Final outcome for one draft
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// A new resource was created
    Created,
    /// The existing resource received this many actions
    Updated { actions: usize },
    /// The existing resource already matched the draft
    Unchanged,
    /// A before-create or before-update callback dropped the work
    Vetoed,
    Failed(SyncError),
}

impl SyncOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Check if the outcome wrote to the catalog
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Created | Self::Updated { .. })
    }
}

/// Run statistics, updated concurrently through atomic increments.
///
/// Every draft is recorded exactly once, so `processed` always equals the
/// sum of the other counters.
#[derive(Debug)]
pub struct SyncStatistics {
    resource_kind: &'static str,
    processed: AtomicUsize,
    created: AtomicUsize,
    updated: AtomicUsize,
    unchanged: AtomicUsize,
    vetoed: AtomicUsize,
    failed: AtomicUsize,
    failed_keys: Mutex<BTreeSet<String>>,
}

impl SyncStatistics {
    /// `resource_kind` is the plural name used in the report, e.g. "products"
    pub fn new(resource_kind: &'static str) -> Self {
        Self {
            resource_kind,
            processed: AtomicUsize::new(0),
            created: AtomicUsize::new(0),
            updated: AtomicUsize::new(0),
            unchanged: AtomicUsize::new(0),
            vetoed: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            failed_keys: Mutex::new(BTreeSet::new()),
        }
    }

    pub fn record(&self, key: Option<&str>, outcome: &SyncOutcome) {
        let counter = match outcome {
            SyncOutcome::Created => &self.created,
            SyncOutcome::Updated { .. } => &self.updated,
            SyncOutcome::Unchanged => &self.unchanged,
            SyncOutcome::Vetoed => &self.vetoed,
            SyncOutcome::Failed(_) => {
                if let Some(key) = key {
                    self.failed_keys
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .insert(key.to_string());
                }
                &self.failed
            }
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn resource_kind(&self) -> &'static str {
        self.resource_kind
    }

    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    pub fn updated(&self) -> usize {
        self.updated.load(Ordering::Relaxed)
    }

    pub fn unchanged(&self) -> usize {
        self.unchanged.load(Ordering::Relaxed)
    }

    pub fn vetoed(&self) -> usize {
        self.vetoed.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn failed_keys(&self) -> BTreeSet<String> {
        self.failed_keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The one-line summary, e.g.
    /// `Summary: 2 products were processed in total (1 created, 1 updated and 0 failed to sync).`
    pub fn report_message(&self) -> String {
        format!(
            "Summary: {} {} were processed in total ({} created, {} updated and {} failed to sync).",
            self.processed(),
            self.resource_kind,
            self.created(),
            self.updated(),
            self.failed()
        )
    }

    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            resource_kind: self.resource_kind.to_string(),
            processed: self.processed(),
            created: self.created(),
            updated: self.updated(),
            unchanged: self.unchanged(),
            vetoed: self.vetoed(),
            failed: self.failed(),
            failed_keys: self.failed_keys().into_iter().collect(),
        }
    }
}

impl fmt::Display for SyncStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.report_message())
    }
}

/// Plain copy of the counters, for reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    pub resource_kind: String,
    pub processed: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub vetoed: usize,
    pub failed: usize,
    pub failed_keys: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;

    #[test]
    fn test_report_message() {
        let stats = SyncStatistics::new("cart discounts");
        stats.record(Some("a"), &SyncOutcome::Created);
        stats.record(Some("b"), &SyncOutcome::Unchanged);
        assert_eq!(
            stats.report_message(),
            "Summary: 2 cart discounts were processed in total (1 created, 0 updated and 0 failed to sync)."
        );
    }

    #[test]
    fn test_failures_collect_keys() {
        let stats = SyncStatistics::new("products");
        let failure = SyncOutcome::Failed(SyncError::from_catalog(
            "p1",
            CatalogError::Transport("timeout".into()),
        ));
        stats.record(Some("p1"), &failure);
        stats.record(None, &failure);
        stats.record(Some("p2"), &SyncOutcome::Vetoed);

        assert_eq!(stats.processed(), 3);
        assert_eq!(stats.failed(), 2);
        assert_eq!(stats.vetoed(), 1);
        assert_eq!(stats.failed_keys().into_iter().collect::<Vec<_>>(), vec!["p1"]);
    }

    #[test]
    fn test_concurrent_records() {
        let stats = SyncStatistics::new("products");
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..100 {
                        stats.record(None, &SyncOutcome::Updated { actions: 1 });
                    }
                });
            }
        });
        assert_eq!(stats.processed(), 800);
        assert_eq!(stats.updated(), 800);
    }
}
