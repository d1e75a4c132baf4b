//! Process-wide holder of the latest status snapshot.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Immutable summary of dependency health.
///
/// Built once per aggregation cycle and replaced wholesale; readers see
/// either the prior complete snapshot or the new one, never a mix.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    /// Check name to failure message, empty when everything is healthy.
    pub issues: BTreeMap<String, String>,
    /// Administrator override in effect when this snapshot was built.
    pub forced_degraded: bool,
    pub captured_at: DateTime<Utc>,
}

/// Shared store for the current [`StatusSnapshot`] and the forced-degraded
/// flag.
///
/// One instance per process, constructed at startup and injected wherever
/// status is read or written. Written only by the aggregator and the
/// administrative toggle; read concurrently by the gauge and the status
/// endpoints. Synchronization is internal, callers never lock.
pub struct StatusStore {
    snapshot: ArcSwapOption<StatusSnapshot>,
    degraded: AtomicBool,
}

impl StatusStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwapOption::empty(),
            degraded: AtomicBool::new(false),
        }
    }

    /// Atomically replace the current snapshot.
    pub fn set_status_info(&self, snapshot: StatusSnapshot) {
        self.snapshot.store(Some(Arc::new(snapshot)));
    }

    /// The current snapshot, `None` before the first aggregation cycle.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<StatusSnapshot>> {
        self.snapshot.load_full()
    }

    /// The current issue map, empty before the first cycle.
    #[must_use]
    pub fn status_info(&self) -> BTreeMap<String, String> {
        self.snapshot()
            .map(|snapshot| snapshot.issues.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }

    pub fn set_degraded(&self, degraded: bool) {
        self.degraded.store(degraded, Ordering::Relaxed);
    }

    /// Gauge value: 0 when healthy, otherwise the number of reported issues.
    ///
    /// Derived from the snapshot on every read, never stored.
    #[must_use]
    pub fn degraded_entries(&self) -> u64 {
        self.snapshot()
            .map_or(0, |snapshot| snapshot.issues.len() as u64)
    }
}

impl Default for StatusStore {
    fn default() -> Self {
        Self::new()
    }
}
