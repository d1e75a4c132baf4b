//! Periodic status aggregation.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tracing::Instrument;

use crate::probes::DependencyProbe;
use crate::store::{StatusSnapshot, StatusStore};

/// Issue key set when the administrator has forced degraded status.
const ADMIN_DEGRADED: &str = "admin-degraded";

/// Gathers the status of local and remote dependencies and publishes it to
/// the [`StatusStore`], from where the gauge and the status endpoints read it
/// without triggering probes of their own.
pub struct StatusAggregator {
    store: Arc<StatusStore>,
    probes: Vec<Arc<dyn DependencyProbe>>,
}

impl StatusAggregator {
    #[must_use]
    pub fn new(store: Arc<StatusStore>, probes: Vec<Arc<dyn DependencyProbe>>) -> Self {
        Self { store, probes }
    }

    /// Run one aggregation cycle and publish the resulting snapshot.
    ///
    /// Semantics are identical whether driven by the timer or invoked on
    /// demand by an administrative refresh. A failing probe contributes its
    /// issue and nothing else; it never prevents the remaining probes from
    /// running or the snapshot from being published.
    #[tracing::instrument(skip(self))]
    pub async fn gather(&self) {
        let mut issues = BTreeMap::new();

        let forced_degraded = self.store.is_degraded();
        if forced_degraded {
            issues.insert(ADMIN_DEGRADED.to_owned(), "true".to_owned());
        }

        for probe in &self.probes {
            let span = tracing::info_span!("probe", name = probe.name());
            if let Err(message) = probe.check().instrument(span).await {
                tracing::warn!(probe = probe.name(), %message, "dependency probe failed");
                issues.insert(probe.name().to_owned(), message);
            }
        }

        self.store.set_status_info(StatusSnapshot {
            issues,
            forced_degraded,
            captured_at: Utc::now(),
        });
    }

    /// Drive [`Self::gather`] on a fixed interval until the task is dropped.
    pub async fn run(self: Arc<Self>, period: Duration) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.gather().await;
        }
    }
}
