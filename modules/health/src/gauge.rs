//! Degraded-status gauge.

use std::sync::Arc;

use crate::store::StatusStore;

/// Register the `status_isDegraded` observable gauge on the global meter
/// provider.
///
/// The value is derived from the store on every observation: 0 when the
/// current snapshot has no issues, otherwise the number of entries. Reading
/// the gauge never triggers probes.
pub fn register_degraded_gauge(store: Arc<StatusStore>) {
    let meter = opentelemetry::global::meter("policies-health");
    meter
        .u64_observable_gauge("status_isDegraded")
        .with_description("Returns 0 if good, value > 0 for number of entries in the status message")
        .with_callback(move |observer| observer.observe(store.degraded_entries(), &[]))
        .build();
}
