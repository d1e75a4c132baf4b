//! Health of the service and its dependencies.
//!
//! A [`StatusAggregator`] probes the local datastore and the remote rule
//! engine on a fixed interval, merges the results with the
//! administrator-settable forced-degraded flag, and publishes an immutable
//! [`StatusSnapshot`] into the process-wide [`StatusStore`]. The metrics
//! gauge and the status endpoints are cheap, lock-light reads of the store;
//! they never trigger probes of their own.

pub mod aggregator;
pub mod gauge;
pub mod probes;
pub mod store;

pub use aggregator::StatusAggregator;
pub use gauge::register_degraded_gauge;
pub use probes::{DatastoreProbe, DependencyProbe, EngineClient, EngineProbe};
pub use store::{StatusSnapshot, StatusStore};
