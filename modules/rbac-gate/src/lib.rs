//! RBAC authorization gate.
//!
//! Every inbound business request passes through [`middleware::rbac_gate`]
//! before its handler runs. The gate extracts the opaque caller identity from
//! the request, resolves the caller's [`GrantRecord`] from the TTL-bounded
//! [`GrantCache`] (or, on a miss, with one round trip to the remote RBAC
//! service) and either attaches a [`Principal`] to the request or rejects it
//! with `403 Forbidden`.
//!
//! The gate fails closed: a missing identity header, an unreachable RBAC
//! service, or any remote failure all deny the request. Downstream status
//! codes are never surfaced to the original caller.

pub mod cache;
pub mod client;
pub mod middleware;
pub mod principal;

pub use cache::GrantCache;
pub use client::{GrantSource, RbacClient};
pub use middleware::{RbacGateState, rbac_gate};
pub use principal::{CallerIdentity, GrantRecord, IDENTITY_HEADER, Principal};
