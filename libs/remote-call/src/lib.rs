//! Remote-call failure taxonomy.
//!
//! Remote policy services report errors as heterogeneous HTTP responses. This
//! crate normalizes any such response into one [`RemoteFailure`] so every
//! caller (the RBAC gate, the engine probe) pattern-matches the same small
//! set of variants instead of inspecting raw status codes and bodies.

pub mod failure;

pub use failure::{RemoteFailure, failure_from_response, translate};
