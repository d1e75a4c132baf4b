//! Router and request handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use health::{StatusAggregator, StatusSnapshot, StatusStore};
use rbac_gate::{Principal, RbacGateState, rbac_gate};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<StatusStore>,
    pub aggregator: Arc<StatusAggregator>,
}

/// Build the full router.
///
/// Health, status and admin routes are public; the RBAC gate wraps only the
/// `/api/policies` subtree.
#[must_use]
pub fn build_router(state: AppState, gate: RbacGateState) -> Router {
    let api = Router::new()
        .route("/api/policies/v1/access", get(current_access))
        .layer(axum::middleware::from_fn_with_state(gate, rbac_gate));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/policies/v1/status", get(current_status))
        .route("/admin/status/degraded", post(set_degraded))
        .route("/admin/status/refresh", post(refresh_status))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness view of the latest snapshot: 200 when no issues are reported and
/// the forced flag is off, 503 otherwise. Reads the store only; never probes.
async fn health_check(State(state): State<AppState>) -> Response {
    let issues = state.store.status_info();
    let degraded = state.store.is_degraded() || !issues.is_empty();
    let status = if degraded {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (status, Json(issues)).into_response()
}

/// The current status snapshot, `null` before the first aggregation cycle.
async fn current_status(State(state): State<AppState>) -> Response {
    Json(current_snapshot(&state)).into_response()
}

fn current_snapshot(state: &AppState) -> Option<StatusSnapshot> {
    state
        .store
        .snapshot()
        .map(|snapshot| snapshot.as_ref().clone())
}

#[derive(Debug, Deserialize)]
struct DegradedToggle {
    degraded: bool,
}

/// Administrator override: force (or clear) degraded status. The snapshot is
/// refreshed immediately so the change is visible without waiting a cycle.
async fn set_degraded(
    State(state): State<AppState>,
    Json(toggle): Json<DegradedToggle>,
) -> Response {
    state.store.set_degraded(toggle.degraded);
    state.aggregator.gather().await;
    Json(current_snapshot(&state)).into_response()
}

/// On-demand aggregation with the same semantics as the timer path.
async fn refresh_status(State(state): State<AppState>) -> Response {
    state.aggregator.gather().await;
    Json(current_snapshot(&state)).into_response()
}

/// Behind the gate: the calling principal's capability flags.
async fn current_access(Extension(principal): Extension<Principal>) -> Json<Principal> {
    Json(principal)
}
