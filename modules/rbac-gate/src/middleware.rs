//! Authorization middleware for business routes.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::Instrument;

use crate::cache::GrantCache;
use crate::client::GrantSource;
use crate::principal::{CallerIdentity, IDENTITY_HEADER, Principal};

/// Shared state for the RBAC gate middleware.
#[derive(Clone)]
pub struct RbacGateState {
    pub grants: Arc<dyn GrantSource>,
    pub cache: Arc<GrantCache>,
}

/// RBAC gate run before every business handler.
///
/// Per request: extract the caller identity, consult the grant cache, on a
/// miss make one remote call, then either attach a [`Principal`] to the
/// request or reject it.
///
/// Fails closed: a missing or non-UTF-8 identity header and every remote
/// failure end in `403 Forbidden` with an empty body. The remote status code
/// is kept for logging only and never propagated to the caller.
pub async fn rbac_gate(
    State(state): State<RbacGateState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(raw) = req
        .headers()
        .get(IDENTITY_HEADER)
        .and_then(|value| value.to_str().ok())
    else {
        tracing::warn!("request without identity header rejected");
        return StatusCode::FORBIDDEN.into_response();
    };
    let identity = CallerIdentity::from_header(raw);

    let grant = match state.cache.get(identity.raw()) {
        Some(grant) => grant,
        None => {
            let fetched = state
                .grants
                .fetch_grant(&identity)
                .instrument(tracing::info_span!("get_rbac"))
                .await;
            match fetched {
                Ok(grant) => {
                    state.cache.put(identity.raw(), grant);
                    grant
                }
                Err(failure) => {
                    tracing::warn!(
                        account = identity.account(),
                        error = %failure,
                        "got no rbac info, rejecting request"
                    );
                    return StatusCode::FORBIDDEN.into_response();
                }
            }
        }
    };

    req.extensions_mut().insert(Principal {
        account: identity.account().map(str::to_owned),
        can_read_all: grant.can_read_all,
        can_write_all: grant.can_write_all,
    });
    next.run(req).await
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::principal::GrantRecord;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use axum::routing::get;
    use axum::{Extension, Json, Router};
    use remote_call::RemoteFailure;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tower::ServiceExt;

    /// Grant source with a canned outcome and a call counter.
    struct FakeGrants {
        outcome: Result<GrantRecord, RemoteFailure>,
        calls: AtomicUsize,
    }

    impl FakeGrants {
        fn ok(grant: GrantRecord) -> Arc<Self> {
            Arc::new(Self {
                outcome: Ok(grant),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(failure: RemoteFailure) -> Arc<Self> {
            Arc::new(Self {
                outcome: Err(failure),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GrantSource for FakeGrants {
        async fn fetch_grant(
            &self,
            _identity: &CallerIdentity,
        ) -> Result<GrantRecord, RemoteFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    fn app(grants: Arc<dyn GrantSource>, ttl: Duration) -> Router {
        let state = RbacGateState {
            grants,
            cache: Arc::new(GrantCache::new(ttl)),
        };
        Router::new()
            .route(
                "/access",
                get(|Extension(principal): Extension<Principal>| async move { Json(principal) }),
            )
            .layer(axum::middleware::from_fn_with_state(state, rbac_gate))
    }

    fn request_with_identity(identity: &str) -> HttpRequest<Body> {
        HttpRequest::builder()
            .uri("/access")
            .header(IDENTITY_HEADER, identity)
            .body(Body::empty())
            .unwrap()
    }

    const GRANT: GrantRecord = GrantRecord {
        can_read_all: true,
        can_write_all: false,
    };

    #[tokio::test]
    async fn missing_identity_header_is_rejected() {
        let grants = FakeGrants::ok(GRANT);
        let app = app(grants.clone(), Duration::from_secs(60));

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/access")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        // The remote service is never consulted for an unidentified caller.
        assert_eq!(grants.calls(), 0);
    }

    #[tokio::test]
    async fn successful_lookup_attaches_principal() {
        let grants = FakeGrants::ok(GRANT);
        let app = app(grants.clone(), Duration::from_secs(60));

        let response = app.oneshot(request_with_identity("caller-a")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = http_body_util::BodyExt::collect(response.into_body())
            .await
            .unwrap()
            .to_bytes();
        let principal: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(principal["can_read_all"], true);
        assert_eq!(principal["can_write_all"], false);
        assert_eq!(grants.calls(), 1);
    }

    #[tokio::test]
    async fn repeat_request_within_ttl_makes_no_remote_call() {
        let grants = FakeGrants::ok(GRANT);
        let app = app(grants.clone(), Duration::from_secs(60));

        for _ in 0..3 {
            let response = app
                .clone()
                .oneshot(request_with_identity("caller-a"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        assert_eq!(grants.calls(), 1);
    }

    #[tokio::test]
    async fn expired_entry_triggers_a_fresh_remote_call() {
        let grants = FakeGrants::ok(GRANT);
        let app = app(grants.clone(), Duration::from_millis(20));

        let first = app
            .clone()
            .oneshot(request_with_identity("caller-a"))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        tokio::time::sleep(Duration::from_millis(40)).await;

        let second = app.oneshot(request_with_identity("caller-a")).await.unwrap();
        assert_eq!(second.status(), StatusCode::OK);
        assert_eq!(grants.calls(), 2);
    }

    #[tokio::test]
    async fn distinct_callers_are_cached_independently() {
        let grants = FakeGrants::ok(GRANT);
        let app = app(grants.clone(), Duration::from_secs(60));

        for identity in ["caller-a", "caller-b", "caller-a"] {
            let response = app
                .clone()
                .oneshot(request_with_identity(identity))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        assert_eq!(grants.calls(), 2);
    }

    #[tokio::test]
    async fn remote_permission_denial_rejects_with_403() {
        let grants = FakeGrants::failing(RemoteFailure::PermissionDenied);
        let app = app(grants, Duration::from_secs(60));

        let response = app.oneshot(request_with_identity("caller-a")).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn downstream_status_is_never_propagated() {
        let grants = FakeGrants::failing(RemoteFailure::Unavailable {
            status: 502,
            reason: "Bad Gateway".to_owned(),
        });
        let app = app(grants, Duration::from_secs(60));

        let response = app.oneshot(request_with_identity("caller-a")).await.unwrap();

        // 403, not the remote's 502.
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn unreachable_service_fails_closed() {
        let grants = FakeGrants::failing(RemoteFailure::Unreachable(
            "connection refused".to_owned(),
        ));
        let app = app(grants.clone(), Duration::from_secs(60));

        let response = app
            .clone()
            .oneshot(request_with_identity("caller-a"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        // Failures are not cached; the next request retries the remote call.
        let response = app.oneshot(request_with_identity("caller-a")).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(grants.calls(), 2);
    }
}
