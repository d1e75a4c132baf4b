//! Liveness probes for the service's dependencies.

use async_trait::async_trait;
use remote_call::RemoteFailure;
use sqlx::PgPool;

/// Sentinel policy name for the datastore probe; the row never exists.
const SENTINEL_NAME: &str = "dummy";
const SENTINEL_ORG_ID: &str = "-dummy-";

/// Always-valid condition used to exercise the engine's validation endpoint.
const SENTINEL_CONDITION: &str = "facts.arch = 'x86_64'";

/// One dependency check run by the aggregator.
///
/// Implementations are side-effect-free from the aggregator's point of view;
/// a failure is reported as a human-readable message and recorded verbatim in
/// the status snapshot.
#[async_trait]
pub trait DependencyProbe: Send + Sync {
    /// Key under which this probe's failures appear in the issue map.
    fn name(&self) -> &'static str;

    /// Probe the dependency once.
    ///
    /// # Errors
    ///
    /// The failure message to record; the probe itself never panics the
    /// aggregation cycle.
    async fn check(&self) -> Result<(), String>;
}

/// Minimal read against the policies datastore.
///
/// Looks up a sentinel policy that is known never to exist; any answer means
/// the datastore is reachable.
pub struct DatastoreProbe {
    pool: PgPool,
}

impl DatastoreProbe {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DependencyProbe for DatastoreProbe {
    fn name(&self) -> &'static str {
        "backend-db"
    }

    async fn check(&self) -> Result<(), String> {
        sqlx::query("SELECT id FROM policy WHERE name = $1 AND org_id = $2")
            .bind(SENTINEL_NAME)
            .bind(SENTINEL_ORG_ID)
            .fetch_optional(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

/// Lightweight call against the rule-evaluation engine.
pub struct EngineProbe {
    client: EngineClient,
}

impl EngineProbe {
    #[must_use]
    pub fn new(client: EngineClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DependencyProbe for EngineProbe {
    fn name(&self) -> &'static str {
        "engine"
    }

    async fn check(&self) -> Result<(), String> {
        self.client
            .validate_condition(SENTINEL_CONDITION)
            .await
            .map_err(|e| e.to_string())
    }
}

/// HTTP client for the rule-evaluation engine's validation operation.
pub struct EngineClient {
    http: reqwest::Client,
    base_url: String,
}

impl EngineClient {
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// Ask the engine to validate a condition expression.
    ///
    /// # Errors
    ///
    /// `Unreachable` when the transport fails; otherwise the translated
    /// failure for any non-success response.
    pub async fn validate_condition(&self, condition: &str) -> Result<(), RemoteFailure> {
        let url = format!("{}/validate", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "condition": condition }))
            .send()
            .await
            .map_err(|e| RemoteFailure::Unreachable(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(remote_call::failure_from_response(response).await)
        }
    }
}
