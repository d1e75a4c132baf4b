//! Remote RBAC service client.

use async_trait::async_trait;
use remote_call::RemoteFailure;

use crate::principal::{CallerIdentity, GrantRecord, IDENTITY_HEADER};

/// Source of RBAC grants for the gate.
///
/// The middleware holds this as a trait object so tests can substitute a
/// local implementation for the HTTP client.
#[async_trait]
pub trait GrantSource: Send + Sync {
    /// Fetch the caller's grant record from the policy service.
    ///
    /// One round trip, no retry; retry is the next cache miss.
    ///
    /// # Errors
    ///
    /// Any [`RemoteFailure`] variant; `Unreachable` when the transport itself
    /// fails or the success body cannot be deserialized.
    async fn fetch_grant(
        &self,
        identity: &CallerIdentity,
    ) -> Result<GrantRecord, RemoteFailure>;
}

/// HTTP client for the remote RBAC service.
pub struct RbacClient {
    http: reqwest::Client,
    base_url: String,
    application: String,
}

impl RbacClient {
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        application: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            application: application.into(),
        }
    }
}

#[async_trait]
impl GrantSource for RbacClient {
    async fn fetch_grant(
        &self,
        identity: &CallerIdentity,
    ) -> Result<GrantRecord, RemoteFailure> {
        let url = format!("{}/rbac-info", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("app", self.application.as_str())])
            .header(IDENTITY_HEADER, identity.raw())
            .send()
            .await
            .map_err(|e| RemoteFailure::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(remote_call::failure_from_response(response).await);
        }

        response
            .json::<GrantRecord>()
            .await
            .map_err(|e| RemoteFailure::Unreachable(e.to_string()))
    }
}
