//! Caller identity and grant models.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// Request header carrying the opaque caller identity.
pub const IDENTITY_HEADER: &str = "x-rh-identity";

/// The two capabilities a caller has been granted by the RBAC service.
///
/// Immutable once fetched; lives for one request (plus its stay in the
/// grant cache) and is never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantRecord {
    pub can_read_all: bool,
    pub can_write_all: bool,
}

/// Untrusted caller identity extracted from the identity header.
///
/// The raw header value is the cache key and is forwarded verbatim to the
/// RBAC service. The account number is decoded on a best-effort basis purely
/// to enrich log events; no authorization decision depends on it.
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    raw: String,
    account: Option<String>,
}

impl CallerIdentity {
    #[must_use]
    pub fn from_header(raw: &str) -> Self {
        Self {
            raw: raw.to_owned(),
            account: decode_account(raw),
        }
    }

    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }
}

/// The header is conventionally base64-encoded JSON with an
/// `identity.account_number` field; anything else leaves the account unknown.
fn decode_account(raw: &str) -> Option<String> {
    let bytes = STANDARD.decode(raw).ok()?;
    let value: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    value
        .get("identity")?
        .get("account_number")?
        .as_str()
        .map(str::to_owned)
}

/// Authenticated principal attached to a request once the gate admits it.
///
/// Downstream handlers read the capability flags for fine-grained checks.
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    pub account: Option<String>,
    pub can_read_all: bool,
    pub can_write_all: bool,
}
