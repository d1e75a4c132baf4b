//! Translation of remote HTTP responses into [`RemoteFailure`] values.

use http::StatusCode;
use thiserror::Error;

/// Typed failure of a remote service call.
///
/// Constructed by [`translate`] (and its [`failure_from_response`] wrapper)
/// for response-level failures, or directly as [`RemoteFailure::Unreachable`]
/// when the transport itself fails before a response arrives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteFailure {
    /// The remote service rejected the request payload (HTTP 400).
    #[error("{0}")]
    ValidationFailed(String),
    /// The remote service denied the caller (HTTP 401).
    #[error("no permission on remote call")]
    PermissionDenied,
    /// The requested entity does not exist on the remote side (HTTP 404).
    #[error("{0}")]
    NotFound(String),
    /// Any other non-success status.
    #[error("remote call failed with {status} {reason}")]
    Unavailable { status: u16, reason: String },
    /// The transport failed: connection refused, timeout, broken body stream.
    #[error("remote service unreachable: {0}")]
    Unreachable(String),
}

/// Translate a remote response into exactly one [`RemoteFailure`].
///
/// The status-to-variant mapping is fixed. The body is consulted only for its
/// conventional `errorMsg` field (JSON content types) or taken verbatim as
/// text; anything missing or unparseable degrades to a placeholder naming the
/// status code. Translation itself never fails.
///
/// Permission denials and unexpected statuses additionally emit a
/// warning-level event here, at the one place that still sees the reason
/// phrase and the remote body.
#[must_use]
pub fn translate(status: StatusCode, content_type: Option<&str>, body: &[u8]) -> RemoteFailure {
    let msg = extract_message(status, content_type, body);
    let reason = status.canonical_reason().unwrap_or("Unknown");

    match status.as_u16() {
        400 => RemoteFailure::ValidationFailed(format!("Validation failed: {msg}")),
        401 => {
            tracing::warn!(reason, body = %msg, "no permission on remote call");
            RemoteFailure::PermissionDenied
        }
        404 => RemoteFailure::NotFound(msg),
        code => {
            tracing::warn!(code, reason, body = %msg, "remote call failed");
            RemoteFailure::Unavailable {
                status: code,
                reason: reason.to_owned(),
            }
        }
    }
}

/// Read status, content type and body from a response and [`translate`] them.
///
/// A failure while reading the body degrades to the no-body placeholder
/// rather than masking the original status.
pub async fn failure_from_response(response: reqwest::Response) -> RemoteFailure {
    let status = response.status();
    let content_type = response
        .headers()
        .get(http::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let body = response.bytes().await.unwrap_or_default();
    translate(status, content_type.as_deref(), &body)
}

fn extract_message(status: StatusCode, content_type: Option<&str>, body: &[u8]) -> String {
    if body.is_empty() {
        return placeholder(status);
    }
    if content_type.is_some_and(|ct| ct.starts_with("application/json")) {
        serde_json::from_slice::<serde_json::Value>(body)
            .ok()
            .and_then(|value| {
                value
                    .get("errorMsg")
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_owned)
            })
            .unwrap_or_else(|| placeholder(status))
    } else {
        match std::str::from_utf8(body) {
            Ok(text) => text.to_owned(),
            Err(_) => placeholder(status),
        }
    }
}

fn placeholder(status: StatusCode) -> String {
    format!("-- no body received, status code is {}", status.as_u16())
}
