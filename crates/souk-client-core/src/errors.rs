//! User-facing error classification.
//!
//! Everything the user ever reads about a failure comes from this module:
//! a pure mapping from a normalized API error descriptor to a display
//! string, plus the small taxonomy the connectivity and session layers use
//! to pick their wording. No I/O happens here.

use serde::Deserialize;

/// Shown for 403 responses.
pub const PERMISSION_DENIED: &str = "You do not have permission to perform this action.";
/// Shown for 404 responses.
pub const NOT_FOUND: &str = "The requested resource was not found.";
/// Fallback for 400 responses that carry no message of their own.
pub const INVALID_REQUEST: &str = "Invalid request.";
/// Shown for 401 responses.
pub const LOGIN_REQUIRED: &str = "Please log in to continue.";
/// Shown for 500 responses.
pub const SERVER_ERROR: &str = "Something went wrong on our side. Please try again later.";
/// Shown when no response was received at all.
pub const NETWORK_ERROR: &str = "Could not reach the server. Check your connection and try again.";
/// Last-resort fallback when nothing better is known.
pub const GENERIC_ERROR: &str = "Something went wrong. Please try again.";
/// Shown when the device itself has no connectivity.
pub const OFFLINE: &str = "No internet connection. Check your network and try again.";
/// Shown when the device is online but the backend is failing its probes.
pub const SERVER_MAINTENANCE: &str = "The service is under maintenance. Please try again shortly.";
/// Shown when a stored session could not be restored.
pub const SESSION_RESTORE_FAILED: &str = "Could not restore your previous session.";
/// Shown when credentials could not be written to device storage.
pub const CREDENTIAL_SAVE_FAILED: &str = "Could not save your login on this device.";

/// Normalized error descriptor assembled from an HTTP response.
///
/// `status` is the HTTP status code (absent when no response was received);
/// the remaining fields are whatever the backend put in the error body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Map a descriptor to the string the user sees.
///
/// Status codes take precedence over body fields; for unrecognized codes
/// the body fields are tried in `message`, `detail`, `error` order before
/// falling back to the generic message.
pub fn user_message(err: &ApiErrorBody) -> String {
    match err.status {
        Some(403) => PERMISSION_DENIED.to_string(),
        Some(404) => NOT_FOUND.to_string(),
        Some(400) => err
            .message
            .clone()
            .or_else(|| err.detail.clone())
            .unwrap_or_else(|| INVALID_REQUEST.to_string()),
        Some(401) => LOGIN_REQUIRED.to_string(),
        Some(500) => SERVER_ERROR.to_string(),
        None | Some(0) => NETWORK_ERROR.to_string(),
        Some(_) => err
            .message
            .clone()
            .or_else(|| err.detail.clone())
            .or_else(|| err.error.clone())
            .unwrap_or_else(|| GENERIC_ERROR.to_string()),
    }
}

/// Turn a capability identifier like `can_manage_listings` into a
/// permission-denied sentence.
pub fn permission_denied_message(capability: &str) -> String {
    let name = capability
        .strip_prefix("can_")
        .unwrap_or(capability)
        .replace('_', " ");
    format!("You do not have the \"{name}\" permission.")
}

/// Failure categories surfaced to the user by this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A storage operation failed; the value was dropped.
    Persistence,
    /// The device itself has no network connectivity.
    NetworkUnreachable,
    /// The device is online but the backend failed its health probes.
    BackendUnavailable,
    /// The profile fetch during session restore was rejected.
    AuthFailure,
    /// The backend rejected the request payload.
    Validation,
}

impl ErrorKind {
    /// Default wording for this category.
    pub fn user_message(self) -> &'static str {
        match self {
            Self::Persistence => CREDENTIAL_SAVE_FAILED,
            Self::NetworkUnreachable => OFFLINE,
            Self::BackendUnavailable => SERVER_MAINTENANCE,
            Self::AuthFailure => SESSION_RESTORE_FAILED,
            Self::Validation => INVALID_REQUEST,
        }
    }
}

/// Failure of an API call, carrying the classified descriptor when a
/// response was received.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No response: connect failure, DNS failure, broken transport.
    #[error("network error: {0}")]
    Transport(String),
    /// The request did not complete within its budget.
    #[error("request timed out")]
    Timeout,
    /// The backend answered with a non-success status.
    #[error("api error (status {status})")]
    Status { status: u16, body: ApiErrorBody },
}

impl ApiError {
    /// HTTP status of the response, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The string the user should see for this failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(_) | Self::Timeout => NETWORK_ERROR.to_string(),
            Self::Status { body, .. } => user_message(body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(status: Option<u16>) -> ApiErrorBody {
        ApiErrorBody {
            status,
            ..ApiErrorBody::default()
        }
    }

    #[test]
    fn forbidden_maps_to_permission_message() {
        assert_eq!(user_message(&body(Some(403))), PERMISSION_DENIED);
    }

    #[test]
    fn empty_descriptor_maps_to_network_error() {
        assert_eq!(user_message(&ApiErrorBody::default()), NETWORK_ERROR);
        assert_eq!(user_message(&body(Some(0))), NETWORK_ERROR);
    }

    #[test]
    fn bad_request_prefers_backend_message() {
        let err = ApiErrorBody {
            status: Some(400),
            message: Some("X".to_string()),
            detail: Some("ignored".to_string()),
            ..ApiErrorBody::default()
        };
        assert_eq!(user_message(&err), "X");
    }

    #[test]
    fn bad_request_falls_back_through_detail() {
        let err = ApiErrorBody {
            status: Some(400),
            detail: Some("phone is required".to_string()),
            ..ApiErrorBody::default()
        };
        assert_eq!(user_message(&err), "phone is required");
        assert_eq!(user_message(&body(Some(400))), INVALID_REQUEST);
    }

    #[test]
    fn unknown_status_walks_the_fallback_chain() {
        let err = ApiErrorBody {
            status: Some(418),
            error: Some("teapot".to_string()),
            ..ApiErrorBody::default()
        };
        assert_eq!(user_message(&err), "teapot");
        assert_eq!(user_message(&body(Some(418))), GENERIC_ERROR);
    }

    #[test]
    fn known_statuses_map_to_fixed_strings() {
        assert_eq!(user_message(&body(Some(401))), LOGIN_REQUIRED);
        assert_eq!(user_message(&body(Some(404))), NOT_FOUND);
        assert_eq!(user_message(&body(Some(500))), SERVER_ERROR);
    }

    #[test]
    fn capability_identifier_becomes_sentence() {
        assert_eq!(
            permission_denied_message("can_manage_listings"),
            "You do not have the \"manage listings\" permission."
        );
        assert_eq!(
            permission_denied_message("publish"),
            "You do not have the \"publish\" permission."
        );
    }

    #[test]
    fn api_error_classifies_through_body() {
        let err = ApiError::Status {
            status: 403,
            body: body(Some(403)),
        };
        assert_eq!(err.user_message(), PERMISSION_DENIED);
        assert_eq!(err.status(), Some(403));

        let err = ApiError::Transport("connection refused".to_string());
        assert_eq!(err.user_message(), NETWORK_ERROR);
        assert_eq!(err.status(), None);
    }
}
