//! Error taxonomy for the authentication core.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Failures surfaced by the credential validators and session issuer.
///
/// `InvalidCredentials` deliberately carries the same message for "unknown
/// user" and "wrong password" so callers cannot probe for accounts.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("Email domain not allowed. Allowed domains: {}", .0.join(", "))]
    DomainNotAllowed(Vec<String>),

    #[error("Directory unavailable: {0}")]
    DirectoryUnavailable(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("OAuth exchange failed: {0}")]
    OAuthFailed(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Stable machine-readable kind, used in JSON bodies and redirect
    /// query parameters.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::UserAlreadyExists => "user_already_exists",
            AuthError::DomainNotAllowed(_) => "domain_not_allowed",
            AuthError::DirectoryUnavailable(_) => "directory_unavailable",
            AuthError::Unauthenticated(_) => "unauthenticated",
            AuthError::OAuthFailed(_) => "oauth_failed",
            AuthError::InvalidRequest(_) => "invalid_request",
            AuthError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::UserAlreadyExists => StatusCode::BAD_REQUEST,
            AuthError::DomainNotAllowed(_) => StatusCode::UNAUTHORIZED,
            AuthError::DirectoryUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AuthError::OAuthFailed(_) => StatusCode::BAD_GATEWAY,
            AuthError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": {
                "type": self.kind(),
                "message": self.to_string()
            }
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_credentials_message_does_not_name_the_cause() {
        // Same wording no matter whether the user was missing or the
        // password was wrong.
        assert_eq!(AuthError::InvalidCredentials.to_string(), "Invalid credentials");
    }

    #[test]
    fn test_domain_not_allowed_names_the_domains() {
        let err = AuthError::DomainNotAllowed(vec![
            "example.com".to_string(),
            "example.org".to_string(),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("example.com"));
        assert!(msg.contains("example.org"));
    }

    #[test]
    fn test_error_kinds_are_stable() {
        assert_eq!(AuthError::InvalidCredentials.kind(), "invalid_credentials");
        assert_eq!(AuthError::UserAlreadyExists.kind(), "user_already_exists");
        assert_eq!(
            AuthError::DirectoryUnavailable("refused".to_string()).kind(),
            "directory_unavailable"
        );
        assert_eq!(AuthError::OAuthFailed("x".to_string()).kind(), "oauth_failed");
    }
}
