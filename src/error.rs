//! Authentication error types.
//!
//! Every failure the HTTP surface can report maps to one `AuthErrorCode`,
//! which fixes the HTTP status and a stable numeric code.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::credentials::StoreError;
use crate::session::TokenError;

/// Stable error codes returned to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum AuthErrorCode {
    /// 1001: Request body is malformed or missing fields
    InvalidFormat = 1001,
    /// 2001: Unknown user or wrong password (deliberately the same code)
    InvalidUserOrPassword = 2001,
    /// 2002: Authorization header missing
    TokenRequired = 2002,
    /// 2003: Token signature or structure invalid
    InvalidToken = 2003,
    /// 2004: Token not registered or past its expiry
    TokenInvalidOrExpired = 2004,
    /// 4291: Request budget exhausted
    RateLimitExceeded = 4291,
    /// 5000: Unexpected fault
    InternalServerError = 5000,
    /// 5001: Token signing failed
    FailedToGenerateToken = 5001,
}

impl AuthErrorCode {
    /// Get error code as i32.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Get error name string.
    pub fn name(self) -> &'static str {
        match self {
            Self::InvalidFormat => "INVALID_FORMAT",
            Self::InvalidUserOrPassword => "INVALID_USER_OR_PASSWORD",
            Self::TokenRequired => "TOKEN_REQUIRED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenInvalidOrExpired => "TOKEN_INVALID_OR_EXPIRED",
            Self::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            Self::InternalServerError => "INTERNAL_SERVER_ERROR",
            Self::FailedToGenerateToken => "FAILED_TO_GENERATE_TOKEN",
        }
    }

    /// Get HTTP status code.
    pub fn http_status(self) -> StatusCode {
        match self {
            Self::InvalidFormat => StatusCode::BAD_REQUEST,
            Self::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            Self::InternalServerError | Self::FailedToGenerateToken => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    fn default_message(self) -> &'static str {
        match self {
            Self::InvalidFormat => "invalid format",
            Self::InvalidUserOrPassword => "invalid user or password",
            Self::TokenRequired => "token required",
            Self::InvalidToken => "invalid token",
            Self::TokenInvalidOrExpired => "token is invalid or expired",
            Self::RateLimitExceeded => "rate limit exceeded",
            Self::InternalServerError => "internal server error",
            Self::FailedToGenerateToken => "failed to generate token",
        }
    }
}

/// Authentication error with message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthError {
    pub code: AuthErrorCode,
    pub message: String,
}

impl AuthError {
    /// Create a new auth error.
    pub fn new(code: AuthErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create error with default message.
    pub fn from_code(code: AuthErrorCode) -> Self {
        Self::new(code, code.default_message())
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.code.name(), self.code.code(), self.message)
    }
}

impl std::error::Error for AuthError {}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid(_) => Self::from_code(AuthErrorCode::InvalidToken),
            other => {
                tracing::error!("Token generation failed: {}", other);
                Self::from_code(AuthErrorCode::FailedToGenerateToken)
            }
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            // Never reveal whether the username exists.
            StoreError::NotFound => Self::from_code(AuthErrorCode::InvalidUserOrPassword),
            other => {
                tracing::error!("Credential store failure: {}", other);
                Self::from_code(AuthErrorCode::InternalServerError)
            }
        }
    }
}

/// JSON response body for auth errors.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthErrorResponse {
    #[schema(example = 2004)]
    pub code: i32,
    #[schema(example = "TOKEN_INVALID_OR_EXPIRED")]
    pub error: &'static str,
    #[schema(example = "token is invalid or expired")]
    pub message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = AuthErrorResponse {
            code: self.code.code(),
            error: self.code.name(),
            message: self.message,
        };
        (self.code.http_status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AuthErrorCode::InvalidFormat.code(), 1001);
        assert_eq!(AuthErrorCode::TokenInvalidOrExpired.code(), 2004);
        assert_eq!(AuthErrorCode::FailedToGenerateToken.code(), 5001);
    }

    #[test]
    fn test_http_status() {
        assert_eq!(
            AuthErrorCode::InvalidFormat.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthErrorCode::TokenRequired.http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthErrorCode::RateLimitExceeded.http_status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AuthErrorCode::FailedToGenerateToken.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_found_is_indistinguishable_from_bad_password() {
        let from_store = AuthError::from(StoreError::NotFound);
        let bad_password = AuthError::from_code(AuthErrorCode::InvalidUserOrPassword);
        assert_eq!(from_store, bad_password);
    }

    #[test]
    fn test_store_conflict_is_internal() {
        let err = AuthError::from(StoreError::Conflict("alice".into()));
        assert_eq!(err.code, AuthErrorCode::InternalServerError);
    }

    #[test]
    fn test_error_from_code() {
        let err = AuthError::from_code(AuthErrorCode::InvalidToken);
        assert_eq!(err.message, "invalid token");
        assert!(err.to_string().contains("INVALID_TOKEN"));
    }
}
