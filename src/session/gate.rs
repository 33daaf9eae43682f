//! Session gate middleware for Axum.
//!
//! Per request: read the `Authorization` header, decode the token, check it is
//! live, then hand an [`AuthenticatedSubject`] to the handler through request
//! extensions. Any failure ends the request.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::Response,
};

use super::manager::{AuthenticatedSubject, SessionManager};
use crate::error::{AuthError, AuthErrorCode};

/// Extract the token from the `Authorization` header.
///
/// Accepts the raw token or `Bearer <token>` (scheme matched case-insensitively).
pub fn extract_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .ok_or_else(|| AuthError::from_code(AuthErrorCode::TokenRequired))?;

    let token = strip_bearer(value);
    if token.is_empty() {
        return Err(AuthError::from_code(AuthErrorCode::TokenRequired));
    }
    Ok(token)
}

/// `value` is already trimmed, so a bare `Bearer` means the token is empty.
fn strip_bearer(value: &str) -> &str {
    match (value.get(..6), value.get(6..)) {
        (Some(scheme), Some(rest))
            if scheme.eq_ignore_ascii_case("bearer")
                && (rest.is_empty() || rest.starts_with([' ', '\t'])) =>
        {
            rest.trim()
        }
        _ => value,
    }
}

pub async fn session_gate(
    State(sessions): State<SessionManager>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let subject: AuthenticatedSubject = {
        let token = extract_token(request.headers())?;
        sessions.authorize(token).inspect_err(|e| {
            tracing::debug!(code = e.code.code(), "session gate rejected request");
        })?
    };

    request.extensions_mut().insert(subject);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_missing_header() {
        let err = extract_token(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.code, AuthErrorCode::TokenRequired);
    }

    #[test]
    fn test_empty_header() {
        assert_eq!(
            extract_token(&headers_with("")).unwrap_err().code,
            AuthErrorCode::TokenRequired
        );
        assert_eq!(
            extract_token(&headers_with("Bearer ")).unwrap_err().code,
            AuthErrorCode::TokenRequired
        );
    }

    #[test]
    fn test_raw_token() {
        let headers = headers_with("abc.def.ghi");
        assert_eq!(extract_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_bearer_token() {
        let headers = headers_with("Bearer abc.def.ghi");
        assert_eq!(extract_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_bearer_without_token() {
        for value in ["Bearer", "Bearer   ", "bearer", "  Bearer \t "] {
            assert_eq!(
                extract_token(&headers_with(value)).unwrap_err().code,
                AuthErrorCode::TokenRequired,
                "{value:?}"
            );
        }
    }

    #[test]
    fn test_bearer_scheme_case_insensitive() {
        for value in ["bearer abc.def.ghi", "BEARER abc.def.ghi", "Bearer\tabc.def.ghi"] {
            assert_eq!(extract_token(&headers_with(value)).unwrap(), "abc.def.ghi");
        }
    }

    #[test]
    fn test_token_starting_with_bearer_kept() {
        let headers = headers_with("bearerish.token.value");
        assert_eq!(extract_token(&headers).unwrap(), "bearerish.token.value");
    }
}
