use axum::{Extension, Json, extract::State};
use std::sync::Arc;

use super::openapi::ApiDoc;
use super::state::AppState;
use super::types::{
    HealthResponse, LoginRequest, RenewResponse, TokenResponse, ValidJson, ValidateResponse,
};
use crate::error::{AuthError, AuthErrorCode, AuthErrorResponse};
use crate::session::AuthenticatedSubject;

/// Log in with username and password
///
/// POST {base}/login
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 400, description = "Malformed body", body = AuthErrorResponse),
        (status = 401, description = "Invalid user or password", body = AuthErrorResponse),
        (status = 500, description = "Failed to generate token", body = AuthErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> Result<Json<TokenResponse>, AuthError> {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(AuthError::from_code(AuthErrorCode::InvalidFormat));
    }

    let minted = state.auth.login(&req.username, &req.password).await?;
    Ok(Json(TokenResponse {
        token: minted.token,
    }))
}

/// Exchange a live token for a new one
///
/// POST {base}/renew
#[utoipa::path(
    post,
    path = "/renew",
    responses(
        (status = 200, description = "Token renewed; the old token is revoked", body = RenewResponse),
        (status = 401, description = "Token missing, invalid or expired", body = AuthErrorResponse),
        (status = 500, description = "Failed to generate token", body = AuthErrorResponse)
    ),
    security(("session_token" = [])),
    tag = "Auth"
)]
pub async fn renew(
    State(state): State<Arc<AppState>>,
    Extension(subject): Extension<AuthenticatedSubject>,
) -> Result<Json<RenewResponse>, AuthError> {
    let minted = state.auth.renew(&subject.token)?;
    Ok(Json(RenewResponse {
        new_token: minted.token,
    }))
}

/// Check that a token is live
///
/// POST {base}/validate
#[utoipa::path(
    post,
    path = "/validate",
    responses(
        (status = 200, description = "Token is live", body = ValidateResponse),
        (status = 401, description = "Token missing, invalid or expired", body = AuthErrorResponse)
    ),
    security(("session_token" = [])),
    tag = "Auth"
)]
pub async fn validate(Extension(subject): Extension<AuthenticatedSubject>) -> Json<ValidateResponse> {
    tracing::debug!(subject = %subject.subject, "token validated");
    Json(ValidateResponse { valid: true })
}

/// Health check
///
/// GET {base}/health
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse)
    ),
    tag = "System"
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// GET {base}/api-docs/openapi.json
pub async fn openapi_json(State(state): State<Arc<AppState>>) -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::with_base_path(&state.base_path))
}
