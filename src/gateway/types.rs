//! Request/response DTOs and the JSON body extractor.

use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use utoipa::ToSchema;

use crate::error::{AuthError, AuthErrorCode};

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "correct")]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

/// Renew response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RenewResponse {
    pub new_token: String,
}

/// Validate response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ValidateResponse {
    #[schema(example = true)]
    pub valid: bool,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
}

/// `Json<T>` whose rejection is an `InvalidFormat` auth error.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                tracing::debug!("Rejected request body: {}", rejection.body_text());
                AuthError::from_code(AuthErrorCode::InvalidFormat)
            })?;
        Ok(Self(value))
    }
}
