//! OpenAPI documentation.
//!
//! Served at `{base}/api-docs/openapi.json`. Paths are documented relative to
//! the configured base path, which is published as the server URL.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::openapi::server::Server;
use utoipa::{Modify, OpenApi};

use super::types::{HealthResponse, LoginRequest, RenewResponse, TokenResponse, ValidateResponse};
use crate::error::AuthErrorResponse;

/// Session token passed verbatim in the Authorization header
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_token",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "Authorization",
                    "Token returned by /login or /renew, optionally prefixed with `Bearer `",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Simple Auth API",
        version = "1.0.0",
        description = "Issue, renew and validate session tokens for username/password users."
    ),
    paths(
        super::handlers::login,
        super::handlers::renew,
        super::handlers::validate,
        super::handlers::health,
    ),
    components(schemas(
        LoginRequest,
        TokenResponse,
        RenewResponse,
        ValidateResponse,
        HealthResponse,
        AuthErrorResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login and session lifecycle"),
        (name = "System", description = "Service status")
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    pub fn with_base_path(base_path: &str) -> utoipa::openapi::OpenApi {
        let mut doc = Self::openapi();
        let url = if base_path.is_empty() { "/" } else { base_path };
        doc.servers = Some(vec![Server::new(url)]);
        doc
    }
}
