//! HTTP surface: routes, middleware stack and server lifecycle.

pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod rate_limit;
pub mod state;
pub mod types;

use anyhow::Context;
use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;

use crate::config::AppConfig;
use crate::service::AuthService;
use crate::session::{session_gate, spawn_sweeper};
use rate_limit::RateLimiter;
use state::AppState;

/// Build the full router.
///
/// Protected routes pass the session gate before reaching their handler.
pub fn build_router(state: Arc<AppState>, compressed: bool) -> Router {
    let sessions = state.auth.sessions().clone();

    // ==========================================================================
    // Protected Routes (session token required)
    // ==========================================================================
    let protected_routes = Router::new()
        .route("/renew", post(handlers::renew))
        .route("/validate", post(handlers::validate))
        .route_layer(from_fn_with_state(sessions, session_gate));

    // ==========================================================================
    // Public Routes
    // ==========================================================================
    let public_routes = Router::new()
        .route("/login", post(handlers::login))
        .route("/health", get(handlers::health))
        .route("/api-docs/openapi.json", get(handlers::openapi_json));

    let api = public_routes.merge(protected_routes);
    let app = if state.base_path.is_empty() {
        api
    } else {
        Router::new().nest(&state.base_path, api)
    };

    with_middleware(app, state, compressed)
}

/// Layers, outermost first: panic recovery, CORS, optional gzip, request
/// logging, rate limiting.
fn with_middleware(app: Router<Arc<AppState>>, state: Arc<AppState>, compressed: bool) -> Router {
    let app = app
        .layer(from_fn_with_state(
            state.limiter.clone(),
            middleware::rate_limit,
        ))
        .layer(from_fn(middleware::request_logger))
        .with_state(state);

    let app = if compressed {
        app.layer(CompressionLayer::new())
    } else {
        app
    };

    app.layer(middleware::cors_layer())
        .layer(CatchPanicLayer::custom(middleware::panic_response))
}

/// Serve until SIGINT/SIGTERM, drain for up to the shutdown timeout, then
/// flush every session.
pub async fn run_server(config: &AppConfig, auth: Arc<AuthService>) -> anyhow::Result<()> {
    let limiter = RateLimiter::new(config.rate_limit.per_second, config.rate_limit.burst);
    let state = Arc::new(AppState::new(auth.clone(), limiter, config.base_path()));
    let app = build_router(state, config.server.compressed);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Health check: http://{}{}/health", addr, config.base_path());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sweeper = (config.session.sweep_interval_secs > 0).then(|| {
        tracing::info!(
            every_secs = config.session.sweep_interval_secs,
            "Expired-session sweeper enabled"
        );
        spawn_sweeper(
            auth.sessions().registry().clone(),
            Duration::from_secs(config.session.sweep_interval_secs),
            shutdown_rx.clone(),
        )
    });

    let mut stop_rx = shutdown_rx;
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = stop_rx.wait_for(|stop| *stop).await;
            })
            .await
    });

    let early_exit = tokio::select! {
        _ = shutdown_signal() => None,
        result = &mut server => Some(result),
    };

    let _ = shutdown_tx.send(true);

    let outcome = match early_exit {
        Some(result) => result
            .context("server task panicked")?
            .context("server error"),
        None => {
            tracing::info!("Shutdown signal received, draining connections");
            match tokio::time::timeout(config.shutdown_timeout(), server).await {
                Ok(joined) => joined
                    .context("server task panicked")?
                    .context("server error"),
                Err(_) => {
                    tracing::warn!(
                        timeout_secs = config.server.shutdown_timeout_secs,
                        "Shutdown timeout elapsed; abandoning in-flight requests"
                    );
                    Ok(())
                }
            }
        }
    };

    if let Some(sweeper) = sweeper {
        let _ = sweeper.await;
    }

    let dropped = auth.sessions().flush();
    tracing::info!(dropped, "Session registry flushed");

    auth.close().await;
    tracing::info!("Shutdown complete");

    outcome
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{Argon2Hasher, InMemoryCredentialStore};
    use crate::session::{SessionManager, SessionRegistry, TokenCodec};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_state() -> Arc<AppState> {
        let sessions = SessionManager::new(
            TokenCodec::new(b"test-secret", Duration::from_secs(3600)),
            Arc::new(SessionRegistry::new()),
        );
        let auth = AuthService::new(
            Arc::new(InMemoryCredentialStore::new()),
            Argon2Hasher::with_params(8, 1, 1).unwrap(),
            sessions,
        )
        .unwrap();
        Arc::new(AppState::new(
            Arc::new(auth),
            RateLimiter::disabled(),
            String::new(),
        ))
    }

    async fn explode() -> &'static str {
        panic!("handler exploded")
    }

    #[tokio::test]
    async fn test_handler_panic_becomes_internal_error() {
        let routes = Router::new()
            .route("/explode", get(explode))
            .route("/health", get(handlers::health));
        let app = with_middleware(routes, test_state(), false);

        let response = app
            .clone()
            .oneshot(Request::get("/explode").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], 5000);

        // Still serving after the panic
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
