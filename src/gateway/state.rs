use std::sync::Arc;

use super::rate_limit::RateLimiter;
use crate::service::AuthService;

/// Shared state handed to every handler.
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub limiter: Arc<RateLimiter>,
    /// Normalized route prefix (`/api`, or `""` at the root)
    pub base_path: String,
}

impl AppState {
    pub fn new(auth: Arc<AuthService>, limiter: RateLimiter, base_path: String) -> Self {
        Self {
            auth,
            limiter: Arc::new(limiter),
            base_path,
        }
    }
}
