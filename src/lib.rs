//! Simple Auth - bearer token authentication service
//!
//! Issues, validates and renews signed session tokens for users kept in a
//! username/password credential store.
//!
//! # Modules
//!
//! - [`session`] - Token codec, session registry, session gate (the core)
//! - [`credentials`] - Credential store trait, PostgreSQL and in-memory stores, Argon2 hashing
//! - [`service`] - Login / renew / user creation
//! - [`gateway`] - HTTP routes, middleware, server lifecycle
//! - [`error`] - Error codes returned to clients
//! - [`config`] - Defaults, YAML and environment configuration
//! - [`logging`] - tracing subscriber setup
//! - [`db`] - PostgreSQL connection pool

pub mod config;
pub mod credentials;
pub mod db;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod service;
pub mod session;

// Convenient re-exports at crate root
pub use config::AppConfig;
pub use credentials::{
    Argon2Hasher, Credential, CredentialStore, InMemoryCredentialStore, PgCredentialStore,
    StoreError,
};
pub use error::{AuthError, AuthErrorCode};
pub use service::AuthService;
pub use session::{
    AuthenticatedSubject, Claims, MintedToken, SessionManager, SessionRegistry, TokenCodec,
    TokenError,
};
