//! Credential store: username -> password hash.
//!
//! The session core never touches this; only the login flow and the
//! `create-user` command do.

pub mod memory;
pub mod password;
pub mod postgres;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{DatabaseConfig, DbEngine};
use crate::db::Database;

pub use memory::InMemoryCredentialStore;
pub use password::Argon2Hasher;
pub use postgres::PgCredentialStore;

/// Stored login credential. `password_hash` is an Argon2 PHC string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password_hash: String,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("user not found")]
    NotFound,

    #[error("user already exists: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("invalid credential: {0}")]
    Invalid(&'static str),
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, username: &str) -> Result<Credential, StoreError>;

    /// Insert a new credential; an existing username is a `Conflict`.
    async fn save(&self, credential: &Credential) -> Result<(), StoreError>;

    /// Release pooled connections on the way out.
    async fn close(&self) {}
}

/// Build the store selected by `DB_ENGINE`. Postgres is pinged (and migrated
/// when `migrate` is set) before returning, so an unreachable database fails
/// startup.
pub async fn connect(
    config: &DatabaseConfig,
    migrate: bool,
) -> Result<Arc<dyn CredentialStore>, StoreError> {
    match config.engine {
        DbEngine::Postgres => {
            let db = Arc::new(Database::connect(config).await?);
            db.health_check().await?;
            let store = PgCredentialStore::new(db);
            if migrate {
                store.migrate().await?;
            }
            Ok(Arc::new(store))
        }
        DbEngine::Memory => {
            tracing::warn!("Using in-memory credential store; users are lost on exit");
            Ok(Arc::new(InMemoryCredentialStore::new()))
        }
    }
}
