//! PostgreSQL credential store.
//!
//! Uses runtime queries to avoid sqlx compile-time database connection.

use async_trait::async_trait;
use std::sync::Arc;

use super::{Credential, CredentialStore, StoreError};
use crate::db::{Database, SafeRow};

pub struct PgCredentialStore {
    db: Arc<Database>,
}

impl PgCredentialStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create the users table if it does not exist.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id         BIGSERIAL PRIMARY KEY,
                username   TEXT NOT NULL UNIQUE,
                password   TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(self.db.pool())
        .await?;

        tracing::info!("users table ready");
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn get(&self, username: &str) -> Result<Credential, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT username, password
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(self.db.pool())
        .await?
        .ok_or(StoreError::NotFound)?;

        Ok(Credential {
            username: row
                .try_get_log("username")
                .ok_or_else(|| sqlx::Error::ColumnNotFound("username".into()))?,
            password_hash: row
                .try_get_log("password")
                .ok_or_else(|| sqlx::Error::ColumnNotFound("password".into()))?,
        })
    }

    async fn save(&self, credential: &Credential) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, password)
            VALUES ($1, $2)
            "#,
        )
        .bind(&credential.username)
        .bind(&credential.password_hash)
        .execute(self.db.pool())
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::Conflict(credential.username.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn close(&self) {
        self.db.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;

    // Requires a running PostgreSQL reachable through DB_URL
    #[tokio::test]
    #[ignore]
    async fn test_save_get_conflict() {
        let config = DatabaseConfig {
            url: std::env::var("DB_URL").ok(),
            ..DatabaseConfig::default()
        };
        let db = Arc::new(Database::connect(&config).await.expect("Failed to connect"));
        let store = PgCredentialStore::new(db);
        store.migrate().await.unwrap();

        let username = format!("it-{}", uuid::Uuid::new_v4().simple());
        let credential = Credential {
            username: username.clone(),
            password_hash: "$argon2id$fake".to_string(),
        };

        store.save(&credential).await.unwrap();
        assert_eq!(store.get(&username).await.unwrap(), credential);
        assert!(matches!(
            store.save(&credential).await,
            Err(StoreError::Conflict(_))
        ));
        assert!(matches!(
            store.get("definitely-not-a-user").await,
            Err(StoreError::NotFound)
        ));

        store.close().await;
        assert!(matches!(
            store.get(&username).await,
            Err(StoreError::Database(_))
        ));
    }
}
