use std::sync::Arc;

use crate::credentials::{Argon2Hasher, Credential, CredentialStore, StoreError};
use crate::error::{AuthError, AuthErrorCode};
use crate::session::{MintedToken, SessionManager};

/// Login and user creation on top of the credential store and sessions.
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    hasher: Argon2Hasher,
    sessions: SessionManager,
    /// Verified against when the username is unknown, so both failure paths
    /// cost one Argon2 verification.
    decoy_hash: String,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: Argon2Hasher,
        sessions: SessionManager,
    ) -> Result<Self, StoreError> {
        let decoy_hash = hasher.hash("decoy-password-never-matches")?;
        Ok(Self {
            store,
            hasher,
            sessions,
            decoy_hash,
        })
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Check the password and open a session.
    ///
    /// Unknown user and wrong password produce the same error.
    pub async fn login(&self, username: &str, password: &str) -> Result<MintedToken, AuthError> {
        let credential = match self.store.get(username).await {
            Ok(credential) => Some(credential),
            Err(StoreError::NotFound) => None,
            Err(e) => return Err(e.into()),
        };

        let stored_hash = credential
            .as_ref()
            .map_or_else(|| self.decoy_hash.clone(), |c| c.password_hash.clone());
        let matched = self.verify_blocking(password, stored_hash).await?;

        let Some(credential) = credential.filter(|_| matched) else {
            tracing::warn!(username, "Login rejected");
            return Err(AuthError::from_code(AuthErrorCode::InvalidUserOrPassword));
        };

        let minted = self.sessions.issue(&credential.username)?;
        tracing::info!(username = %credential.username, "Login succeeded");
        Ok(minted)
    }

    pub fn renew(&self, token: &str) -> Result<MintedToken, AuthError> {
        self.sessions.renew(token)
    }

    /// Hash `password` and save a new user. Used by `create-user`.
    pub async fn create_user(&self, username: &str, password: &str) -> Result<(), StoreError> {
        if username.trim().is_empty() {
            return Err(StoreError::Invalid("username must not be empty"));
        }
        if password.is_empty() {
            return Err(StoreError::Invalid("password must not be empty"));
        }

        let hasher = self.hasher.clone();
        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| StoreError::Hashing(e.to_string()))??;

        self.store
            .save(&Credential {
                username: username.to_string(),
                password_hash,
            })
            .await?;

        tracing::info!(username, "User created");
        Ok(())
    }

    /// Close the credential store's connections.
    pub async fn close(&self) {
        self.store.close().await;
    }

    async fn verify_blocking(&self, password: &str, stored_hash: String) -> Result<bool, AuthError> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &stored_hash))
            .await
            .map_err(|e| {
                tracing::error!("Password verification task failed: {}", e);
                AuthError::from_code(AuthErrorCode::InternalServerError)
            })
    }
}
