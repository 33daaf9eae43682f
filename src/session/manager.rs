use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::codec::{MintedToken, TokenCodec};
use super::registry::SessionRegistry;
use crate::error::{AuthError, AuthErrorCode};

/// Identity attached to a request that passed the session gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedSubject {
    pub subject: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Token lifecycle: issue, authorize, renew and flush.
///
/// Combines the codec (is the token authentic?) with the registry (is it still
/// live?). Both checks must pass for a token to be accepted.
#[derive(Clone)]
pub struct SessionManager {
    codec: Arc<TokenCodec>,
    registry: Arc<SessionRegistry>,
}

impl SessionManager {
    pub fn new(codec: TokenCodec, registry: Arc<SessionRegistry>) -> Self {
        Self {
            codec: Arc::new(codec),
            registry,
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Mint a token for `subject` and register it.
    pub fn issue(&self, subject: &str) -> Result<MintedToken, AuthError> {
        let minted = self.codec.mint(subject)?;
        self.registry.record(minted.token.clone(), minted.expires_at);
        tracing::debug!(subject, expires_at = %minted.expires_at, "session issued");
        Ok(minted)
    }

    /// Decode, then check liveness.
    pub fn authorize(&self, token: &str) -> Result<AuthenticatedSubject, AuthError> {
        let claims = self.codec.decode(token)?;

        if !self.registry.is_live(token) {
            return Err(AuthError::from_code(AuthErrorCode::TokenInvalidOrExpired));
        }

        let expires_at = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| AuthError::from_code(AuthErrorCode::InvalidToken))?;

        Ok(AuthenticatedSubject {
            subject: claims.sub,
            token: token.to_string(),
            expires_at,
        })
    }

    /// Replace a live token with a fresh one for the same subject.
    ///
    /// The new token gets a full TTL from now. The old token stops being live
    /// as soon as this returns, so a replayed renewal fails.
    pub fn renew(&self, old_token: &str) -> Result<MintedToken, AuthError> {
        if !self.registry.is_live(old_token) {
            return Err(AuthError::from_code(AuthErrorCode::TokenInvalidOrExpired));
        }

        let claims = self.codec.decode(old_token)?;
        let minted = self.codec.mint(&claims.sub)?;

        if !self
            .registry
            .rotate(old_token, minted.token.clone(), minted.expires_at)
        {
            // Another renewal (or a flush) got there first.
            return Err(AuthError::from_code(AuthErrorCode::TokenInvalidOrExpired));
        }

        tracing::debug!(subject = %minted.subject, "session renewed");
        Ok(minted)
    }

    /// Drop every session. Returns how many were dropped.
    pub fn flush(&self) -> usize {
        self.registry.flush()
    }
}
