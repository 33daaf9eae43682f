//! Signed session tokens.
//!
//! Tokens are HS256 JWTs carrying `{sub, iat, exp, jti}`. Decoding checks the
//! signature and claim structure only: whether a token may still be used is
//! answered by the [`SessionRegistry`](super::SessionRegistry), not by `exp`.

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// JWT claims embedded in every session token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub sub: String, // Subject (username)
    pub iat: i64,    // Issued at (unix seconds)
    pub exp: i64,    // Expiration (unix seconds)
    pub jti: String, // Random token id, keeps same-second tokens distinct
}

/// A freshly signed token and the instant it stops being live.
#[derive(Debug, Clone)]
pub struct MintedToken {
    pub token: String,
    pub subject: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),

    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("token ttl overflows the supported time range")]
    ExpiryOverflow,
}

pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: TimeDelta,
}

impl TokenCodec {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is enforced by the registry, so an expired claim still decodes.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp"]);

        let ttl = i64::try_from(ttl.as_secs())
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    /// Sign a new token for `subject`, expiring one TTL from now.
    pub fn mint(&self, subject: &str) -> Result<MintedToken, TokenError> {
        let issued_at = Utc::now();
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or(TokenError::ExpiryOverflow)?;

        let claims = Claims {
            sub: subject.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().simple().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(TokenError::Signing)?;

        Ok(MintedToken {
            token,
            subject: claims.sub,
            expires_at,
        })
    }

    /// Verify the signature and return the embedded claims.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)
    }
}
