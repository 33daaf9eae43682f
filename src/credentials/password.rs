use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use super::StoreError;

/// Salted Argon2id password hashing.
///
/// Verification reads the cost parameters from the stored PHC string, so
/// hashes produced with other parameters still verify.
#[derive(Clone, Default)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    /// Custom cost parameters (memory in KiB, iterations, lanes).
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, StoreError> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| StoreError::Hashing(e.to_string()))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    pub fn hash(&self, password: &str) -> Result<String, StoreError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| StoreError::Hashing(e.to_string()))
    }

    /// Constant-time comparison of `password` against a stored hash.
    /// An unparseable hash never matches.
    pub fn verify(&self, password: &str, password_hash: &str) -> bool {
        let parsed = match PasswordHash::new(password_hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Stored password hash is malformed: {}", e);
                return false;
            }
        };
        self.argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> Argon2Hasher {
        Argon2Hasher::with_params(8, 1, 1).unwrap()
    }

    #[test]
    fn test_hash_then_verify() {
        let hasher = hasher();
        let hash = hasher.hash("correct horse").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("correct horse", &hash));
        assert!(!hasher.verify("wrong horse", &hash));
    }

    #[test]
    fn test_salted() {
        let hasher = hasher();
        assert_ne!(hasher.hash("pw").unwrap(), hasher.hash("pw").unwrap());
    }

    #[test]
    fn test_verify_uses_stored_params() {
        let cheap = hasher().hash("pw").unwrap();
        assert!(Argon2Hasher::default().verify("pw", &cheap));
    }

    #[test]
    fn test_malformed_hash_never_matches() {
        assert!(!hasher().verify("pw", "plaintext-password"));
        assert!(!hasher().verify("", ""));
    }

    #[test]
    fn test_invalid_params() {
        assert!(Argon2Hasher::with_params(0, 0, 0).is_err());
    }
}
