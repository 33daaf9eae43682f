use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::{Credential, CredentialStore, StoreError};

/// Credential store kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    users: DashMap<String, String>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn get(&self, username: &str) -> Result<Credential, StoreError> {
        self.users
            .get(username)
            .map(|entry| Credential {
                username: username.to_string(),
                password_hash: entry.value().clone(),
            })
            .ok_or(StoreError::NotFound)
    }

    async fn save(&self, credential: &Credential) -> Result<(), StoreError> {
        match self.users.entry(credential.username.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(credential.username.clone())),
            Entry::Vacant(slot) => {
                slot.insert(credential.password_hash.clone());
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(username: &str) -> Credential {
        Credential {
            username: username.to_string(),
            password_hash: "$argon2id$fake".to_string(),
        }
    }

    #[tokio::test]
    async fn test_save_then_get() {
        let store = InMemoryCredentialStore::new();
        store.save(&credential("alice")).await.unwrap();

        let found = store.get("alice").await.unwrap();
        assert_eq!(found, credential("alice"));
    }

    #[tokio::test]
    async fn test_missing_user() {
        let store = InMemoryCredentialStore::new();
        assert!(matches!(
            store.get("nobody").await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let store = InMemoryCredentialStore::new();
        store.save(&credential("alice")).await.unwrap();

        let err = store.save(&credential("alice")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(name) if name == "alice"));
        assert_eq!(store.len(), 1);
    }
}
