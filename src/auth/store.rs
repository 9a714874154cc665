//! Credential persistence port.
//!
//! The core never queries storage directly; it depends on [`CredentialStore`].
//! Implementations own uniqueness: `insert` must be a single atomic
//! insert-or-conflict, never a lookup followed by a write.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{
    error::StoreError,
    identity::{Identity, UserId},
    password::HashedPassword,
};

/// A stored account. Only the gate sees the hash.
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub identity: Identity,
    pub password_hash: HashedPassword,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a new account and return its store-assigned identity.
    ///
    /// Usernames are unique and case-sensitive. A taken username yields
    /// `StoreError::Conflict`.
    async fn insert(
        &self,
        username: &str,
        password_hash: &HashedPassword,
    ) -> Result<Identity, StoreError>;

    /// Exact, case-sensitive lookup by username.
    async fn find_by_username(&self, username: &str)
        -> Result<Option<CredentialRecord>, StoreError>;
}

#[derive(Debug, Default)]
struct MemoryUsers {
    next_id: u64,
    by_username: HashMap<String, CredentialRecord>,
}

/// Process-local store used by tests and local runs without a database.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    users: RwLock<MemoryUsers>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn insert(
        &self,
        username: &str,
        password_hash: &HashedPassword,
    ) -> Result<Identity, StoreError> {
        // check and insert under one write lock
        let mut users = self.users.write().await;
        if users.by_username.contains_key(username) {
            return Err(StoreError::Conflict);
        }

        users.next_id += 1;
        let identity = Identity::new(UserId::new(users.next_id), username);
        users.by_username.insert(
            username.to_string(),
            CredentialRecord {
                identity: identity.clone(),
                password_hash: password_hash.clone(),
            },
        );

        Ok(identity)
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        Ok(self.users.read().await.by_username.get(username).cloned())
    }
}
