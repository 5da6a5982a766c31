//! Session store contract
//!
//! The session lifecycle only ever talks to persistence through
//! [`SessionStore`]. Sessions are keyed by identity, so there is exactly one
//! slot per identity: `put_session` is insert-or-replace, and rotation goes
//! through `compare_and_swap_session` so that two concurrent refreshes
//! presenting the same token cannot both win.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{Identity, SessionRecord};

/// Store errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Unknown identity or absent session
    #[error("record not found")]
    NotFound,

    /// Username uniqueness conflict
    #[error("username already exists")]
    AlreadyExists,

    /// Compare-and-swap lost: the stored token is not the expected one
    #[error("stored refresh token does not match")]
    Conflict,

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Persistence operations required by the session lifecycle
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create an identity and return its id
    ///
    /// Fails with `AlreadyExists` when the username is taken.
    async fn create_identity(
        &self,
        username: &str,
        password_hash: &str,
        email: &str,
    ) -> Result<Uuid, StoreError>;

    /// Look up an identity by exact (case-sensitive) username
    async fn find_identity_by_username(&self, username: &str) -> Result<Identity, StoreError>;

    /// Fetch the stored password digest of an identity
    async fn fetch_password_hash(&self, identity_id: Uuid) -> Result<String, StoreError>;

    /// Insert or replace the session of an identity
    ///
    /// Fails with `NotFound` when the identity does not exist.
    async fn put_session(
        &self,
        identity_id: Uuid,
        refresh_token: &str,
        refresh_expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Fetch the current session of an identity
    async fn get_session(&self, identity_id: Uuid) -> Result<SessionRecord, StoreError>;

    /// Atomically replace the stored refresh token if it still equals `expected`
    ///
    /// Returns `Conflict` when the stored token differs and `NotFound` when
    /// there is no session. Only `refresh_token` and `updated_at` change.
    async fn compare_and_swap_session(
        &self,
        identity_id: Uuid,
        expected: &str,
        new_token: &str,
    ) -> Result<(), StoreError>;

    /// Delete the session of an identity. Deleting nothing is not an error.
    async fn delete_session(&self, identity_id: Uuid) -> Result<(), StoreError>;

    /// Check that the backend is reachable
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[derive(Default)]
struct MemoryTables {
    identities: HashMap<Uuid, Identity>,
    usernames: HashMap<String, Uuid>,
    sessions: HashMap<Uuid, SessionRecord>,
}

/// Process-local session store
///
/// Every operation runs under a single lock guard, so compare-and-swap is
/// atomic with respect to all other calls.
#[derive(Default)]
pub struct InMemorySessionStore {
    tables: RwLock<MemoryTables>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live sessions
    pub async fn session_count(&self) -> usize {
        self.tables.read().await.sessions.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create_identity(
        &self,
        username: &str,
        password_hash: &str,
        email: &str,
    ) -> Result<Uuid, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.usernames.contains_key(username) {
            return Err(StoreError::AlreadyExists);
        }

        let identity = Identity::new(username, password_hash, email);
        let id = identity.id;
        tables.usernames.insert(username.to_string(), id);
        tables.identities.insert(id, identity);
        Ok(id)
    }

    async fn find_identity_by_username(&self, username: &str) -> Result<Identity, StoreError> {
        let tables = self.tables.read().await;
        tables
            .usernames
            .get(username)
            .and_then(|id| tables.identities.get(id))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn fetch_password_hash(&self, identity_id: Uuid) -> Result<String, StoreError> {
        self.tables
            .read()
            .await
            .identities
            .get(&identity_id)
            .map(|identity| identity.password_hash.clone())
            .ok_or(StoreError::NotFound)
    }

    async fn put_session(
        &self,
        identity_id: Uuid,
        refresh_token: &str,
        refresh_expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.identities.contains_key(&identity_id) {
            return Err(StoreError::NotFound);
        }

        let record = SessionRecord::new(identity_id, refresh_token, refresh_expires_at);
        tables.sessions.insert(identity_id, record);
        Ok(())
    }

    async fn get_session(&self, identity_id: Uuid) -> Result<SessionRecord, StoreError> {
        self.tables
            .read()
            .await
            .sessions
            .get(&identity_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn compare_and_swap_session(
        &self,
        identity_id: Uuid,
        expected: &str,
        new_token: &str,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let record = tables
            .sessions
            .get_mut(&identity_id)
            .ok_or(StoreError::NotFound)?;

        if record.refresh_token != expected {
            return Err(StoreError::Conflict);
        }

        record.refresh_token = new_token.to_string();
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_session(&self, identity_id: Uuid) -> Result<(), StoreError> {
        self.tables.write().await.sessions.remove(&identity_id);
        Ok(())
    }
}
