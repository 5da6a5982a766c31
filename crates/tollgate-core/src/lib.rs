//! Tollgate Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout Tollgate:
//! - Identity and session record models
//! - The session lifecycle error taxonomy
//! - The `SessionStore` contract and its implementations (in-memory, PostgreSQL)
//! - Configuration management

pub mod config;
pub mod postgres;
pub mod store;

pub use config::{
    AppConfig, ConfigError, DatabaseConfig, LoggingConfig, PasswordConfig, ServerConfig,
    SessionConfig, StoreBackend, TokenConfig, ValidationConfig, MAX_REFRESH_WINDOW_DAYS,
    MAX_TOKEN_TTL_SECS,
};
pub use postgres::PgSessionStore;
pub use store::{InMemorySessionStore, SessionStore, StoreError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Error Types
// ============================================================================

/// Failure classes surfaced by the session lifecycle
///
/// Variants are deliberately coarse. `Unauthenticated` covers every
/// cryptographic, claim and replay failure so callers cannot tell which
/// sub-check rejected them; the precise cause only reaches the audit log.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TollgateError {
    /// Password does not satisfy the policy. The reason is user-facing.
    #[error("{0}")]
    PolicyViolation(String),

    #[error("identity already exists")]
    AlreadyExists,

    #[error("not found")]
    NotFound,

    #[error("unauthenticated")]
    Unauthenticated,

    /// A concurrent rotation replaced the session first.
    #[error("session rotation conflict")]
    Conflict,

    /// Store or cryptographic subsystem failure unrelated to caller input.
    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, TollgateError>;

// ============================================================================
// Identity
// ============================================================================

/// A registered user account
///
/// Created on Register and never mutated by the session lifecycle afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque 128-bit identifier
    pub id: Uuid,

    /// Unique, case-sensitive login name
    pub username: String,

    pub email: String,

    /// Argon2 PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Identity {
    /// Build a new identity with a fresh id and timestamps set to now
    pub fn new(
        username: impl Into<String>,
        password_hash: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

// ============================================================================
// Session Record
// ============================================================================

/// The persisted pointer to the one currently valid refresh token of an identity
///
/// At most one record exists per identity. Issuing a new session replaces it,
/// rotation overwrites `refresh_token` in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub identity_id: Uuid,

    pub refresh_token: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// End of the session window. Not extended by rotation.
    pub refresh_expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(
        identity_id: Uuid,
        refresh_token: impl Into<String>,
        refresh_expires_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            identity_id,
            refresh_token: refresh_token.into(),
            created_at: now,
            updated_at: now,
            refresh_expires_at,
        }
    }

    /// Check whether the session window has closed at `now`
    pub fn is_window_expired(&self, now: DateTime<Utc>) -> bool {
        self.refresh_expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_identity_new() {
        let identity = Identity::new("alice", "$argon2id$...", "a@x.com");

        assert_eq!(identity.username, "alice");
        assert_eq!(identity.email, "a@x.com");
        assert_eq!(identity.created_at, identity.updated_at);
        assert!(!identity.id.is_nil());
    }

    #[test]
    fn test_identity_serialization_hides_hash() {
        let identity = Identity::new("alice", "secret_hash", "a@x.com");
        let json = serde_json::to_string(&identity).unwrap();

        assert!(json.contains("alice"));
        assert!(!json.contains("secret_hash"));
    }

    #[test]
    fn test_session_window() {
        let now = Utc::now();
        let record = SessionRecord::new(Uuid::new_v4(), "token", now + Duration::days(30));

        assert!(!record.is_window_expired(now));
        assert!(record.is_window_expired(now + Duration::days(30)));
        assert!(record.is_window_expired(now + Duration::days(31)));
    }

    #[test]
    fn test_policy_violation_displays_reason() {
        let err = TollgateError::PolicyViolation("too weak".to_string());
        assert_eq!(err.to_string(), "too weak");
    }
}
