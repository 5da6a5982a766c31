//! Session lifecycle service
//!
//! Orchestrates registration, login, validation, issuance, revocation and
//! refresh on top of the password policy, the token service and a
//! [`SessionStore`].
//!
//! Each identity has at most one live session. The session record stores
//! the one refresh token that is currently valid; refreshing swaps it for a
//! new one with compare-and-swap, so a refresh token can be redeemed once.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tollgate_core::{AppConfig, Result, SessionStore, StoreError, TollgateError};
use uuid::Uuid;

use super::jwt::{JwtError, TokenKind, TokenPair, TokenService};
use super::password::{CredentialHasher, PasswordPolicy};
use crate::audit::{audit_log, AuditEvent};

/// Session lifecycle coordinator
///
/// Holds no per-request state. Share it behind an `Arc`.
pub struct SessionCoordinator {
    store: Arc<dyn SessionStore>,
    tokens: Arc<TokenService>,
    policy: PasswordPolicy,
    hasher: CredentialHasher,
    session_window: Duration,
}

impl SessionCoordinator {
    pub fn new(
        store: Arc<dyn SessionStore>,
        tokens: Arc<TokenService>,
        policy: PasswordPolicy,
        hasher: CredentialHasher,
        session_window: Duration,
    ) -> Self {
        Self {
            store,
            tokens,
            policy,
            hasher,
            session_window,
        }
    }

    /// Build a coordinator from application configuration
    pub fn from_config(
        store: Arc<dyn SessionStore>,
        tokens: Arc<TokenService>,
        config: &AppConfig,
    ) -> Result<Self> {
        let days = config.session.refresh_window_days;
        let session_window = Duration::try_days(days).ok_or_else(|| {
            TollgateError::Internal(format!("session window of {days} days is out of range"))
        })?;
        let hasher = CredentialHasher::from_config(&config.password)
            .map_err(|e| TollgateError::Internal(e.to_string()))?;

        Ok(Self::new(
            store,
            tokens,
            PasswordPolicy::from_config(&config.password),
            hasher,
            session_window,
        ))
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Register a new identity
    ///
    /// The password policy runs before anything is hashed or stored.
    pub async fn register(&self, username: &str, password: &str, email: &str) -> Result<Uuid> {
        if let Err(violation) = self.policy.validate(password) {
            audit_log(&AuditEvent::RegistrationFailure {
                username: username.to_string(),
                reason: format!("password policy: {:?}", violation.rule),
            });
            return Err(TollgateError::PolicyViolation(violation.reason));
        }

        let digest = self.hash_password(password).await?;

        let identity_id = match self.store.create_identity(username, &digest, email).await {
            Ok(id) => id,
            Err(StoreError::AlreadyExists) => {
                audit_log(&AuditEvent::RegistrationFailure {
                    username: username.to_string(),
                    reason: "username taken".to_string(),
                });
                return Err(TollgateError::AlreadyExists);
            }
            Err(e) => return Err(internal("Failed to create identity", e)),
        };

        audit_log(&AuditEvent::RegistrationSuccess {
            identity_id,
            username: username.to_string(),
        });

        Ok(identity_id)
    }

    /// Authenticate with username and password and start a new session
    ///
    /// Any previous session of the identity is replaced, so its refresh
    /// token stops working.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair> {
        let identity = match self.store.find_identity_by_username(username).await {
            Ok(identity) => identity,
            Err(StoreError::NotFound) => {
                audit_log(&AuditEvent::LoginFailure {
                    username: username.to_string(),
                    reason: "unknown username".to_string(),
                });
                return Err(TollgateError::NotFound);
            }
            Err(e) => return Err(internal("Failed to fetch identity", e)),
        };

        if !self
            .verify_password(identity.password_hash.clone(), password)
            .await?
        {
            audit_log(&AuditEvent::LoginFailure {
                username: username.to_string(),
                reason: "password mismatch".to_string(),
            });
            return Err(TollgateError::Unauthenticated);
        }

        let pair = self.start_session(identity.id).await?;

        audit_log(&AuditEvent::LoginSuccess {
            identity_id: identity.id,
            username: identity.username,
        });

        Ok(pair)
    }

    /// Check an access token and return the identity it belongs to
    ///
    /// The token must be unexpired, signed by us, of access kind, and its
    /// identity must still hold a session. Revocation therefore takes
    /// effect immediately even for access tokens that have not expired.
    pub async fn validate(&self, access_token: &str) -> Result<Uuid> {
        match self.tokens.verify(access_token) {
            Ok(true) => {}
            Ok(false) => return Err(reject("validate", "access token expired")),
            Err(e) => return Err(reject("validate", e)),
        }

        let claims = self
            .tokens
            .extract_claims(access_token)
            .map_err(|e| reject("validate", e))?;

        if claims.kind != TokenKind::Access {
            return Err(reject("validate", format!("{} token presented", claims.kind)));
        }

        match self.store.get_session(claims.identity).await {
            Ok(_) => Ok(claims.identity),
            Err(StoreError::NotFound) => Err(reject("validate", "no live session")),
            Err(e) => Err(internal("Failed to fetch session", e)),
        }
    }

    /// Start a session for an already known identity, skipping credentials
    ///
    /// Intended for trusted internal callers.
    pub async fn issue_for_identity(&self, identity_id: Uuid) -> Result<TokenPair> {
        self.start_session(identity_id).await
    }

    /// End the session of an identity
    ///
    /// Revoking an identity without a session succeeds.
    pub async fn revoke(&self, identity_id: Uuid) -> Result<()> {
        self.store
            .delete_session(identity_id)
            .await
            .map_err(|e| internal("Failed to delete session", e))?;

        audit_log(&AuditEvent::SessionRevoked { identity_id });
        Ok(())
    }

    /// Exchange a refresh token for a new token pair
    ///
    /// The access token may be expired but must be genuine and belong to
    /// the same identity as the refresh token. The presented refresh token
    /// must be the one currently stored. On success it is replaced and can
    /// never be used again.
    pub async fn refresh(&self, access_token: &str, refresh_token: &str) -> Result<TokenPair> {
        match self.tokens.verify(refresh_token) {
            Ok(true) => {}
            Ok(false) => return Err(reject("refresh", "refresh token expired")),
            Err(e) => return Err(reject("refresh", e)),
        }

        let refresh_claims = self
            .tokens
            .extract_claims(refresh_token)
            .map_err(|e| reject("refresh", e))?;
        let access_claims = self
            .tokens
            .extract_claims(access_token)
            .map_err(|e| reject("refresh", e))?;

        if refresh_claims.kind != TokenKind::Refresh || access_claims.kind != TokenKind::Access {
            return Err(reject("refresh", "token kinds swapped or repeated"));
        }

        if refresh_claims.identity != access_claims.identity {
            return Err(reject("refresh", "tokens belong to different identities"));
        }
        let identity_id = refresh_claims.identity;

        let record = match self.store.get_session(identity_id).await {
            Ok(record) => record,
            Err(StoreError::NotFound) => return Err(TollgateError::NotFound),
            Err(e) => return Err(internal("Failed to fetch session", e)),
        };

        if record.refresh_token != refresh_token {
            audit_log(&AuditEvent::RefreshReplayDetected { identity_id });
            return Err(TollgateError::Unauthenticated);
        }

        if record.is_window_expired(Utc::now()) {
            return Err(reject("refresh", "session window closed"));
        }

        let pair = self
            .tokens
            .issue(identity_id)
            .map_err(|e| internal_token("Failed to issue tokens", e))?;

        match self
            .store
            .compare_and_swap_session(identity_id, refresh_token, &pair.refresh_token)
            .await
        {
            Ok(()) => {}
            Err(StoreError::Conflict) => {
                audit_log(&AuditEvent::RotationConflict { identity_id });
                return Err(TollgateError::Conflict);
            }
            Err(StoreError::NotFound) => return Err(TollgateError::NotFound),
            Err(e) => return Err(internal("Failed to rotate session", e)),
        }

        audit_log(&AuditEvent::TokenRefresh { identity_id });
        Ok(pair)
    }

    /// Issue a pair and make it the identity's only session
    async fn start_session(&self, identity_id: Uuid) -> Result<TokenPair> {
        let pair = self
            .tokens
            .issue(identity_id)
            .map_err(|e| internal_token("Failed to issue tokens", e))?;

        let window_end = Utc::now()
            .checked_add_signed(self.session_window)
            .ok_or_else(|| TollgateError::Internal("session window out of range".to_string()))?;
        match self
            .store
            .put_session(identity_id, &pair.refresh_token, window_end)
            .await
        {
            Ok(()) => {}
            Err(StoreError::NotFound) => return Err(TollgateError::NotFound),
            Err(e) => return Err(internal("Failed to store session", e)),
        }

        audit_log(&AuditEvent::SessionIssued { identity_id });
        Ok(pair)
    }

    async fn hash_password(&self, password: &str) -> Result<String> {
        let hasher = self.hasher.clone();
        let password = password.to_string();

        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| TollgateError::Internal(format!("Password hashing task failed: {e}")))?
            .map_err(|e| TollgateError::Internal(e.to_string()))
    }

    async fn verify_password(&self, digest: String, candidate: &str) -> Result<bool> {
        let hasher = self.hasher.clone();
        let candidate = candidate.to_string();

        tokio::task::spawn_blocking(move || hasher.verify(&digest, &candidate))
            .await
            .map_err(|e| TollgateError::Internal(format!("Password verification task failed: {e}")))
    }
}

fn internal(context: &str, err: StoreError) -> TollgateError {
    TollgateError::Internal(format!("{context}: {err}"))
}

fn internal_token(context: &str, err: JwtError) -> TollgateError {
    TollgateError::Internal(format!("{context}: {err}"))
}

/// Record why a token was rejected and collapse it to `Unauthenticated`
fn reject(operation: &str, reason: impl std::fmt::Display) -> TollgateError {
    audit_log(&AuditEvent::InvalidToken {
        operation: operation.to_string(),
        reason: reason.to_string(),
    });
    TollgateError::Unauthenticated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        fast_password_config, test_coordinator, test_token_config, test_token_service,
        FOREIGN_PRIVATE_PEM, FOREIGN_PUBLIC_PEM,
    };
    use crate::auth::jwt::{SigningKey, VerifyingKey};
    use async_trait::async_trait;
    use chrono::DateTime;
    use tollgate_core::{Identity, InMemorySessionStore, SessionRecord};

    const PASSWORD: &str = "Abcd123!";

    async fn registered(coordinator: &SessionCoordinator) -> Uuid {
        coordinator
            .register("alice", PASSWORD, "a@x.com")
            .await
            .unwrap()
    }

    fn coordinator_with_window(
        store: Arc<InMemorySessionStore>,
        window: Duration,
    ) -> SessionCoordinator {
        let config = fast_password_config();
        SessionCoordinator::new(
            store,
            Arc::new(test_token_service()),
            PasswordPolicy::from_config(&config),
            CredentialHasher::from_config(&config).unwrap(),
            window,
        )
    }

    #[tokio::test]
    async fn test_register_login_validate_refresh() {
        let (coordinator, _) = test_coordinator();

        let id = registered(&coordinator).await;
        let pair = coordinator.login("alice", PASSWORD).await.unwrap();
        assert_eq!(coordinator.validate(&pair.access_token).await.unwrap(), id);

        let rotated = coordinator
            .refresh(&pair.access_token, &pair.refresh_token)
            .await
            .unwrap();
        assert_ne!(rotated.refresh_token, pair.refresh_token);
        assert_eq!(coordinator.validate(&rotated.access_token).await.unwrap(), id);

        // the first refresh token has been consumed
        assert_eq!(
            coordinator
                .refresh(&rotated.access_token, &pair.refresh_token)
                .await,
            Err(TollgateError::Unauthenticated)
        );
    }

    #[tokio::test]
    async fn test_register_weak_password_touches_nothing() {
        let (coordinator, _) = test_coordinator();

        let err = coordinator
            .register("alice", "weak", "a@x.com")
            .await
            .unwrap_err();
        match err {
            TollgateError::PolicyViolation(reason) => {
                assert_eq!(reason, PasswordPolicy::from_config(&fast_password_config()).reason())
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // username is still free
        registered(&coordinator).await;
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let (coordinator, _) = test_coordinator();
        registered(&coordinator).await;

        assert_eq!(
            coordinator.register("alice", PASSWORD, "b@x.com").await,
            Err(TollgateError::AlreadyExists)
        );
        // usernames are case-sensitive
        assert!(coordinator.register("Alice", PASSWORD, "b@x.com").await.is_ok());
    }

    #[tokio::test]
    async fn test_login_failures() {
        let (coordinator, store) = test_coordinator();
        registered(&coordinator).await;

        assert_eq!(
            coordinator.login("bob", PASSWORD).await,
            Err(TollgateError::NotFound)
        );
        assert_eq!(
            coordinator.login("alice", "Wrong123!").await,
            Err(TollgateError::Unauthenticated)
        );
        assert_eq!(store.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_second_login_replaces_session() {
        let (coordinator, store) = test_coordinator();
        let id = registered(&coordinator).await;

        let first = coordinator.login("alice", PASSWORD).await.unwrap();
        let second = coordinator.login("alice", PASSWORD).await.unwrap();

        assert_eq!(store.session_count().await, 1);
        assert_eq!(
            store.get_session(id).await.unwrap().refresh_token,
            second.refresh_token
        );
        assert_eq!(
            coordinator
                .refresh(&first.access_token, &first.refresh_token)
                .await,
            Err(TollgateError::Unauthenticated)
        );
        // the first access token still validates until it expires
        assert_eq!(coordinator.validate(&first.access_token).await.unwrap(), id);
    }

    #[tokio::test]
    async fn test_validate_rejections() {
        let (coordinator, _) = test_coordinator();
        let id = registered(&coordinator).await;
        let pair = coordinator.login("alice", PASSWORD).await.unwrap();

        assert_eq!(
            coordinator.validate("garbage").await,
            Err(TollgateError::Unauthenticated)
        );
        assert_eq!(
            coordinator.validate(&pair.refresh_token).await,
            Err(TollgateError::Unauthenticated)
        );

        let expired = coordinator
            .tokens()
            .issue_at(id, Utc::now() - Duration::hours(2))
            .unwrap();
        assert_eq!(
            coordinator.validate(&expired.access_token).await,
            Err(TollgateError::Unauthenticated)
        );

        let foreign = TokenService::with_keys(
            SigningKey::from_pem(FOREIGN_PRIVATE_PEM).unwrap(),
            VerifyingKey::from_pem(FOREIGN_PUBLIC_PEM).unwrap(),
            &test_token_config(),
        )
        .unwrap();
        let forged = foreign.issue(id).unwrap();
        assert_eq!(
            coordinator.validate(&forged.access_token).await,
            Err(TollgateError::Unauthenticated)
        );
    }

    #[tokio::test]
    async fn test_revoke() {
        let (coordinator, _) = test_coordinator();
        let id = registered(&coordinator).await;
        let pair = coordinator.login("alice", PASSWORD).await.unwrap();

        coordinator.revoke(id).await.unwrap();
        assert_eq!(
            coordinator.validate(&pair.access_token).await,
            Err(TollgateError::Unauthenticated)
        );
        assert_eq!(
            coordinator
                .refresh(&pair.access_token, &pair.refresh_token)
                .await,
            Err(TollgateError::NotFound)
        );

        // idempotent, and fine for identities that never had a session
        coordinator.revoke(id).await.unwrap();
        coordinator.revoke(Uuid::new_v4()).await.unwrap();
    }

    #[tokio::test]
    async fn test_issue_for_identity() {
        let (coordinator, store) = test_coordinator();
        let id = registered(&coordinator).await;

        let pair = coordinator.issue_for_identity(id).await.unwrap();
        assert_eq!(coordinator.validate(&pair.access_token).await.unwrap(), id);
        assert_eq!(store.session_count().await, 1);

        assert_eq!(
            coordinator.issue_for_identity(Uuid::new_v4()).await,
            Err(TollgateError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_refresh_with_expired_access_token() {
        let (coordinator, store) = test_coordinator();
        let id = registered(&coordinator).await;

        // refresh token still valid, access token long expired
        let old_access = coordinator
            .tokens()
            .issue_at(id, Utc::now() - Duration::hours(2))
            .unwrap()
            .access_token;
        let pair = coordinator.issue_for_identity(id).await.unwrap();

        let rotated = coordinator
            .refresh(&old_access, &pair.refresh_token)
            .await
            .unwrap();
        assert_eq!(
            store.get_session(id).await.unwrap().refresh_token,
            rotated.refresh_token
        );
    }

    #[tokio::test]
    async fn test_refresh_kind_and_identity_checks() {
        let (coordinator, _) = test_coordinator();
        let alice = registered(&coordinator).await;
        coordinator
            .register("bob", PASSWORD, "b@x.com")
            .await
            .unwrap();

        let pair = coordinator.login("alice", PASSWORD).await.unwrap();
        let bob = coordinator.login("bob", PASSWORD).await.unwrap();

        // swapped
        assert_eq!(
            coordinator
                .refresh(&pair.refresh_token, &pair.access_token)
                .await,
            Err(TollgateError::Unauthenticated)
        );
        // refresh token passed twice
        assert_eq!(
            coordinator
                .refresh(&pair.refresh_token, &pair.refresh_token)
                .await,
            Err(TollgateError::Unauthenticated)
        );
        // identities differ
        assert_eq!(
            coordinator
                .refresh(&bob.access_token, &pair.refresh_token)
                .await,
            Err(TollgateError::Unauthenticated)
        );

        // nothing was consumed
        let rotated = coordinator
            .refresh(&pair.access_token, &pair.refresh_token)
            .await
            .unwrap();
        assert_eq!(
            coordinator.validate(&rotated.access_token).await.unwrap(),
            alice
        );
    }

    #[tokio::test]
    async fn test_refresh_expired_refresh_token() {
        let (coordinator, store) = test_coordinator();
        let id = registered(&coordinator).await;

        let stale = coordinator
            .tokens()
            .issue_at(id, Utc::now() - Duration::days(1))
            .unwrap();
        store
            .put_session(id, &stale.refresh_token, Utc::now() + Duration::days(30))
            .await
            .unwrap();

        assert_eq!(
            coordinator
                .refresh(&stale.access_token, &stale.refresh_token)
                .await,
            Err(TollgateError::Unauthenticated)
        );
    }

    #[tokio::test]
    async fn test_refresh_after_session_window_closes() {
        let store = Arc::new(InMemorySessionStore::new());
        let coordinator = coordinator_with_window(store.clone(), Duration::zero());
        let id = registered(&coordinator).await;
        let pair = coordinator.issue_for_identity(id).await.unwrap();

        assert_eq!(
            coordinator
                .refresh(&pair.access_token, &pair.refresh_token)
                .await,
            Err(TollgateError::Unauthenticated)
        );
        // the stored token was not consumed
        assert_eq!(
            store.get_session(id).await.unwrap().refresh_token,
            pair.refresh_token
        );
    }

    #[tokio::test]
    async fn test_oversized_session_window_fails_cleanly() {
        let store = Arc::new(InMemorySessionStore::new());
        let coordinator =
            coordinator_with_window(store.clone(), Duration::days(100_000_000_000));
        let id = registered(&coordinator).await;

        assert!(matches!(
            coordinator.login("alice", PASSWORD).await,
            Err(TollgateError::Internal(_))
        ));
        assert!(matches!(
            coordinator.issue_for_identity(id).await,
            Err(TollgateError::Internal(_))
        ));
        assert_eq!(store.session_count().await, 0);
    }

    #[test]
    fn test_from_config_rejects_unrepresentable_window() {
        let mut config = crate::testing::test_config();
        config.session.refresh_window_days = i64::MAX;

        let result = SessionCoordinator::from_config(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(test_token_service()),
            &config,
        );
        assert!(matches!(result, Err(TollgateError::Internal(_))));
    }

    #[tokio::test]
    async fn test_rotation_keeps_session_window() {
        let store = Arc::new(InMemorySessionStore::new());
        let coordinator = coordinator_with_window(store.clone(), Duration::days(30));
        let id = registered(&coordinator).await;
        let pair = coordinator.issue_for_identity(id).await.unwrap();
        let window_end = store.get_session(id).await.unwrap().refresh_expires_at;

        coordinator
            .refresh(&pair.access_token, &pair.refresh_token)
            .await
            .unwrap();
        assert_eq!(
            store.get_session(id).await.unwrap().refresh_expires_at,
            window_end
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_refresh_single_winner() {
        let (coordinator, store) = test_coordinator();
        let coordinator = Arc::new(coordinator);
        let id = registered(&coordinator).await;
        let pair = coordinator.login("alice", PASSWORD).await.unwrap();

        let attempts = (0..8).map(|_| {
            let coordinator = coordinator.clone();
            let pair = pair.clone();
            tokio::spawn(async move {
                coordinator
                    .refresh(&pair.access_token, &pair.refresh_token)
                    .await
            })
        });
        let results: Vec<_> = futures::future::join_all(attempts)
            .await
            .into_iter()
            .map(|joined| joined.unwrap())
            .collect();

        let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1);
        for result in &results {
            if let Err(e) = result {
                assert!(
                    matches!(e, TollgateError::Conflict | TollgateError::Unauthenticated),
                    "unexpected error: {e:?}"
                );
            }
        }
        assert_eq!(
            store.get_session(id).await.unwrap().refresh_token,
            winners[0].refresh_token
        );
    }

    /// Store whose every call fails with a backend error
    struct FailingStore;

    #[async_trait]
    impl SessionStore for FailingStore {
        async fn create_identity(
            &self,
            _username: &str,
            _password_hash: &str,
            _email: &str,
        ) -> std::result::Result<Uuid, StoreError> {
            Err(StoreError::Backend("connection refused".to_string()))
        }

        async fn find_identity_by_username(
            &self,
            _username: &str,
        ) -> std::result::Result<Identity, StoreError> {
            Err(StoreError::Backend("connection refused".to_string()))
        }

        async fn fetch_password_hash(
            &self,
            _identity_id: Uuid,
        ) -> std::result::Result<String, StoreError> {
            Err(StoreError::Backend("connection refused".to_string()))
        }

        async fn put_session(
            &self,
            _identity_id: Uuid,
            _refresh_token: &str,
            _refresh_expires_at: DateTime<Utc>,
        ) -> std::result::Result<(), StoreError> {
            Err(StoreError::Backend("connection refused".to_string()))
        }

        async fn get_session(
            &self,
            _identity_id: Uuid,
        ) -> std::result::Result<SessionRecord, StoreError> {
            Err(StoreError::Backend("connection refused".to_string()))
        }

        async fn compare_and_swap_session(
            &self,
            _identity_id: Uuid,
            _expected: &str,
            _new_token: &str,
        ) -> std::result::Result<(), StoreError> {
            Err(StoreError::Backend("connection refused".to_string()))
        }

        async fn delete_session(&self, _identity_id: Uuid) -> std::result::Result<(), StoreError> {
            Err(StoreError::Backend("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_store_failures_are_internal() {
        let config = fast_password_config();
        let tokens = Arc::new(test_token_service());
        let coordinator = SessionCoordinator::new(
            Arc::new(FailingStore),
            tokens.clone(),
            PasswordPolicy::from_config(&config),
            CredentialHasher::from_config(&config).unwrap(),
            Duration::days(30),
        );
        let id = Uuid::new_v4();
        let pair = tokens.issue(id).unwrap();

        assert!(matches!(
            coordinator.register("alice", PASSWORD, "a@x.com").await,
            Err(TollgateError::Internal(_))
        ));
        assert!(matches!(
            coordinator.login("alice", PASSWORD).await,
            Err(TollgateError::Internal(_))
        ));
        assert!(matches!(
            coordinator.validate(&pair.access_token).await,
            Err(TollgateError::Internal(_))
        ));
        assert!(matches!(
            coordinator.issue_for_identity(id).await,
            Err(TollgateError::Internal(_))
        ));
        assert!(matches!(
            coordinator.revoke(id).await,
            Err(TollgateError::Internal(_))
        ));
        assert!(matches!(
            coordinator
                .refresh(&pair.access_token, &pair.refresh_token)
                .await,
            Err(TollgateError::Internal(_))
        ));
    }
}
