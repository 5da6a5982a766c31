//! Test fixtures
//!
//! RSA key pairs checked in under `testdata/` and Argon2 parameters light
//! enough for unit tests. Never use any of this outside tests.

use std::sync::Arc;

use chrono::Duration;
use tollgate_core::{AppConfig, InMemorySessionStore, PasswordConfig, StoreBackend, TokenConfig};

use crate::auth::{
    CredentialHasher, PasswordPolicy, SessionCoordinator, SigningKey, TokenService, VerifyingKey,
};
use crate::state::AppState;
use crate::validation::RequestValidator;

pub const SIGNING_PRIVATE_PEM: &[u8] = include_bytes!("../testdata/signing_private.pem");
pub const SIGNING_PUBLIC_PEM: &[u8] = include_bytes!("../testdata/signing_public.pem");
/// A second key pair, for tokens that must fail signature checks
pub const FOREIGN_PRIVATE_PEM: &[u8] = include_bytes!("../testdata/foreign_private.pem");
pub const FOREIGN_PUBLIC_PEM: &[u8] = include_bytes!("../testdata/foreign_public.pem");

pub fn test_token_config() -> TokenConfig {
    TokenConfig {
        issuer: "tollgate-test".to_string(),
        access_ttl_secs: 900,
        refresh_ttl_secs: 3600,
        ..TokenConfig::default()
    }
}

pub fn test_token_service() -> TokenService {
    TokenService::with_keys(
        SigningKey::from_pem(SIGNING_PRIVATE_PEM).expect("test signing key"),
        VerifyingKey::from_pem(SIGNING_PUBLIC_PEM).expect("test verifying key"),
        &test_token_config(),
    )
    .expect("test token lifetimes")
}

pub fn fast_password_config() -> PasswordConfig {
    PasswordConfig {
        memory_cost: 1024,
        time_cost: 1,
        parallelism: 1,
        ..PasswordConfig::default()
    }
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.database.backend = StoreBackend::Memory;
    config.tokens = test_token_config();
    config.password = fast_password_config();
    config
}

/// Coordinator over a fresh in-memory store, returned alongside the store
pub fn test_coordinator() -> (SessionCoordinator, Arc<InMemorySessionStore>) {
    let store = Arc::new(InMemorySessionStore::new());
    let config = fast_password_config();
    let coordinator = SessionCoordinator::new(
        store.clone(),
        Arc::new(test_token_service()),
        PasswordPolicy::from_config(&config),
        CredentialHasher::from_config(&config).expect("test argon2 params"),
        Duration::days(30),
    );
    (coordinator, store)
}

pub fn test_state() -> Arc<AppState> {
    let store = Arc::new(InMemorySessionStore::new());
    let config = test_config();
    let coordinator = SessionCoordinator::from_config(
        store.clone(),
        Arc::new(test_token_service()),
        &config,
    )
    .expect("test coordinator");

    Arc::new(AppState::new(
        Arc::new(coordinator),
        store,
        RequestValidator::from_config(&config.validation),
    ))
}
