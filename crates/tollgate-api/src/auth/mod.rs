//! Session authentication module
//!
//! - Token issuance and verification (RS256)
//! - Password policy and Argon2 hashing
//! - Request and response models for the RPC surface
//! - The session lifecycle service

pub mod jwt;
pub mod models;
pub mod password;
pub mod service;

pub use jwt::{
    Claims, JwtError, SigningKey, TokenClaims, TokenKind, TokenPair, TokenService, TokenVerifier,
    VerifyingKey,
};
pub use models::{
    IdentityResponse, LoginRequest, NewSessionRequest, RefreshRequest, RegisterRequest,
    RevokeRequest, RevokeResponse, TokenPairResponse, ValidateRequest, ValidateResponse,
};
pub use password::{
    verify_password, CredentialHasher, PasswordError, PasswordPolicy, PolicyRule, PolicyViolation,
};
pub use service::SessionCoordinator;
