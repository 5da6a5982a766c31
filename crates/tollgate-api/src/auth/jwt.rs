//! JWT token issuance and verification
//!
//! Tokens are signed with RS256. The private key only lives in
//! [`SigningKey`]; anything holding a [`VerifyingKey`] can check tokens
//! through a [`TokenVerifier`] without being able to mint them.
//!
//! Access and refresh tokens share the claim shape and differ by lifetime
//! and by the `kind` claim.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tollgate_core::TokenConfig;
use uuid::Uuid;

/// Which half of a token pair a token is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Access => write!(f, "access"),
            TokenKind::Refresh => write!(f, "refresh"),
        }
    }
}

/// JWT Claims structure as encoded on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Token issuer
    pub iss: String,
    /// Subject - identity ID
    pub sub: String,
    /// JWT ID - unique per token
    pub jti: String,
    /// Issued at timestamp (Unix epoch)
    pub iat: i64,
    /// Expiration timestamp (Unix epoch)
    pub exp: i64,
    /// Access or refresh
    pub kind: TokenKind,
}

/// Identity claims extracted from a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub identity: Uuid,
    pub kind: TokenKind,
    pub token_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// An access token and a refresh token issued together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// JWT token errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode JWT: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    #[error("Failed to read key file {path}: {source}")]
    KeyFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed token: {0}")]
    MalformedToken(String),

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token lifetime out of range: {0}")]
    LifetimeOutOfRange(String),
}

/// RSA private key used to sign tokens
#[derive(Clone)]
pub struct SigningKey(EncodingKey);

impl SigningKey {
    /// Parse a PEM encoded RSA private key (PKCS#1 or PKCS#8)
    pub fn from_pem(pem: &[u8]) -> Result<Self, JwtError> {
        EncodingKey::from_rsa_pem(pem)
            .map(Self)
            .map_err(|e| JwtError::InvalidKey(format!("private key: {e}")))
    }

    pub fn from_file(path: &Path) -> Result<Self, JwtError> {
        Self::from_pem(&read_key_file(path)?)
    }
}

/// RSA public key used to verify tokens
#[derive(Clone)]
pub struct VerifyingKey(DecodingKey);

impl VerifyingKey {
    /// Parse a PEM encoded RSA public key
    pub fn from_pem(pem: &[u8]) -> Result<Self, JwtError> {
        DecodingKey::from_rsa_pem(pem)
            .map(Self)
            .map_err(|e| JwtError::InvalidKey(format!("public key: {e}")))
    }

    pub fn from_file(path: &Path) -> Result<Self, JwtError> {
        Self::from_pem(&read_key_file(path)?)
    }
}

fn read_key_file(path: &Path) -> Result<Vec<u8>, JwtError> {
    std::fs::read(path).map_err(|e| JwtError::KeyFile {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Verification-only half of the token service
#[derive(Clone)]
pub struct TokenVerifier {
    key: VerifyingKey,
    issuer: String,
}

impl TokenVerifier {
    pub fn new(key: VerifyingKey, issuer: impl Into<String>) -> Self {
        Self {
            key,
            issuer: issuer.into(),
        }
    }

    /// Check signature, issuer and claim structure, ignoring expiry
    fn decode_claims(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        let token_data = decode::<Claims>(token, &self.key.0, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                _ => JwtError::MalformedToken(e.to_string()),
            }
        })?;

        Ok(token_data.claims)
    }

    /// Verify a token at the current time
    pub fn verify(&self, token: &str) -> Result<bool, JwtError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token against a given instant
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Signature valid and `exp > now`
    /// * `Ok(false)` - Signature valid but the token has expired
    /// * `Err(JwtError)` - Forged, malformed, or from another issuer
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<bool, JwtError> {
        let claims = self.decode_claims(token)?;
        Ok(claims.exp > now.timestamp())
    }

    /// Extract identity claims without checking expiry
    ///
    /// Refresh needs the identity out of an access token that may already be
    /// expired, so only the signature and claim structure are checked here.
    pub fn extract_claims(&self, token: &str) -> Result<TokenClaims, JwtError> {
        let claims = self.decode_claims(token)?;

        let identity = Uuid::parse_str(&claims.sub)
            .map_err(|e| JwtError::MalformedToken(format!("invalid identity in sub: {e}")))?;
        let issued_at = DateTime::from_timestamp(claims.iat, 0)
            .ok_or_else(|| JwtError::MalformedToken("iat out of range".to_string()))?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| JwtError::MalformedToken("exp out of range".to_string()))?;

        Ok(TokenClaims {
            identity,
            kind: claims.kind,
            token_id: claims.jti,
            issued_at,
            expires_at,
        })
    }
}

/// Signs and verifies token pairs
///
/// Immutable after construction and safe to share between requests.
#[derive(Clone)]
pub struct TokenService {
    signing_key: SigningKey,
    verifier: TokenVerifier,
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(
        signing_key: SigningKey,
        verifying_key: VerifyingKey,
        issuer: impl Into<String>,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        let issuer = issuer.into();
        Self {
            signing_key,
            verifier: TokenVerifier::new(verifying_key, issuer.clone()),
            issuer,
            access_ttl,
            refresh_ttl,
        }
    }

    /// Build a token service from configuration, reading both key files
    pub fn from_config(config: &TokenConfig) -> Result<Self, JwtError> {
        let signing_key = SigningKey::from_file(&config.private_key_path)?;
        let verifying_key = VerifyingKey::from_file(&config.public_key_path)?;
        Self::with_keys(signing_key, verifying_key, config)
    }

    /// Build a token service from configuration with already loaded keys
    pub fn with_keys(
        signing_key: SigningKey,
        verifying_key: VerifyingKey,
        config: &TokenConfig,
    ) -> Result<Self, JwtError> {
        Ok(Self::new(
            signing_key,
            verifying_key,
            config.issuer.clone(),
            lifetime(config.access_ttl_secs)?,
            lifetime(config.refresh_ttl_secs)?,
        ))
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Issue a fresh token pair for an identity
    pub fn issue(&self, identity: Uuid) -> Result<TokenPair, JwtError> {
        self.issue_at(identity, Utc::now())
    }

    /// Issue a token pair as of a given instant
    ///
    /// Each token carries its own `jti`, so two pairs issued in the same
    /// second for the same identity never compare equal.
    pub fn issue_at(&self, identity: Uuid, now: DateTime<Utc>) -> Result<TokenPair, JwtError> {
        Ok(TokenPair {
            access_token: self.sign(identity, TokenKind::Access, now, self.access_ttl)?,
            refresh_token: self.sign(identity, TokenKind::Refresh, now, self.refresh_ttl)?,
        })
    }

    fn sign(
        &self,
        identity: Uuid,
        kind: TokenKind,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<String, JwtError> {
        let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
            JwtError::LifetimeOutOfRange(format!("{} seconds", ttl.num_seconds()))
        })?;
        let claims = Claims {
            iss: self.issuer.clone(),
            sub: identity.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            kind,
        };

        let token = encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key.0)?;
        Ok(token)
    }

    /// Verify a token at the current time
    pub fn verify(&self, token: &str) -> Result<bool, JwtError> {
        self.verifier.verify(token)
    }

    /// Verify a token against a given instant
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<bool, JwtError> {
        self.verifier.verify_at(token, now)
    }

    /// Extract identity claims without checking expiry
    pub fn extract_claims(&self, token: &str) -> Result<TokenClaims, JwtError> {
        self.verifier.extract_claims(token)
    }
}

fn lifetime(secs: u64) -> Result<Duration, JwtError> {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .ok_or_else(|| JwtError::LifetimeOutOfRange(format!("{secs} seconds")))
}
