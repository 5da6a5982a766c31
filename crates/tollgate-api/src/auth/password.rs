/// Password policy and hashing using Argon2id
///
/// The policy gates credential creation:
/// - Length: 8 to 30 characters (inclusive, configurable)
/// - At least 1 uppercase letter, 1 lowercase letter, 1 digit
/// - At least 1 symbol from a fixed allowed set
///
/// Hashes are PHC strings (algorithm, parameters, 16-byte random salt, digest),
/// so verification reads its parameters back from the stored digest.
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params,
};
use thiserror::Error;
use tollgate_core::PasswordConfig;

/// The individual policy rules, checked in this order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyRule {
    Length,
    Uppercase,
    Lowercase,
    Digit,
    Symbol,
}

/// A password rejected by the policy
///
/// `rule` is the first rule that failed and is meant for diagnostics only.
/// The displayed reason is the same whichever rule failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct PolicyViolation {
    pub rule: PolicyRule,
    pub reason: String,
}

/// Password hashing errors
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Invalid Argon2 parameters: {0}")]
    InvalidParams(String),

    #[error("Failed to hash password: {0}")]
    HashingFailed(String),
}

/// Password strength policy
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    min_length: usize,
    max_length: usize,
    symbols: String,
    reason: String,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self::from_config(&PasswordConfig::default())
    }
}

impl PasswordPolicy {
    pub fn from_config(config: &PasswordConfig) -> Self {
        let reason = format!(
            "password must be {}-{} characters long and contain an uppercase letter, \
             a lowercase letter, a digit and one of the symbols {}",
            config.min_length, config.max_length, config.allowed_symbols
        );
        Self {
            min_length: config.min_length,
            max_length: config.max_length,
            symbols: config.allowed_symbols.clone(),
            reason,
        }
    }

    /// The reason carried by every violation of this policy
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Validate a candidate password
    ///
    /// Rules are checked in order and the first failing one is reported.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use tollgate_api::auth::password::PasswordPolicy;
    ///
    /// let policy = PasswordPolicy::default();
    /// assert!(policy.validate("Abcd123!").is_ok());
    /// assert!(policy.validate("weak").is_err());
    /// ```
    pub fn validate(&self, candidate: &str) -> Result<(), PolicyViolation> {
        let len = candidate.chars().count();
        if len < self.min_length || len > self.max_length {
            return Err(self.violation(PolicyRule::Length));
        }

        if !candidate.chars().any(|c| c.is_uppercase()) {
            return Err(self.violation(PolicyRule::Uppercase));
        }

        if !candidate.chars().any(|c| c.is_lowercase()) {
            return Err(self.violation(PolicyRule::Lowercase));
        }

        if !candidate.chars().any(|c| c.is_ascii_digit()) {
            return Err(self.violation(PolicyRule::Digit));
        }

        if !candidate.chars().any(|c| self.symbols.contains(c)) {
            return Err(self.violation(PolicyRule::Symbol));
        }

        Ok(())
    }

    fn violation(&self, rule: PolicyRule) -> PolicyViolation {
        PolicyViolation {
            rule,
            reason: self.reason.clone(),
        }
    }
}

/// Salted one-way password hasher
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl CredentialHasher {
    /// Create a hasher with the Argon2 parameters from configuration
    pub fn from_config(config: &PasswordConfig) -> Result<Self, PasswordError> {
        let params = Params::new(
            config.memory_cost,
            config.time_cost,
            config.parallelism,
            Some(32),
        )
        .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;

        Ok(Self { params })
    }

    /// Hash a plaintext password
    ///
    /// Any input is accepted, including the empty string. The same input
    /// hashes differently on every call because of the random salt.
    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::new(
            argon2::Algorithm::Argon2id,
            argon2::Version::V0x13,
            self.params.clone(),
        );

        let password_hash = argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

        Ok(password_hash.to_string())
    }

    /// Verify a candidate password against a stored digest
    ///
    /// A malformed digest and a wrong password both return `false`.
    pub fn verify(&self, digest: &str, candidate: &str) -> bool {
        verify_password(digest, candidate)
    }
}

/// Verify a candidate password against a PHC digest
///
/// The Argon2 parameters are read from the digest itself.
pub fn verify_password(digest: &str, candidate: &str) -> bool {
    let parsed_hash = match PasswordHash::new(digest) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::debug!(error = %e, "stored password hash is malformed");
            return false;
        }
    };

    Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed_hash)
        .is_ok()
}
