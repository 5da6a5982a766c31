//! Request validation gate
//!
//! Runs the structural rules declared on request models and reports the
//! first failure as a fixed description followed by the field name, for
//! example `Field is required: username`.
//!
//! The validator is an ordinary value held in application state, so tests
//! and binaries can build their own with different limits.

use std::fmt;

use tollgate_core::ValidationConfig;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

pub const ERR_INVALID_FORMAT: &str = "Invalid format";
pub const ERR_FIELD_REQUIRED: &str = "Field is required";
pub const ERR_FIELD_EXCEEDS_MAX_LEN: &str = "Field exceeds maximum length";
pub const ERR_FIELD_BELOW_MIN_LEN: &str = "Field is below minimum length";
pub const ERR_FIELD_EXCEEDS_MAX_VAL: &str = "Field exceeds maximum value";
pub const ERR_FIELD_BELOW_MIN_VAL: &str = "Field is below minimum value";
pub const ERR_UNKNOWN_VALIDATION: &str = "Unknown validation error";
pub const ERR_INVALID_IDENTITY_ID: &str = "invalid user id format";

/// A rejected request, already rendered for the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure(String);

impl ValidationFailure {
    fn new(description: &str, field: &str) -> Self {
        Self(format!("{description}: {field}"))
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ValidationFailure {}

/// Bounds that are configurable rather than declared on the models
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationLimits {
    pub username_min: usize,
    pub username_max: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            username_min: 3,
            username_max: 32,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RequestValidator {
    limits: ValidationLimits,
}

impl RequestValidator {
    pub fn new(limits: ValidationLimits) -> Self {
        Self { limits }
    }

    pub fn from_config(config: &ValidationConfig) -> Self {
        Self::new(ValidationLimits {
            username_min: config.username_min_length,
            username_max: config.username_max_length,
        })
    }

    pub fn limits(&self) -> ValidationLimits {
        self.limits
    }

    /// Run the derived rules of a request model
    pub fn validate<T: Validate>(&self, request: &T) -> Result<(), ValidationFailure> {
        request.validate().map_err(|errors| first_failure(&errors))
    }

    /// Check a username against the configured length bounds
    pub fn validate_username(&self, username: &str) -> Result<(), ValidationFailure> {
        let len = username.chars().count();
        if len == 0 {
            return Err(ValidationFailure::new(ERR_FIELD_REQUIRED, "username"));
        }
        if len < self.limits.username_min {
            return Err(ValidationFailure::new(ERR_FIELD_BELOW_MIN_LEN, "username"));
        }
        if len > self.limits.username_max {
            return Err(ValidationFailure::new(ERR_FIELD_EXCEEDS_MAX_LEN, "username"));
        }
        Ok(())
    }

    /// Parse an identity id supplied as text
    pub fn parse_identity_id(&self, raw: &str) -> Result<Uuid, ValidationFailure> {
        Uuid::parse_str(raw.trim()).map_err(|_| ValidationFailure(ERR_INVALID_IDENTITY_ID.to_string()))
    }
}

/// Pick the first failing field, by name, and describe it
fn first_failure(errors: &ValidationErrors) -> ValidationFailure {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    match fields.first() {
        Some((field, field_errors)) => {
            let description = field_errors
                .first()
                .map(describe)
                .unwrap_or(ERR_UNKNOWN_VALIDATION);
            ValidationFailure::new(description, field)
        }
        None => ValidationFailure(ERR_UNKNOWN_VALIDATION.to_string()),
    }
}

fn describe(error: &ValidationError) -> &'static str {
    match error.code.as_ref() {
        "required" => ERR_FIELD_REQUIRED,
        "email" | "url" | "regex" => ERR_INVALID_FORMAT,
        "length" => {
            let len = error
                .params
                .get("value")
                .and_then(|v| v.as_str())
                .map(|s| s.chars().count() as u64);
            let max = error.params.get("max").and_then(|v| v.as_u64());
            match (len, max) {
                (Some(0), _) => ERR_FIELD_REQUIRED,
                (Some(len), Some(max)) if len > max => ERR_FIELD_EXCEEDS_MAX_LEN,
                _ => ERR_FIELD_BELOW_MIN_LEN,
            }
        }
        "range" => {
            let value = error.params.get("value").and_then(|v| v.as_f64());
            let max = error.params.get("max").and_then(|v| v.as_f64());
            match (value, max) {
                (Some(value), Some(max)) if value > max => ERR_FIELD_EXCEEDS_MAX_VAL,
                _ => ERR_FIELD_BELOW_MIN_VAL,
            }
        }
        _ => ERR_UNKNOWN_VALIDATION,
    }
}
