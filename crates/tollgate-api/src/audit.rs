//! Security audit logging for session lifecycle events
//!
//! Every registration, login, issuance, revocation and rotation outcome is
//! logged with the "audit" target, so it can be filtered and routed
//! separately from application logs.
//!
//! Failures carry their precise reason here. The caller only ever sees the
//! coarse error class.
//!
//! # Example
//!
//! ```ignore
//! use tollgate_api::audit::{audit_log, AuditEvent};
//!
//! audit_log(&AuditEvent::LoginSuccess {
//!     identity_id,
//!     username: "alice".to_string(),
//! });
//! ```

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

/// Security audit events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    RegistrationSuccess {
        identity_id: Uuid,
        username: String,
    },

    RegistrationFailure {
        username: String,
        reason: String,
    },

    LoginSuccess {
        identity_id: Uuid,
        username: String,
    },

    LoginFailure {
        username: String,
        reason: String,
    },

    /// A new session replaced whatever the identity had before
    SessionIssued {
        identity_id: Uuid,
    },

    SessionRevoked {
        identity_id: Uuid,
    },

    /// Successful rotation
    TokenRefresh {
        identity_id: Uuid,
    },

    /// A refresh token that is no longer the stored one was presented
    RefreshReplayDetected {
        identity_id: Uuid,
    },

    /// A concurrent refresh rotated the session first
    RotationConflict {
        identity_id: Uuid,
    },

    /// Forged, expired, malformed, or wrong-kind token
    InvalidToken {
        operation: String,
        reason: String,
    },
}

impl AuditEvent {
    /// Stable snake_case name, matching the serialized `event_type`
    pub fn event_type(&self) -> &'static str {
        match self {
            AuditEvent::RegistrationSuccess { .. } => "registration_success",
            AuditEvent::RegistrationFailure { .. } => "registration_failure",
            AuditEvent::LoginSuccess { .. } => "login_success",
            AuditEvent::LoginFailure { .. } => "login_failure",
            AuditEvent::SessionIssued { .. } => "session_issued",
            AuditEvent::SessionRevoked { .. } => "session_revoked",
            AuditEvent::TokenRefresh { .. } => "token_refresh",
            AuditEvent::RefreshReplayDetected { .. } => "refresh_replay_detected",
            AuditEvent::RotationConflict { .. } => "rotation_conflict",
            AuditEvent::InvalidToken { .. } => "invalid_token",
        }
    }

    /// Events that point at possible token theft
    pub fn is_security_alert(&self) -> bool {
        matches!(
            self,
            AuditEvent::RefreshReplayDetected { .. } | AuditEvent::RotationConflict { .. }
        )
    }
}

/// Log a security audit event with structured fields
///
/// Replay and conflict events are raised to WARN. Everything else is INFO.
///
/// ```json
/// {
///   "event_type": "login_failure",
///   "username": "alice",
///   "reason": "password mismatch"
/// }
/// ```
pub fn audit_log(event: &AuditEvent) {
    let timestamp = chrono::Utc::now();

    let event_json = serde_json::to_string(event)
        .unwrap_or_else(|e| format!("{{\"error\":\"Failed to serialize audit event: {e}\"}}"));

    match event {
        AuditEvent::RegistrationSuccess {
            identity_id,
            username,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                identity_id = %identity_id,
                username = %username,
                "Registration successful"
            );
        }
        AuditEvent::RegistrationFailure { username, reason } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                username = %username,
                reason = %reason,
                "Registration failed"
            );
        }
        AuditEvent::LoginSuccess {
            identity_id,
            username,
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                identity_id = %identity_id,
                username = %username,
                "Login successful"
            );
        }
        AuditEvent::LoginFailure { username, reason } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                username = %username,
                reason = %reason,
                "Login failed"
            );
        }
        AuditEvent::SessionIssued { identity_id } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                identity_id = %identity_id,
                "Session issued"
            );
        }
        AuditEvent::SessionRevoked { identity_id } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                identity_id = %identity_id,
                "Session revoked"
            );
        }
        AuditEvent::TokenRefresh { identity_id } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                identity_id = %identity_id,
                "Token refresh"
            );
        }
        AuditEvent::RefreshReplayDetected { identity_id } => {
            warn!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                identity_id = %identity_id,
                "Superseded refresh token presented"
            );
        }
        AuditEvent::RotationConflict { identity_id } => {
            warn!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                identity_id = %identity_id,
                "Concurrent session rotation lost"
            );
        }
        AuditEvent::InvalidToken { operation, reason } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                operation = %operation,
                reason = %reason,
                "Invalid token"
            );
        }
    }
}
