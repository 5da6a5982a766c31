//! Request and response models for the session RPC surface
//!
//! Requests carry structural validation rules (`validator` derives). The
//! password policy is not expressed here; it runs inside the service.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::jwt::TokenPair;

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
    #[validate(email)]
    pub email: String,
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Access token validation request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct ValidateRequest {
    #[validate(length(min = 1))]
    pub access_token: String,
}

/// Session issuance for a known identity
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct NewSessionRequest {
    #[validate(length(min = 1))]
    pub identity_id: String,
}

/// Session revocation request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct RevokeRequest {
    #[validate(length(min = 1))]
    pub identity_id: String,
}

/// Token pair exchange request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1))]
    pub access_token: String,
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

/// Newly registered identity
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IdentityResponse {
    pub identity_id: Uuid,
}

/// Result of a successful validation
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ValidateResponse {
    pub identity_id: Uuid,
}

/// Token pair response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Always "Bearer"
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

impl TokenPairResponse {
    pub fn new(pair: TokenPair, expires_in: i64) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RevokeResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_rules() {
        let ok = RegisterRequest {
            username: "alice".to_string(),
            password: "Abcd123!".to_string(),
            email: "a@x.com".to_string(),
        };
        assert!(ok.validate().is_ok());

        let bad_email = RegisterRequest {
            email: "not-an-email".to_string(),
            ..ok.clone()
        };
        assert!(bad_email.validate().is_err());

        let empty_name = RegisterRequest {
            username: String::new(),
            ..ok
        };
        let errors = empty_name.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("username"));
    }

    #[test]
    fn test_token_pair_response() {
        let response = TokenPairResponse::new(
            TokenPair {
                access_token: "a".to_string(),
                refresh_token: "r".to_string(),
            },
            900,
        );

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["token_type"], "Bearer");
        assert_eq!(json["expires_in"], 900);
        assert_eq!(json["refresh_token"], "r");
    }
}
