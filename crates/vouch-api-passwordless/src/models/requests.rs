//! Request DTOs for passwordless endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Request a code or link for an identifier.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SendCodeRequest {
    /// Email address or phone number, depending on the channel.
    #[validate(length(min = 1, max = 320, message = "Identifier must be 1-320 characters"))]
    pub identifier: String,
}

/// Present a secret for verification.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct VerifyCodeRequest {
    #[validate(length(min = 1, max = 320, message = "Identifier must be 1-320 characters"))]
    pub identifier: String,

    /// The code or link token that was delivered.
    #[validate(length(min = 1, max = 128, message = "Secret must be 1-128 characters"))]
    pub secret: String,

    /// Issue a long-lived session.
    #[serde(default)]
    pub remember: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_request_validation() {
        let valid = SendCodeRequest {
            identifier: "a@b.com".to_string(),
        };
        assert!(valid.validate().is_ok());

        let empty = SendCodeRequest {
            identifier: String::new(),
        };
        assert!(empty.validate().is_err());

        let too_long = SendCodeRequest {
            identifier: "x".repeat(321),
        };
        assert!(too_long.validate().is_err());
    }

    #[test]
    fn test_verify_request_validation() {
        let valid = VerifyCodeRequest {
            identifier: "a@b.com".to_string(),
            secret: "123456".to_string(),
            remember: false,
        };
        assert!(valid.validate().is_ok());

        let long_secret = VerifyCodeRequest {
            secret: "1".repeat(129),
            ..valid
        };
        assert!(long_secret.validate().is_err());
    }

    #[test]
    fn test_remember_defaults_to_false() {
        let request: VerifyCodeRequest =
            serde_json::from_str(r#"{"identifier":"a@b.com","secret":"123456"}"#).unwrap();
        assert!(!request.remember);
    }

    #[test]
    fn test_form_encoded_verify_request() {
        let request: VerifyCodeRequest = serde_urlencoded::from_str(
            "identifier=a%40b.com&secret=123456&remember=true&csrf_token=abc.def",
        )
        .unwrap();
        assert_eq!(request.identifier, "a@b.com");
        assert!(request.remember);
    }
}
