//! Response DTOs for passwordless endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use vouch_csrf::CsrfStats;
use vouch_verification::{IssuedCode, Session, SessionBundle, User};

/// Response after a code or link was issued.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SendCodeResponse {
    /// Always `"sent"`.
    pub status: String,

    /// Secret lifetime in seconds.
    pub expires_in_seconds: i64,

    /// The secret itself, only when development exposure is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_secret: Option<String>,
}

impl From<IssuedCode> for SendCodeResponse {
    fn from(issued: IssuedCode) -> Self {
        Self {
            status: "sent".to_string(),
            expires_in_seconds: issued.expires_in_seconds,
            dev_secret: issued.dev_secret,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub identifier: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: *user.id.as_uuid(),
            identifier: user.identifier,
            display_name: user.display_name,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub id: Uuid,
    pub app_id: Uuid,
    pub environment_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<Uuid>,
    pub remember: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            id: *session.id.as_uuid(),
            app_id: *session.scope.app_id.as_uuid(),
            environment_id: *session.scope.environment_id.as_uuid(),
            organization_id: session.scope.organization_id.map(|id| *id.as_uuid()),
            remember: session.remember,
            created_at: session.created_at,
            expires_at: session.expires_at,
        }
    }
}

/// Response after a successful verification.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VerifyCodeResponse {
    pub user: UserResponse,
    pub session: SessionResponse,
    /// Opaque bearer token for the new session.
    pub token: String,
}

impl From<SessionBundle> for VerifyCodeResponse {
    fn from(bundle: SessionBundle) -> Self {
        Self {
            user: bundle.user.into(),
            session: bundle.session.into(),
            token: bundle.token,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CsrfTokenResponse {
    pub csrf_token: String,
    pub expires_in_seconds: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct CsrfStatsResponse {
    pub total_tokens: usize,
    pub valid_tokens: usize,
}

impl From<CsrfStats> for CsrfStatsResponse {
    fn from(stats: CsrfStats) -> Self {
        Self {
            total_tokens: stats.total_tokens,
            valid_tokens: stats.valid_tokens,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_response_hides_absent_secret() {
        let response = SendCodeResponse::from(IssuedCode {
            dev_secret: None,
            expires_at: Utc::now(),
            expires_in_seconds: 600,
        });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "sent");
        assert_eq!(json["expires_in_seconds"], 600);
        assert!(json.get("dev_secret").is_none());
    }

    #[test]
    fn test_send_response_exposes_dev_secret() {
        let response = SendCodeResponse::from(IssuedCode {
            dev_secret: Some("123456".to_string()),
            expires_at: Utc::now(),
            expires_in_seconds: 600,
        });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["dev_secret"], "123456");
    }
}
