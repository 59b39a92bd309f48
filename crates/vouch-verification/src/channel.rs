//! Verification channels.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use vouch_core::VouchError;

/// The closed set of channels a code can be delivered through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// Numeric one-time code sent by email.
    EmailOtp,
    /// Numeric one-time code sent by SMS.
    SmsOtp,
    /// High-entropy token embedded in a link.
    MagicLink,
}

impl ChannelKind {
    pub const ALL: [ChannelKind; 3] = [Self::EmailOtp, Self::SmsOtp, Self::MagicLink];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmailOtp => "email_otp",
            Self::SmsOtp => "sms_otp",
            Self::MagicLink => "magic_link",
        }
    }

    /// OTP channels carry numeric secrets, link channels carry tokens.
    #[must_use]
    pub fn is_otp(&self) -> bool {
        matches!(self, Self::EmailOtp | Self::SmsOtp)
    }

    /// Whether identifiers on this channel are email addresses.
    #[must_use]
    pub fn uses_email(&self) -> bool {
        matches!(self, Self::EmailOtp | Self::MagicLink)
    }

    /// Normalize an identifier for storage and lookup.
    ///
    /// Email identifiers are trimmed and lowercased. Phone numbers are trimmed
    /// and stripped of spaces, dashes and parentheses.
    #[must_use]
    pub fn normalize_identifier(&self, identifier: &str) -> String {
        let trimmed = identifier.trim();
        if self.uses_email() {
            trimmed.to_lowercase()
        } else {
            trimmed
                .chars()
                .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
                .collect()
        }
    }

    #[must_use]
    pub fn sent_action(&self) -> String {
        format!("{}_sent", self.as_str())
    }

    #[must_use]
    pub fn verify_failed_action(&self) -> String {
        format!("{}_verify_failed", self.as_str())
    }

    #[must_use]
    pub fn verify_success_action(&self) -> String {
        format!("{}_verify_success", self.as_str())
    }

    #[must_use]
    pub fn login_action(&self) -> String {
        format!("{}_login", self.as_str())
    }

    /// Rate limiter route key for sends on this channel.
    #[must_use]
    pub fn send_route(&self) -> String {
        format!("{}:send", self.as_str())
    }

    /// Rate limiter key for sends to one identifier.
    #[must_use]
    pub fn send_key(&self, identifier: &str) -> String {
        format!("{}:send:{identifier}", self.as_str())
    }
}

impl Display for ChannelKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelKind {
    type Err = VouchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email_otp" => Ok(Self::EmailOtp),
            "sms_otp" => Ok(Self::SmsOtp),
            "magic_link" => Ok(Self::MagicLink),
            other => Err(VouchError::UnknownChannel(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        for channel in ChannelKind::ALL {
            assert_eq!(channel.as_str().parse::<ChannelKind>().unwrap(), channel);
        }
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            "webauthn".parse::<ChannelKind>(),
            Err(VouchError::UnknownChannel("webauthn".to_string()))
        );
    }

    #[test]
    fn test_audit_actions() {
        let channel = ChannelKind::MagicLink;
        assert_eq!(channel.sent_action(), "magic_link_sent");
        assert_eq!(channel.verify_failed_action(), "magic_link_verify_failed");
        assert_eq!(channel.verify_success_action(), "magic_link_verify_success");
        assert_eq!(channel.login_action(), "magic_link_login");
    }

    #[test]
    fn test_rate_limit_keys() {
        let channel = ChannelKind::EmailOtp;
        assert_eq!(channel.send_route(), "email_otp:send");
        assert_eq!(channel.send_key("a@b.com"), "email_otp:send:a@b.com");
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(
            ChannelKind::EmailOtp.normalize_identifier("  Alice@Example.COM "),
            "alice@example.com"
        );
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(
            ChannelKind::SmsOtp.normalize_identifier(" +1 (555) 010-9999 "),
            "+15550109999"
        );
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&ChannelKind::SmsOtp).unwrap();
        assert_eq!(json, r#""sms_otp""#);
    }
}
