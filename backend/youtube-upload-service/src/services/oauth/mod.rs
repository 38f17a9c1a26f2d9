use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub mod google;

pub use google::GoogleOAuthProvider;

pub const YOUTUBE_UPLOAD_SCOPE: &str = "https://www.googleapis.com/auth/youtube.upload";
pub const YOUTUBE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/youtube.readonly";

/// Scopes requested during login.
pub const SCOPES: [&str; 2] = [YOUTUBE_UPLOAD_SCOPE, YOUTUBE_READONLY_SCOPE];

/// Tokens are refreshed this long before they actually expire.
const REFRESH_MARGIN_SECS: i64 = 60;

/// Credential bundle kept in the server-side session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthCredentials {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_uri: String,
    pub scopes: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl OAuthCredentials {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now + Duration::seconds(REFRESH_MARGIN_SECS) >= expires_at,
            None => false,
        }
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.is_some()
    }
}

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("Failed to exchange token: {0}")]
    TokenExchange(String),

    #[error("Failed to refresh token: {0}")]
    TokenRefresh(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("No refresh token available")]
    MissingRefreshToken,
}

#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Authorization URL the browser is sent to.
    fn authorization_url(&self, state: &str) -> String;

    /// Exchange authorization code for tokens
    async fn exchange_code(&self, code: &str) -> Result<OAuthCredentials, OAuthError>;

    /// Obtain a new access token, keeping the refresh token when Google omits it.
    async fn refresh(&self, credentials: &OAuthCredentials) -> Result<OAuthCredentials, OAuthError>;
}

/// Random CSRF state token (64 hex characters).
pub fn generate_state_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(expires_at: Option<DateTime<Utc>>) -> OAuthCredentials {
        OAuthCredentials {
            access_token: "ya29.token".into(),
            refresh_token: Some("1//refresh".into()),
            token_uri: "https://oauth2.googleapis.com/token".into(),
            scopes: SCOPES.iter().map(|s| s.to_string()).collect(),
            expires_at,
        }
    }

    #[test]
    fn expiry_includes_refresh_margin() {
        let now = Utc::now();
        assert!(!credentials(Some(now + Duration::minutes(10))).is_expired_at(now));
        assert!(credentials(Some(now + Duration::seconds(30))).is_expired_at(now));
        assert!(credentials(Some(now - Duration::seconds(1))).is_expired_at(now));
        assert!(!credentials(None).is_expired_at(now));
    }

    #[test]
    fn state_tokens_are_unique_hex() {
        let a = generate_state_token();
        let b = generate_state_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn oauth_error_display() {
        let err = OAuthError::TokenExchange("invalid_grant".to_string());
        assert!(err.to_string().contains("Failed to exchange token"));
    }
}
