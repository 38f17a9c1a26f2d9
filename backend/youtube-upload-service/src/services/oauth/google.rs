use super::{OAuthCredentials, OAuthError, OAuthProvider, SCOPES};
use crate::config::GoogleConfig;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;
use serde::Deserialize;

#[derive(Clone)]
pub struct GoogleOAuthProvider {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    auth_uri: String,
    token_uri: String,
    http_client: Client,
}

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleTokenError {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl GoogleOAuthProvider {
    pub fn new(config: &GoogleConfig, http_client: Client) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            auth_uri: config.auth_uri.clone(),
            token_uri: config.token_uri.clone(),
            http_client,
        }
    }

    async fn request_token(&self, params: &[(&str, &str)]) -> Result<GoogleTokenResponse, String> {
        let response = self
            .http_client
            .post(&self.token_uri)
            .form(params)
            .send()
            .await
            .map_err(|e| format!("HTTP error: {}", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| format!("HTTP error: {}", e))?;

        if !status.is_success() {
            let message = serde_json::from_str::<GoogleTokenError>(&body)
                .map(|e| match e.error_description {
                    Some(description) => format!("{}: {}", e.error, description),
                    None => e.error,
                })
                .unwrap_or(body);
            return Err(format!("{} ({})", message, status.as_u16()));
        }

        serde_json::from_str(&body).map_err(|e| format!("JSON parse error: {}", e))
    }

    fn credentials_from(
        &self,
        token: GoogleTokenResponse,
        fallback_refresh: Option<String>,
        fallback_scopes: &[String],
    ) -> OAuthCredentials {
        let scopes = token
            .scope
            .map(|s| s.split_whitespace().map(str::to_string).collect::<Vec<_>>())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| fallback_scopes.to_vec());

        OAuthCredentials {
            access_token: token.access_token,
            refresh_token: token.refresh_token.or(fallback_refresh),
            token_uri: self.token_uri.clone(),
            scopes,
            expires_at: token
                .expires_in
                .filter(|secs| *secs > 0)
                .map(|secs| Utc::now() + Duration::seconds(secs)),
        }
    }
}

#[async_trait]
impl OAuthProvider for GoogleOAuthProvider {
    fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&access_type=offline&include_granted_scopes=true&prompt=consent",
            self.auth_uri,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(&SCOPES.join(" ")),
            urlencoding::encode(state)
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<OAuthCredentials, OAuthError> {
        let token = self
            .request_token(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .await
            .map_err(OAuthError::TokenExchange)?;

        let requested: Vec<String> = SCOPES.iter().map(|s| s.to_string()).collect();
        Ok(self.credentials_from(token, None, &requested))
    }

    async fn refresh(&self, credentials: &OAuthCredentials) -> Result<OAuthCredentials, OAuthError> {
        let refresh_token = credentials
            .refresh_token
            .as_deref()
            .ok_or(OAuthError::MissingRefreshToken)?;

        let token = self
            .request_token(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .await
            .map_err(OAuthError::TokenRefresh)?;

        tracing::debug!("refreshed Google access token");
        Ok(self.credentials_from(
            token,
            credentials.refresh_token.clone(),
            &credentials.scopes,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GOOGLE_AUTH_URI, GOOGLE_TOKEN_URI, YOUTUBE_API_BASE, YOUTUBE_UPLOAD_BASE};

    fn provider() -> GoogleOAuthProvider {
        GoogleOAuthProvider::new(
            &GoogleConfig {
                client_id: "client-123.apps.googleusercontent.com".into(),
                client_secret: "secret".into(),
                redirect_uri: "http://127.0.0.1:5000/oauth2callback".into(),
                auth_uri: GOOGLE_AUTH_URI.into(),
                token_uri: GOOGLE_TOKEN_URI.into(),
                api_base_url: YOUTUBE_API_BASE.into(),
                upload_base_url: YOUTUBE_UPLOAD_BASE.into(),
            },
            Client::new(),
        )
    }

    #[test]
    fn authorization_url_requests_youtube_scopes_offline() {
        let url = provider().authorization_url("state-abc");
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("client_id=client-123.apps.googleusercontent.com"));
        assert!(url.contains("redirect_uri=http%3A%2F%2F127.0.0.1%3A5000%2Foauth2callback"));
        assert!(url.contains("youtube.upload"));
        assert!(url.contains("youtube.readonly"));
        assert!(url.contains("state=state-abc"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("response_type=code"));
    }

    #[test]
    fn refresh_keeps_existing_refresh_token_and_scopes() {
        let provider = provider();
        let token = GoogleTokenResponse {
            access_token: "new-access".into(),
            expires_in: Some(3599),
            refresh_token: None,
            scope: None,
        };
        let scopes = vec!["a".to_string()];
        let creds = provider.credentials_from(token, Some("old-refresh".into()), &scopes);

        assert_eq!(creds.access_token, "new-access");
        assert_eq!(creds.refresh_token.as_deref(), Some("old-refresh"));
        assert_eq!(creds.scopes, scopes);
        assert!(creds.expires_at.is_some());
    }

    #[test]
    fn granted_scopes_are_split_on_whitespace() {
        let provider = provider();
        let token = GoogleTokenResponse {
            access_token: "a".into(),
            expires_in: None,
            refresh_token: Some("r".into()),
            scope: Some(format!("{} {}", SCOPES[0], SCOPES[1])),
        };
        let creds = provider.credentials_from(token, None, &[]);
        assert_eq!(creds.scopes.len(), 2);
        assert!(creds.expires_at.is_none());
    }
}
