/// Configuration management for youtube-upload-service
///
/// Loads configuration from environment variables with sensible defaults.
/// Google OAuth client credentials may come from the environment or from a
/// downloaded `client_secret.json`.
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::session::MAX_SESSION_TTL_SECS;

pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:5000/oauth2callback";
pub const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
pub const YOUTUBE_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/youtube/v3";

/// 5 GB
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024 * 1024;

const DEV_SESSION_SECRET: &str = "dev-only-session-secret-change-me";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("failed to read client secrets file {path}: {reason}")]
    ClientSecrets { path: String, reason: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppConfig,
    pub google: GoogleConfig,
    pub session: SessionConfig,
    pub upload: UploadConfig,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub env: String,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

#[derive(Clone, Debug)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_uri: String,
    pub token_uri: String,
    pub api_base_url: String,
    pub upload_base_url: String,
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub secret_key: String,
    pub ttl_secs: i64,
    pub cookie_secure: bool,
}

#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub upload_dir: PathBuf,
    pub max_upload_bytes: u64,
    pub ffprobe_path: String,
    pub category_id: String,
}

/// Shape of the JSON file downloaded from the Google Cloud console.
#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    web: Option<ClientSecrets>,
    installed: Option<ClientSecrets>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    #[serde(default)]
    pub auth_uri: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl ClientSecrets {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::ClientSecrets {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&raw).map_err(|reason| ConfigError::ClientSecrets {
            path: path.display().to_string(),
            reason,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, String> {
        let file: ClientSecretsFile = serde_json::from_str(raw).map_err(|e| e.to_string())?;
        file.web
            .or(file.installed)
            .ok_or_else(|| "expected a top-level \"web\" or \"installed\" object".to_string())
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let app = AppConfig {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_var("APP_PORT", 5000)?,
            env,
        };

        let google = load_google_config()?;

        let secret_key = match std::env::var("SESSION_SECRET_KEY") {
            Ok(key) if !key.trim().is_empty() => key,
            _ if app.is_production() => return Err(ConfigError::Missing("SESSION_SECRET_KEY")),
            _ => {
                tracing::warn!("SESSION_SECRET_KEY not set; using development session secret");
                DEV_SESSION_SECRET.to_string()
            }
        };

        let session = SessionConfig {
            secret_key,
            ttl_secs: checked_session_ttl(parse_var("SESSION_TTL_SECS", 86_400)?)?,
            cookie_secure: app.is_production(),
        };

        let upload = UploadConfig {
            upload_dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("uploads")),
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            ffprobe_path: std::env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string()),
            category_id: std::env::var("YOUTUBE_CATEGORY_ID").unwrap_or_else(|_| "22".to_string()),
        };

        Ok(Config {
            app,
            google,
            session,
            upload,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.app.host, self.app.port)
    }
}

fn load_google_config() -> Result<GoogleConfig, ConfigError> {
    let env_id = std::env::var("GOOGLE_CLIENT_ID").ok().filter(|v| !v.is_empty());
    let env_secret = std::env::var("GOOGLE_CLIENT_SECRET")
        .ok()
        .filter(|v| !v.is_empty());
    let env_redirect = std::env::var("REDIRECT_URI").ok().filter(|v| !v.is_empty());

    let secrets_path = std::env::var("GOOGLE_CLIENT_SECRETS_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("client_secret.json"));

    let file_secrets = if env_id.is_some() && env_secret.is_some() {
        None
    } else if secrets_path.exists() {
        tracing::info!(path = %secrets_path.display(), "loading Google client secrets file");
        Some(ClientSecrets::from_file(&secrets_path)?)
    } else {
        None
    };

    let client_id = env_id
        .or_else(|| file_secrets.as_ref().map(|s| s.client_id.clone()))
        .ok_or(ConfigError::Missing("GOOGLE_CLIENT_ID"))?;
    let client_secret = env_secret
        .or_else(|| file_secrets.as_ref().map(|s| s.client_secret.clone()))
        .ok_or(ConfigError::Missing("GOOGLE_CLIENT_SECRET"))?;
    let redirect_uri = env_redirect
        .or_else(|| {
            file_secrets
                .as_ref()
                .and_then(|s| s.redirect_uris.first().cloned())
        })
        .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string());

    Ok(GoogleConfig {
        client_id,
        client_secret,
        redirect_uri,
        auth_uri: file_secrets
            .as_ref()
            .and_then(|s| s.auth_uri.clone())
            .unwrap_or_else(|| GOOGLE_AUTH_URI.to_string()),
        token_uri: file_secrets
            .as_ref()
            .and_then(|s| s.token_uri.clone())
            .unwrap_or_else(|| GOOGLE_TOKEN_URI.to_string()),
        api_base_url: YOUTUBE_API_BASE.to_string(),
        upload_base_url: YOUTUBE_UPLOAD_BASE.to_string(),
    })
}

fn checked_session_ttl(secs: i64) -> Result<i64, ConfigError> {
    if (1..=MAX_SESSION_TTL_SECS).contains(&secs) {
        Ok(secs)
    } else {
        Err(ConfigError::Invalid {
            name: "SESSION_TTL_SECS",
            reason: format!("must be between 1 and {}", MAX_SESSION_TTL_SECS),
        })
    }
}

fn parse_var<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
