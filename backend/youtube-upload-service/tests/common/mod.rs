//! Shared fixtures for integration tests
//!
//! Fake OAuth provider, YouTube API and video probe, a config pointing at a
//! temporary upload directory, and helpers for multipart bodies and
//! signed-in sessions.
#![allow(dead_code)]

use actix_web::cookie::Cookie;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use youtube_upload_service::config::{
    AppConfig, Config, GoogleConfig, SessionConfig, UploadConfig, DEFAULT_MAX_UPLOAD_BYTES,
};
use youtube_upload_service::services::oauth::{OAuthCredentials, OAuthError, OAuthProvider, SCOPES};
use youtube_upload_service::services::video_probe::{ProbeError, StreamInfo, VideoProbe};
use youtube_upload_service::services::youtube::{VideoMetadata, YouTubeApi, YouTubeError};
use youtube_upload_service::AppState;

pub const FAKE_AUTH_URL: &str = "https://accounts.test/o/oauth2/auth";
pub const GOOD_CODE: &str = "good-code";
pub const CHANNEL_TITLE: &str = "Test Kanalı";
pub const UPLOADED_VIDEO_ID: &str = "vid123";

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeOAuth {
    pub exchange_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
}

#[async_trait]
impl OAuthProvider for FakeOAuth {
    fn authorization_url(&self, state: &str) -> String {
        format!("{}?response_type=code&state={}", FAKE_AUTH_URL, state)
    }

    async fn exchange_code(&self, code: &str) -> Result<OAuthCredentials, OAuthError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        if code == GOOD_CODE {
            Ok(credentials("access-from-code", Duration::hours(1)))
        } else {
            Err(OAuthError::TokenExchange("invalid_grant".to_string()))
        }
    }

    async fn refresh(&self, current: &OAuthCredentials) -> Result<OAuthCredentials, OAuthError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        Ok(OAuthCredentials {
            access_token: "refreshed-token".to_string(),
            expires_at: Some(Utc::now() + Duration::hours(1)),
            ..current.clone()
        })
    }
}

#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub access_token: String,
    pub metadata: VideoMetadata,
    pub file_size: u64,
}

#[derive(Default)]
pub struct FakeYouTube {
    pub fail_upload: bool,
    pub fail_channel_lookup: bool,
    pub uploads: Mutex<Vec<RecordedUpload>>,
}

impl FakeYouTube {
    pub fn failing() -> Self {
        Self {
            fail_upload: true,
            ..Default::default()
        }
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub fn last_upload(&self) -> RecordedUpload {
        self.uploads
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no upload recorded")
    }
}

#[async_trait]
impl YouTubeApi for FakeYouTube {
    async fn channel_title(&self, _access_token: &str) -> Result<Option<String>, YouTubeError> {
        if self.fail_channel_lookup {
            return Err(YouTubeError::Api {
                status: 403,
                message: "forbidden".to_string(),
            });
        }
        Ok(Some(CHANNEL_TITLE.to_string()))
    }

    async fn upload_video(
        &self,
        access_token: &str,
        file: &Path,
        metadata: &VideoMetadata,
    ) -> Result<String, YouTubeError> {
        let file_size = tokio::fs::metadata(file).await?.len();
        self.uploads.lock().unwrap().push(RecordedUpload {
            access_token: access_token.to_string(),
            metadata: metadata.clone(),
            file_size,
        });

        if self.fail_upload {
            return Err(YouTubeError::Api {
                status: 403,
                message: "quotaExceeded".to_string(),
            });
        }
        Ok(UPLOADED_VIDEO_ID.to_string())
    }
}

/// Probe returning fixed stream info, or failing when `None`.
pub struct FakeProbe(pub Option<StreamInfo>);

impl FakeProbe {
    /// 720x1280, 30 fps, 900 frames: a 30 second portrait clip.
    pub fn portrait_30s() -> Self {
        FakeProbe(Some(StreamInfo {
            width: 720,
            height: 1280,
            frame_rate: 30.0,
            frame_count: 900.0,
        }))
    }

    pub fn landscape_10min() -> Self {
        FakeProbe(Some(StreamInfo {
            width: 1920,
            height: 1080,
            frame_rate: 25.0,
            frame_count: 15_000.0,
        }))
    }

    pub fn broken() -> Self {
        FakeProbe(None)
    }
}

#[async_trait]
impl VideoProbe for FakeProbe {
    async fn probe(&self, _path: &Path) -> Result<StreamInfo, ProbeError> {
        self.0
            .ok_or_else(|| ProbeError::Failed("Invalid data found when processing input".into()))
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

pub fn test_config(upload_dir: &Path) -> Config {
    Config {
        app: AppConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            env: "test".to_string(),
        },
        google: GoogleConfig {
            client_id: "test-client-id".to_string(),
            client_secret: "test-client-secret".to_string(),
            redirect_uri: "http://localhost:5000/oauth2callback".to_string(),
            auth_uri: FAKE_AUTH_URL.to_string(),
            token_uri: "https://oauth.test/token".to_string(),
            api_base_url: "https://youtube.test/youtube/v3".to_string(),
            upload_base_url: "https://youtube.test/upload/youtube/v3".to_string(),
        },
        session: SessionConfig {
            secret_key: "integration-test-session-secret".to_string(),
            ttl_secs: 3600,
            cookie_secure: false,
        },
        upload: UploadConfig {
            upload_dir: upload_dir.to_path_buf(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            ffprobe_path: "ffprobe".to_string(),
            category_id: "22".to_string(),
        },
    }
}

pub struct TestContext {
    pub state: AppState,
    pub oauth: Arc<FakeOAuth>,
    pub youtube: Arc<FakeYouTube>,
    pub upload_dir: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        Self::build(FakeYouTube::default(), FakeProbe::portrait_30s(), |_| {})
    }

    pub fn build(youtube: FakeYouTube, probe: FakeProbe, tweak: impl FnOnce(&mut Config)) -> Self {
        let upload_dir = tempfile::tempdir().expect("temp upload dir");
        let mut config = test_config(upload_dir.path());
        tweak(&mut config);

        let oauth = Arc::new(FakeOAuth::default());
        let youtube = Arc::new(youtube);
        let state = AppState::new(config, oauth.clone(), youtube.clone(), Arc::new(probe));

        Self {
            state,
            oauth,
            youtube,
            upload_dir,
        }
    }

    /// Cookie for a fresh session holding valid credentials.
    pub fn signed_in(&self) -> Cookie<'static> {
        self.signed_in_with(credentials("access-token", Duration::hours(1)))
    }

    pub fn signed_in_with(&self, creds: OAuthCredentials) -> Cookie<'static> {
        let pending = self.state.sessions.create();
        let session = self
            .state
            .sessions
            .sign_in(pending.id, creds, Some(CHANNEL_TITLE.to_string()))
            .expect("signed-in session");
        self.state.sessions.session_cookie(session.id)
    }

    pub fn upload_dir_is_empty(&self) -> bool {
        std::fs::read_dir(self.upload_dir.path())
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(true)
    }
}

pub fn credentials(access_token: &str, valid_for: Duration) -> OAuthCredentials {
    OAuthCredentials {
        access_token: access_token.to_string(),
        refresh_token: Some("1//refresh-token".to_string()),
        token_uri: "https://oauth.test/token".to_string(),
        scopes: SCOPES.iter().map(|s| s.to_string()).collect(),
        expires_at: Some(Utc::now() + valid_for),
    }
}

// ---------------------------------------------------------------------------
// Multipart
// ---------------------------------------------------------------------------

pub const BOUNDARY: &str = "----youtube-upload-test-boundary";

/// Builds a `multipart/form-data` body; the file part (if any) comes first,
/// as the upload page sends it.
pub fn multipart_body(file: Option<(&str, &[u8])>, fields: &[(&str, &str)]) -> (String, Vec<u8>) {
    let mut body = Vec::new();

    if let Some((filename, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"video_dosyasi\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }

    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }

    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    (format!("multipart/form-data; boundary={}", BOUNDARY), body)
}
