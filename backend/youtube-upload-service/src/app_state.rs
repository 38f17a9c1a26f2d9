/// Shared state handed to every handler through `web::Data`.
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::services::{
    FfprobeProbe, GoogleOAuthProvider, OAuthProvider, TempStorage, UploadService, VideoProbe,
    YouTubeApi, YouTubeClient,
};
use crate::session::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: Arc<SessionStore>,
    pub oauth: Arc<dyn OAuthProvider>,
    pub youtube: Arc<dyn YouTubeApi>,
    pub uploads: Arc<UploadService>,
    pub temp_storage: TempStorage,
}

impl AppState {
    /// Assemble state from already-built collaborators.
    pub fn new(
        config: Config,
        oauth: Arc<dyn OAuthProvider>,
        youtube: Arc<dyn YouTubeApi>,
        probe: Arc<dyn VideoProbe>,
    ) -> Self {
        let sessions = Arc::new(SessionStore::new(
            &config.session.secret_key,
            config.session.ttl_secs,
            config.session.cookie_secure,
        ));
        let uploads = Arc::new(UploadService::new(
            youtube.clone(),
            probe,
            config.upload.category_id.clone(),
        ));
        let temp_storage = TempStorage::new(config.upload.upload_dir.clone());

        Self {
            config: Arc::new(config),
            sessions,
            oauth,
            youtube,
            uploads,
            temp_storage,
        }
    }

    /// Production wiring: Google endpoints and the local `ffprobe`.
    pub fn from_config(config: Config) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("youtube-upload-service/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let oauth: Arc<dyn OAuthProvider> =
            Arc::new(GoogleOAuthProvider::new(&config.google, http.clone()));
        let youtube: Arc<dyn YouTubeApi> = Arc::new(YouTubeClient::new(&config.google, http));
        let probe: Arc<dyn VideoProbe> =
            Arc::new(FfprobeProbe::new(config.upload.ffprobe_path.clone()));

        Ok(Self::new(config, oauth, youtube, probe))
    }
}
