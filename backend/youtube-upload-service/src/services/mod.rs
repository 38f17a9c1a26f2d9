//! Business services: Google OAuth, YouTube Data API, video probing and the
//! upload pipeline that ties them together.

pub mod oauth;
pub mod temp_storage;
pub mod upload;
pub mod video_probe;
pub mod youtube;

pub use oauth::{GoogleOAuthProvider, OAuthCredentials, OAuthError, OAuthProvider};
pub use temp_storage::TempStorage;
pub use upload::UploadService;
pub use video_probe::{FfprobeProbe, VideoProbe};
pub use youtube::{YouTubeApi, YouTubeClient, YouTubeError};
