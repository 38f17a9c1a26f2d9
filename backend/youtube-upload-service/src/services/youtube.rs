/// YouTube Data API v3 client
///
/// Covers the two calls the service needs: `channels.list` to greet the
/// signed-in user and `videos.insert` through the resumable upload protocol:
/// a POST with the video resource returns a session URI in `Location`, then a
/// single PUT streams the file body to that URI.
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::config::GoogleConfig;
use crate::models::Visibility;

#[derive(Debug, Error)]
pub enum YouTubeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("YouTube API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("upload session URI missing from response")]
    MissingUploadLocation,

    #[error("failed to read video file: {0}")]
    Io(#[from] std::io::Error),

    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

/// Metadata sent with `videos.insert`.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub category_id: String,
    pub visibility: Visibility,
    pub content_type: String,
}

#[derive(Debug, Serialize)]
struct VideoSnippet<'a> {
    title: &'a str,
    description: &'a str,
    tags: &'a [String],
    #[serde(rename = "categoryId")]
    category_id: &'a str,
}

#[derive(Debug, Serialize)]
struct VideoStatus {
    #[serde(rename = "privacyStatus")]
    privacy_status: Visibility,
}

#[derive(Debug, Serialize)]
struct VideoResource<'a> {
    snippet: VideoSnippet<'a>,
    status: VideoStatus,
}

#[derive(Debug, Deserialize)]
struct InsertedVideo {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
    snippet: ChannelSnippet,
}

#[derive(Debug, Deserialize)]
struct ChannelSnippet {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[async_trait]
pub trait YouTubeApi: Send + Sync {
    /// Title of the caller's own channel, if they have one.
    async fn channel_title(&self, access_token: &str) -> Result<Option<String>, YouTubeError>;

    /// Upload `file` and return the new video id.
    async fn upload_video(
        &self,
        access_token: &str,
        file: &Path,
        metadata: &VideoMetadata,
    ) -> Result<String, YouTubeError>;
}

#[derive(Debug, Clone)]
pub struct YouTubeClient {
    http: Client,
    api_base_url: String,
    upload_base_url: String,
}

impl YouTubeClient {
    pub fn new(config: &GoogleConfig, http: Client) -> Self {
        Self::with_endpoints(http, &config.api_base_url, &config.upload_base_url)
    }

    pub fn with_endpoints(http: Client, api_base_url: &str, upload_base_url: &str) -> Self {
        Self {
            http,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            upload_base_url: upload_base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn start_resumable_session(
        &self,
        access_token: &str,
        file_size: u64,
        metadata: &VideoMetadata,
    ) -> Result<String, YouTubeError> {
        let resource = VideoResource {
            snippet: VideoSnippet {
                title: &metadata.title,
                description: &metadata.description,
                tags: &metadata.tags,
                category_id: &metadata.category_id,
            },
            status: VideoStatus {
                privacy_status: metadata.visibility,
            },
        };

        let response = self
            .http
            .post(format!("{}/videos", self.upload_base_url))
            .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
            .header(AUTHORIZATION, format!("Bearer {}", access_token))
            .header("X-Upload-Content-Type", metadata.content_type.as_str())
            .header("X-Upload-Content-Length", file_size.to_string())
            .json(&resource)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or(YouTubeError::MissingUploadLocation)
    }
}

#[async_trait]
impl YouTubeApi for YouTubeClient {
    async fn channel_title(&self, access_token: &str) -> Result<Option<String>, YouTubeError> {
        let response = self
            .http
            .get(format!("{}/channels", self.api_base_url))
            .query(&[("part", "snippet"), ("mine", "true")])
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let channels: ChannelListResponse = response.json().await?;
        Ok(channels.items.into_iter().next().map(|c| c.snippet.title))
    }

    async fn upload_video(
        &self,
        access_token: &str,
        file: &Path,
        metadata: &VideoMetadata,
    ) -> Result<String, YouTubeError> {
        let file_size = tokio::fs::metadata(file).await?.len();
        let session_uri = self
            .start_resumable_session(access_token, file_size, metadata)
            .await?;

        tracing::debug!(file_size, "resumable upload session opened");

        let body = tokio::fs::File::open(file).await?;
        let response = self
            .http
            .put(&session_uri)
            .header(AUTHORIZATION, format!("Bearer {}", access_token))
            .header(CONTENT_TYPE, metadata.content_type.as_str())
            .header(CONTENT_LENGTH, file_size)
            .body(reqwest::Body::from(body))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => {
                let inserted: InsertedVideo = response.json().await?;
                tracing::info!(video_id = %inserted.id, "video uploaded to YouTube");
                Ok(inserted.id)
            }
            // 308 means the server kept only part of the body
            StatusCode::PERMANENT_REDIRECT => Err(YouTubeError::InvalidResponse(
                "upload incomplete".to_string(),
            )),
            _ => Err(api_error(response).await),
        }
    }
}

async fn api_error(response: reqwest::Response) -> YouTubeError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    YouTubeError::Api { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_resource_serializes_to_api_shape() {
        let tags = vec!["rust".to_string()];
        let resource = VideoResource {
            snippet: VideoSnippet {
                title: "Title",
                description: "Desc",
                tags: &tags,
                category_id: "22",
            },
            status: VideoStatus {
                privacy_status: Visibility::Unlisted,
            },
        };

        let json = serde_json::to_value(&resource).unwrap();
        assert_eq!(json["snippet"]["categoryId"], "22");
        assert_eq!(json["snippet"]["tags"][0], "rust");
        assert_eq!(json["status"]["privacyStatus"], "unlisted");
    }

    #[test]
    fn endpoints_drop_trailing_slash() {
        let client = YouTubeClient::with_endpoints(Client::new(), "http://api/", "http://up//");
        assert_eq!(client.api_base_url, "http://api");
        assert_eq!(client.upload_base_url, "http://up");
    }
}
