/// Upload pipeline
///
/// Runs the classifier against the received file, builds the YouTube
/// metadata and performs the transfer. The temporary file is removed once
/// the transfer finishes, whatever the outcome, or when the future is dropped.
use std::sync::Arc;

use crate::error::Result;
use crate::models::{
    watch_url, UploadForm, UploadResponse, VideoKind, SHORTS_HASHTAG,
};
use crate::services::video_probe::{self, VideoProbe};
use crate::services::youtube::{VideoMetadata, YouTubeApi};

pub struct UploadService {
    youtube: Arc<dyn YouTubeApi>,
    probe: Arc<dyn VideoProbe>,
    category_id: String,
}

impl UploadService {
    pub fn new(
        youtube: Arc<dyn YouTubeApi>,
        probe: Arc<dyn VideoProbe>,
        category_id: impl Into<String>,
    ) -> Self {
        Self {
            youtube,
            probe,
            category_id: category_id.into(),
        }
    }

    /// Classify, upload and clean up.
    pub async fn publish(&self, access_token: &str, form: UploadForm) -> Result<UploadResponse> {
        let result = self.transfer(access_token, &form).await;
        form.file.remove().await;
        result
    }

    async fn transfer(&self, access_token: &str, form: &UploadForm) -> Result<UploadResponse> {
        let analysis = video_probe::analyze(self.probe.as_ref(), form.file.path()).await;
        let video_kind = form.requested_kind.resolve(analysis.classification);

        tracing::info!(
            file = %form.original_filename,
            requested = ?form.requested_kind,
            detected = ?analysis.classification,
            resolved = ?video_kind,
            visibility = %form.visibility,
            "uploading video"
        );

        let metadata = self.build_metadata(form, video_kind);
        let video_id = self
            .youtube
            .upload_video(access_token, form.file.path(), &metadata)
            .await?;

        Ok(UploadResponse {
            success: true,
            video_url: watch_url(&video_id),
            video_id,
            visibility: form.visibility,
            video_kind,
            analysis,
        })
    }

    fn build_metadata(&self, form: &UploadForm, video_kind: VideoKind) -> VideoMetadata {
        let mut description = form.description.clone();
        let mut tags = form.tags.clone();

        if video_kind == VideoKind::Short {
            if !description.to_lowercase().contains("#shorts") {
                if !description.is_empty() {
                    description.push_str("\n\n");
                }
                description.push_str(SHORTS_HASHTAG);
            }
            if !tags.iter().any(|t| t.eq_ignore_ascii_case("shorts")) {
                tags.push("Shorts".to_string());
            }
        }

        VideoMetadata {
            title: form.title.clone(),
            description,
            tags,
            category_id: self.category_id.clone(),
            visibility: form.visibility,
            content_type: form.container.mime_type().to_string(),
        }
    }
}
