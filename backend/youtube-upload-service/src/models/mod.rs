//! Request/response models for the upload flow.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::services::temp_storage::TempFile;

pub const DEFAULT_TITLE: &str = "Başlık Girilmedi";
pub const DEFAULT_DESCRIPTION: &str = "Açıklama girilmedi";
pub const SHORTS_HASHTAG: &str = "#Shorts";

/// YouTube privacy status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Unlisted,
    Private,
}

impl Visibility {
    /// Unknown or missing values fall back to public.
    pub fn normalize(raw: Option<&str>) -> Self {
        match raw.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("unlisted") => Visibility::Unlisted,
            Some("private") => Visibility::Private,
            _ => Visibility::Public,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Unlisted => "unlisted",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final classification of an uploaded video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoKind {
    Normal,
    Short,
}

/// What the user picked on the upload form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestedKind {
    #[default]
    Normal,
    Shorts,
    Auto,
}

impl RequestedKind {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("shorts") | Some("short") => RequestedKind::Shorts,
            Some("auto") => RequestedKind::Auto,
            _ => RequestedKind::Normal,
        }
    }

    /// Explicit choices win; `Auto` defers to the probe result.
    pub fn resolve(self, detected: VideoKind) -> VideoKind {
        match self {
            RequestedKind::Normal => VideoKind::Normal,
            RequestedKind::Shorts => VideoKind::Short,
            RequestedKind::Auto => detected,
        }
    }
}

/// Containers accepted by the upload endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoContainer {
    Mp4,
    Mov,
    Avi,
    Mkv,
    Flv,
    Wmv,
    Webm,
}

impl VideoContainer {
    pub const ALL: [VideoContainer; 7] = [
        VideoContainer::Mp4,
        VideoContainer::Mov,
        VideoContainer::Avi,
        VideoContainer::Mkv,
        VideoContainer::Flv,
        VideoContainer::Wmv,
        VideoContainer::Webm,
    ];

    /// Matches on the final extension, case-insensitively. Leading dots
    /// belong to the stem, so `.mp4` has no extension.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.trim_start_matches('.').rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "mp4" => Some(VideoContainer::Mp4),
            "mov" => Some(VideoContainer::Mov),
            "avi" => Some(VideoContainer::Avi),
            "mkv" => Some(VideoContainer::Mkv),
            "flv" => Some(VideoContainer::Flv),
            "wmv" => Some(VideoContainer::Wmv),
            "webm" => Some(VideoContainer::Webm),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            VideoContainer::Mp4 => "mp4",
            VideoContainer::Mov => "mov",
            VideoContainer::Avi => "avi",
            VideoContainer::Mkv => "mkv",
            VideoContainer::Flv => "flv",
            VideoContainer::Wmv => "wmv",
            VideoContainer::Webm => "webm",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            VideoContainer::Mp4 => "video/mp4",
            VideoContainer::Mov => "video/quicktime",
            VideoContainer::Avi => "video/x-msvideo",
            VideoContainer::Mkv => "video/x-matroska",
            VideoContainer::Flv => "video/x-flv",
            VideoContainer::Wmv => "video/x-ms-wmv",
            VideoContainer::Webm => "video/webm",
        }
    }

    /// ".mp4, .mov, ..." for error messages.
    pub fn allowed_list() -> String {
        Self::ALL
            .iter()
            .map(|c| format!(".{}", c.extension()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Summary of the probed video, embedded in the upload response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoAnalysis {
    pub duration_seconds: f64,
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: f64,
    pub classification: VideoKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// A received upload, already written to disk.
#[derive(Debug)]
pub struct UploadForm {
    pub file: TempFile,
    pub original_filename: String,
    pub container: VideoContainer,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub visibility: Visibility,
    pub requested_kind: RequestedKind,
}

/// Success body of `POST /upload-video`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(rename = "basarili")]
    pub success: bool,
    pub video_id: String,
    #[serde(rename = "video_linki")]
    pub video_url: String,
    #[serde(rename = "gizlilik")]
    pub visibility: Visibility,
    #[serde(rename = "video_tipi")]
    pub video_kind: VideoKind,
    #[serde(rename = "video_analiz")]
    pub analysis: VideoAnalysis,
}

/// Splits a comma-separated tag field, dropping blanks.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Human-readable size for messages: "5 GB", "512 MB", "900 KB".
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    match bytes {
        b if b >= GB && b % GB == 0 => format!("{} GB", b / GB),
        b if b >= GB => format!("{:.1} GB", b as f64 / GB as f64),
        b if b >= MB => format!("{} MB", b / MB),
        b if b >= KB => format!("{} KB", b / KB),
        b => format!("{} B", b),
    }
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}
