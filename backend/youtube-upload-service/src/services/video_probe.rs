/// Video probing and Shorts classification
///
/// Metadata comes from `ffprobe`; the classification itself is plain
/// arithmetic over width, height, frame rate and frame count.
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tokio::process::Command;

use crate::models::{VideoAnalysis, VideoKind};

/// Longest duration (seconds) still eligible for Shorts.
pub const SHORTS_MAX_DURATION_SECS: f64 = 60.0;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("ffprobe spawn error: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("ffprobe failed: {0}")]
    Failed(String),

    #[error("ffprobe json parse: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no video stream found")]
    NoVideoStream,
}

/// Raw numbers read from the first video stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
    pub frame_count: f64,
}

#[async_trait]
pub trait VideoProbe: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<StreamInfo, ProbeError>;
}

/// [`VideoProbe`] backed by the `ffprobe` executable.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    binary: String,
}

impl FfprobeProbe {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl VideoProbe for FfprobeProbe {
    async fn probe(&self, path: &Path) -> Result<StreamInfo, ProbeError> {
        let output = Command::new(&self.binary)
            .arg("-v")
            .arg("error")
            .arg("-show_streams")
            .arg("-show_format")
            .arg("-of")
            .arg("json")
            .arg(path)
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProbeError::Failed(stderr.trim().to_string()));
        }

        parse_ffprobe_json(&output.stdout)
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    #[serde(default)]
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    #[serde(default)]
    codec_type: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    avg_frame_rate: Option<String>,
    #[serde(default)]
    r_frame_rate: Option<String>,
    #[serde(default)]
    nb_frames: Option<String>,
    #[serde(default)]
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    #[serde(default)]
    duration: Option<String>,
}

/// Extract [`StreamInfo`] from `ffprobe -of json` output.
///
/// When the container does not record `nb_frames` the frame count is
/// reconstructed from the stream (or container) duration.
pub fn parse_ffprobe_json(bytes: &[u8]) -> Result<StreamInfo, ProbeError> {
    let output: FfprobeOutput = serde_json::from_slice(bytes)?;

    let stream = output
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or(ProbeError::NoVideoStream)?;

    let frame_rate = [&stream.avg_frame_rate, &stream.r_frame_rate]
        .into_iter()
        .filter_map(|r| r.as_deref().and_then(parse_rational))
        .find(|fps| *fps > 0.0)
        .unwrap_or(0.0);

    let duration = stream
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .or_else(|| {
            output
                .format
                .as_ref()
                .and_then(|f| f.duration.as_deref())
                .and_then(|d| d.parse::<f64>().ok())
        });

    let frame_count = stream
        .nb_frames
        .as_deref()
        .and_then(|n| n.parse::<f64>().ok())
        .filter(|n| *n > 0.0)
        .or_else(|| duration.map(|d| (d * frame_rate).round()))
        .unwrap_or(0.0);

    Ok(StreamInfo {
        width: stream.width.unwrap_or(0),
        height: stream.height.unwrap_or(0),
        frame_rate,
        frame_count,
    })
}

/// "30000/1001" -> 29.97; "0/0" -> None.
fn parse_rational(raw: &str) -> Option<f64> {
    match raw.split_once('/') {
        Some((n, d)) => {
            let n = n.trim().parse::<f64>().ok()?;
            let d = d.trim().parse::<f64>().ok()?;
            (d > 0.0).then(|| n / d)
        }
        None => raw.trim().parse::<f64>().ok(),
    }
}

/// Shorts heuristic: at most 60 seconds and portrait.
pub fn classify(info: StreamInfo) -> VideoAnalysis {
    let duration = if info.frame_rate > 0.0 {
        info.frame_count / info.frame_rate
    } else {
        0.0
    };
    let aspect_ratio = if info.height > 0 {
        f64::from(info.width) / f64::from(info.height)
    } else {
        1.0
    };

    let classification = if duration <= SHORTS_MAX_DURATION_SECS && aspect_ratio < 1.0 {
        VideoKind::Short
    } else {
        VideoKind::Normal
    };

    VideoAnalysis {
        duration_seconds: round2(duration),
        width: info.width,
        height: info.height,
        aspect_ratio: round2(aspect_ratio),
        classification,
        warning: None,
    }
}

/// Probe and classify; an unreadable file yields "normal" plus a warning.
pub async fn analyze(probe: &dyn VideoProbe, path: &Path) -> VideoAnalysis {
    match probe.probe(path).await {
        Ok(info) => classify(info),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "video probe failed; assuming normal video");
            VideoAnalysis {
                duration_seconds: 0.0,
                width: 0,
                height: 0,
                aspect_ratio: 1.0,
                classification: VideoKind::Normal,
                warning: Some(format!("Video analiz edilemedi: {}", err)),
            }
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
