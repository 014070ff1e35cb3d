//! Aspect-ratio detection for attached media.
//!
//! Images are measured from their header with the `image` crate; videos are
//! measured with `ffprobe`. The gallery lays media out by width / height, so
//! any failure falls back to a square ratio.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::policy::MediaKind;

/// Ratio used when the file cannot be decoded.
pub const DEFAULT_ASPECT_RATIO: f64 = 1.0;

/// Error type for dimension probing.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("ffprobe binary not found: {0}")]
    FfprobeNotFound(std::io::Error),

    #[error("ffprobe execution failed (exit code {exit_code:?}): {stderr}")]
    FfprobeFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("failed to parse ffprobe output: {0}")]
    Parse(String),

    #[error("no video stream with dimensions in {0}")]
    NoVideoStream(String),

    #[error("degenerate dimensions {width}x{height}")]
    Degenerate { width: u32, height: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("probe task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

// ---------------------------------------------------------------------------
// ffprobe JSON output structures
// ---------------------------------------------------------------------------

/// Subset of `ffprobe -print_format json -show_streams` output.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Width / height of the media at `path`, or [`DEFAULT_ASPECT_RATIO`] if
/// it cannot be determined.
pub async fn aspect_ratio_or_default(path: &Path, kind: MediaKind) -> f64 {
    match dimensions(path, kind).await.and_then(|(w, h)| ratio(w, h)) {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!(
                path = %path.display(),
                kind = kind.as_str(),
                error = %e,
                "Falling back to default aspect ratio",
            );
            DEFAULT_ASPECT_RATIO
        }
    }
}

/// Natural `(width, height)` of the media at `path`.
pub async fn dimensions(path: &Path, kind: MediaKind) -> Result<(u32, u32), ProbeError> {
    match kind {
        MediaKind::Image => image_dimensions(path.to_path_buf()).await,
        MediaKind::Video => video_dimensions(path).await,
    }
}

/// Width / height, rejecting zero-sized media.
pub fn ratio(width: u32, height: u32) -> Result<f64, ProbeError> {
    if width == 0 || height == 0 {
        return Err(ProbeError::Degenerate { width, height });
    }
    Ok(f64::from(width) / f64::from(height))
}

async fn image_dimensions(path: PathBuf) -> Result<(u32, u32), ProbeError> {
    tokio::task::spawn_blocking(move || -> Result<(u32, u32), ProbeError> {
        let reader = image::ImageReader::open(&path)?.with_guessed_format()?;
        Ok(reader.into_dimensions()?)
    })
    .await?
}

async fn video_dimensions(path: &Path) -> Result<(u32, u32), ProbeError> {
    let output = tokio::process::Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_streams",
            "-select_streams",
            "v:0",
        ])
        .arg(path)
        .output()
        .await
        .map_err(ProbeError::FfprobeNotFound)?;

    if !output.status.success() {
        return Err(ProbeError::FfprobeFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_video_dimensions(&stdout)
        .ok_or_else(|| ProbeError::NoVideoStream(path.to_string_lossy().to_string()))?
}

/// Pull the first video stream's dimensions out of ffprobe JSON.
fn parse_video_dimensions(json: &str) -> Option<Result<(u32, u32), ProbeError>> {
    let probe = match serde_json::from_str::<FfprobeOutput>(json) {
        Ok(p) => p,
        Err(e) => return Some(Err(ProbeError::Parse(format!("{e}: {json}")))),
    };
    probe
        .streams
        .iter()
        .filter(|s| s.codec_type.as_deref() == Some("video"))
        .find_map(|s| Some(Ok((s.width?, s.height?))))
}
