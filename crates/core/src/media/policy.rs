//! Media acceptance policy: which files may be attached to a listing.
//!
//! Files are classified by content type (image or video) and checked against
//! a per-kind size ceiling. Anything else is rejected and dropped from the
//! accepted set; callers may surface the rejection reasons.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::MediaFile;

/// Largest accepted image (10 MiB).
pub const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

/// Largest accepted video (50 MiB).
pub const MAX_VIDEO_BYTES: u64 = 50 * 1024 * 1024;

/// Extension to content type, for files read from disk.
const CONTENT_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
    ("gif", "image/gif"),
    ("heic", "image/heic"),
    ("mp4", "video/mp4"),
    ("m4v", "video/x-m4v"),
    ("mov", "video/quicktime"),
    ("webm", "video/webm"),
    ("avi", "video/x-msvideo"),
];

/// Fallback when the extension is unknown.
pub const UNKNOWN_CONTENT_TYPE: &str = "application/octet-stream";

/// Kind of a media attachment, as stored by the backend (`media_type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify a content type. Returns `None` for anything that is neither
    /// an image nor a video.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let lower = content_type.to_ascii_lowercase();
        if lower.starts_with("image/") {
            Some(Self::Image)
        } else if lower.starts_with("video/") {
            Some(Self::Video)
        } else {
            None
        }
    }

    /// Backend `media_type` value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }

    /// Size ceiling for this kind.
    pub fn max_bytes(self) -> u64 {
        match self {
            Self::Image => MAX_IMAGE_BYTES,
            Self::Video => MAX_VIDEO_BYTES,
        }
    }
}

/// Guess a content type from a file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    ext.and_then(|ext| {
        CONTENT_TYPES
            .iter()
            .find(|(known, _)| *known == ext)
            .map(|(_, ct)| *ct)
    })
    .unwrap_or(UNKNOWN_CONTENT_TYPE)
}

/// Why a file was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("{file_name}: unsupported file type '{content_type}'")]
    UnsupportedType {
        file_name: String,
        content_type: String,
    },

    #[error("{file_name}: {size} bytes exceeds the {limit}-byte limit for {kind:?} files")]
    TooLarge {
        file_name: String,
        kind: MediaKind,
        size: u64,
        limit: u64,
    },
}

/// Check a single file against the policy, returning its kind on success.
pub fn check(file: &MediaFile) -> Result<MediaKind, Rejection> {
    let kind = MediaKind::from_content_type(&file.content_type).ok_or_else(|| {
        Rejection::UnsupportedType {
            file_name: file.file_name.clone(),
            content_type: file.content_type.clone(),
        }
    })?;

    let limit = kind.max_bytes();
    if file.size > limit {
        return Err(Rejection::TooLarge {
            file_name: file.file_name.clone(),
            kind,
            size: file.size,
            limit,
        });
    }

    Ok(kind)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn file(name: &str, content_type: &str, size: u64) -> MediaFile {
        MediaFile {
            path: PathBuf::from(name),
            file_name: name.to_string(),
            content_type: content_type.to_string(),
            size,
        }
    }

    #[test]
    fn accepts_images_and_videos_within_limits() {
        assert_eq!(check(&file("a.jpg", "image/jpeg", 1024)), Ok(MediaKind::Image));
        assert_eq!(
            check(&file("b.mp4", "video/mp4", MAX_VIDEO_BYTES)),
            Ok(MediaKind::Video)
        );
    }

    #[test]
    fn rejects_other_kinds() {
        let result = check(&file("doc.pdf", "application/pdf", 10));
        assert!(matches!(result, Err(Rejection::UnsupportedType { .. })));
    }

    #[test]
    fn size_ceiling_depends_on_kind() {
        let big_image = file("big.png", "image/png", MAX_IMAGE_BYTES + 1);
        assert!(matches!(check(&big_image), Err(Rejection::TooLarge { .. })));

        // The same size is fine for a video.
        let video = file("clip.mp4", "video/mp4", MAX_IMAGE_BYTES + 1);
        assert_eq!(check(&video), Ok(MediaKind::Video));

        let huge_video = file("long.mp4", "video/mp4", MAX_VIDEO_BYTES + 1);
        assert!(matches!(check(&huge_video), Err(Rejection::TooLarge { .. })));
    }

    #[test]
    fn content_type_for_extension() {
        assert_eq!(content_type_for(Path::new("x/goat.JPG")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("clip.mov")), "video/quicktime");
        assert_eq!(content_type_for(Path::new("notes.txt")), UNKNOWN_CONTENT_TYPE);
        assert_eq!(content_type_for(Path::new("noext")), UNKNOWN_CONTENT_TYPE);
    }

    #[test]
    fn kind_from_content_type_is_case_insensitive() {
        assert_eq!(MediaKind::from_content_type("IMAGE/PNG"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_content_type("text/plain"), None);
    }
}
