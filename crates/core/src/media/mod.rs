//! Media attachments of a listing form.
//!
//! Tracks newly attached local files (pending), media already stored by the
//! backend (existing), the queue of existing media to delete on submit, and
//! the single featured marker.

pub mod policy;
pub mod preview;
pub mod probe;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::MediaId;

pub use policy::{MediaKind, Rejection};
pub use preview::{PreviewHandle, PreviewRegistry};

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// A local file selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub path: PathBuf,
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
}

impl MediaFile {
    /// Describe the file at `path`, guessing its content type from the
    /// extension.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = tokio::fs::metadata(&path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self {
            content_type: policy::content_type_for(&path).to_string(),
            file_name,
            size: metadata.len(),
            path,
        })
    }
}

// ---------------------------------------------------------------------------
// Attachments
// ---------------------------------------------------------------------------

/// Identifies one attachment on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "source", content = "id", rename_all = "snake_case")]
pub enum AttachmentId {
    /// Client-generated id of a file not yet uploaded.
    Pending(Uuid),
    /// Backend id of stored media.
    Existing(MediaId),
}

/// A newly attached file. Owns its preview.
#[derive(Debug)]
pub struct PendingMedia {
    pub id: Uuid,
    pub file: MediaFile,
    pub kind: MediaKind,
    pub aspect_ratio: f64,
    preview: Option<PreviewHandle>,
}

impl PendingMedia {
    pub fn new(file: MediaFile, kind: MediaKind, aspect_ratio: f64, preview: PreviewHandle) -> Self {
        Self {
            id: Uuid::new_v4(),
            file,
            kind,
            aspect_ratio,
            preview: Some(preview),
        }
    }

    /// Preview URL, until previews are released.
    pub fn preview_url(&self) -> Option<&str> {
        self.preview.as_ref().map(PreviewHandle::url)
    }

    fn release_preview(&mut self) {
        if let Some(handle) = self.preview.take() {
            handle.release();
        }
    }
}

/// Media already stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistingMedia {
    pub id: MediaId,
    pub url: String,
    pub kind: MediaKind,
    pub aspect_ratio: f64,
    /// Whether the backend currently flags this item as featured.
    pub featured_on_server: bool,
}

/// One entry in the form's media list.
#[derive(Debug)]
pub enum MediaAttachment {
    Pending(PendingMedia),
    Existing(ExistingMedia),
}

impl MediaAttachment {
    pub fn id(&self) -> AttachmentId {
        match self {
            Self::Pending(p) => AttachmentId::Pending(p.id),
            Self::Existing(e) => AttachmentId::Existing(e.id),
        }
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            Self::Pending(p) => p.kind,
            Self::Existing(e) => e.kind,
        }
    }

    pub fn is_existing(&self) -> bool {
        matches!(self, Self::Existing(_))
    }
}

// ---------------------------------------------------------------------------
// Preparing new files
// ---------------------------------------------------------------------------

/// Result of running new files through the acceptance policy.
#[derive(Debug, Default)]
pub struct PreparedMedia {
    pub accepted: Vec<PendingMedia>,
    pub rejected: Vec<Rejection>,
}

/// Filter `files` through the acceptance policy, measure each accepted
/// file's aspect ratio, and allocate its preview.
///
/// Files are processed in order; rejected files are reported, not attached.
pub async fn prepare(files: Vec<MediaFile>, previews: &PreviewRegistry) -> PreparedMedia {
    let mut prepared = PreparedMedia::default();

    for file in files {
        match policy::check(&file) {
            Ok(kind) => {
                let aspect_ratio = probe::aspect_ratio_or_default(&file.path, kind).await;
                let preview = previews.create(&file);
                prepared
                    .accepted
                    .push(PendingMedia::new(file, kind, aspect_ratio, preview));
            }
            Err(rejection) => {
                tracing::info!(reason = %rejection, "Media file rejected");
                prepared.rejected.push(rejection);
            }
        }
    }

    prepared
}

// ---------------------------------------------------------------------------
// Media set
// ---------------------------------------------------------------------------

/// The ordered attachment list plus featured marker and deletion queue.
///
/// At most one attachment is featured. Removing the featured attachment
/// moves the marker to the first remaining existing attachment, else the
/// first remaining pending one, else nothing.
#[derive(Debug, Default)]
pub struct MediaSet {
    items: Vec<MediaAttachment>,
    featured: Option<AttachmentId>,
    deletion_queue: Vec<MediaId>,
}

impl MediaSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from backend media. The first item the backend flags as
    /// featured becomes the featured marker.
    pub fn from_existing(existing: Vec<ExistingMedia>) -> Self {
        let featured = existing
            .iter()
            .find(|m| m.featured_on_server)
            .map(|m| AttachmentId::Existing(m.id));
        Self {
            items: existing.into_iter().map(MediaAttachment::Existing).collect(),
            featured,
            deletion_queue: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[MediaAttachment] {
        &self.items
    }

    pub fn featured(&self) -> Option<AttachmentId> {
        self.featured
    }

    pub fn deletion_queue(&self) -> &[MediaId] {
        &self.deletion_queue
    }

    pub fn pending(&self) -> impl Iterator<Item = &PendingMedia> {
        self.items.iter().filter_map(|a| match a {
            MediaAttachment::Pending(p) => Some(p),
            MediaAttachment::Existing(_) => None,
        })
    }

    pub fn existing(&self) -> impl Iterator<Item = &ExistingMedia> {
        self.items.iter().filter_map(|a| match a {
            MediaAttachment::Existing(e) => Some(e),
            MediaAttachment::Pending(_) => None,
        })
    }

    pub fn contains(&self, id: AttachmentId) -> bool {
        self.items.iter().any(|a| a.id() == id)
    }

    /// Append newly prepared attachments.
    pub fn attach(&mut self, pending: Vec<PendingMedia>) {
        self.items
            .extend(pending.into_iter().map(MediaAttachment::Pending));
    }

    /// Remove an attachment.
    ///
    /// A pending attachment's preview is revoked immediately. An existing
    /// attachment is queued for deletion on submit. Returns `false` if `id`
    /// is not on the form.
    pub fn remove(&mut self, id: AttachmentId) -> bool {
        let Some(index) = self.items.iter().position(|a| a.id() == id) else {
            return false;
        };

        match self.items.remove(index) {
            MediaAttachment::Pending(mut p) => p.release_preview(),
            MediaAttachment::Existing(e) => {
                if !self.deletion_queue.contains(&e.id) {
                    self.deletion_queue.push(e.id);
                }
            }
        }

        if self.featured == Some(id) {
            self.featured = self.fallback_featured();
        }
        true
    }

    /// Mark `id` as featured. No-op (returns `false`) if `id` is not present.
    pub fn set_featured(&mut self, id: AttachmentId) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.featured = Some(id);
        true
    }

    /// Record that pending attachment `pending_id` is now stored by the
    /// backend as `stored`, keeping its position and featured marker.
    pub fn promote(&mut self, pending_id: Uuid, stored: ExistingMedia) -> bool {
        let old = AttachmentId::Pending(pending_id);
        let Some(slot) = self.items.iter_mut().find(|a| a.id() == old) else {
            return false;
        };

        let new = AttachmentId::Existing(stored.id);
        // Dropping the replaced pending entry revokes its preview.
        *slot = MediaAttachment::Existing(stored);
        if self.featured == Some(old) {
            self.featured = Some(new);
        }
        true
    }

    /// Revoke every pending preview. The attachments themselves stay.
    pub fn release_previews(&mut self) {
        for item in &mut self.items {
            if let MediaAttachment::Pending(p) = item {
                p.release_preview();
            }
        }
    }

    /// Hand over the deletion queue, leaving it empty.
    pub fn take_deletion_queue(&mut self) -> Vec<MediaId> {
        std::mem::take(&mut self.deletion_queue)
    }

    /// Update the server-side featured flags after the backend has been
    /// told which item is featured.
    pub fn mark_featured_on_server(&mut self, id: MediaId) {
        for item in &mut self.items {
            if let MediaAttachment::Existing(e) = item {
                e.featured_on_server = e.id == id;
            }
        }
    }

    fn fallback_featured(&self) -> Option<AttachmentId> {
        self.items
            .iter()
            .find(|a| a.is_existing())
            .or_else(|| self.items.first())
            .map(MediaAttachment::id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
