//! Local preview handles for pending media.
//!
//! A [`PreviewHandle`] stands for a locally allocated preview URL. The
//! [`PreviewRegistry`] that created it tracks every live URL; the handle
//! releases its URL exactly once, when it is dropped or explicitly
//! [released](PreviewHandle::release).

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use super::MediaFile;

/// URL scheme prefix of generated previews.
pub const PREVIEW_SCHEME: &str = "preview:";

/// Allocates preview URLs and keeps count of the ones still alive.
#[derive(Debug, Clone, Default)]
pub struct PreviewRegistry {
    live: Arc<Mutex<HashSet<String>>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a preview URL for `file`.
    pub fn create(&self, file: &MediaFile) -> PreviewHandle {
        let url = format!("{PREVIEW_SCHEME}{}/{}", Uuid::new_v4(), file.file_name);
        self.with_live(|live| {
            live.insert(url.clone());
        });
        tracing::trace!(url = %url, "Preview created");
        PreviewHandle {
            url,
            registry: self.clone(),
        }
    }

    /// Number of previews not yet released.
    pub fn live_count(&self) -> usize {
        self.with_live(|live| live.len())
    }

    /// Whether `url` is still allocated.
    pub fn is_live(&self, url: &str) -> bool {
        self.with_live(|live| live.contains(url))
    }

    fn revoke(&self, url: &str) {
        let removed = self.with_live(|live| live.remove(url));
        if removed {
            tracing::trace!(url = %url, "Preview revoked");
        }
    }

    fn with_live<R>(&self, f: impl FnOnce(&mut HashSet<String>) -> R) -> R {
        // A poisoned set is still a valid set of strings.
        let mut guard = match self.live.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }
}

/// Owned preview URL. Revoked on drop.
#[derive(Debug)]
pub struct PreviewHandle {
    url: String,
    registry: PreviewRegistry,
}

impl PreviewHandle {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Revoke the URL now instead of at drop.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.registry.revoke(&self.url);
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn file() -> MediaFile {
        MediaFile {
            path: PathBuf::from("goat.jpg"),
            file_name: "goat.jpg".into(),
            content_type: "image/jpeg".into(),
            size: 10,
        }
    }

    #[test]
    fn handle_drop_revokes_url() {
        let registry = PreviewRegistry::new();
        let handle = registry.create(&file());
        let url = handle.url().to_string();
        assert!(url.starts_with(PREVIEW_SCHEME));
        assert!(registry.is_live(&url));

        drop(handle);
        assert!(!registry.is_live(&url));
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn explicit_release() {
        let registry = PreviewRegistry::new();
        let a = registry.create(&file());
        let _b = registry.create(&file());
        assert_eq!(registry.live_count(), 2);

        a.release();
        assert_eq!(registry.live_count(), 1);
    }

    #[test]
    fn urls_are_unique() {
        let registry = PreviewRegistry::new();
        let a = registry.create(&file());
        let b = registry.create(&file());
        assert_ne!(a.url(), b.url());
    }
}
