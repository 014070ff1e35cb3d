//! JSON listing manifest consumed by the CLI.
//!
//! Every field is optional; present fields override what the form already
//! holds (a resumed draft or a stored listing). Media paths are resolved
//! relative to the manifest file.
//!
//! ```json
//! {
//!   "name": "Premium Boer Goat Buck",
//!   "category_id": "6f1c2d1e-8a3b-4c55-9f7e-0d2b1a3c4e5f",
//!   "gender": "M",
//!   "price": 250000,
//!   "vaccinations": [{ "name": "PPR", "date": "2025-03-01" }],
//!   "media": ["photos/front.jpg", "clips/walk.mp4"],
//!   "featured": 0
//! }
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use glafrica_core::error::CoreError;
use glafrica_core::form::{FieldUpdate, FormState};
use glafrica_core::listing::{Gender, VaccinationPatch};
use glafrica_core::media::{AttachmentId, MediaFile, Rejection};
use glafrica_core::types::{CategoryId, MediaId, TagId};

/// Errors while loading or applying a manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Could not read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid manifest {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Field(#[from] CoreError),

    #[error("featured index {index} is out of range for {count} media files")]
    FeaturedIndex { index: usize, count: usize },

    #[error("Media {0} is not attached to this listing")]
    UnknownMedia(MediaId),
}

/// A price given either as JSON text or as a JSON number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PriceValue {
    Text(String),
    Number(serde_json::Number),
}

impl PriceValue {
    fn into_text(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestVaccination {
    pub name: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Field overrides and media changes for one listing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListingManifest {
    pub name: Option<String>,
    pub category_id: Option<CategoryId>,
    pub breed: Option<String>,
    /// Backend code: `M`, `F` or `mixed`.
    pub gender: Option<String>,
    pub age: Option<String>,
    pub weight: Option<String>,
    pub price: Option<PriceValue>,
    pub currency: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub health_status: Option<String>,
    /// Appended to the vaccination history; rows whose name and date are
    /// already recorded are skipped.
    pub vaccinations: Vec<ManifestVaccination>,
    /// Replaces the tag set when present.
    pub tag_ids: Option<BTreeSet<TagId>>,
    /// Files to attach, in upload order.
    pub media: Vec<PathBuf>,
    /// Index into `media` of the file to feature.
    pub featured: Option<usize>,
    /// Already stored media to feature instead.
    pub featured_media_id: Option<MediaId>,
    /// Stored media to delete on submit.
    pub remove_media: Vec<MediaId>,
}

impl ListingManifest {
    /// Read `path`, resolving media paths against its directory.
    pub async fn load(path: &Path) -> Result<Self, ManifestError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ManifestError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::parse(&text, base).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse manifest JSON, resolving relative media paths against `base`.
    pub fn parse(json: &str, base: &Path) -> Result<Self, serde_json::Error> {
        let mut manifest: Self = serde_json::from_str(json)?;
        for media in &mut manifest.media {
            if media.is_relative() {
                *media = base.join(&*media);
            }
        }
        Ok(manifest)
    }

    /// Apply field overrides, vaccinations and tags.
    pub fn apply_fields(&self, form: &mut FormState) -> Result<(), ManifestError> {
        let text_updates: [(&Option<String>, fn(String) -> FieldUpdate); 8] = [
            (&self.name, FieldUpdate::Name),
            (&self.breed, FieldUpdate::Breed),
            (&self.age, FieldUpdate::Age),
            (&self.weight, FieldUpdate::Weight),
            (&self.currency, FieldUpdate::Currency),
            (&self.location, FieldUpdate::Location),
            (&self.description, FieldUpdate::Description),
            (&self.health_status, FieldUpdate::HealthStatus),
        ];
        for (value, update) in text_updates {
            if let Some(v) = value {
                form.update(update(v.clone()));
            }
        }

        if let Some(category) = self.category_id {
            form.update(FieldUpdate::Category(Some(category)));
        }
        if let Some(code) = &self.gender {
            form.update(FieldUpdate::Gender(Gender::from_code(code)?));
        }
        if let Some(price) = &self.price {
            form.update(FieldUpdate::Price(price.clone().into_text()));
        }

        // A resumed draft already holds the rows added on the first run.
        for v in &self.vaccinations {
            let recorded = form
                .fields()
                .vaccination_history
                .iter()
                .any(|r| r.name.trim() == v.name.trim() && r.date.trim() == v.date.trim());
            if recorded {
                continue;
            }
            let id = form.add_vaccination();
            form.update_vaccination(
                id,
                VaccinationPatch {
                    name: Some(v.name.clone()),
                    date: Some(v.date.clone()),
                    notes: Some(v.notes.clone()),
                },
            )?;
        }

        if let Some(wanted) = &self.tag_ids {
            let current = form.fields().tag_ids.clone();
            for tag in current.symmetric_difference(wanted) {
                form.toggle_tag(*tag);
            }
        }
        Ok(())
    }

    /// Apply removals, attach new files and set the featured item.
    ///
    /// Returns the files the acceptance policy rejected.
    pub async fn apply_media(&self, form: &mut FormState) -> Result<Vec<Rejection>, ManifestError> {
        for id in &self.remove_media {
            if !form.remove_media(AttachmentId::Existing(*id)) {
                return Err(ManifestError::UnknownMedia(*id));
            }
        }

        if let Some(index) = self.featured {
            if index >= self.media.len() {
                return Err(ManifestError::FeaturedIndex {
                    index,
                    count: self.media.len(),
                });
            }
        }

        let mut files = Vec::with_capacity(self.media.len());
        for path in &self.media {
            let file = MediaFile::from_path(path)
                .await
                .map_err(|source| ManifestError::Io {
                    path: path.clone(),
                    source,
                })?;
            files.push(file);
        }
        let rejected = form.add_media(files).await;

        if let Some(index) = self.featured {
            let wanted = &self.media[index];
            let pending = form
                .media()
                .pending()
                .find(|p| &p.file.path == wanted)
                .map(|p| AttachmentId::Pending(p.id));
            match pending {
                Some(id) => {
                    form.set_featured(id);
                }
                None => tracing::warn!(path = %wanted.display(), "Featured file was rejected"),
            }
        }

        if let Some(id) = self.featured_media_id {
            if !form.set_featured(AttachmentId::Existing(id)) {
                return Err(ManifestError::UnknownMedia(id));
            }
        }

        Ok(rejected)
    }
}
