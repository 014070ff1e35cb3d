//! Backend seam for listing submission.
//!
//! [`ListingApi`] is the capability the submission orchestrator calls; the
//! HTTP implementation lives in `glafrica-client`. Request and response
//! bodies mirror the admin livestock endpoints.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::listing::{FormFieldSet, Gender, VaccinationRecord};
use crate::media::{ExistingMedia, MediaFile, MediaKind};
use crate::types::{CategoryId, ListingId, MediaId, TagId, Timestamp};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors surfaced by a [`ListingApi`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request never got a response (network, DNS, TLS, timeout).
    #[error("Network error: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("{message}")]
    Backend { status: u16, message: String },

    /// Credentials missing, expired or rejected.
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    /// The response body could not be decoded.
    #[error("Unexpected response from server: {0}")]
    Decode(String),

    /// A local file could not be read for upload.
    #[error("Could not read {path}: {message}")]
    File { path: String, message: String },
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Create/update body for a livestock listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingPayload {
    pub name: String,
    pub category_id: Option<CategoryId>,
    pub breed: String,
    pub gender: Gender,
    pub age: String,
    pub weight: String,
    pub price: String,
    pub currency: String,
    pub location: String,
    pub description: String,
    pub health_status: String,
    pub vaccination_history: Vec<VaccinationRecord>,
    pub tag_ids: BTreeSet<TagId>,
}

impl From<&FormFieldSet> for ListingPayload {
    /// Trims text fields and drops unnamed vaccination records.
    fn from(f: &FormFieldSet) -> Self {
        Self {
            name: f.name.trim().to_string(),
            category_id: f.category_id,
            breed: f.breed.trim().to_string(),
            gender: f.gender,
            age: f.age.trim().to_string(),
            weight: f.weight.trim().to_string(),
            price: f.price.trim().to_string(),
            currency: f.currency.trim().to_ascii_uppercase(),
            location: f.location.trim().to_string(),
            description: f.description.trim().to_string(),
            health_status: f.health_status.trim().to_string(),
            vaccination_history: f.submitted_vaccinations(),
            tag_ids: f.tag_ids.clone(),
        }
    }
}

/// Per-file options sent alongside an upload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UploadOptions {
    pub media_kind: MediaKind,
    pub is_featured: bool,
    pub aspect_ratio: f64,
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

/// A stored media asset, as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRef {
    pub id: MediaId,
    #[serde(default)]
    pub file_url: Option<String>,
    pub media_type: MediaKind,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: f64,
}

fn default_aspect_ratio() -> f64 {
    crate::media::probe::DEFAULT_ASPECT_RATIO
}

impl From<MediaRef> for ExistingMedia {
    fn from(m: MediaRef) -> Self {
        Self {
            id: m.id,
            url: m.file_url.unwrap_or_default(),
            kind: m.media_type,
            aspect_ratio: m.aspect_ratio,
            featured_on_server: m.is_featured,
        }
    }
}

/// Nested category in a listing detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: CategoryId,
    pub name: String,
}

/// Nested tag in a listing detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRef {
    pub id: TagId,
    pub name: String,
}

/// Full listing as returned by create, update and detail endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingDetail {
    pub id: ListingId,
    pub name: String,
    #[serde(default)]
    pub category: Option<CategoryRef>,
    pub breed: String,
    pub gender: Gender,
    pub age: String,
    #[serde(default)]
    pub weight: String,
    /// Decimal rendered as text by the backend.
    pub price: String,
    pub currency: String,
    pub location: String,
    #[serde(default)]
    pub is_sold: bool,
    pub description: String,
    pub health_status: String,
    #[serde(default)]
    pub vaccination_history: Vec<VaccinationRecord>,
    #[serde(default)]
    pub media: Vec<MediaRef>,
    #[serde(default)]
    pub tags: Vec<TagRef>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

impl ListingDetail {
    /// The editable values of this listing.
    pub fn field_set(&self) -> FormFieldSet {
        FormFieldSet {
            name: self.name.clone(),
            category_id: self.category.as_ref().map(|c| c.id),
            breed: self.breed.clone(),
            gender: self.gender,
            age: self.age.clone(),
            weight: self.weight.clone(),
            price: self.price.clone(),
            currency: self.currency.clone(),
            location: self.location.clone(),
            description: self.description.clone(),
            health_status: self.health_status.clone(),
            vaccination_history: self.vaccination_history.clone(),
            tag_ids: self.tags.iter().map(|t| t.id).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Backend operations used by the listing form.
#[async_trait]
pub trait ListingApi: Send + Sync {
    async fn create_listing(&self, payload: &ListingPayload) -> Result<ListingDetail, ApiError>;

    async fn update_listing(
        &self,
        id: ListingId,
        payload: &ListingPayload,
    ) -> Result<ListingDetail, ApiError>;

    async fn get_listing(&self, id: ListingId) -> Result<ListingDetail, ApiError>;

    async fn upload_media(
        &self,
        listing: ListingId,
        file: &MediaFile,
        options: UploadOptions,
    ) -> Result<MediaRef, ApiError>;

    async fn delete_media(&self, listing: ListingId, media: MediaId) -> Result<(), ApiError>;

    async fn set_featured_media(&self, media: MediaId) -> Result<(), ApiError>;
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn payload_trims_and_filters() {
        let mut fields = FormFieldSet {
            name: "  Boer buck ".into(),
            currency: "ngn".into(),
            ..Default::default()
        };
        fields.add_vaccination();
        let named = fields.add_vaccination();
        fields.vaccination_history[1].name = "PPR".into();

        let payload = ListingPayload::from(&fields);
        assert_eq!(payload.name, "Boer buck");
        assert_eq!(payload.currency, "NGN");
        assert_eq!(payload.vaccination_history.len(), 1);
        assert_eq!(payload.vaccination_history[0].id, named);
    }

    #[test]
    fn detail_deserializes_backend_shape() {
        let id = Uuid::new_v4();
        let media_id = Uuid::new_v4();
        let json = serde_json::json!({
            "id": id,
            "name": "Premium Boer Goat Buck",
            "breed": "Boer",
            "category": {"id": Uuid::new_v4(), "name": "Goats", "slug": "goats"},
            "age": "2 years",
            "weight": "45kg",
            "gender": "M",
            "price": "250000.00",
            "currency": "NGN",
            "location": "Ibadan",
            "is_sold": false,
            "sold_at": null,
            "description": "d",
            "health_status": "h",
            "vaccination_history": [
                {"name": "PPR", "date": "2025-01-10"},
                {"name": "Anthrax"}
            ],
            "media": [{
                "id": media_id,
                "file": "livestock/abc",
                "file_url": "https://cdn.example/abc.jpg",
                "media_type": "image",
                "is_featured": true,
                "aspect_ratio": 1.33
            }],
            "tags": [{"id": Uuid::new_v4(), "name": "breeding"}],
            "created_at": "2025-06-01T08:00:00Z",
            "updated_at": "2025-06-01T08:00:00Z"
        });

        let detail: ListingDetail = serde_json::from_value(json).unwrap();
        assert_eq!(detail.id, id);
        assert_eq!(detail.gender, Gender::Male);
        assert_eq!(detail.media.len(), 1);

        let fields = detail.field_set();
        assert_eq!(fields.tag_ids.len(), 1);
        assert!(fields.category_id.is_some());

        // Rows stored without ids still load, each with its own id.
        let history = &fields.vaccination_history;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].name, "PPR");
        assert_eq!(history[0].date, "2025-01-10");
        assert_eq!(history[1].date, "");
        assert_ne!(history[0].id, history[1].id);

        let existing = ExistingMedia::from(detail.media[0].clone());
        assert_eq!(existing.id, media_id);
        assert!(existing.featured_on_server);
    }

    #[test]
    fn backend_error_displays_message_verbatim() {
        let err = ApiError::Backend {
            status: 400,
            message: "Category not found.".into(),
        };
        assert_eq!(err.to_string(), "Category not found.");
    }
}
