//! Shared fixtures for submission tests: a recording [`ListingApi`] fake and
//! helpers that build valid forms and media files.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use glafrica_core::api::{
    ApiError, CategoryRef, ListingApi, ListingDetail, ListingPayload, MediaRef, UploadOptions,
};
use glafrica_core::form::{FieldUpdate, FormState};
use glafrica_core::listing::Gender;
use glafrica_core::media::{MediaFile, MediaKind};
use glafrica_core::types::{ListingId, MediaId};

/// One call made against the fake backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create(ListingPayload),
    Update(ListingId, ListingPayload),
    Get(ListingId),
    Upload {
        listing: ListingId,
        file_name: String,
        options: UploadOptions,
    },
    Delete {
        listing: ListingId,
        media: MediaId,
    },
    SetFeatured(MediaId),
}

/// Failures to inject. Each fires once.
#[derive(Debug, Default)]
struct Failures {
    create: Option<ApiError>,
    /// Zero-based index of the upload call that fails.
    upload: Option<(usize, ApiError)>,
    deletes: bool,
}

/// In-memory backend that records every call in order.
#[derive(Debug, Default)]
pub struct RecordingApi {
    calls: Mutex<Vec<Call>>,
    listings: Mutex<HashMap<ListingId, ListingDetail>>,
    failures: Mutex<Failures>,
    uploads: Mutex<usize>,
}

impl RecordingApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a stored listing returned by `get_listing`.
    pub fn with_listing(self, detail: ListingDetail) -> Self {
        self.listings.lock().unwrap().insert(detail.id, detail);
        self
    }

    pub fn fail_create(&self, err: ApiError) {
        self.failures.lock().unwrap().create = Some(err);
    }

    pub fn fail_upload(&self, index: usize, err: ApiError) {
        self.failures.lock().unwrap().upload = Some((index, err));
    }

    pub fn fail_deletes(&self) {
        self.failures.lock().unwrap().deletes = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn uploads(&self) -> Vec<(String, UploadOptions)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Upload {
                    file_name, options, ..
                } => Some((file_name, options)),
                _ => None,
            })
            .collect()
    }

    pub fn deletes(&self) -> Vec<MediaId> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Delete { media, .. } => Some(media),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ListingApi for RecordingApi {
    async fn create_listing(&self, payload: &ListingPayload) -> Result<ListingDetail, ApiError> {
        self.record(Call::Create(payload.clone()));
        if let Some(err) = self.failures.lock().unwrap().create.take() {
            return Err(err);
        }
        let detail = detail_from_payload(Uuid::new_v4(), payload);
        self.listings.lock().unwrap().insert(detail.id, detail.clone());
        Ok(detail)
    }

    async fn update_listing(
        &self,
        id: ListingId,
        payload: &ListingPayload,
    ) -> Result<ListingDetail, ApiError> {
        self.record(Call::Update(id, payload.clone()));
        Ok(detail_from_payload(id, payload))
    }

    async fn get_listing(&self, id: ListingId) -> Result<ListingDetail, ApiError> {
        self.record(Call::Get(id));
        self.listings
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::Backend {
                status: 404,
                message: "Not found.".into(),
            })
    }

    async fn upload_media(
        &self,
        listing: ListingId,
        file: &MediaFile,
        options: UploadOptions,
    ) -> Result<MediaRef, ApiError> {
        self.record(Call::Upload {
            listing,
            file_name: file.file_name.clone(),
            options,
        });

        let index = {
            let mut n = self.uploads.lock().unwrap();
            let index = *n;
            *n += 1;
            index
        };
        let mut failures = self.failures.lock().unwrap();
        if matches!(&failures.upload, Some((i, _)) if *i == index) {
            if let Some((_, err)) = failures.upload.take() {
                return Err(err);
            }
        }

        Ok(MediaRef {
            id: Uuid::new_v4(),
            file_url: Some(format!("https://cdn.example/{}", file.file_name)),
            media_type: options.media_kind,
            is_featured: options.is_featured,
            aspect_ratio: options.aspect_ratio,
        })
    }

    async fn delete_media(&self, listing: ListingId, media: MediaId) -> Result<(), ApiError> {
        self.record(Call::Delete { listing, media });
        if self.failures.lock().unwrap().deletes {
            return Err(ApiError::Transport("connection reset".into()));
        }
        Ok(())
    }

    async fn set_featured_media(&self, media: MediaId) -> Result<(), ApiError> {
        self.record(Call::SetFeatured(media));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn detail_from_payload(id: ListingId, p: &ListingPayload) -> ListingDetail {
    ListingDetail {
        id,
        name: p.name.clone(),
        category: p.category_id.map(|id| CategoryRef {
            id,
            name: "Goats".into(),
        }),
        breed: p.breed.clone(),
        gender: p.gender,
        age: p.age.clone(),
        weight: p.weight.clone(),
        price: p.price.clone(),
        currency: p.currency.clone(),
        location: p.location.clone(),
        is_sold: false,
        description: p.description.clone(),
        health_status: p.health_status.clone(),
        vaccination_history: p.vaccination_history.clone(),
        media: Vec::new(),
        tags: Vec::new(),
        created_at: None,
        updated_at: None,
    }
}

/// A stored, valid listing carrying `media`.
pub fn stored_listing(media: Vec<MediaRef>) -> ListingDetail {
    let mut form = FormState::new();
    fill_valid_fields(&mut form);
    let mut detail = detail_from_payload(Uuid::new_v4(), &form.payload());
    detail.media = media;
    detail
}

pub fn stored_image(featured: bool) -> MediaRef {
    MediaRef {
        id: Uuid::new_v4(),
        file_url: Some("https://cdn.example/stored.jpg".into()),
        media_type: MediaKind::Image,
        is_featured: featured,
        aspect_ratio: 1.0,
    }
}

/// Fill every field so that steps 1 to 3 validate.
pub fn fill_valid_fields(form: &mut FormState) {
    form.update(FieldUpdate::Name("Premium Boer Goat Buck".into()));
    form.update(FieldUpdate::Category(Some(Uuid::new_v4())));
    form.update(FieldUpdate::Breed("Boer".into()));
    form.update(FieldUpdate::Gender(Gender::Male));
    form.update(FieldUpdate::Age("2 years".into()));
    form.update(FieldUpdate::Weight("45kg".into()));
    form.update(FieldUpdate::Price("250000".into()));
    form.update(FieldUpdate::Location("Ibadan, Oyo".into()));
    form.update(FieldUpdate::Description(
        "Healthy breeding buck from a closed herd, raised on pasture with supplemental feed.".into(),
    ));
    form.update(FieldUpdate::HealthStatus(
        "Dewormed monthly, no known conditions.".into(),
    ));
}

/// Write a small PNG per name into `dir` and describe each as a media file.
pub async fn image_files(dir: &Path, names: &[&str]) -> Vec<MediaFile> {
    let mut files = Vec::new();
    for name in names {
        let path = dir.join(name);
        image::RgbImage::new(16, 9)
            .save(&path)
            .expect("write test image");
        files.push(MediaFile::from_path(&path).await.expect("stat test image"));
    }
    files
}
