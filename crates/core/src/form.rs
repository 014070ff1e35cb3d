//! Listing form state store.
//!
//! [`FormState`] owns everything the create/edit wizard edits: field values,
//! current step, media attachments, per-field errors and the dirty and
//! submitting flags. All mutation goes through its action methods; a
//! single owner holds it, so no two actions interleave.

use uuid::Uuid;

use crate::api::{ListingDetail, ListingPayload};
use crate::draft::DraftStore;
use crate::error::CoreError;
use crate::listing::{FormFieldSet, Gender, VaccinationPatch};
use crate::media::{
    self, AttachmentId, ExistingMedia, MediaFile, MediaSet, PreviewRegistry, Rejection,
};
use crate::types::{CategoryId, ListingId, TagId};
use crate::validation::{evaluate_step, FieldErrors, FormField, RuleInput};
use crate::wizard::{steps_to_validate, FormStep};

/// Whether the form creates a new listing or edits a stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(ListingId),
}

/// A new value for one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Name(String),
    Category(Option<CategoryId>),
    Breed(String),
    Gender(Gender),
    Age(String),
    Weight(String),
    Price(String),
    Currency(String),
    Location(String),
    Description(String),
    HealthStatus(String),
}

impl FieldUpdate {
    /// The validated field this update touches.
    pub fn field(&self) -> FormField {
        match self {
            Self::Name(_) => FormField::Name,
            Self::Category(_) => FormField::CategoryId,
            Self::Breed(_) => FormField::Breed,
            Self::Gender(_) => FormField::Gender,
            Self::Age(_) => FormField::Age,
            Self::Weight(_) => FormField::Weight,
            Self::Price(_) => FormField::Price,
            Self::Currency(_) => FormField::Currency,
            Self::Location(_) => FormField::Location,
            Self::Description(_) => FormField::Description,
            Self::HealthStatus(_) => FormField::HealthStatus,
        }
    }

    fn apply(self, f: &mut FormFieldSet) {
        match self {
            Self::Name(v) => f.name = v,
            Self::Category(v) => f.category_id = v,
            Self::Breed(v) => f.breed = v,
            Self::Gender(v) => f.gender = v,
            Self::Age(v) => f.age = v,
            Self::Weight(v) => f.weight = v,
            Self::Price(v) => f.price = v,
            Self::Currency(v) => f.currency = v,
            Self::Location(v) => f.location = v,
            Self::Description(v) => f.description = v,
            Self::HealthStatus(v) => f.health_status = v,
        }
    }
}

/// The listing wizard's state.
#[derive(Debug)]
pub struct FormState {
    mode: FormMode,
    fields: FormFieldSet,
    step: FormStep,
    media: MediaSet,
    errors: FieldErrors,
    dirty: bool,
    submitting: bool,
    /// Listing created by an earlier, partially failed submission.
    created: Option<ListingId>,
    drafts: Option<DraftStore>,
    previews: PreviewRegistry,
}

impl Default for FormState {
    fn default() -> Self {
        Self::new()
    }
}

impl FormState {
    /// Empty create-mode form.
    pub fn new() -> Self {
        Self {
            mode: FormMode::Create,
            fields: FormFieldSet::default(),
            step: FormStep::BasicInfo,
            media: MediaSet::new(),
            errors: FieldErrors::new(),
            dirty: false,
            submitting: false,
            created: None,
            drafts: None,
            previews: PreviewRegistry::new(),
        }
    }

    /// Edit-mode form hydrated from a stored listing.
    pub fn from_detail(detail: &ListingDetail) -> Self {
        let existing = detail
            .media
            .iter()
            .cloned()
            .map(ExistingMedia::from)
            .collect();
        Self {
            mode: FormMode::Edit(detail.id),
            fields: detail.field_set(),
            media: MediaSet::from_existing(existing),
            ..Self::new()
        }
    }

    /// Persist drafts to `drafts`. Only create-mode forms write drafts.
    pub fn with_drafts(mut self, drafts: DraftStore) -> Self {
        self.drafts = Some(drafts);
        self
    }

    /// Allocate previews from a shared registry.
    pub fn with_previews(mut self, previews: PreviewRegistry) -> Self {
        self.previews = previews;
        self
    }

    // ---- reads ----

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn fields(&self) -> &FormFieldSet {
        &self.fields
    }

    pub fn step(&self) -> FormStep {
        self.step
    }

    pub fn media(&self) -> &MediaSet {
        &self.media
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error(&self, field: FormField) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }

    /// Listing the next submission writes to, if it already exists.
    pub fn target_listing(&self) -> Option<ListingId> {
        match self.mode {
            FormMode::Edit(id) => Some(id),
            FormMode::Create => self.created,
        }
    }

    /// Body for the create/update call.
    pub fn payload(&self) -> ListingPayload {
        ListingPayload::from(&self.fields)
    }

    // ---- field actions ----

    /// Set one field, clearing its error.
    pub fn update(&mut self, update: FieldUpdate) {
        self.errors.remove(&update.field());
        update.apply(&mut self.fields);
        self.dirty = true;
    }

    pub fn add_vaccination(&mut self) -> Uuid {
        self.dirty = true;
        self.fields.add_vaccination()
    }

    pub fn update_vaccination(&mut self, id: Uuid, patch: VaccinationPatch) -> Result<(), CoreError> {
        self.fields.update_vaccination(id, patch)?;
        self.dirty = true;
        Ok(())
    }

    pub fn remove_vaccination(&mut self, id: Uuid) -> bool {
        let removed = self.fields.remove_vaccination(id);
        self.dirty |= removed;
        removed
    }

    pub fn toggle_tag(&mut self, tag: TagId) {
        self.fields.toggle_tag(tag);
        self.dirty = true;
    }

    // ---- validation & navigation ----

    /// Evaluate `step`'s rules, replacing the errors of the fields it owns.
    /// Returns `true` iff none of them failed.
    pub fn validate_step(&mut self, step: FormStep) -> bool {
        let input = RuleInput {
            fields: &self.fields,
            attachment_count: self.media.len(),
        };
        let outcome = evaluate_step(step, &input);

        for field in &outcome.checked {
            self.errors.remove(field);
        }
        let valid = outcome.is_valid();
        self.errors.extend(outcome.errors);
        valid
    }

    /// Validate the current step and move forward.
    ///
    /// Returns `false` if validation failed or the form is already on the
    /// last step.
    pub fn next_step(&mut self) -> bool {
        if !self.validate_step(self.step) {
            tracing::debug!(step = self.step.number(), errors = self.errors.len(), "Step blocked");
            return false;
        }
        match self.step.next() {
            Some(next) => {
                self.step = next;
                self.autosave();
                true
            }
            None => false,
        }
    }

    /// Move back one step. Never validates.
    pub fn previous_step(&mut self) -> bool {
        match self.step.previous() {
            Some(prev) => {
                self.step = prev;
                self.autosave();
                true
            }
            None => false,
        }
    }

    /// Jump to step `n`.
    ///
    /// Backward jumps always succeed. Forward jumps validate each step on
    /// the way and stop (without moving) at the first failure.
    pub fn go_to_step(&mut self, n: u8) -> Result<bool, CoreError> {
        let target = FormStep::from_number(n)?;
        for step in steps_to_validate(self.step, target) {
            if !self.validate_step(step) {
                return Ok(false);
            }
        }
        if target != self.step {
            self.step = target;
            self.autosave();
        }
        Ok(true)
    }

    // ---- media actions ----

    /// Attach `files`, dropping any the acceptance policy rejects.
    ///
    /// Returns the rejections so the caller can tell the user.
    pub async fn add_media(&mut self, files: Vec<MediaFile>) -> Vec<Rejection> {
        let prepared = media::prepare(files, &self.previews).await;
        if !prepared.accepted.is_empty() {
            self.media.attach(prepared.accepted);
            self.dirty = true;
        }
        if !self.media.is_empty() {
            self.errors.remove(&FormField::Media);
        }
        prepared.rejected
    }

    pub fn remove_media(&mut self, id: AttachmentId) -> bool {
        let removed = self.media.remove(id);
        self.dirty |= removed;
        removed
    }

    pub fn set_featured(&mut self, id: AttachmentId) -> bool {
        let changed = self.media.set_featured(id);
        self.dirty |= changed;
        changed
    }

    // ---- drafts ----

    /// Write the current fields and step to the draft store.
    pub fn save_draft(&self) {
        if let (FormMode::Create, Some(drafts)) = (self.mode, &self.drafts) {
            drafts.save(&self.fields, self.step);
        }
    }

    /// Replace fields and step with the saved draft. Returns `true` if a
    /// draft was applied. Media is untouched.
    pub fn load_draft(&mut self) -> bool {
        if self.mode != FormMode::Create {
            return false;
        }
        let Some(snapshot) = self.drafts.as_ref().and_then(DraftStore::load) else {
            return false;
        };
        self.fields = snapshot.data;
        self.step = snapshot.current_step;
        self.errors.clear();
        self.dirty = true;
        true
    }

    pub fn has_saved_draft(&self) -> bool {
        self.drafts.as_ref().is_some_and(DraftStore::has_saved)
    }

    pub fn clear_draft(&self) {
        if let Some(drafts) = &self.drafts {
            drafts.clear();
        }
    }

    fn autosave(&self) {
        if self.dirty {
            self.save_draft();
        }
    }

    // ---- lifecycle ----

    /// Back to an empty create form. Releases every pending preview.
    pub fn reset(&mut self) {
        let drafts = self.drafts.take();
        let previews = self.previews.clone();
        *self = Self::new().with_previews(previews);
        self.drafts = drafts;
    }

    // ---- submission internals ----

    pub(crate) fn set_submitting(&mut self, submitting: bool) {
        self.submitting = submitting;
    }

    pub(crate) fn record_created(&mut self, id: ListingId) {
        if self.mode == FormMode::Create {
            self.created = Some(id);
        }
    }

    pub(crate) fn media_mut(&mut self) -> &mut MediaSet {
        &mut self.media
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use super::*;
    use crate::store::{KeyValueStore, MemoryStore};

    fn fill_basic(form: &mut FormState) {
        form.update(FieldUpdate::Name("Boer buck".into()));
        form.update(FieldUpdate::Category(Some(Uuid::new_v4())));
        form.update(FieldUpdate::Breed("Boer".into()));
        form.update(FieldUpdate::Gender(Gender::Male));
        form.update(FieldUpdate::Age("2 years".into()));
    }

    fn fill_pricing(form: &mut FormState) {
        form.update(FieldUpdate::Price("120000".into()));
        form.update(FieldUpdate::Location("Kano".into()));
    }

    fn fill_details(form: &mut FormState) {
        form.update(FieldUpdate::Description("d".repeat(60)));
        form.update(FieldUpdate::HealthStatus("h".repeat(25)));
    }

    fn draft_form() -> (Arc<MemoryStore>, FormState) {
        let store = Arc::new(MemoryStore::new());
        let form = FormState::new().with_drafts(DraftStore::new(store.clone()));
        (store, form)
    }

    #[test]
    fn short_name_blocks_first_step() {
        let mut form = FormState::new();
        form.update(FieldUpdate::Name("ab".into()));

        assert!(!form.next_step());
        assert_eq!(form.step(), FormStep::BasicInfo);
        assert!(form.error(FormField::Name).is_some());
    }

    #[test]
    fn valid_steps_advance() {
        let mut form = FormState::new();
        fill_basic(&mut form);
        assert!(form.next_step());
        fill_pricing(&mut form);
        assert!(form.next_step());
        fill_details(&mut form);
        assert!(form.next_step());
        assert_eq!(form.step(), FormStep::Media);
        assert!(form.errors().is_empty());
    }

    #[test]
    fn last_step_does_not_advance() {
        let mut form = FormState::new();
        fill_basic(&mut form);
        fill_pricing(&mut form);
        fill_details(&mut form);
        assert!(form.go_to_step(4).unwrap());

        // No media yet.
        assert!(!form.next_step());
        assert!(form.error(FormField::Media).is_some());
    }

    #[test]
    fn previous_step_is_unconditional() {
        let mut form = FormState::new();
        fill_basic(&mut form);
        assert!(form.next_step());
        form.update(FieldUpdate::Name("".into()));

        assert!(form.previous_step());
        assert_eq!(form.step(), FormStep::BasicInfo);
        assert!(!form.previous_step());
    }

    #[test]
    fn update_clears_field_error() {
        let mut form = FormState::new();
        assert!(!form.validate_step(FormStep::BasicInfo));
        assert!(form.error(FormField::Breed).is_some());

        form.update(FieldUpdate::Breed("Boer".into()));
        assert!(form.error(FormField::Breed).is_none());
        assert!(form.error(FormField::Name).is_some());
    }

    #[test]
    fn validate_step_only_touches_own_fields() {
        let mut form = FormState::new();
        form.validate_step(FormStep::BasicInfo);
        let basic_errors = form.errors().len();

        form.validate_step(FormStep::DetailsHealth);
        assert_eq!(form.errors().len(), basic_errors + 2);

        fill_details(&mut form);
        assert!(form.validate_step(FormStep::DetailsHealth));
        assert_eq!(form.errors().len(), basic_errors);
    }

    #[test]
    fn forward_jump_stops_at_first_invalid_step() {
        let mut form = FormState::new();
        fill_basic(&mut form);

        assert!(!form.go_to_step(3).unwrap());
        assert_eq!(form.step(), FormStep::BasicInfo);
        assert!(form.error(FormField::Price).is_some());
    }

    #[test]
    fn go_to_step_out_of_range() {
        let mut form = FormState::new();
        assert!(form.go_to_step(0).is_err());
        assert!(form.go_to_step(5).is_err());
    }

    #[test]
    fn step_change_autosaves_dirty_form() {
        let (store, mut form) = draft_form();
        fill_basic(&mut form);
        assert!(form.next_step());

        let raw = store.get(crate::draft::DRAFT_KEY).unwrap().expect("draft saved");
        let snapshot: crate::draft::DraftSnapshot = serde_json::from_str(&raw).unwrap();
        assert_eq!(snapshot.current_step, FormStep::PricingLocation);
        assert_eq!(snapshot.data.name, "Boer buck");
    }

    #[test]
    fn clean_form_does_not_autosave() {
        let (store, mut form) = draft_form();
        // Invalid first step: no navigation, nothing saved.
        assert!(!form.next_step());
        assert!(!form.previous_step());
        assert!(store.get(crate::draft::DRAFT_KEY).unwrap().is_none());
    }

    #[test]
    fn load_draft_restores_fields_and_step() {
        let (store, mut form) = draft_form();
        fill_basic(&mut form);
        assert!(form.next_step());
        let saved = form.fields().clone();

        let mut restored = FormState::new().with_drafts(DraftStore::new(store));
        assert!(restored.has_saved_draft());
        assert!(restored.load_draft());
        assert_eq!(restored.fields(), &saved);
        assert_eq!(restored.step(), FormStep::PricingLocation);
    }

    #[test]
    fn edit_mode_never_writes_drafts() {
        let store = Arc::new(MemoryStore::new());
        let detail: ListingDetail = serde_json::from_value(serde_json::json!({
            "id": Uuid::new_v4(),
            "name": "Boer buck",
            "breed": "Boer",
            "gender": "M",
            "age": "2 years",
            "price": "1000.00",
            "currency": "NGN",
            "location": "Kano",
            "description": "d",
            "health_status": "h"
        }))
        .unwrap();
        let mut form = FormState::from_detail(&detail).with_drafts(DraftStore::new(store.clone()));
        form.update(FieldUpdate::Name("Boer buck II".into()));
        form.save_draft();

        assert!(store.get(crate::draft::DRAFT_KEY).unwrap().is_none());
        assert_eq!(form.target_listing(), Some(detail.id));
    }

    #[tokio::test]
    async fn add_media_clears_media_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("goat.png");
        image::RgbImage::new(8, 8).save(&path).unwrap();

        let mut form = FormState::new();
        assert!(!form.validate_step(FormStep::Media));
        assert!(form.error(FormField::Media).is_some());

        let rejected = form
            .add_media(vec![MediaFile::from_path(&path).await.unwrap()])
            .await;
        assert!(rejected.is_empty());
        assert!(form.error(FormField::Media).is_none());
        assert_eq!(form.media().len(), 1);
        assert_eq!(form.previews().live_count(), 1);
    }

    #[tokio::test]
    async fn add_media_reports_rejections() {
        let mut form = FormState::new();
        let pdf = MediaFile {
            path: PathBuf::from("brochure.pdf"),
            file_name: "brochure.pdf".into(),
            content_type: "application/pdf".into(),
            size: 100,
        };
        let rejected = form.add_media(vec![pdf]).await;
        assert_eq!(rejected.len(), 1);
        assert!(form.media().is_empty());
        assert!(!form.is_dirty());
    }

    #[tokio::test]
    async fn reset_releases_previews_and_keeps_draft_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("goat.png");
        image::RgbImage::new(8, 8).save(&path).unwrap();

        let (_, mut form) = draft_form();
        fill_basic(&mut form);
        form.add_media(vec![MediaFile::from_path(&path).await.unwrap()])
            .await;
        let previews = form.previews().clone();
        assert_eq!(previews.live_count(), 1);

        form.reset();
        assert_eq!(previews.live_count(), 0);
        assert_eq!(form.fields(), &FormFieldSet::default());
        assert_eq!(form.step(), FormStep::BasicInfo);
        assert!(!form.is_dirty());

        fill_basic(&mut form);
        assert!(form.next_step());
        assert!(form.has_saved_draft());
    }
}
