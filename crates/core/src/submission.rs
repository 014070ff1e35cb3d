//! Final submission of a listing form.
//!
//! [`SubmissionOrchestrator::submit`] runs the write sequence against a
//! [`ListingApi`]:
//!
//! 1. validate the media step
//! 2. create or update the listing record
//! 3. delete media queued for removal (best-effort)
//! 4. upload pending media one at a time, in list order
//! 5. release every pending preview
//! 6. tell the backend which existing item is featured (best-effort)
//! 7. clear the draft and reset the form
//!
//! The first hard failure aborts the sequence and leaves the form populated.
//! Work already done is recorded on the form, so resubmitting updates the
//! created record and only uploads what is still pending.

use uuid::Uuid;

use crate::api::{ApiError, ListingApi, UploadOptions};
use crate::form::FormState;
use crate::media::{AttachmentId, ExistingMedia, MediaFile, MediaKind};
use crate::types::ListingId;
use crate::validation::FieldErrors;
use crate::wizard::FormStep;

/// Why a submission did not complete.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("{}", correction_prompt(.0))]
    Validation(FieldErrors),

    #[error(transparent)]
    Api(#[from] ApiError),
}

fn correction_prompt(errors: &FieldErrors) -> String {
    match errors.len() {
        1 => "Please correct the highlighted field".to_string(),
        n => format!("Please correct the {n} highlighted fields"),
    }
}

/// A pending upload, detached from the form for the duration of the call.
struct UploadJob {
    pending_id: Uuid,
    file: MediaFile,
    kind: MediaKind,
    aspect_ratio: f64,
}

/// Drives the submit sequence against a backend.
#[derive(Debug, Clone)]
pub struct SubmissionOrchestrator<A> {
    api: A,
}

impl<A: ListingApi> SubmissionOrchestrator<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Fetch a stored listing and build an edit-mode form from it.
    pub async fn load_for_edit(&self, id: ListingId) -> Result<FormState, ApiError> {
        let detail = self.api.get_listing(id).await?;
        tracing::info!(listing_id = %id, media = detail.media.len(), "Loaded listing for edit");
        Ok(FormState::from_detail(&detail))
    }

    /// Submit `form`. See [`Self::submit_with`].
    pub async fn submit(&self, form: &mut FormState) -> Result<ListingId, SubmissionError> {
        self.submit_with(form, |_| {}).await
    }

    /// Submit `form`, calling `on_success` with the listing id once every
    /// step has succeeded and the form has been reset.
    pub async fn submit_with(
        &self,
        form: &mut FormState,
        on_success: impl FnOnce(ListingId),
    ) -> Result<ListingId, SubmissionError> {
        form.set_submitting(true);
        let result = self.run(form).await;
        form.set_submitting(false);

        match result {
            Ok(id) => {
                form.clear_draft();
                form.reset();
                tracing::info!(listing_id = %id, "Listing submitted");
                on_success(id);
                Ok(id)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Listing submission failed");
                Err(e)
            }
        }
    }

    async fn run(&self, form: &mut FormState) -> Result<ListingId, SubmissionError> {
        if !form.validate_step(FormStep::Media) {
            return Err(SubmissionError::Validation(form.errors().clone()));
        }

        let listing_id = self.write_record(form).await?;
        self.delete_queued(form, listing_id).await;

        let uploaded = self.upload_pending(form, listing_id).await;
        // Uploaded items already dropped their previews on promotion.
        form.media_mut().release_previews();
        uploaded?;

        self.reconcile_featured(form).await;
        Ok(listing_id)
    }

    async fn write_record(&self, form: &mut FormState) -> Result<ListingId, ApiError> {
        let payload = form.payload();
        match form.target_listing() {
            Some(id) => {
                let detail = self.api.update_listing(id, &payload).await?;
                tracing::info!(listing_id = %detail.id, "Listing updated");
                Ok(detail.id)
            }
            None => {
                let detail = self.api.create_listing(&payload).await?;
                tracing::info!(listing_id = %detail.id, "Listing created");
                form.record_created(detail.id);
                Ok(detail.id)
            }
        }
    }

    async fn delete_queued(&self, form: &mut FormState, listing_id: ListingId) {
        for media_id in form.media_mut().take_deletion_queue() {
            match self.api.delete_media(listing_id, media_id).await {
                Ok(()) => tracing::info!(%listing_id, %media_id, "Media deleted"),
                Err(e) => {
                    tracing::warn!(%listing_id, %media_id, error = %e, "Failed to delete media, skipping")
                }
            }
        }
    }

    /// Upload every pending attachment in order, promoting each on success.
    ///
    /// An upload is featured if it carries the featured marker. With no
    /// existing media and no marker at all, the first upload is featured.
    async fn upload_pending(&self, form: &mut FormState, listing_id: ListingId) -> Result<(), ApiError> {
        let media = form.media();
        let marker = media.featured();
        let auto_feature_first = marker.is_none() && media.existing().next().is_none();
        let jobs: Vec<UploadJob> = media
            .pending()
            .map(|p| UploadJob {
                pending_id: p.id,
                file: p.file.clone(),
                kind: p.kind,
                aspect_ratio: p.aspect_ratio,
            })
            .collect();

        for (index, job) in jobs.into_iter().enumerate() {
            let is_featured = marker == Some(AttachmentId::Pending(job.pending_id))
                || (auto_feature_first && index == 0);
            let options = UploadOptions {
                media_kind: job.kind,
                is_featured,
                aspect_ratio: job.aspect_ratio,
            };

            let stored = self.api.upload_media(listing_id, &job.file, options).await?;
            tracing::info!(
                %listing_id,
                media_id = %stored.id,
                file = %job.file.file_name,
                is_featured,
                "Media uploaded",
            );

            let stored = ExistingMedia::from(stored);
            let stored_id = stored.id;
            let media = form.media_mut();
            media.promote(job.pending_id, stored);
            if is_featured {
                media.set_featured(AttachmentId::Existing(stored_id));
                media.mark_featured_on_server(stored_id);
            }
        }
        Ok(())
    }

    async fn reconcile_featured(&self, form: &mut FormState) {
        let Some(AttachmentId::Existing(media_id)) = form.media().featured() else {
            return;
        };
        let stale = form
            .media()
            .existing()
            .any(|e| e.id == media_id && !e.featured_on_server);
        if !stale {
            return;
        }

        match self.api.set_featured_media(media_id).await {
            Ok(()) => {
                tracing::info!(%media_id, "Featured media updated");
                form.media_mut().mark_featured_on_server(media_id);
            }
            Err(e) => tracing::warn!(%media_id, error = %e, "Failed to update featured media"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::FormField;

    #[test]
    fn validation_message_matches_error_count() {
        let mut errors = FieldErrors::new();
        errors.insert(FormField::Media, "At least one image or video is required".into());
        assert_eq!(
            SubmissionError::Validation(errors.clone()).to_string(),
            "Please correct the highlighted field"
        );

        errors.insert(FormField::Price, "Price is required".into());
        assert_eq!(
            SubmissionError::Validation(errors).to_string(),
            "Please correct the 2 highlighted fields"
        );
    }
}
