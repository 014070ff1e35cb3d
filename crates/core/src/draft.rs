//! Local draft persistence for the create-listing form.
//!
//! A draft is the field set plus the current step, stamped with the save
//! time and a schema version. Media is never part of a draft. Drafts older
//! than [`DRAFT_TTL_HOURS`] or written with another schema version are
//! treated as absent. Storage failures are logged and swallowed; they never
//! interrupt the form.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::listing::FormFieldSet;
use crate::store::{KeyValueStore, StoreError};
use crate::types::Timestamp;
use crate::wizard::FormStep;

/// Storage key of the single create-form draft.
pub const DRAFT_KEY: &str = "livestock_form_draft";

/// Drafts expire after this many hours.
pub const DRAFT_TTL_HOURS: i64 = 24;

/// Bump when [`FormFieldSet`] changes shape.
pub const DRAFT_VERSION: u32 = 1;

/// Errors while reading or writing a draft.
#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Draft serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// What is written to storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftSnapshot {
    #[serde(default)]
    pub version: u32,
    pub data: FormFieldSet,
    pub current_step: FormStep,
    /// Save time, epoch milliseconds.
    pub timestamp: i64,
}

impl DraftSnapshot {
    pub fn saved_at(&self) -> Option<Timestamp> {
        chrono::DateTime::from_timestamp_millis(self.timestamp)
    }

    fn is_usable_at(&self, now: Timestamp) -> bool {
        if self.version != DRAFT_VERSION {
            return false;
        }
        let age_ms = now.timestamp_millis() - self.timestamp;
        age_ms <= chrono::Duration::hours(DRAFT_TTL_HOURS).num_milliseconds()
    }
}

/// Reads and writes the draft entry of a [`KeyValueStore`].
#[derive(Clone)]
pub struct DraftStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl std::fmt::Debug for DraftStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DraftStore").field("key", &self.key).finish()
    }
}

impl DraftStore {
    /// Draft store under the default [`DRAFT_KEY`].
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(store, DRAFT_KEY)
    }

    pub fn with_key(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Save, logging any failure.
    pub fn save(&self, fields: &FormFieldSet, step: FormStep) {
        self.save_at(fields, step, chrono::Utc::now());
    }

    pub fn save_at(&self, fields: &FormFieldSet, step: FormStep, now: Timestamp) {
        if let Err(e) = self.try_save_at(fields, step, now) {
            tracing::warn!(key = %self.key, error = %e, "Failed to save draft");
        }
    }

    /// Save, returning any failure to the caller.
    pub fn try_save_at(
        &self,
        fields: &FormFieldSet,
        step: FormStep,
        now: Timestamp,
    ) -> Result<(), DraftError> {
        let snapshot = DraftSnapshot {
            version: DRAFT_VERSION,
            data: fields.clone(),
            current_step: step,
            timestamp: now.timestamp_millis(),
        };
        let json = serde_json::to_string(&snapshot)?;
        self.store.set(&self.key, &json)?;
        tracing::debug!(key = %self.key, step = step.number(), "Draft saved");
        Ok(())
    }

    /// The saved draft, if present, readable and not expired.
    ///
    /// An unusable entry (expired, other version, malformed) is removed.
    pub fn load(&self) -> Option<DraftSnapshot> {
        self.load_at(chrono::Utc::now())
    }

    pub fn load_at(&self, now: Timestamp) -> Option<DraftSnapshot> {
        match self.read() {
            Ok(Some(snapshot)) if snapshot.is_usable_at(now) => Some(snapshot),
            Ok(Some(snapshot)) => {
                tracing::info!(
                    key = %self.key,
                    version = snapshot.version,
                    "Discarding expired or incompatible draft",
                );
                self.clear();
                None
            }
            Ok(None) => None,
            Err(DraftError::Serialization(e)) => {
                tracing::warn!(key = %self.key, error = %e, "Discarding unreadable draft");
                self.clear();
                None
            }
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Failed to load draft");
                None
            }
        }
    }

    /// Whether a usable draft exists. Never modifies storage.
    pub fn has_saved(&self) -> bool {
        self.has_saved_at(chrono::Utc::now())
    }

    pub fn has_saved_at(&self, now: Timestamp) -> bool {
        matches!(self.read(), Ok(Some(s)) if s.is_usable_at(now))
    }

    /// Remove the draft, logging any failure.
    pub fn clear(&self) {
        if let Err(e) = self.store.delete(&self.key) {
            tracing::warn!(key = %self.key, error = %e, "Failed to clear draft");
        }
    }

    fn read(&self) -> Result<Option<DraftSnapshot>, DraftError> {
        match self.store.get(&self.key)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
