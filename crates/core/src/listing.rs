//! Livestock listing field set.
//!
//! The editable, serializable values of a listing. Nothing in here holds a
//! file handle, so a [`FormFieldSet`] can be written to a draft on its own
//! while media stays in memory.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;
use crate::types::{CategoryId, TagId};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Currency used when a listing does not specify one.
pub const DEFAULT_CURRENCY: &str = "NGN";

/// Backend column limits for listing text fields.
pub const MAX_NAME_LEN: usize = 200;
pub const MAX_BREED_LEN: usize = 100;
pub const MAX_AGE_LEN: usize = 50;
pub const MAX_WEIGHT_LEN: usize = 50;
pub const MAX_LOCATION_LEN: usize = 200;

/// Currency codes are ISO-4217 style, three letters.
pub const CURRENCY_CODE_LEN: usize = 3;

// ---------------------------------------------------------------------------
// Gender
// ---------------------------------------------------------------------------

/// Sex of the animal, or of the group for mixed lots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "mixed")]
    MixedGroup,
    #[default]
    #[serde(rename = "")]
    Unset,
}

impl Gender {
    /// Parse the backend code (`M`, `F`, `mixed`, or empty).
    pub fn from_code(code: &str) -> Result<Self, CoreError> {
        match code {
            "M" => Ok(Self::Male),
            "F" => Ok(Self::Female),
            "mixed" => Ok(Self::MixedGroup),
            "" => Ok(Self::Unset),
            other => Err(CoreError::Validation(format!(
                "Invalid gender '{other}'. Must be one of: M, F, mixed"
            ))),
        }
    }

    /// Backend code for this value.
    pub fn code(self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
            Self::MixedGroup => "mixed",
            Self::Unset => "",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::MixedGroup => "Mixed (Group)",
            Self::Unset => "Not set",
        }
    }

    /// Whether a concrete value has been chosen.
    pub fn is_set(self) -> bool {
        self != Self::Unset
    }
}

// ---------------------------------------------------------------------------
// Vaccination history
// ---------------------------------------------------------------------------

/// One entry in a listing's vaccination history.
///
/// The id is generated client-side and only used to address the row while
/// editing; the backend stores the list as free-form JSON, so rows read
/// back without an `id` or `date` get a fresh id and an empty date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaccinationRecord {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl VaccinationRecord {
    /// A blank record, as created by the "add vaccination" action.
    pub fn empty() -> Self {
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            date: String::new(),
            notes: None,
        }
    }

    /// Records without a vaccine name are dropped at submit time.
    pub fn is_blank(&self) -> bool {
        self.name.trim().is_empty()
    }
}

/// Partial update applied to a [`VaccinationRecord`] by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VaccinationPatch {
    pub name: Option<String>,
    pub date: Option<String>,
    pub notes: Option<Option<String>>,
}

impl VaccinationPatch {
    fn apply(self, record: &mut VaccinationRecord) {
        if let Some(name) = self.name {
            record.name = name;
        }
        if let Some(date) = self.date {
            record.date = date;
        }
        if let Some(notes) = self.notes {
            record.notes = notes;
        }
    }
}

// ---------------------------------------------------------------------------
// Field set
// ---------------------------------------------------------------------------

/// All editable values of a livestock listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormFieldSet {
    pub name: String,
    pub category_id: Option<CategoryId>,
    pub breed: String,
    pub gender: Gender,
    pub age: String,
    pub weight: String,
    /// Kept as text so partially typed values survive a draft round-trip.
    pub price: String,
    pub currency: String,
    pub location: String,
    pub description: String,
    pub health_status: String,
    pub vaccination_history: Vec<VaccinationRecord>,
    pub tag_ids: BTreeSet<TagId>,
}

impl Default for FormFieldSet {
    fn default() -> Self {
        Self {
            name: String::new(),
            category_id: None,
            breed: String::new(),
            gender: Gender::Unset,
            age: String::new(),
            weight: String::new(),
            price: String::new(),
            currency: DEFAULT_CURRENCY.to_string(),
            location: String::new(),
            description: String::new(),
            health_status: String::new(),
            vaccination_history: Vec::new(),
            tag_ids: BTreeSet::new(),
        }
    }
}

impl FormFieldSet {
    /// Parse the price text, if it is a finite number.
    pub fn parsed_price(&self) -> Option<f64> {
        self.price
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite())
    }

    /// Vaccination records that will be sent to the backend.
    pub fn submitted_vaccinations(&self) -> Vec<VaccinationRecord> {
        self.vaccination_history
            .iter()
            .filter(|r| !r.is_blank())
            .cloned()
            .collect()
    }

    /// Append a blank vaccination record and return its id.
    pub fn add_vaccination(&mut self) -> Uuid {
        let record = VaccinationRecord::empty();
        let id = record.id;
        self.vaccination_history.push(record);
        id
    }

    /// Apply `patch` to the record with `id`.
    pub fn update_vaccination(&mut self, id: Uuid, patch: VaccinationPatch) -> Result<(), CoreError> {
        let record = self
            .vaccination_history
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| CoreError::NotFound {
                entity: "vaccination record",
                id: id.to_string(),
            })?;
        patch.apply(record);
        Ok(())
    }

    /// Remove the record with `id`. Returns `false` if no such record exists.
    pub fn remove_vaccination(&mut self, id: Uuid) -> bool {
        let before = self.vaccination_history.len();
        self.vaccination_history.retain(|r| r.id != id);
        self.vaccination_history.len() != before
    }

    /// Add the tag if absent, remove it if present.
    pub fn toggle_tag(&mut self, tag: TagId) {
        if !self.tag_ids.remove(&tag) {
            self.tag_ids.insert(tag);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
