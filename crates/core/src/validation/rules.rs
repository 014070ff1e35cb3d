//! Field identifiers and the per-step rule table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::listing::{
    FormFieldSet, CURRENCY_CODE_LEN, MAX_AGE_LEN, MAX_BREED_LEN, MAX_LOCATION_LEN, MAX_NAME_LEN,
    MAX_WEIGHT_LEN,
};
use crate::wizard::FormStep;

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

pub const MIN_NAME_LEN: usize = 3;
pub const MIN_BREED_LEN: usize = 2;
pub const MIN_DESCRIPTION_LEN: usize = 50;
pub const MIN_HEALTH_STATUS_LEN: usize = 20;

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// A form field that can carry a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    Name,
    CategoryId,
    Breed,
    Gender,
    Age,
    Weight,
    Price,
    Currency,
    Location,
    Description,
    HealthStatus,
    Media,
}

impl FormField {
    /// Backend field name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::CategoryId => "category_id",
            Self::Breed => "breed",
            Self::Gender => "gender",
            Self::Age => "age",
            Self::Weight => "weight",
            Self::Price => "price",
            Self::Currency => "currency",
            Self::Location => "location",
            Self::Description => "description",
            Self::HealthStatus => "health_status",
            Self::Media => "media",
        }
    }

    /// The wizard page this field lives on.
    pub fn step(self) -> FormStep {
        match self {
            Self::Name
            | Self::CategoryId
            | Self::Breed
            | Self::Gender
            | Self::Age
            | Self::Weight => FormStep::BasicInfo,
            Self::Price | Self::Currency | Self::Location => FormStep::PricingLocation,
            Self::Description | Self::HealthStatus => FormStep::DetailsHealth,
            Self::Media => FormStep::Media,
        }
    }
}

impl std::fmt::Display for FormField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field name to error message. A field without an entry has no error.
pub type FieldErrors = BTreeMap<FormField, String>;

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Everything a rule may look at: the field values plus the number of
/// media attachments (pending and existing) currently on the form.
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    pub fields: &'a FormFieldSet,
    pub attachment_count: usize,
}

/// A single check on one field. Returns the error message on failure.
#[derive(Clone, Copy)]
pub struct FieldRule {
    pub field: FormField,
    pub check: fn(&RuleInput<'_>) -> Option<String>,
}

impl std::fmt::Debug for FieldRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldRule").field("field", &self.field).finish()
    }
}

fn text_len(s: &str) -> usize {
    s.trim().chars().count()
}

fn at_least(value: &str, min: usize, label: &str) -> Option<String> {
    (text_len(value) < min).then(|| format!("{label} must be at least {min} characters"))
}

fn at_most(value: &str, max: usize, label: &str) -> Option<String> {
    (text_len(value) > max).then(|| format!("{label} must be at most {max} characters"))
}

fn required(value: &str, label: &str) -> Option<String> {
    value.trim().is_empty().then(|| format!("{label} is required"))
}

const BASIC_INFO_RULES: &[FieldRule] = &[
    FieldRule {
        field: FormField::Name,
        check: |i| at_least(&i.fields.name, MIN_NAME_LEN, "Name"),
    },
    FieldRule {
        field: FormField::Name,
        check: |i| at_most(&i.fields.name, MAX_NAME_LEN, "Name"),
    },
    FieldRule {
        field: FormField::CategoryId,
        check: |i| {
            i.fields
                .category_id
                .is_none()
                .then(|| "Please select a category".to_string())
        },
    },
    FieldRule {
        field: FormField::Breed,
        check: |i| at_least(&i.fields.breed, MIN_BREED_LEN, "Breed"),
    },
    FieldRule {
        field: FormField::Breed,
        check: |i| at_most(&i.fields.breed, MAX_BREED_LEN, "Breed"),
    },
    FieldRule {
        field: FormField::Gender,
        check: |i| {
            (!i.fields.gender.is_set()).then(|| "Please select a gender".to_string())
        },
    },
    FieldRule {
        field: FormField::Age,
        check: |i| required(&i.fields.age, "Age"),
    },
    FieldRule {
        field: FormField::Age,
        check: |i| at_most(&i.fields.age, MAX_AGE_LEN, "Age"),
    },
    FieldRule {
        field: FormField::Weight,
        check: |i| at_most(&i.fields.weight, MAX_WEIGHT_LEN, "Weight"),
    },
];

const PRICING_LOCATION_RULES: &[FieldRule] = &[
    FieldRule {
        field: FormField::Price,
        check: |i| match i.fields.parsed_price() {
            Some(p) if p > 0.0 => None,
            _ => Some("Price must be a number greater than 0".to_string()),
        },
    },
    FieldRule {
        field: FormField::Currency,
        check: |i| {
            let code = i.fields.currency.trim();
            let ok = code.len() == CURRENCY_CODE_LEN && code.chars().all(|c| c.is_ascii_alphabetic());
            (!ok).then(|| "Currency must be a 3-letter code".to_string())
        },
    },
    FieldRule {
        field: FormField::Location,
        check: |i| required(&i.fields.location, "Location"),
    },
    FieldRule {
        field: FormField::Location,
        check: |i| at_most(&i.fields.location, MAX_LOCATION_LEN, "Location"),
    },
];

const DETAILS_HEALTH_RULES: &[FieldRule] = &[
    FieldRule {
        field: FormField::Description,
        check: |i| at_least(&i.fields.description, MIN_DESCRIPTION_LEN, "Description"),
    },
    FieldRule {
        field: FormField::HealthStatus,
        check: |i| at_least(&i.fields.health_status, MIN_HEALTH_STATUS_LEN, "Health status"),
    },
];

const MEDIA_RULES: &[FieldRule] = &[FieldRule {
    field: FormField::Media,
    check: |i| {
        (i.attachment_count == 0).then(|| "At least one image or video is required".to_string())
    },
}];

/// The rules owned by `step`, in evaluation order.
pub fn rules_for(step: FormStep) -> &'static [FieldRule] {
    match step {
        FormStep::BasicInfo => BASIC_INFO_RULES,
        FormStep::PricingLocation => PRICING_LOCATION_RULES,
        FormStep::DetailsHealth => DETAILS_HEALTH_RULES,
        FormStep::Media => MEDIA_RULES,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_rule_belongs_to_its_step() {
        for step in FormStep::ALL {
            for rule in rules_for(step) {
                assert_eq!(rule.field.step(), step, "{} is on the wrong step", rule.field);
            }
        }
    }

    #[test]
    fn field_names_match_backend() {
        assert_eq!(FormField::CategoryId.as_str(), "category_id");
        assert_eq!(FormField::HealthStatus.as_str(), "health_status");
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        assert!(at_least("ñañ", 3, "Name").is_none());
        assert!(at_least("  ab  ", 3, "Name").is_some());
    }
}
