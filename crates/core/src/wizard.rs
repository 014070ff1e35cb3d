//! Listing wizard step definitions and navigation rules.
//!
//! The create/edit listing form is split into four pages. Moving backward
//! is always allowed; moving forward requires the current page to pass its
//! validation rules (see [`crate::validation`]).

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Minimum step number (1-based).
pub const MIN_STEP: u8 = 1;

/// Maximum step number (1-based).
pub const MAX_STEP: u8 = 4;

/// The four pages of the listing wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum FormStep {
    BasicInfo,
    PricingLocation,
    DetailsHealth,
    Media,
}

impl FormStep {
    /// All steps in order.
    pub const ALL: [FormStep; 4] = [
        Self::BasicInfo,
        Self::PricingLocation,
        Self::DetailsHealth,
        Self::Media,
    ];

    /// Convert a 1-based step number to a `FormStep`.
    pub fn from_number(n: u8) -> Result<Self, CoreError> {
        match n {
            1 => Ok(Self::BasicInfo),
            2 => Ok(Self::PricingLocation),
            3 => Ok(Self::DetailsHealth),
            4 => Ok(Self::Media),
            _ => Err(CoreError::Validation(format!(
                "Invalid step number {n}. Must be between {MIN_STEP} and {MAX_STEP}"
            ))),
        }
    }

    /// Convert to a 1-based step number.
    pub fn number(self) -> u8 {
        match self {
            Self::BasicInfo => 1,
            Self::PricingLocation => 2,
            Self::DetailsHealth => 3,
            Self::Media => 4,
        }
    }

    /// Human-readable label for the step.
    pub fn label(self) -> &'static str {
        match self {
            Self::BasicInfo => "Basic Info",
            Self::PricingLocation => "Pricing & Location",
            Self::DetailsHealth => "Details & Health",
            Self::Media => "Media",
        }
    }

    /// The following step, or `None` on the last page.
    pub fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1).ok()
    }

    /// The preceding step, or `None` on the first page.
    pub fn previous(self) -> Option<Self> {
        self.number()
            .checked_sub(1)
            .and_then(|n| Self::from_number(n).ok())
    }

    pub fn is_last(self) -> bool {
        self == Self::Media
    }
}

impl Default for FormStep {
    fn default() -> Self {
        Self::BasicInfo
    }
}

impl TryFrom<u8> for FormStep {
    type Error = CoreError;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        Self::from_number(n)
    }
}

impl From<FormStep> for u8 {
    fn from(step: FormStep) -> u8 {
        step.number()
    }
}

impl std::fmt::Display for FormStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "step {} ({})", self.number(), self.label())
    }
}

/// Steps that must validate before `target` can be shown, starting from
/// `current`.
///
/// Backward or same-step targets need nothing. A forward target requires
/// every step from `current` up to (but excluding) `target`.
pub fn steps_to_validate(current: FormStep, target: FormStep) -> Vec<FormStep> {
    FormStep::ALL
        .into_iter()
        .filter(|s| *s >= current && *s < target)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
