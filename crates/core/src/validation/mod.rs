//! Per-step form validation.
//!
//! Provides the field/rule types, the static rule table keyed by wizard
//! step, and a pure evaluator that turns a step's rules into field errors.

pub mod evaluator;
pub mod rules;

pub use evaluator::{evaluate_step, StepOutcome};
pub use rules::{rules_for, FieldErrors, FieldRule, FormField, RuleInput};
