//! Livestock listing form: field model, step validation, media handling,
//! draft persistence and the submission sequence.
//!
//! Transport lives elsewhere; the backend is reached through the
//! [`api::ListingApi`] trait.

pub mod api;
pub mod draft;
pub mod error;
pub mod form;
pub mod listing;
pub mod media;
pub mod store;
pub mod submission;
pub mod types;
pub mod validation;
pub mod wizard;
