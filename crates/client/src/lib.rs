//! HTTP client and command-line front end for the livestock listing form.
//!
//! [`admin_api::AdminApiClient`] implements the core
//! [`glafrica_core::api::ListingApi`] seam against the admin REST API.

pub mod admin_api;
pub mod auth;
pub mod config;
pub mod logging;
pub mod manifest;
