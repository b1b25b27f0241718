//! HTTP request handlers for all API endpoints.
//!
//! Each handler validates its input, orchestrates the blob store, metadata
//! store, and inference gateway, and serializes a response. They share one
//! linear shape: validate, store, invoke, normalize, persist, respond, with
//! validation failing before any side effect and a persistence failure
//! rolling back the blob written earlier in the same request.
//!
//! # Handler Modules
//!
//! - [`background`]: background removal, streamed back as an attachment
//! - [`health`]: liveness probe
//! - [`items`]: categorized wardrobe uploads, listing, deletion
//! - [`looks`]: bearer-authenticated styled look saving and listing
//! - [`tryon`]: virtual try-on runs
//!
//! # Shared plumbing
//!
//! - [`forms`]: multipart collection with validation-error mapping
//! - [`media`]: image fetching, compensating blob deletes, extension rules
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`] which converts to the
//! appropriate status code and JSON error body at the boundary.

pub mod background;
pub mod forms;
pub mod health;
pub mod items;
pub mod looks;
pub mod media;
pub mod tryon;
