//! API request and response data models.
//!
//! These structures define the public HTTP contract, kept separate from the
//! database models so the wire shapes and storage shapes can evolve
//! independently. Every success payload carries a `success` boolean; error
//! payloads are produced centrally by [`crate::errors::Error`].
//!
//! - [`items`]: categorized uploads and the wardrobe listing
//! - [`looks`]: styled look saving and listing
//! - [`tryon`]: virtual try-on parameters and generated images

pub mod items;
pub mod looks;
pub mod tryon;
