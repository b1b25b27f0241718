//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: axum route handlers for all endpoints
//! - **[`models`]**: request/response structures defining the wire contract
//!
//! # API Structure
//!
//! - **Wardrobe items** (`/api/v1/items`): categorized upload, listing,
//!   deletion
//! - **Background removal** (`/api/v1/background-removal`): synchronous
//!   image transformation, nothing persisted
//! - **Virtual try-on** (`/api/v1/tryon`): person + garment composition via
//!   the inference gateway
//! - **Styled looks** (`/api/v1/looks`): bearer-authenticated save and
//!   listing of generated outfits
//! - **Health** (`/healthz`): liveness probe

pub mod handlers;
pub mod models;
