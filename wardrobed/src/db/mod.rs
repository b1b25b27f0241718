//! Metadata store: persisted records and their backends.
//!
//! The [`store::WardrobeStore`] trait is the seam between the orchestration
//! handlers and persistence. Two backends implement it:
//!
//! - PostgreSQL ([`store::PostgresWardrobeStore`]) for production, with
//!   embedded migrations run at connect time
//! - In-memory ([`store::MemoryWardrobeStore`]) for tests and local
//!   development
//!
//! Handlers receive the store as an `Arc<dyn WardrobeStore>` through the
//! application state and never construct a backend themselves; construction
//! goes through [`store::create_wardrobe_store`].

pub mod errors;
pub mod store;

pub use errors::DbError;
pub use store::{
    LookParams, MemoryWardrobeStore, PostgresWardrobeStore, StyledLook, StyledLookCreate, WardrobeItem, WardrobeItemCreate,
    WardrobeStore, create_wardrobe_store,
};
