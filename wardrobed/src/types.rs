//! Common type definitions.
//!
//! Entity IDs are UUIDs wrapped in type aliases:
//!
//! - [`ItemId`]: Wardrobe item identifier
//! - [`LookId`]: Styled look identifier

use uuid::Uuid;

// Type aliases for IDs
pub type ItemId = Uuid;
pub type LookId = Uuid;
