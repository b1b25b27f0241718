//! Authentication.
//!
//! Callers authenticate with bearer tokens minted by the identity provider
//! and verified here against the shared secret. There is no login surface in
//! this service; it trusts the provider's signature and nothing else.
//!
//! # Modules
//!
//! - [`current_user`]: extractor for the authenticated user in handlers
//! - [`session`]: bearer token claims and verification
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use wardrobed::auth::AuthenticatedUser;
//!
//! async fn protected_handler(user: AuthenticatedUser) -> Result<String> {
//!     Ok(format!("Hello, {}!", user.id))
//! }
//! ```

pub mod current_user;
pub mod session;

pub use current_user::AuthenticatedUser;
pub use session::{Claims, verify_bearer_token};
