//! Core crate: sub-modules.

pub mod error;
pub mod icon;
pub mod secret;
pub mod types;

// Re-export top-level items for convenience.
pub use error::VaultError;
pub use icon::{IconResolver, NullIconResolver};
pub use types::*;
