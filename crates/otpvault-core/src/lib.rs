//! # OtpVault – Canonical Credential Model
//!
//! Shared foundation for the OtpVault backup and conversion crates:
//!
//! - **Entities** – `Authenticator`, `Category`, `CustomIcon` and the
//!   `Backup` aggregate that owns them
//! - **Secret canonicalizer** – every shared secret is re-encoded into
//!   RFC 4648 base-32 (uppercase, no padding) before acceptance
//! - **Error taxonomy** – one `VaultError` enum shared by all crates
//! - **Icon resolution** – the `IconResolver` trait consumed by converters

pub mod vault;

pub use vault::error::VaultError;
pub use vault::icon::{IconResolver, NullIconResolver};
pub use vault::secret;
pub use vault::types::*;
