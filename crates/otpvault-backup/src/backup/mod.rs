//! Backup crate: sub-modules.

pub mod crypto;
pub mod envelope;
