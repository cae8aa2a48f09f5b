//! Error types shared by the OtpVault crates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Everything that can go wrong while reading or producing a backup.
///
/// Every variant is terminal for the single attempt that raised it: no
/// automatic retry happens at this layer and no partial `Backup` is ever
/// returned alongside an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultError {
    /// A required password was not supplied. Raised before any input is
    /// parsed, so callers get a clean prompt-for-password signal.
    MissingPassword,
    /// Authenticated decryption failed — wrong password or corrupted bytes.
    Decryption(String),
    /// Bytes do not match the expected structure after decryption/repair.
    Format(String),
    /// A recognized field carries a value we have no decode path for.
    UnsupportedVariant(String),
    /// Own-format schema version outside the supported range.
    UnsupportedVersion(u32),
    /// A shared secret failed canonicalization.
    InvalidSecret(String),
    /// The canonical encoding could not be produced.
    Serialization(String),
}

impl fmt::Display for VaultError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPassword => write!(f, "A password is required for this backup"),
            Self::Decryption(msg) => write!(f, "Decryption error: {}", msg),
            Self::Format(msg) => write!(f, "Format error: {}", msg),
            Self::UnsupportedVariant(msg) => write!(f, "Unsupported variant: {}", msg),
            Self::UnsupportedVersion(v) => write!(f, "Unsupported backup version: {}", v),
            Self::InvalidSecret(msg) => write!(f, "Invalid secret: {}", msg),
            Self::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for VaultError {}
