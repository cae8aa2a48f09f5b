//! # OtpVault – Foreign-Format Converters
//!
//! Maps backups exported by other authenticator applications onto the
//! canonical [`otpvault_core::Backup`] model:
//!
//! - **Converter contract** – `password_policy()` + `convert()`, checked
//!   before any parsing so callers get a clean prompt-for-password signal
//! - **Deterministic dispatch** – a closed set of source applications tried
//!   in a fixed order, never open-ended detection
//! - **Per-app decoders** – each converter owns its format's decryption,
//!   parsing-quirk repair and field mapping; partial results are never
//!   returned

pub mod convert;

pub use convert::converter::{
    convert_from, try_convert_any, BackupConverter, PasswordPolicy, SourceApp,
};
