//! The converter contract and dispatch over supported source apps.

use serde::{Deserialize, Serialize};
use std::fmt;

use otpvault_core::{Backup, IconResolver, VaultError};

// ─── Contract ────────────────────────────────────────────────────────

/// Whether a foreign format needs a password before conversion can start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordPolicy {
    /// The format is never protected.
    Never,
    /// The format may or may not be protected; try without, prompt on
    /// failure.
    Optional,
    /// The format is always protected; conversion without a password fails
    /// with [`VaultError::MissingPassword`] before any input is read.
    Always,
}

/// One implementation per supported foreign application. Every converter
/// either produces a [`Backup`] satisfying the canonical model invariants
/// or fails — partial results are never returned.
pub trait BackupConverter {
    fn password_policy(&self) -> PasswordPolicy;

    fn convert(&self, data: &[u8], password: Option<&str>) -> Result<Backup, VaultError>;
}

/// Shared pre-parse gate for `Always` converters.
pub(crate) fn require_password(password: Option<&str>) -> Result<&str, VaultError> {
    password.ok_or(VaultError::MissingPassword)
}

// ─── Dispatch ────────────────────────────────────────────────────────

/// The closed set of foreign applications we can read backups from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceApp {
    TotpAuthenticator,
}

impl fmt::Display for SourceApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TotpAuthenticator => write!(f, "TOTP Authenticator"),
        }
    }
}

impl SourceApp {
    /// Deterministic dispatch order for [`try_convert_any`].
    pub const ALL: &'static [SourceApp] = &[SourceApp::TotpAuthenticator];

    /// The converter implementation for this source app.
    pub fn converter<'a>(&self, icons: &'a dyn IconResolver) -> Box<dyn BackupConverter + 'a> {
        match self {
            Self::TotpAuthenticator => Box::new(
                crate::convert::totp_authenticator::TotpAuthenticatorConverter::new(icons),
            ),
        }
    }
}

/// Convert input known to come from a specific source app. `Always`
/// converters own their [`VaultError::MissingPassword`] gate as the first
/// step of `convert`.
pub fn convert_from(
    app: SourceApp,
    data: &[u8],
    password: Option<&str>,
    icons: &dyn IconResolver,
) -> Result<Backup, VaultError> {
    app.converter(icons).convert(data, password)
}

/// Try every supported source app against unknown input, in the fixed
/// [`SourceApp::ALL`] order. Returns the first success together with the
/// app that accepted the bytes, or the last error.
pub fn try_convert_any(
    data: &[u8],
    password: Option<&str>,
    icons: &dyn IconResolver,
) -> Result<(SourceApp, Backup), VaultError> {
    let mut last = VaultError::Format("no converter accepted the input".into());
    for app in SourceApp::ALL {
        match convert_from(*app, data, password, icons) {
            Ok(backup) => return Ok((*app, backup)),
            Err(err) => {
                log::debug!("{} converter declined: {}", app, err);
                last = err;
            }
        }
    }
    Err(last)
}
