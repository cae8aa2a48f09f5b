//! The versioned envelope: `Backup` ⇄ bytes.
//!
//! Byte layout, stable across versions:
//!
//! ```text
//! [0]      schema version (u8)
//! [1]      encrypted flag (0x00 plaintext, 0x01 encrypted)
//! -- encrypted --
//! [2..18]  salt (16 bytes)
//! [18..30] nonce (12 bytes)
//! [30..]   AES-256-GCM ciphertext + 16-byte auth tag
//! -- plaintext --
//! [2..]    canonical JSON encoding of the backup
//! ```
//!
//! Readers tolerate unknown future fields inside the JSON payload but never
//! guess at the envelope itself: an unknown flag or out-of-range version is
//! a hard error.

use otpvault_core::{Backup, VaultError};

use crate::backup::crypto;

/// Current envelope schema version. The decode path rejects anything
/// outside `1..=SCHEMA_VERSION`.
pub const SCHEMA_VERSION: u8 = 1;

const FLAG_PLAIN: u8 = 0x00;
const FLAG_ENCRYPTED: u8 = 0x01;
const HEADER_LEN: usize = 2;
/// Header + salt + nonce + tag of an empty ciphertext.
const MIN_ENCRYPTED_LEN: usize =
    HEADER_LEN + crypto::SALT_LEN + crypto::NONCE_LEN + crypto::TAG_LEN;

/// Serialize a backup, encrypting when a password is supplied. The empty
/// string is a valid password and still encrypts.
pub fn to_bytes(backup: &Backup, password: Option<&str>) -> Result<Vec<u8>, VaultError> {
    let payload = serde_json::to_vec(backup)
        .map_err(|e| VaultError::Serialization(format!("backup encode: {}", e)))?;

    let mut out = Vec::with_capacity(MIN_ENCRYPTED_LEN + payload.len());
    out.push(SCHEMA_VERSION);

    match password {
        Some(pw) => {
            let salt = crypto::generate_salt();
            let nonce = crypto::generate_nonce();
            let key = crypto::derive_key(pw, &salt, crypto::PBKDF2_ITERATIONS);
            let ciphertext = crypto::aes_encrypt(&key, &nonce, &payload)?;

            out.push(FLAG_ENCRYPTED);
            out.extend_from_slice(&salt);
            out.extend_from_slice(&nonce);
            out.extend_from_slice(&ciphertext);
        }
        None => {
            out.push(FLAG_PLAIN);
            out.extend_from_slice(&payload);
        }
    }

    Ok(out)
}

/// Read an envelope back into a [`Backup`].
///
/// Fails with [`VaultError::MissingPassword`] if the envelope is encrypted
/// and no password was supplied, before any payload work happens. A wrong
/// password fails deterministically on tag verification — never a
/// structurally valid but garbage backup. A password supplied for a
/// plaintext envelope is ignored.
pub fn from_bytes(data: &[u8], password: Option<&str>) -> Result<Backup, VaultError> {
    if data.len() < HEADER_LEN {
        return Err(VaultError::Format("envelope shorter than its header".into()));
    }

    let version = data[0];
    if version == 0 || version > SCHEMA_VERSION {
        return Err(VaultError::UnsupportedVersion(version as u32));
    }

    match data[1] {
        FLAG_PLAIN => decode_payload(&data[HEADER_LEN..]),
        FLAG_ENCRYPTED => {
            let password = password.ok_or(VaultError::MissingPassword)?;
            if data.len() < MIN_ENCRYPTED_LEN {
                return Err(VaultError::Format("truncated encrypted envelope".into()));
            }

            let salt = &data[HEADER_LEN..HEADER_LEN + crypto::SALT_LEN];
            let nonce_start = HEADER_LEN + crypto::SALT_LEN;
            let nonce_bytes = &data[nonce_start..nonce_start + crypto::NONCE_LEN];
            let ciphertext = &data[nonce_start + crypto::NONCE_LEN..];

            let key = crypto::derive_key(password, salt, crypto::PBKDF2_ITERATIONS);
            let mut nonce = [0u8; crypto::NONCE_LEN];
            nonce.copy_from_slice(nonce_bytes);

            let payload = crypto::aes_decrypt(&key, &nonce, ciphertext)?;
            decode_payload(&payload)
        }
        other => Err(VaultError::Format(format!("unknown envelope flag 0x{:02x}", other))),
    }
}

fn decode_payload(bytes: &[u8]) -> Result<Backup, VaultError> {
    let backup: Backup =
        serde_json::from_slice(bytes).map_err(|e| VaultError::Format(format!("backup decode: {}", e)))?;
    // The payload's own schema tag must agree with what we can read, not
    // just the envelope byte.
    if backup.version == 0 || backup.version > Backup::SCHEMA_VERSION {
        return Err(VaultError::UnsupportedVersion(backup.version));
    }
    backup.validate()?;
    log::debug!(
        "decoded backup: {} authenticator(s), {} categor(ies), {} custom icon(s)",
        backup.authenticators.len(),
        backup.categories.len(),
        backup.custom_icons.len()
    );
    Ok(backup)
}
