//! Shared-secret canonicalization.
//!
//! The canonical alphabet is RFC 4648 base-32, uppercase, without padding.
//! Every secret entering the model is re-encoded into this form regardless
//! of the encoding its source app used.

use crate::vault::error::VaultError;
use crate::vault::types::AuthenticatorType;

/// Normalize case and strip separators and padding. Does not validate.
pub fn clean(raw: &str) -> String {
    let stripped: String = raw.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
    stripped.to_uppercase().trim_end_matches('=').to_string()
}

/// Validate and re-encode a secret into the canonical alphabet.
///
/// Rejects empty input. Accepts padded or unpadded base-32 in any case.
/// Idempotent: canonicalizing an already-canonical secret yields the same
/// value.
pub fn canonicalize(raw: &str) -> Result<String, VaultError> {
    let cleaned = clean(raw);
    if cleaned.is_empty() {
        return Err(VaultError::InvalidSecret("secret is empty".into()));
    }
    // Decoding proves the string fits the alphabet.
    decode(&cleaned)?;
    Ok(cleaned)
}

/// Type-aware canonicalization. Steam and mOTP secrets currently share the
/// base-32 rule; the type hook exists so a divergent alphabet stays a local
/// change.
pub fn canonicalize_for(raw: &str, _kind: AuthenticatorType) -> Result<String, VaultError> {
    canonicalize(raw)
}

/// Encode raw bytes in the canonical alphabet.
pub fn encode(bytes: &[u8]) -> String {
    base32::encode(base32::Alphabet::Rfc4648 { padding: false }, bytes)
}

/// Decode a canonical (or padded) secret string to raw bytes.
pub fn decode(secret: &str) -> Result<Vec<u8>, VaultError> {
    let cleaned = clean(secret);
    let padded = pad_base32(&cleaned);
    base32::decode(base32::Alphabet::Rfc4648 { padding: true }, &padded)
        .or_else(|| base32::decode(base32::Alphabet::Rfc4648 { padding: false }, &cleaned))
        .ok_or_else(|| VaultError::InvalidSecret("not valid base-32".into()))
}

/// Pad to a multiple of 8 characters so the strict decoder accepts it.
fn pad_base32(s: &str) -> String {
    let rem = s.len() % 8;
    if rem == 0 {
        s.to_string()
    } else {
        let mut padded = s.to_string();
        padded.extend(std::iter::repeat('=').take(8 - rem));
        padded
    }
}
