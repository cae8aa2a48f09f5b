//! Converter for "TOTP Authenticator" exports.
//!
//! The source app writes a UTF-8 text file holding base64, encrypted with
//! AES-256-CBC keyed by an *unsalted* SHA-256 hash of the password and a
//! zero IV. Both weaknesses are reproduced here for read compatibility
//! only — the own-format envelope never uses this construction. There is no
//! authentication tag, so a structurally "successful" decryption proves
//! nothing; the JSON parse downstream is the de facto integrity check.
//!
//! The decrypted plaintext is not valid JSON as emitted: it needs a fixed,
//! order-sensitive three-step repair (strip two leading characters,
//! truncate after the last `]`, un-escape doubled quotes). The sequence is
//! specific to this one format version and must not be generalized; a
//! changed export format becomes a new converter variant.

use aes::Aes256;
use base64::{engine::general_purpose::STANDARD as B64, Engine};
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, KeyIvInit};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use otpvault_core::{
    secret, Authenticator, AuthenticatorType, Backup, IconResolver, VaultError,
};

use crate::convert::converter::{require_password, BackupConverter, PasswordPolicy};

type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// The format only ever carries time-based credentials.
const KIND: AuthenticatorType = AuthenticatorType::Totp;
/// The `base` field of every observed export. Anything else is an
/// unsupported variant; we do not guess an alternate decoding.
const EXPECTED_BASE: i64 = 16;
/// The source app never sets an IV.
const ZERO_IV: [u8; 16] = [0u8; 16];
/// The issuer value the source app writes when it only has a name.
const UNKNOWN_ISSUER: &str = "Unknown";

pub struct TotpAuthenticatorConverter<'a> {
    icons: &'a dyn IconResolver,
}

impl<'a> TotpAuthenticatorConverter<'a> {
    pub fn new(icons: &'a dyn IconResolver) -> Self {
        Self { icons }
    }
}

impl BackupConverter for TotpAuthenticatorConverter<'_> {
    fn password_policy(&self) -> PasswordPolicy {
        PasswordPolicy::Always
    }

    fn convert(&self, data: &[u8], password: Option<&str>) -> Result<Backup, VaultError> {
        let password = require_password(password)?;
        let key: [u8; 32] = Sha256::digest(password.as_bytes()).into();

        let text = std::str::from_utf8(data)
            .map_err(|e| VaultError::Format(format!("export is not UTF-8: {}", e)))?;
        let ciphertext = B64
            .decode(text.trim())
            .map_err(|e| VaultError::Format(format!("base64 decode: {}", e)))?;

        let plaintext = decrypt_cbc(&key, &ciphertext)?;
        // Wrong passwords usually survive unpadding and die here or in the
        // repair step instead.
        let raw_json = String::from_utf8(plaintext).map_err(|_| {
            VaultError::Format("decrypted payload is not UTF-8 – wrong password?".into())
        })?;
        let repaired = repair_json(&raw_json)?;

        let accounts: Vec<Account> = serde_json::from_str(&repaired)
            .map_err(|e| VaultError::Format(format!("account list parse: {}", e)))?;
        log::debug!("decoded {} TOTP Authenticator account(s)", accounts.len());

        let authenticators = accounts
            .into_iter()
            .map(|account| account.into_authenticator(self.icons))
            .collect::<Result<Vec<_>, _>>()?;

        Backup::new(authenticators, Vec::new(), Vec::new())
    }
}

/// AES-256-CBC/PKCS7 with the format's fixed zero IV.
fn decrypt_cbc(key: &[u8; 32], ciphertext: &[u8]) -> Result<Vec<u8>, VaultError> {
    if ciphertext.is_empty() || ciphertext.len() % 16 != 0 {
        return Err(VaultError::Format(format!(
            "ciphertext length {} is not a positive multiple of the block size",
            ciphertext.len()
        )));
    }

    let mut buf = ciphertext.to_vec();
    let decryptor = Aes256CbcDec::new(key.into(), (&ZERO_IV).into());
    let plaintext = decryptor
        .decrypt_padded_mut::<Pkcs7>(&mut buf)
        .map_err(|_| VaultError::Decryption("invalid padding – wrong password or corrupted data".into()))?;

    Ok(plaintext.to_vec())
}

/// The fixed three-step repair, in exactly this order. Not a general JSON
/// sanitizer.
fn repair_json(raw: &str) -> Result<String, VaultError> {
    // 1. Drop the two junk characters the app writes before the array.
    let stripped: String = raw.chars().skip(2).collect();

    // 2. Truncate everything after the final ']'.
    let end = stripped
        .rfind(']')
        .ok_or_else(|| VaultError::Format("no closing ']' in decrypted payload".into()))?;
    let truncated = &stripped[..=end];

    // 3. Un-escape the doubled quote sequences.
    Ok(truncated.replace("\\\"", "\""))
}

// ─── Foreign records ─────────────────────────────────────────────────

/// One account as the source app serializes it. Numeric fields are
/// string-typed with empty meaning "use the type default"; the parser
/// keeps them as strings so mapping stays honest about what the source
/// bytes actually carried.
#[derive(Debug, Deserialize)]
struct Account {
    #[serde(default)]
    issuer: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    key: String,
    #[serde(default)]
    digits: String,
    #[serde(default)]
    period: String,
    #[serde(default)]
    base: i64,
}

impl Account {
    fn into_authenticator(self, icons: &dyn IconResolver) -> Result<Authenticator, VaultError> {
        // The app writes issuer "Unknown" when it only knows a name.
        let (issuer, username) = if self.issuer == UNKNOWN_ISSUER {
            (self.name, None)
        } else {
            (self.issuer, Some(self.name))
        };

        let period = parse_or_default(&self.period, KIND.default_period(), "period")?;
        let digits = parse_or_default(&self.digits, KIND.default_digits(), "digits")?;

        if self.base != EXPECTED_BASE {
            return Err(VaultError::UnsupportedVariant(format!(
                "cannot decode secrets with base {}",
                self.base
            )));
        }

        let secret_bytes = hex::decode(&self.key)
            .map_err(|e| VaultError::Format(format!("hex secret: {}", e)))?;
        let canonical = secret::encode(&secret_bytes);

        let mut auth = Authenticator::new(KIND, issuer, &canonical)?
            .with_digits(digits)
            .with_period(period);
        auth.username = username;
        auth.icon = icons.find_service_key_by_name(&auth.issuer);
        Ok(auth)
    }
}

fn parse_or_default(raw: &str, default: u32, field: &str) -> Result<u32, VaultError> {
    if raw.is_empty() {
        return Ok(default);
    }
    raw.parse::<u32>()
        .map_err(|e| VaultError::Format(format!("{} {:?}: {}", field, raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cbc::cipher::BlockEncryptMut;
    use otpvault_core::HashAlgorithm;

    type Aes256CbcEnc = cbc::Encryptor<Aes256>;

    /// Mirror of the source app's icon table lookup.
    struct MockIconResolver;

    impl IconResolver for MockIconResolver {
        fn find_service_key_by_name(&self, _name: &str) -> Option<String> {
            Some("default".into())
        }
    }

    /// Build an export exactly as the source app writes it: mangled JSON,
    /// AES-256-CBC with SHA-256 password key and zero IV, then base64 text.
    fn encrypt_export(mangled_json: &str, password: &str) -> Vec<u8> {
        let key: [u8; 32] = Sha256::digest(password.as_bytes()).into();
        let ciphertext = Aes256CbcEnc::new((&key).into(), (&ZERO_IV).into())
            .encrypt_padded_vec_mut::<Pkcs7>(mangled_json.as_bytes());
        B64.encode(ciphertext).into_bytes()
    }

    /// The mangled shape: two junk chars, escaped quotes, trailing junk
    /// after the array close.
    fn mangle(records: &str) -> String {
        format!("&\u{1}{}{}", records.replace('"', "\\\""), "\u{0}\u{0}trailing")
    }

    fn convert(data: &[u8], password: Option<&str>) -> Result<Backup, VaultError> {
        TotpAuthenticatorConverter::new(&MockIconResolver).convert(data, password)
    }

    // ── Field mapping ────────────────────────────────────────────

    #[test]
    fn unknown_issuer_sentinel_promotes_name() {
        let records = r#"[{"issuer":"Unknown","name":"Alice","key":"48656C6C6F","digits":"","period":"","base":16}]"#;
        let data = encrypt_export(&mangle(records), "pw");
        let backup = convert(&data, Some("pw")).unwrap();

        assert_eq!(backup.authenticators.len(), 1);
        let auth = &backup.authenticators[0];
        assert_eq!(auth.issuer, "Alice");
        assert_eq!(auth.username, None);
        assert_eq!(auth.digits, 6);
        assert_eq!(auth.period, 30);
        // hex 48 65 6C 6C 6F re-encoded in the canonical alphabet
        assert_eq!(auth.secret, "JBSWY3DP");
        assert_eq!(auth.kind, AuthenticatorType::Totp);
        assert_eq!(auth.algorithm, HashAlgorithm::Sha1);
        assert_eq!(auth.icon.as_deref(), Some("default"));
    }

    #[test]
    fn named_issuer_keeps_username() {
        let records = r#"[{"issuer":"GitHub","name":"alice@example.com","key":"48656C6C6F","digits":"8","period":"60","base":16}]"#;
        let data = encrypt_export(&mangle(records), "pw");
        let backup = convert(&data, Some("pw")).unwrap();

        let auth = &backup.authenticators[0];
        assert_eq!(auth.issuer, "GitHub");
        assert_eq!(auth.username.as_deref(), Some("alice@example.com"));
        assert_eq!(auth.digits, 8);
        assert_eq!(auth.period, 60);
    }

    #[test]
    fn multiple_accounts_convert_in_order() {
        let records = r#"[{"issuer":"A","name":"a","key":"AA","digits":"","period":"","base":16},{"issuer":"B","name":"b","key":"BB","digits":"","period":"","base":16}]"#;
        let data = encrypt_export(&mangle(records), "pw");
        let backup = convert(&data, Some("pw")).unwrap();
        assert_eq!(backup.authenticators.len(), 2);
        assert_eq!(backup.authenticators[0].issuer, "A");
        assert_eq!(backup.authenticators[1].issuer, "B");
    }

    // ── Fail-fast pipeline ───────────────────────────────────────

    #[test]
    fn missing_password_precedes_any_parsing() {
        let result = convert(b"\xff\xfe not even text", None);
        assert_eq!(result, Err(VaultError::MissingPassword));
    }

    #[test]
    fn wrong_password_never_yields_a_backup() {
        let records = r#"[{"issuer":"A","name":"a","key":"AA","digits":"","period":"","base":16}]"#;
        let data = encrypt_export(&mangle(records), "correct");
        assert!(convert(&data, Some("wrong")).is_err());
    }

    #[test]
    fn unsupported_base_is_rejected() {
        // Junk hex in `key` proves the base check happens before decoding.
        let records = r#"[{"issuer":"A","name":"a","key":"ZZ-not-hex","digits":"","period":"","base":10}]"#;
        let data = encrypt_export(&mangle(records), "pw");
        assert!(matches!(
            convert(&data, Some("pw")),
            Err(VaultError::UnsupportedVariant(_))
        ));
    }

    #[test]
    fn bad_hex_secret_is_a_format_error() {
        let records = r#"[{"issuer":"A","name":"a","key":"XYZ","digits":"","period":"","base":16}]"#;
        let data = encrypt_export(&mangle(records), "pw");
        assert!(matches!(convert(&data, Some("pw")), Err(VaultError::Format(_))));
    }

    #[test]
    fn junk_numeric_field_is_a_format_error() {
        let records = r#"[{"issuer":"A","name":"a","key":"AA","digits":"six","period":"","base":16}]"#;
        let data = encrypt_export(&mangle(records), "pw");
        assert!(matches!(convert(&data, Some("pw")), Err(VaultError::Format(_))));
    }

    #[test]
    fn empty_secret_aborts_whole_conversion() {
        // Second record is fine; the first one's empty key must still sink
        // the conversion, not yield a partial backup.
        let records = r#"[{"issuer":"A","name":"a","key":"","digits":"","period":"","base":16},{"issuer":"B","name":"b","key":"BB","digits":"","period":"","base":16}]"#;
        let data = encrypt_export(&mangle(records), "pw");
        assert!(matches!(convert(&data, Some("pw")), Err(VaultError::InvalidSecret(_))));
    }

    #[test]
    fn zero_digits_or_period_is_rejected() {
        // "0" is a parseable number but violates the model, unlike "" which
        // means "use the default".
        for records in [
            r#"[{"issuer":"A","name":"a","key":"AA","digits":"0","period":"","base":16}]"#,
            r#"[{"issuer":"A","name":"a","key":"AA","digits":"","period":"0","base":16}]"#,
        ] {
            let data = encrypt_export(&mangle(records), "pw");
            assert!(matches!(convert(&data, Some("pw")), Err(VaultError::Format(_))));
        }
    }

    #[test]
    fn not_base64_is_a_format_error() {
        assert!(matches!(
            convert(b"!!! definitely not base64 !!!", Some("pw")),
            Err(VaultError::Format(_))
        ));
    }

    // ── JSON repair ──────────────────────────────────────────────

    #[test]
    fn repair_applies_steps_in_order() {
        let raw = "&\u{1}[{\\\"a\\\":1}]\u{0}\u{0}junk";
        assert_eq!(repair_json(raw).unwrap(), "[{\"a\":1}]");
    }

    #[test]
    fn repair_without_array_close_fails() {
        assert!(matches!(repair_json("xx[{\"a\":1}"), Err(VaultError::Format(_))));
        assert!(matches!(repair_json(""), Err(VaultError::Format(_))));
    }

    #[test]
    fn repair_keeps_last_bracket() {
        // Nested arrays: only content after the *last* ']' goes.
        let raw = "xx[[1],[2]]tail";
        assert_eq!(repair_json(raw).unwrap(), "[[1],[2]]");
    }
}
