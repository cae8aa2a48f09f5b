//! Cryptographic primitives for the backup envelope.
//!
//! - **Key derivation**: PBKDF2-HMAC-SHA256 (600 000 iterations)
//! - **Encryption**: AES-256-GCM with random 96-bit nonce; the 16-byte
//!   auth tag rides at the end of the ciphertext

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::RngCore;

use otpvault_core::VaultError;

/// PBKDF2 iteration count (OWASP recommendation for SHA-256).
pub const PBKDF2_ITERATIONS: u32 = 600_000;
/// Salt length in bytes.
pub const SALT_LEN: usize = 16;
/// AES-256-GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;
/// GCM authentication tag length in bytes.
pub const TAG_LEN: usize = 16;
/// Derived key length in bytes (256-bit for AES-256).
pub const KEY_LEN: usize = 32;

/// Derive an AES-256 key from a password using PBKDF2-HMAC-SHA256.
pub fn derive_key(password: &str, salt: &[u8], iterations: u32) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2::pbkdf2_hmac::<sha2::Sha256>(password.as_bytes(), salt, iterations, &mut key);
    key
}

/// Generate a cryptographically random salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

/// Generate a cryptographically random nonce for AES-GCM.
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);
    nonce
}

/// Encrypt plaintext bytes with AES-256-GCM. The returned buffer holds
/// ciphertext followed by the auth tag.
pub fn aes_encrypt(
    key: &[u8; KEY_LEN],
    nonce_bytes: &[u8; NONCE_LEN],
    plaintext: &[u8],
) -> Result<Vec<u8>, VaultError> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| VaultError::Serialization(format!("AES init: {}", e)))?;
    let nonce = Nonce::from_slice(nonce_bytes);
    cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| VaultError::Serialization(format!("AES encrypt: {}", e)))
}

/// Decrypt ciphertext bytes with AES-256-GCM. A wrong password and
/// corrupted bytes fail identically on tag verification.
pub fn aes_decrypt(
    key: &[u8; KEY_LEN],
    nonce_bytes: &[u8; NONCE_LEN],
    ciphertext: &[u8],
) -> Result<Vec<u8>, VaultError> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| VaultError::Decryption(format!("AES init: {}", e)))?;
    let nonce = Nonce::from_slice(nonce_bytes);
    cipher.decrypt(nonce, ciphertext).map_err(|_| {
        VaultError::Decryption("integrity check failed – wrong password or corrupted data".into())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Key derivation ───────────────────────────────────────────

    #[test]
    fn derive_key_deterministic() {
        let salt = [0u8; SALT_LEN];
        assert_eq!(derive_key("password", &salt, 1000), derive_key("password", &salt, 1000));
    }

    #[test]
    fn derive_key_differs_by_password_and_salt() {
        let s1 = [0u8; SALT_LEN];
        let s2 = [1u8; SALT_LEN];
        assert_ne!(derive_key("a", &s1, 1000), derive_key("b", &s1, 1000));
        assert_ne!(derive_key("a", &s1, 1000), derive_key("a", &s2, 1000));
    }

    // ── AES-256-GCM ─────────────────────────────────────────────

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let key = derive_key("test", &[42u8; SALT_LEN], 1000);
        let nonce = [0u8; NONCE_LEN];
        let ct = aes_encrypt(&key, &nonce, b"vault payload").unwrap();
        assert_eq!(ct.len(), b"vault payload".len() + TAG_LEN);
        assert_eq!(aes_decrypt(&key, &nonce, &ct).unwrap(), b"vault payload");
    }

    #[test]
    fn wrong_key_fails() {
        let k1 = derive_key("correct", &[0u8; SALT_LEN], 1000);
        let k2 = derive_key("wrong", &[0u8; SALT_LEN], 1000);
        let nonce = [0u8; NONCE_LEN];
        let ct = aes_encrypt(&k1, &nonce, b"secret data").unwrap();
        assert!(matches!(aes_decrypt(&k2, &nonce, &ct), Err(VaultError::Decryption(_))));
    }

    #[test]
    fn tampered_tag_fails() {
        let key = derive_key("test", &[0u8; SALT_LEN], 1000);
        let nonce = [0u8; NONCE_LEN];
        let mut ct = aes_encrypt(&key, &nonce, b"data").unwrap();
        let last = ct.len() - 1;
        ct[last] ^= 0x01;
        assert!(aes_decrypt(&key, &nonce, &ct).is_err());
    }

    // ── Random generation ────────────────────────────────────────

    #[test]
    fn salt_and_nonce_are_unique() {
        assert_ne!(generate_salt(), generate_salt());
        assert_ne!(generate_nonce(), generate_nonce());
    }
}
