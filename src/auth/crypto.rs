// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 QXB Gateway Contributors

//! Password hashing and custodial key wrapping.
//!
//! - argon2id for password stretching
//! - AES-256-GCM for private key encryption
//!
//! The same KDF backs both concerns, with independent salts: the password
//! hash salt never feeds the encryption key and vice versa. Wrapped keys are
//! stored as base64 with the 12-byte nonce prepended to the ciphertext.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use argon2::{Algorithm, Argon2, Params, Version};
use base64ct::{Base64, Encoding};
use rand::RngCore;

/// argon2id parameters
const ARGON_M_COST: u32 = 64 * 1024; // 64 MiB
const ARGON_T_COST: u32 = 1; // 1 iteration
const ARGON_P_COST: u32 = 1; // parallelism 1

/// Derived key length (AES-256 key size).
const KEY_LEN: usize = 32;

/// Salt length for both hashing and wrapping.
const SALT_LEN: usize = 16;

/// AES-GCM nonce length.
const NONCE_LEN: usize = 12;

/// Errors from password hashing or key wrapping.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("key derivation failed: {0}")]
    Kdf(String),

    #[error("encryption failed: {0}")]
    Encrypt(String),

    #[error("decryption failed")]
    Decrypt,

    #[error("malformed stored value: {0}")]
    Encoding(String),
}

/// Password hash and its salt, both base64, ready for storage.
#[derive(Debug, Clone)]
pub struct PasswordRecord {
    pub hash_b64: String,
    pub salt_b64: String,
}

/// Wrapped private key and its KDF salt, both base64, ready for storage.
#[derive(Debug, Clone)]
pub struct WrappedKey {
    pub ciphertext_b64: String,
    pub salt_b64: String,
}

/// Stretch a password into a 32-byte key with argon2id.
fn derive_key(password: &str, salt: &[u8]) -> Result<[u8; KEY_LEN], CryptoError> {
    let params = Params::new(ARGON_M_COST, ARGON_T_COST, ARGON_P_COST, Some(KEY_LEN))
        .map_err(|e| CryptoError::Kdf(e.to_string()))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut output = [0u8; KEY_LEN];
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut output)
        .map_err(|e| CryptoError::Kdf(e.to_string()))?;

    Ok(output)
}

fn random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<PasswordRecord, CryptoError> {
    let salt = random_bytes::<SALT_LEN>();
    let key = derive_key(password, &salt)?;

    Ok(PasswordRecord {
        hash_b64: Base64::encode_string(&key),
        salt_b64: Base64::encode_string(&salt),
    })
}

/// Verify a password against a stored hash + salt.
///
/// Returns false for any malformed stored value rather than erroring; a
/// corrupt record must not authenticate.
pub fn verify_password(password: &str, hash_b64: &str, salt_b64: &str) -> bool {
    let salt = match Base64::decode_vec(salt_b64) {
        Ok(s) => s,
        Err(_) => return false,
    };
    let expected = match Base64::decode_vec(hash_b64) {
        Ok(h) => h,
        Err(_) => return false,
    };
    let key = match derive_key(password, &salt) {
        Ok(k) => k,
        Err(_) => return false,
    };
    if key.len() != expected.len() {
        return false;
    }

    // Constant-time comparison
    let mut diff = 0u8;
    for (a, b) in key.iter().zip(expected.iter()) {
        diff |= a ^ b;
    }
    diff == 0
}

/// Encrypt a private key under a password-derived AES-256-GCM key.
pub fn wrap_key(password: &str, plaintext: &[u8]) -> Result<WrappedKey, CryptoError> {
    let salt = random_bytes::<SALT_LEN>();
    let key = derive_key(password, &salt)?;

    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|e| CryptoError::Encrypt(e.to_string()))?;

    let nonce_bytes = random_bytes::<NONCE_LEN>();
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| CryptoError::Encrypt(e.to_string()))?;

    // nonce || ciphertext
    let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend_from_slice(&ciphertext);

    Ok(WrappedKey {
        ciphertext_b64: Base64::encode_string(&sealed),
        salt_b64: Base64::encode_string(&salt),
    })
}

/// Decrypt a wrapped private key with the user's password.
///
/// A wrong password or a tampered ciphertext both fail the GCM tag check and
/// surface as [`CryptoError::Decrypt`].
pub fn unwrap_key(
    password: &str,
    ciphertext_b64: &str,
    salt_b64: &str,
) -> Result<Vec<u8>, CryptoError> {
    let salt =
        Base64::decode_vec(salt_b64).map_err(|e| CryptoError::Encoding(e.to_string()))?;
    let sealed =
        Base64::decode_vec(ciphertext_b64).map_err(|e| CryptoError::Encoding(e.to_string()))?;

    if sealed.len() < NONCE_LEN {
        return Err(CryptoError::Encoding("ciphertext too short".to_string()));
    }

    let key = derive_key(password, &salt)?;
    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|e| CryptoError::Encrypt(e.to_string()))?;

    let (nonce_bytes, body) = sealed.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    cipher.decrypt(nonce, body).map_err(|_| CryptoError::Decrypt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_password() {
        let record = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &record.hash_b64, &record.salt_b64));
        assert!(!verify_password("hunter3", &record.hash_b64, &record.salt_b64));
    }

    #[test]
    fn verify_rejects_malformed_record() {
        assert!(!verify_password("pw", "not base64!!!", "also not!!!"));
        assert!(!verify_password("pw", "", ""));
    }

    #[test]
    fn same_password_different_salts() {
        let a = hash_password("pw").unwrap();
        let b = hash_password("pw").unwrap();
        assert_ne!(a.salt_b64, b.salt_b64);
        assert_ne!(a.hash_b64, b.hash_b64);
    }

    #[test]
    fn wrap_and_unwrap_roundtrip() {
        let secret = [7u8; 32];
        let wrapped = wrap_key("correct horse", &secret).unwrap();

        let recovered = unwrap_key("correct horse", &wrapped.ciphertext_b64, &wrapped.salt_b64)
            .unwrap();
        assert_eq!(recovered, secret);
    }

    #[test]
    fn unwrap_with_wrong_password_fails() {
        let secret = [7u8; 32];
        let wrapped = wrap_key("right", &secret).unwrap();

        let result = unwrap_key("wrong", &wrapped.ciphertext_b64, &wrapped.salt_b64);
        assert!(matches!(result, Err(CryptoError::Decrypt)));
    }

    #[test]
    fn unwrap_detects_tampering() {
        let secret = [7u8; 32];
        let wrapped = wrap_key("pw", &secret).unwrap();

        let mut sealed = Base64::decode_vec(&wrapped.ciphertext_b64).unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0xFF;
        let tampered = Base64::encode_string(&sealed);

        let result = unwrap_key("pw", &tampered, &wrapped.salt_b64);
        assert!(matches!(result, Err(CryptoError::Decrypt)));
    }

    #[test]
    fn unwrap_rejects_truncated_ciphertext() {
        let short = Base64::encode_string(&[1u8, 2, 3]);
        let salt = Base64::encode_string(&[0u8; 16]);
        let result = unwrap_key("pw", &short, &salt);
        assert!(matches!(result, Err(CryptoError::Encoding(_))));
    }
}
