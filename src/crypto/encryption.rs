// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! AES-256-GCM Document Encryption
//!
//! Data-encapsulation layer of the Seal envelope. The document key is a
//! fresh 32-byte key per document; the Seal identity (`package_id || id`)
//! is bound in as additional authenticated data so a ciphertext cannot be
//! replayed under a different allowlist.
//!
//! **Format**:
//! ```text
//! nonce (12 bytes) | ciphertext+tag (variable length)
//! ```

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use rand::{rngs::OsRng, RngCore};

use super::CryptoError;

pub const NONCE_SIZE: usize = 12;
pub const KEY_SIZE: usize = 32;

/// Encrypt `plaintext` under `key`, authenticating `aad`
///
/// A random 12-byte nonce is generated and prepended to the output.
pub fn encrypt_aes_gcm(plaintext: &[u8], key: &[u8; KEY_SIZE], aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| CryptoError::InvalidKey {
        key_type: "document_key".to_string(),
        reason: e.to_string(),
    })?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, Payload { msg: plaintext, aad })
        .map_err(|e| CryptoError::EncryptionFailed {
            operation: "document".to_string(),
            reason: e.to_string(),
        })?;

    let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypt output of [`encrypt_aes_gcm`]
///
/// # Errors
///
/// - Input shorter than the nonce
/// - Authentication tag mismatch (wrong key, wrong AAD or tampered data)
pub fn decrypt_aes_gcm(encrypted: &[u8], key: &[u8; KEY_SIZE], aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if encrypted.len() < NONCE_SIZE {
        return Err(CryptoError::InvalidPayload {
            field: "ciphertext".to_string(),
            reason: format!(
                "expected at least {} bytes for nonce, got {}",
                NONCE_SIZE,
                encrypted.len()
            ),
        });
    }

    let (nonce_bytes, ciphertext) = encrypted.split_at(NONCE_SIZE);
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| CryptoError::InvalidKey {
        key_type: "document_key".to_string(),
        reason: e.to_string(),
    })?;

    cipher
        .decrypt(
            Nonce::from_slice(nonce_bytes),
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|e| CryptoError::DecryptionFailed {
            operation: "document".to_string(),
            reason: format!("authentication error: {}", e),
        })
}
