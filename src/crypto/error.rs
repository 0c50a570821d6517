// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Crypto Error Types
//!
//! Error type shared by the document envelope (AES-256-GCM), the key-share
//! derivation (secp256k1 + HKDF), Shamir splitting and Ed25519 signing.
//!
//! ## Error Variants
//!
//! - **DecryptionFailed**: AEAD decryption failed (wrong key, corrupted ciphertext, tag mismatch)
//! - **EncryptionFailed**: AEAD encryption could not be performed
//! - **InvalidSignature**: Ed25519 signature malformed or verification failed
//! - **InvalidKey**: Invalid key material (wrong size, invalid curve point)
//! - **InvalidPayload**: Encoded field failed validation (hex/base64/BCS)
//! - **KeyDerivationFailed**: HKDF expansion failed
//! - **InvalidThreshold**: Threshold outside `1..=shares`
//! - **Other**: Anything else
//!
//! Every variant carries the operation or field that failed so messages
//! surfaced to callers stay readable without a backtrace.

use std::fmt;

/// Error type for all cryptographic operations
#[derive(Debug, Clone, PartialEq)]
pub enum CryptoError {
    /// AEAD decryption failed
    DecryptionFailed {
        /// Which operation was being performed
        operation: String,
        /// Specific failure reason
        reason: String,
    },

    /// AEAD encryption failed
    EncryptionFailed { operation: String, reason: String },

    /// Signature malformed or verification failed
    InvalidSignature { operation: String, reason: String },

    /// Invalid cryptographic key
    InvalidKey {
        /// Type of key that failed (e.g., "key_server_public_key", "admin_private_key")
        key_type: String,
        reason: String,
    },

    /// Encoded payload validation failed
    InvalidPayload { field: String, reason: String },

    /// HKDF derivation failed
    KeyDerivationFailed { operation: String, reason: String },

    /// Threshold must satisfy `1 <= threshold <= shares`
    InvalidThreshold { threshold: usize, shares: usize },

    Other(String),
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoError::DecryptionFailed { operation, reason } => {
                write!(f, "Decryption failed during {}: {}", operation, reason)
            }
            CryptoError::EncryptionFailed { operation, reason } => {
                write!(f, "Encryption failed during {}: {}", operation, reason)
            }
            CryptoError::InvalidSignature { operation, reason } => {
                write!(f, "Invalid signature during {}: {}", operation, reason)
            }
            CryptoError::InvalidKey { key_type, reason } => {
                write!(f, "Invalid key ({}): {}", key_type, reason)
            }
            CryptoError::InvalidPayload { field, reason } => {
                write!(f, "Invalid payload field '{}': {}", field, reason)
            }
            CryptoError::KeyDerivationFailed { operation, reason } => {
                write!(f, "Key derivation failed during {}: {}", operation, reason)
            }
            CryptoError::InvalidThreshold { threshold, shares } => {
                write!(
                    f,
                    "Invalid threshold {} for {} key servers (expected 1..={})",
                    threshold, shares, shares
                )
            }
            CryptoError::Other(msg) => write!(f, "Crypto error: {}", msg),
        }
    }
}

impl std::error::Error for CryptoError {}

impl From<hex::FromHexError> for CryptoError {
    fn from(err: hex::FromHexError) -> Self {
        CryptoError::InvalidPayload {
            field: "hex_field".to_string(),
            reason: format!("hex decode error: {}", err),
        }
    }
}

impl From<base64::DecodeError> for CryptoError {
    fn from(err: base64::DecodeError) -> Self {
        CryptoError::InvalidPayload {
            field: "base64_field".to_string(),
            reason: format!("base64 decode error: {}", err),
        }
    }
}

impl From<bcs::Error> for CryptoError {
    fn from(err: bcs::Error) -> Self {
        CryptoError::InvalidPayload {
            field: "bcs_field".to_string(),
            reason: format!("bcs error: {}", err),
        }
    }
}

// Conversion from k256 errors (elliptic curve operations)
impl From<k256::elliptic_curve::Error> for CryptoError {
    fn from(err: k256::elliptic_curve::Error) -> Self {
        CryptoError::InvalidKey {
            key_type: "secp256k1_point".to_string(),
            reason: format!("k256 error: {}", err),
        }
    }
}

impl From<ed25519_dalek::SignatureError> for CryptoError {
    fn from(err: ed25519_dalek::SignatureError) -> Self {
        CryptoError::InvalidSignature {
            operation: "ed25519".to_string(),
            reason: err.to_string(),
        }
    }
}
