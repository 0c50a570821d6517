// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Sui-style Ed25519 Signing
//!
//! Transactions and personal messages are signed over an *intent message*:
//! a 3-byte intent header followed by the payload, hashed with Blake2b-256.
//! The serialized signature is `flag || signature || public_key` with
//! flag `0x00` for Ed25519, base64-encoded on the wire.
//!
//! Personal messages are BCS-encoded as `vector<u8>` before hashing, the
//! same framing the Seal key servers verify session certificates against.

use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::{rngs::OsRng, RngCore};

use super::{hash::blake2b256, CryptoError};
use crate::chain::SuiAddress;

pub const ED25519_FLAG: u8 = 0x00;
pub const ED25519_SIGNATURE_LEN: usize = 1 + 64 + 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IntentScope {
    TransactionData = 0,
    PersonalMessage = 3,
}

/// Blake2b-256 of `[scope, version=0, app_id=0] || payload`
pub fn intent_digest(scope: IntentScope, payload: &[u8]) -> [u8; 32] {
    let mut intent = Vec::with_capacity(3 + payload.len());
    intent.push(scope as u8);
    intent.push(0x00);
    intent.push(0x00);
    intent.extend_from_slice(payload);
    blake2b256(&intent)
}

fn personal_message_payload(message: &[u8]) -> Result<Vec<u8>, CryptoError> {
    Ok(bcs::to_bytes(&message.to_vec())?)
}

/// Ed25519 keypair with Sui address derivation
#[derive(Clone)]
pub struct SuiKeypair {
    signing_key: SigningKey,
}

impl std::fmt::Debug for SuiKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuiKeypair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

impl SuiKeypair {
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    pub fn generate() -> Self {
        let mut seed = [0u8; 32];
        OsRng.fill_bytes(&mut seed);
        Self::from_seed(&seed)
    }

    /// Parse a private key given as `0x`-prefixed hex (32 bytes) or as
    /// base64 of `flag || key` (33 bytes, Sui keystore format)
    pub fn from_private_key_str(key: &str) -> Result<Self, CryptoError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(CryptoError::InvalidKey {
                key_type: "private_key".to_string(),
                reason: "empty key".to_string(),
            });
        }

        let bytes = match key.strip_prefix("0x") {
            Some(hex_part) => hex::decode(hex_part)?,
            None => {
                let decoded = B64.decode(key)?;
                match decoded.split_first() {
                    Some((&ED25519_FLAG, rest)) if rest.len() == 32 => rest.to_vec(),
                    _ => {
                        return Err(CryptoError::InvalidKey {
                            key_type: "private_key".to_string(),
                            reason: "expected base64 of 0x00 flag followed by 32 key bytes"
                                .to_string(),
                        })
                    }
                }
            }
        };

        let seed: [u8; 32] = bytes.as_slice().try_into().map_err(|_| CryptoError::InvalidKey {
            key_type: "private_key".to_string(),
            reason: format!("expected 32 bytes, got {}", bytes.len()),
        })?;
        Ok(Self::from_seed(&seed))
    }

    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    pub fn public_key_base64(&self) -> String {
        B64.encode(self.public_key_bytes())
    }

    pub fn address(&self) -> SuiAddress {
        SuiAddress::from_ed25519_public_key(&self.public_key_bytes())
    }

    pub fn sign_transaction(&self, tx_bytes: &[u8]) -> Ed25519Signature {
        self.sign_digest(&intent_digest(IntentScope::TransactionData, tx_bytes))
    }

    pub fn sign_personal_message(&self, message: &[u8]) -> Result<Ed25519Signature, CryptoError> {
        let payload = personal_message_payload(message)?;
        Ok(self.sign_digest(&intent_digest(IntentScope::PersonalMessage, &payload)))
    }

    /// Plain signature over raw bytes (no intent), used for key-server requests
    pub fn sign_raw(&self, message: &[u8]) -> Ed25519Signature {
        self.sign_digest(message)
    }

    fn sign_digest(&self, message: &[u8]) -> Ed25519Signature {
        let signature: Signature = self.signing_key.sign(message);
        Ed25519Signature {
            signature: signature.to_bytes(),
            public_key: self.public_key_bytes(),
        }
    }
}

/// Serialized Ed25519 signature: `flag || sig(64) || pk(32)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ed25519Signature {
    pub signature: [u8; 64],
    pub public_key: [u8; 32],
}

impl Ed25519Signature {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(ED25519_SIGNATURE_LEN);
        out.push(ED25519_FLAG);
        out.extend_from_slice(&self.signature);
        out.extend_from_slice(&self.public_key);
        out
    }

    pub fn to_base64(&self) -> String {
        B64.encode(self.to_bytes())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != ED25519_SIGNATURE_LEN || bytes[0] != ED25519_FLAG {
            return Err(CryptoError::InvalidSignature {
                operation: "parse_ed25519".to_string(),
                reason: format!(
                    "expected {} bytes starting with flag 0x00, got {} bytes",
                    ED25519_SIGNATURE_LEN,
                    bytes.len()
                ),
            });
        }
        let mut signature = [0u8; 64];
        let mut public_key = [0u8; 32];
        signature.copy_from_slice(&bytes[1..65]);
        public_key.copy_from_slice(&bytes[65..]);
        Ok(Self {
            signature,
            public_key,
        })
    }

    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        Self::from_bytes(&B64.decode(encoded)?)
    }

    pub fn signer_address(&self) -> SuiAddress {
        SuiAddress::from_ed25519_public_key(&self.public_key)
    }

    pub fn verify_transaction(&self, tx_bytes: &[u8]) -> Result<(), CryptoError> {
        self.verify_raw(&intent_digest(IntentScope::TransactionData, tx_bytes))
    }

    pub fn verify_personal_message(&self, message: &[u8]) -> Result<(), CryptoError> {
        let payload = personal_message_payload(message)?;
        self.verify_raw(&intent_digest(IntentScope::PersonalMessage, &payload))
    }

    pub fn verify_raw(&self, message: &[u8]) -> Result<(), CryptoError> {
        let key = VerifyingKey::from_bytes(&self.public_key)?;
        let signature = Signature::from_bytes(&self.signature);
        key.verify(message, &signature)
            .map_err(|e| CryptoError::InvalidSignature {
                operation: "verify_ed25519".to_string(),
                reason: e.to_string(),
            })
    }
}
