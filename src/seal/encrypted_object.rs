// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! BCS envelope stored on the blob store

use serde::{Deserialize, Serialize};

use super::SealError;
use crate::chain::ObjectId;

pub const ENCRYPTED_OBJECT_VERSION: u8 = 0;

/// One key server's wrapped share of the document key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedShare {
    pub server_id: ObjectId,
    /// Shamir evaluation index
    pub index: u8,
    /// Encryptor's ephemeral point `R`, SEC1 compressed
    pub ephemeral_point: Vec<u8>,
    pub encrypted_share: [u8; 32],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedObject {
    pub version: u8,
    pub package_id: ObjectId,
    pub id: Vec<u8>,
    pub threshold: u8,
    pub shares: Vec<WrappedShare>,
    /// `nonce || AES-256-GCM(document, aad = full_id)`
    pub ciphertext: Vec<u8>,
}

impl EncryptedObject {
    /// Identity the key servers derive keys for: `package_id || id`
    pub fn full_id(&self) -> Vec<u8> {
        full_id(&self.package_id, &self.id)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, SealError> {
        bcs::to_bytes(self).map_err(|e| SealError::InvalidObject(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SealError> {
        let object: EncryptedObject =
            bcs::from_bytes(bytes).map_err(|e| SealError::InvalidObject(e.to_string()))?;
        if object.version != ENCRYPTED_OBJECT_VERSION {
            return Err(SealError::InvalidObject(format!(
                "unsupported version {}",
                object.version
            )));
        }
        if object.threshold == 0 || usize::from(object.threshold) > object.shares.len() {
            return Err(SealError::InvalidObject(format!(
                "threshold {} with {} shares",
                object.threshold,
                object.shares.len()
            )));
        }
        Ok(object)
    }
}

pub fn full_id(package_id: &ObjectId, id: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(32 + id.len());
    out.extend_from_slice(package_id.as_bytes());
    out.extend_from_slice(id);
    out
}
