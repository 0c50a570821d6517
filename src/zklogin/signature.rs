// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! zkLogin signatures
//!
//! Serialized as `0x05 || json(ZkLoginSignature)`, base64 on the wire. The
//! inner `user_signature` is an ordinary Ed25519 signature by the session's
//! ephemeral key over the same intent message.

use base64::{
    engine::general_purpose::{STANDARD as B64, URL_SAFE_NO_PAD},
    Engine as _,
};
use serde::{Deserialize, Serialize};

use super::{zklogin_address, ZkLoginError};
use crate::chain::SuiAddress;
use crate::crypto::Ed25519Signature;

pub const ZKLOGIN_FLAG: u8 = 0x05;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZkProofPoints {
    pub a: Vec<String>,
    pub b: Vec<Vec<String>>,
    pub c: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssBase64Details {
    pub value: String,
    pub index_mod_4: u8,
}

impl IssBase64Details {
    pub fn from_iss(iss: &str) -> Self {
        Self {
            value: URL_SAFE_NO_PAD.encode(format!("\"iss\":\"{}\",", iss)),
            index_mod_4: 0,
        }
    }

    /// Recover the issuer from the `"iss":"…",` claim fragment
    pub fn iss(&self) -> Result<String, ZkLoginError> {
        let raw = URL_SAFE_NO_PAD
            .decode(self.value.trim_end_matches('='))
            .map_err(|e| ZkLoginError::InvalidSignature(format!("issBase64Details: {}", e)))?;
        let fragment = String::from_utf8(raw)
            .map_err(|e| ZkLoginError::InvalidSignature(format!("issBase64Details: {}", e)))?;
        fragment
            .split_once("\"iss\":\"")
            .and_then(|(_, rest)| rest.split_once('"'))
            .map(|(iss, _)| iss.to_string())
            .ok_or_else(|| ZkLoginError::InvalidSignature("issBase64Details has no iss claim".to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZkLoginInputs {
    pub proof_points: ZkProofPoints,
    pub iss_base64_details: IssBase64Details,
    pub header_base64: String,
    /// Hex-encoded 32-byte address seed
    pub address_seed: String,
}

impl ZkLoginInputs {
    pub fn address_seed_bytes(&self) -> Result<[u8; 32], ZkLoginError> {
        let bytes = hex::decode(self.address_seed.trim_start_matches("0x"))
            .map_err(|e| ZkLoginError::InvalidSignature(format!("addressSeed: {}", e)))?;
        bytes
            .as_slice()
            .try_into()
            .map_err(|_| ZkLoginError::InvalidSignature("addressSeed must be 32 bytes".to_string()))
    }

    pub fn address(&self) -> Result<SuiAddress, ZkLoginError> {
        Ok(zklogin_address(&self.iss_base64_details.iss()?, &self.address_seed_bytes()?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZkLoginSignature {
    pub inputs: ZkLoginInputs,
    pub max_epoch: u64,
    /// Base64 serialized Ed25519 signature by the ephemeral key
    pub user_signature: String,
}

impl ZkLoginSignature {
    pub fn new(inputs: ZkLoginInputs, max_epoch: u64, user_signature: &Ed25519Signature) -> Self {
        Self {
            inputs,
            max_epoch,
            user_signature: user_signature.to_base64(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ZkLoginError> {
        let body = serde_json::to_vec(self)
            .map_err(|e| ZkLoginError::InvalidSignature(e.to_string()))?;
        let mut out = Vec::with_capacity(body.len() + 1);
        out.push(ZKLOGIN_FLAG);
        out.extend_from_slice(&body);
        Ok(out)
    }

    pub fn to_base64(&self) -> Result<String, ZkLoginError> {
        Ok(B64.encode(self.to_bytes()?))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ZkLoginError> {
        match bytes.split_first() {
            Some((&ZKLOGIN_FLAG, body)) => serde_json::from_slice(body)
                .map_err(|e| ZkLoginError::InvalidSignature(format!("malformed zkLogin body: {}", e))),
            _ => Err(ZkLoginError::InvalidSignature(
                "missing zkLogin signature flag".to_string(),
            )),
        }
    }

    pub fn from_base64(encoded: &str) -> Result<Self, ZkLoginError> {
        let bytes = B64
            .decode(encoded.trim())
            .map_err(|e| ZkLoginError::InvalidSignature(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Check the epoch window and the ephemeral signature, returning the
    /// zkLogin address that signed. The Groth16 proof itself is trusted.
    pub fn verify_transaction(
        &self,
        tx_bytes: &[u8],
        current_epoch: u64,
    ) -> Result<SuiAddress, ZkLoginError> {
        if current_epoch > self.max_epoch {
            return Err(ZkLoginError::EpochExpired {
                max_epoch: self.max_epoch,
                current_epoch,
            });
        }
        let user_signature = Ed25519Signature::from_base64(&self.user_signature)
            .map_err(|e| ZkLoginError::InvalidSignature(e.to_string()))?;
        user_signature
            .verify_transaction(tx_bytes)
            .map_err(|e| ZkLoginError::InvalidSignature(e.to_string()))?;
        self.inputs.address()
    }
}
