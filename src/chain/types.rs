// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Sui addresses, object IDs and transaction digests

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::ChainError;
use crate::crypto::{blake2b256, signature::ED25519_FLAG};

pub const SUI_ADDRESS_LENGTH: usize = 32;

/// 32-byte account address
///
/// Rendered as `0x`-prefixed lowercase hex in JSON and as raw bytes in BCS.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SuiAddress(pub [u8; SUI_ADDRESS_LENGTH]);

/// Objects share the address space
pub type ObjectId = SuiAddress;

impl SuiAddress {
    pub const ZERO: SuiAddress = SuiAddress([0u8; SUI_ADDRESS_LENGTH]);

    pub const fn from_bytes(bytes: [u8; SUI_ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// `blake2b256(0x00 || public_key)`
    pub fn from_ed25519_public_key(public_key: &[u8; 32]) -> Self {
        let mut data = Vec::with_capacity(33);
        data.push(ED25519_FLAG);
        data.extend_from_slice(public_key);
        Self(blake2b256(&data))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Small well-known addresses such as `0x6`
    pub const fn from_u8(value: u8) -> Self {
        let mut bytes = [0u8; SUI_ADDRESS_LENGTH];
        bytes[SUI_ADDRESS_LENGTH - 1] = value;
        Self(bytes)
    }
}

impl FromStr for SuiAddress {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if digits.is_empty() || digits.len() > SUI_ADDRESS_LENGTH * 2 {
            return Err(ChainError::InvalidAddress(s.to_string()));
        }

        // Short forms are left-padded
        let padded = format!("{:0>64}", digits);
        let bytes = hex::decode(&padded).map_err(|_| ChainError::InvalidAddress(s.to_string()))?;
        let mut out = [0u8; SUI_ADDRESS_LENGTH];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }
}

impl fmt::Display for SuiAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for SuiAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for SuiAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for SuiAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            SuiAddress::from_str(&s).map_err(de::Error::custom)
        } else {
            let bytes = <[u8; SUI_ADDRESS_LENGTH]>::deserialize(deserializer)?;
            Ok(SuiAddress(bytes))
        }
    }
}

/// Transaction digest, base58 on the wire
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionDigest(pub [u8; 32]);

impl TransactionDigest {
    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }
}

impl FromStr for TransactionDigest {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s.trim())
            .into_vec()
            .map_err(|e| ChainError::Serialization(format!("invalid digest '{}': {}", s, e)))?;
        let digest: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| ChainError::Serialization(format!("digest '{}' is not 32 bytes", s)))?;
        Ok(Self(digest))
    }
}

impl fmt::Display for TransactionDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base58())
    }
}

impl fmt::Debug for TransactionDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionDigest({})", self.to_base58())
    }
}

impl Serialize for TransactionDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base58())
    }
}

impl<'de> Deserialize<'de> for TransactionDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        TransactionDigest::from_str(&s).map_err(de::Error::custom)
    }
}
