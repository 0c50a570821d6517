// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Programmable transaction model
//!
//! Only the shapes the allowlist workflow needs: a list of Move calls whose
//! arguments are either BCS-encoded pure values or object references.
//! `TransactionKind` bytes (no gas data) are what key servers simulate;
//! `TransactionData` bytes are what the sender and sponsor sign.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::{ChainError, ObjectId, SuiAddress, TransactionDigest};
use crate::crypto::hash::blake2b256_parts;

/// The shared `0x6` clock object
pub const SUI_CLOCK_OBJECT_ID: ObjectId = SuiAddress::from_u8(6);

pub const AUTHORIZE_EPHEMERAL_KEY: &str = "authorize_ephemeral_key";
pub const SEAL_APPROVE: &str = "seal_approve";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallArg {
    Pure(Vec<u8>),
    Object(ObjectId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCall {
    pub package: ObjectId,
    pub module: String,
    pub function: String,
    pub arguments: Vec<CallArg>,
}

impl MoveCall {
    pub fn pure_arg<T: DeserializeOwned>(&self, index: usize) -> Result<T, ChainError> {
        match self.arguments.get(index) {
            Some(CallArg::Pure(bytes)) => Ok(bcs::from_bytes(bytes)?),
            _ => Err(ChainError::InvalidTransaction(format!(
                "{}: argument {} is not a pure value",
                self.function, index
            ))),
        }
    }

    pub fn object_arg(&self, index: usize) -> Result<ObjectId, ChainError> {
        match self.arguments.get(index) {
            Some(CallArg::Object(id)) => Ok(*id),
            _ => Err(ChainError::InvalidTransaction(format!(
                "{}: argument {} is not an object",
                self.function, index
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TransactionKind {
    pub calls: Vec<MoveCall>,
}

impl TransactionKind {
    pub fn to_bytes(&self) -> Result<Vec<u8>, ChainError> {
        Ok(bcs::to_bytes(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ChainError> {
        Ok(bcs::from_bytes(bytes)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionData {
    pub sender: SuiAddress,
    pub gas_owner: SuiAddress,
    pub gas_budget: u64,
    pub kind: TransactionKind,
}

impl TransactionData {
    pub fn to_bytes(&self) -> Result<Vec<u8>, ChainError> {
        Ok(bcs::to_bytes(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ChainError> {
        Ok(bcs::from_bytes(bytes)?)
    }

    pub fn digest_of(bytes: &[u8]) -> TransactionDigest {
        TransactionDigest(blake2b256_parts(&[b"TransactionData::", bytes]))
    }

    pub fn is_sponsored(&self) -> bool {
        self.sender != self.gas_owner
    }
}

/// `allowlist::authorize_ephemeral_key(allowlist, ephemeral, document_id, validity_ms, clock)`
pub fn authorize_ephemeral_key_call(
    package: ObjectId,
    module: &str,
    allowlist: ObjectId,
    ephemeral: SuiAddress,
    document_id: &[u8],
    validity_ms: u64,
) -> Result<MoveCall, ChainError> {
    Ok(MoveCall {
        package,
        module: module.to_string(),
        function: AUTHORIZE_EPHEMERAL_KEY.to_string(),
        arguments: vec![
            CallArg::Object(allowlist),
            CallArg::Pure(bcs::to_bytes(&ephemeral)?),
            CallArg::Pure(bcs::to_bytes(&document_id.to_vec())?),
            CallArg::Pure(bcs::to_bytes(&validity_ms)?),
            CallArg::Object(SUI_CLOCK_OBJECT_ID),
        ],
    })
}

/// `allowlist::seal_approve(id, allowlist)`
pub fn seal_approve_call(
    package: ObjectId,
    module: &str,
    id: &[u8],
    allowlist: ObjectId,
) -> Result<MoveCall, ChainError> {
    Ok(MoveCall {
        package,
        module: module.to_string(),
        function: SEAL_APPROVE.to_string(),
        arguments: vec![
            CallArg::Pure(bcs::to_bytes(&id.to_vec())?),
            CallArg::Object(allowlist),
        ],
    })
}

/// Transaction-kind bytes proving access to `id` under `allowlist`
pub fn build_seal_approve_kind(
    package: ObjectId,
    module: &str,
    id: &[u8],
    allowlist: ObjectId,
) -> Result<Vec<u8>, ChainError> {
    TransactionKind {
        calls: vec![seal_approve_call(package, module, id, allowlist)?],
    }
    .to_bytes()
}
