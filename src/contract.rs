// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Contract record and its encryption metadata
//!
//! Older records keep encryption details under
//! `metadata.walrus.encryption`; newer ones use the top-level `seal*`
//! fields. `Contract::normalized` folds the former into the latter so the
//! rest of the crate only ever reads one schema.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use tracing::warn;

use crate::chain::ObjectId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seal_allowlist_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seal_document_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seal_cap_id: Option<String>,
    #[serde(default)]
    pub is_encrypted: bool,
    #[serde(default)]
    pub authorized_users: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptionMeta {
    pub allowlist_id: ObjectId,
    /// Hex, no `0x` prefix
    pub document_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cap_id: Option<ObjectId>,
    pub is_encrypted: bool,
}

impl EncryptionMeta {
    pub fn document_id_bytes(&self) -> Result<Vec<u8>, hex::FromHexError> {
        hex::decode(self.document_id.trim_start_matches("0x"))
    }

    /// Same allowlist and document
    pub fn same_identity(&self, other: &EncryptionMeta) -> bool {
        self.allowlist_id == other.allowlist_id
            && self.document_id.trim_start_matches("0x") == other.document_id.trim_start_matches("0x")
    }
}

fn legacy_field(metadata: &Value, field: &str) -> Option<String> {
    metadata
        .pointer(&format!("/walrus/encryption/{}", field))
        .and_then(Value::as_str)
        .map(str::to_string)
}

impl Contract {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Default::default()
        }
    }

    /// Copy of the record with legacy metadata lifted into the `seal*` fields
    pub fn normalized(&self) -> Contract {
        let mut contract = self.clone();
        let Some(metadata) = &self.metadata else {
            return contract;
        };

        if contract.seal_allowlist_id.is_none() {
            contract.seal_allowlist_id = legacy_field(metadata, "allowlistId");
        }
        if contract.seal_document_id.is_none() {
            contract.seal_document_id = legacy_field(metadata, "documentId");
        }
        if contract.seal_cap_id.is_none() {
            contract.seal_cap_id = legacy_field(metadata, "capId");
        }
        if !contract.is_encrypted {
            contract.is_encrypted = metadata
                .pointer("/walrus/encryption/isEncrypted")
                .and_then(Value::as_bool)
                .unwrap_or(contract.seal_allowlist_id.is_some() && contract.seal_document_id.is_some());
        }
        if contract.blob_id.is_none() {
            contract.blob_id = metadata
                .pointer("/walrus/blobId")
                .and_then(Value::as_str)
                .map(str::to_string);
        }
        contract
    }

    /// Encryption metadata, if the normalized record carries a usable one
    pub fn encryption_meta(&self) -> Option<EncryptionMeta> {
        let normalized = self.normalized();
        let allowlist = normalized.seal_allowlist_id.as_deref()?;
        let document_id = normalized.seal_document_id.as_deref()?;

        let allowlist_id = match ObjectId::from_str(allowlist) {
            Ok(id) => id,
            Err(e) => {
                warn!("Contract {} has unusable allowlist id: {}", self.id, e);
                return None;
            }
        };
        let cap_id = normalized
            .seal_cap_id
            .as_deref()
            .and_then(|cap| ObjectId::from_str(cap).ok());

        Some(EncryptionMeta {
            allowlist_id,
            document_id: document_id.trim_start_matches("0x").to_string(),
            cap_id,
            is_encrypted: normalized.is_encrypted,
        })
    }

    pub fn apply_encryption(&mut self, meta: &EncryptionMeta) {
        self.seal_allowlist_id = Some(meta.allowlist_id.to_string());
        self.seal_document_id = Some(meta.document_id.clone());
        self.seal_cap_id = meta.cap_id.map(|cap| cap.to_string());
        self.is_encrypted = meta.is_encrypted;
    }
}
