// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Request/response bodies of the workflow endpoints
//!
//! Request fields are optional at the type level so a missing field is
//! answered with our own 400 body instead of an extractor rejection.

use serde::{Deserialize, Serialize};

use crate::chain::{ObjectId, TransactionDigest};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateAllowlistRequest {
    pub contract_id: Option<String>,
    pub signer_addresses: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAllowlistResponse {
    pub allowlist_id: ObjectId,
    pub cap_id: ObjectId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SponsorRequest {
    pub sender: Option<String>,
    pub allowlist_id: Option<String>,
    pub ephemeral_address: Option<String>,
    pub document_id: Option<String>,
    pub validity_ms: Option<u64>,
    #[serde(rename = "encryptedJWT", default, skip_serializing_if = "Option::is_none")]
    pub encrypted_jwt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwt_expiry_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsorResponse {
    /// Base64 BCS `TransactionData`
    pub sponsored_tx_bytes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    pub sponsored_tx_bytes: Option<String>,
    pub zk_login_signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub digest: TransactionDigest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CleanExpiredKeysRequest {
    pub allowlist_id: Option<String>,
    pub cap_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanExpiredKeysResponse {
    pub removed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UploadEncryptedPdfRequest {
    /// Base64 ciphertext
    pub encrypted_data: Option<String>,
    pub file_name: Option<String>,
    pub allowlist_id: Option<String>,
    pub document_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cap_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DownloadQuery {
    pub view: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
