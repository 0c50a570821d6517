// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use rand::{rngs::OsRng, RngCore};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

use super::error::{Result, WorkflowError};
use super::WorkflowContext;
use crate::api::{CreateAllowlistRequest, UploadEncryptedPdfRequest};
use crate::chain::{ObjectId, SuiAddress};
use crate::contract::{Contract, EncryptionMeta};
use crate::crypto::sha256;

/// Random bytes appended to the allowlist ID to form a document identity
pub const DOCUMENT_SALT_LEN: usize = 5;

/// Emails become `0x` + SHA-256 of the trimmed, lowercased address so they
/// never leave the process in clear; anything else must be a Sui address.
pub fn hash_signer_identifier(raw: &str) -> Result<SuiAddress> {
    let trimmed = raw.trim();
    if trimmed.contains('@') {
        return Ok(SuiAddress::from_bytes(sha256(trimmed.to_lowercase().as_bytes())));
    }
    SuiAddress::from_str(trimmed).map_err(|_| WorkflowError::InvalidSigner(raw.to_string()))
}

/// Own address first, then signers, duplicates dropped in order
pub fn merge_signer_addresses(own: SuiAddress, signers: &[String]) -> Result<Vec<SuiAddress>> {
    let mut merged = vec![own];
    for raw in signers {
        let address = hash_signer_identifier(raw)?;
        if !merged.contains(&address) {
            merged.push(address);
        }
    }
    Ok(merged)
}

/// `allowlist_id || salt`
pub fn new_document_id(allowlist_id: &ObjectId) -> Vec<u8> {
    let mut salt = [0u8; DOCUMENT_SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let mut id = allowlist_id.as_bytes().to_vec();
    id.extend_from_slice(&salt);
    id
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedDocument {
    pub encrypted_data: Vec<u8>,
    pub allowlist_id: ObjectId,
    pub cap_id: ObjectId,
    /// Hex, no prefix
    pub document_id: String,
}

impl EncryptedDocument {
    pub fn encryption_meta(&self) -> EncryptionMeta {
        EncryptionMeta {
            allowlist_id: self.allowlist_id,
            document_id: self.document_id.clone(),
            cap_id: Some(self.cap_id),
            is_encrypted: true,
        }
    }
}

pub struct EncryptionOrchestrator {
    ctx: Arc<WorkflowContext>,
}

impl EncryptionOrchestrator {
    pub fn new(ctx: Arc<WorkflowContext>) -> Self {
        Self { ctx }
    }

    /// Create an allowlist for `contract_id` and encrypt `data` under it.
    /// Every call creates a new allowlist.
    pub async fn encrypt_document(
        &self,
        contract_id: &str,
        data: &[u8],
        signers: &[String],
    ) -> Result<EncryptedDocument> {
        let own = self.ctx.session.contract_address(contract_id)?;
        let members = merge_signer_addresses(own, signers)?;
        debug!("Allowlist for {} will hold {} members", contract_id, members.len());

        let created = self
            .ctx
            .api
            .create_allowlist(&CreateAllowlistRequest {
                contract_id: Some(contract_id.to_string()),
                signer_addresses: Some(members.iter().map(|m| m.to_string()).collect()),
            })
            .await?;

        let document_id = new_document_id(&created.allowlist_id);
        let encrypted_data = self.ctx.seal.encrypt(
            self.ctx.config.package_id,
            &document_id,
            data,
            self.ctx.config.threshold,
        )?;

        info!(
            "🔒 Encrypted {} bytes for contract {} under allowlist {}",
            data.len(),
            contract_id,
            created.allowlist_id
        );
        Ok(EncryptedDocument {
            encrypted_data,
            allowlist_id: created.allowlist_id,
            cap_id: created.cap_id,
            document_id: hex::encode(document_id),
        })
    }

    /// `encrypt_document`, then store the ciphertext against the contract
    pub async fn encrypt_and_upload(
        &self,
        contract_id: &str,
        data: &[u8],
        file_name: &str,
        signers: &[String],
    ) -> Result<(EncryptedDocument, Contract)> {
        let document = self.encrypt_document(contract_id, data, signers).await?;
        let contract = self
            .ctx
            .api
            .upload_encrypted_pdf(
                contract_id,
                &UploadEncryptedPdfRequest {
                    encrypted_data: Some(B64.encode(&document.encrypted_data)),
                    file_name: Some(file_name.to_string()),
                    allowlist_id: Some(document.allowlist_id.to_string()),
                    document_id: Some(document.document_id.clone()),
                    cap_id: Some(document.cap_id.to_string()),
                },
            )
            .await?;
        Ok((document, contract))
    }
}
