// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use tracing::{debug, info};

use super::error::{Result, WorkflowError};
use crate::api::EpochOneApi;
use crate::contract::{Contract, EncryptionMeta};

/// Encryption metadata for `contract`
///
/// The record in hand is tried first; when it lacks the fields the server
/// copy is fetched once. Returns the record the metadata came from.
pub async fn resolve_encryption_meta(
    api: &dyn EpochOneApi,
    contract: &Contract,
) -> Result<(Contract, EncryptionMeta)> {
    if let Some(meta) = contract.encryption_meta() {
        debug!("Encryption metadata for {} found locally", contract.id);
        return Ok((contract.normalized(), meta));
    }

    info!("Fetching contract {} for encryption metadata", contract.id);
    let fetched = api.get_contract(&contract.id).await?;
    match fetched.encryption_meta() {
        Some(meta) => Ok((fetched.normalized(), meta)),
        None => Err(WorkflowError::MetadataNotFound(contract.id.clone())),
    }
}
