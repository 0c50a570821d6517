// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Server-side logic behind the workflow endpoints
//!
//! Every request is validated before anything touches the chain or the
//! blob store; validation failures are `ApiError::BadRequest`.

use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{
    types::{
        CleanExpiredKeysRequest, CleanExpiredKeysResponse, CreateAllowlistRequest,
        CreateAllowlistResponse, ExecuteRequest, ExecuteResponse, SponsorRequest, SponsorResponse,
        UploadEncryptedPdfRequest,
    },
    ApiError, ContractRegistry,
};
use crate::chain::{
    authorize_ephemeral_key_call, ChainClient, ObjectId, SuiAddress, TransactionData,
    TransactionKind,
};
use crate::config::{ConfigError, ServerConfig};
use crate::contract::{Contract, EncryptionMeta};
use crate::crypto::SuiKeypair;
use crate::storage::BlobStore;
use crate::utils::Clock;

/// Ciphertext plus the name it was uploaded under
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadedPdf {
    pub data: Vec<u8>,
    pub file_name: Option<String>,
}

pub struct SealService {
    chain: Arc<dyn ChainClient>,
    blobs: Arc<dyn BlobStore>,
    contracts: ContractRegistry,
    sponsor: SuiKeypair,
    clock: Arc<dyn Clock>,
    package_id: ObjectId,
    module_name: String,
    gas_budget: u64,
}

fn require(value: &Option<String>) -> Result<&str, ApiError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(ApiError::missing_parameters)
}

fn parse_address(field: &str, raw: &str) -> Result<SuiAddress, ApiError> {
    SuiAddress::from_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid {}: {}", field, raw)))
}

fn parse_hex(field: &str, raw: &str) -> Result<Vec<u8>, ApiError> {
    hex::decode(raw.trim_start_matches("0x"))
        .map_err(|_| ApiError::BadRequest(format!("Invalid {}: expected hex", field)))
}

impl SealService {
    pub fn new(
        config: &ServerConfig,
        chain: Arc<dyn ChainClient>,
        blobs: Arc<dyn BlobStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        let sponsor = SuiKeypair::from_private_key_str(&config.admin_private_key).map_err(|e| {
            ConfigError::Invalid {
                key: "SEAL_ADMIN_PRIVATE_KEY".to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            chain,
            blobs,
            contracts: ContractRegistry::new(),
            sponsor,
            clock,
            package_id: config.package_id,
            module_name: config.module_name.clone(),
            gas_budget: config.gas_budget,
        })
    }

    pub fn contracts(&self) -> &ContractRegistry {
        &self.contracts
    }

    pub fn sponsor_address(&self) -> SuiAddress {
        self.sponsor.address()
    }

    pub fn package_id(&self) -> ObjectId {
        self.package_id
    }

    pub async fn create_allowlist(
        &self,
        request: &CreateAllowlistRequest,
    ) -> Result<CreateAllowlistResponse, ApiError> {
        let contract_id = require(&request.contract_id)?;
        let signers = request
            .signer_addresses
            .as_ref()
            .filter(|list| !list.is_empty())
            .ok_or_else(ApiError::missing_parameters)?;
        let members = signers
            .iter()
            .map(|raw| parse_address("signer address", raw))
            .collect::<Result<Vec<_>, _>>()?;

        let created = self
            .chain
            .create_allowlist(self.sponsor.address(), &format!("contract-{}", contract_id), &members)
            .await?;

        let authorized: Vec<String> = members.iter().map(|m| m.to_string()).collect();
        self.contracts
            .upsert(contract_id, |contract| {
                contract.seal_allowlist_id = Some(created.allowlist_id.to_string());
                contract.seal_cap_id = Some(created.cap_id.to_string());
                contract.authorized_users = authorized;
            })
            .await;

        info!(
            "📜 Allowlist {} created for contract {} ({} members)",
            created.allowlist_id,
            contract_id,
            members.len()
        );
        Ok(CreateAllowlistResponse {
            allowlist_id: created.allowlist_id,
            cap_id: created.cap_id,
        })
    }

    /// Build `authorize_ephemeral_key` with the sponsor as gas owner
    pub async fn sponsor(&self, request: &SponsorRequest) -> Result<SponsorResponse, ApiError> {
        let sender = require(&request.sender)?;
        let allowlist = require(&request.allowlist_id)?;
        let ephemeral = require(&request.ephemeral_address)?;
        let document = require(&request.document_id)?;
        let requested_validity = request.validity_ms.ok_or_else(ApiError::missing_parameters)?;

        let sender = parse_address("sender", sender)?;
        let allowlist_id = parse_address("allowlistId", allowlist)?;
        let ephemeral = parse_address("ephemeralAddress", ephemeral)?;
        let document_id = parse_hex("documentId", document)?;
        if requested_validity == 0 {
            return Err(ApiError::BadRequest("validityMs must be positive".to_string()));
        }

        let now = self.clock.now_ms();
        let validity_ms = match request.jwt_expiry_ms {
            Some(expiry) if expiry <= now => {
                return Err(ApiError::BadRequest("JWT has expired".to_string()));
            }
            Some(expiry) => requested_validity.min(expiry - now),
            None => requested_validity,
        };
        if request.encrypted_jwt.is_none() {
            debug!("Sponsor request for {} carries no JWT", sender);
        }

        let call = authorize_ephemeral_key_call(
            self.package_id,
            &self.module_name,
            allowlist_id,
            ephemeral,
            &document_id,
            validity_ms,
        )
        .map_err(|e| ApiError::Internal(e.to_string()))?;
        let tx = TransactionData {
            sender,
            gas_owner: self.sponsor.address(),
            gas_budget: self.gas_budget,
            kind: TransactionKind { calls: vec![call] },
        };
        let bytes = tx.to_bytes().map_err(|e| ApiError::Internal(e.to_string()))?;

        info!(
            "💸 Sponsored authorization of {} on {} ({} ms)",
            ephemeral, allowlist_id, validity_ms
        );
        Ok(SponsorResponse {
            sponsored_tx_bytes: B64.encode(bytes),
        })
    }

    /// Co-sign as sponsor and submit
    pub async fn execute(&self, request: &ExecuteRequest) -> Result<ExecuteResponse, ApiError> {
        let tx_b64 = require(&request.sponsored_tx_bytes)?;
        let user_signature = require(&request.zk_login_signature)?;

        let tx_bytes = B64
            .decode(tx_b64)
            .map_err(|_| ApiError::BadRequest("Invalid sponsoredTxBytes: expected base64".to_string()))?;
        let tx = TransactionData::from_bytes(&tx_bytes)
            .map_err(|_| ApiError::BadRequest("Invalid sponsoredTxBytes: not a transaction".to_string()))?;
        if tx.gas_owner != self.sponsor.address() {
            warn!("Refusing to co-sign transaction sponsored by {}", tx.gas_owner);
            return Err(ApiError::BadRequest(
                "Transaction is not sponsored by this server".to_string(),
            ));
        }

        let sponsor_signature = self.sponsor.sign_transaction(&tx_bytes).to_base64();
        let digest = self
            .chain
            .execute_transaction(&tx_bytes, &[user_signature.to_string(), sponsor_signature])
            .await?;

        info!("✅ Executed sponsored transaction {}", digest);
        Ok(ExecuteResponse { digest })
    }

    pub async fn clean_expired_keys(
        &self,
        request: &CleanExpiredKeysRequest,
    ) -> Result<CleanExpiredKeysResponse, ApiError> {
        let allowlist_id = parse_address("allowlistId", require(&request.allowlist_id)?)?;
        let cap_id = parse_address("capId", require(&request.cap_id)?)?;

        let removed = self.chain.clean_expired_keys(allowlist_id, cap_id).await?;
        Ok(CleanExpiredKeysResponse { removed })
    }

    pub async fn get_contract(&self, contract_id: &str) -> Result<Contract, ApiError> {
        self.contracts
            .get(contract_id)
            .await
            .ok_or_else(|| ApiError::NotFound(format!("Contract {} not found", contract_id)))
    }

    /// Store the ciphertext and attach encryption metadata to the contract
    pub async fn upload_encrypted_pdf(
        &self,
        contract_id: &str,
        request: &UploadEncryptedPdfRequest,
    ) -> Result<Contract, ApiError> {
        if contract_id.trim().is_empty() {
            return Err(ApiError::missing_parameters());
        }
        let encoded = require(&request.encrypted_data)?;
        let file_name = require(&request.file_name)?.to_string();
        let allowlist_id = parse_address("allowlistId", require(&request.allowlist_id)?)?;
        let document_id = require(&request.document_id)?;
        parse_hex("documentId", document_id)?;
        let cap_id = match request.cap_id.as_deref().filter(|c| !c.trim().is_empty()) {
            Some(raw) => Some(parse_address("capId", raw)?),
            None => None,
        };
        let data = B64
            .decode(encoded)
            .map_err(|_| ApiError::BadRequest("Invalid encryptedData: expected base64".to_string()))?;

        let size = data.len();
        let blob_id = self.blobs.store(data).await?;
        let meta = EncryptionMeta {
            allowlist_id,
            document_id: document_id.trim_start_matches("0x").to_string(),
            cap_id,
            is_encrypted: true,
        };

        let contract = self
            .contracts
            .upsert(contract_id, |contract| {
                contract.apply_encryption(&meta);
                contract.blob_id = Some(blob_id.clone());
                contract.file_name = Some(file_name);
            })
            .await;

        info!("📤 Stored {} encrypted bytes for contract {} as {}", size, contract_id, blob_id);
        Ok(contract)
    }

    pub async fn download_pdf(&self, contract_id: &str) -> Result<DownloadedPdf, ApiError> {
        let contract = self.get_contract(contract_id).await?.normalized();
        let blob_id = contract.blob_id.ok_or_else(|| {
            ApiError::NotFound(format!("Contract {} has no stored document", contract_id))
        })?;

        let data = self.blobs.read(&blob_id).await?;
        debug!("📥 Serving {} bytes of {} for {}", data.len(), blob_id, contract_id);
        Ok(DownloadedPdf {
            data,
            file_name: contract.file_name,
        })
    }
}
