// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Chain access for the allowlist package
//!
//! `ChainClient` is the seam between the workflow and the network. The
//! server uses it to create allowlists and execute sponsored transactions;
//! key servers use `dry_run_transaction_kind` to evaluate `seal_approve`.

pub mod allowlist;
pub mod local;
pub mod transaction;
pub mod types;

pub use allowlist::{Allowlist, EphemeralEntry};
pub use local::{FinalityMode, LocalChain};
pub use transaction::{
    authorize_ephemeral_key_call, build_seal_approve_kind, seal_approve_call, CallArg, MoveCall,
    TransactionData, TransactionKind, SUI_CLOCK_OBJECT_ID,
};
pub use types::{ObjectId, SuiAddress, TransactionDigest};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::crypto::CryptoError;

/// Interval between finality checks while waiting on a transaction
pub const FINALITY_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ChainError {
    #[error("Object not found: {0}")]
    NotFound(String),
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),
    #[error("MoveAbort in {function} with code {code}: {reason}")]
    MoveAbort {
        function: String,
        code: u64,
        reason: String,
    },
    #[error("Transaction {digest} not finalized within {timeout_ms}ms")]
    FinalityTimeout { digest: String, timeout_ms: u64 },
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<bcs::Error> for ChainError {
    fn from(e: bcs::Error) -> Self {
        ChainError::Serialization(e.to_string())
    }
}

impl From<CryptoError> for ChainError {
    fn from(e: CryptoError) -> Self {
        ChainError::InvalidSignature(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedAllowlist {
    pub allowlist_id: ObjectId,
    pub cap_id: ObjectId,
    pub digest: TransactionDigest,
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    /// `create_allowlist_entry(name, members)` executed by `owner`; the
    /// admin capability is transferred to the owner
    async fn create_allowlist(
        &self,
        owner: SuiAddress,
        name: &str,
        members: &[SuiAddress],
    ) -> Result<CreatedAllowlist, ChainError>;

    /// Execute signed transaction bytes. `signatures` are base64
    /// serialized signatures covering the sender and, when sponsored,
    /// the gas owner.
    async fn execute_transaction(
        &self,
        tx_bytes: &[u8],
        signatures: &[String],
    ) -> Result<TransactionDigest, ChainError>;

    async fn is_finalized(&self, digest: &TransactionDigest) -> Result<bool, ChainError>;

    /// Simulate transaction-kind bytes as `sender` without committing
    async fn dry_run_transaction_kind(
        &self,
        tx_kind_bytes: &[u8],
        sender: SuiAddress,
    ) -> Result<(), ChainError>;

    async fn clean_expired_keys(
        &self,
        allowlist_id: ObjectId,
        cap_id: ObjectId,
    ) -> Result<usize, ChainError>;

    async fn get_allowlist(&self, allowlist_id: ObjectId) -> Result<Allowlist, ChainError>;

    async fn current_epoch(&self) -> Result<u64, ChainError>;

    /// Poll until the transaction is final or `timeout` elapses
    async fn wait_for_transaction(
        &self,
        digest: &TransactionDigest,
        timeout: Duration,
    ) -> Result<(), ChainError> {
        let poll = async {
            loop {
                if self.is_finalized(digest).await? {
                    return Ok(());
                }
                debug!("Transaction {} not final yet", digest);
                tokio::time::sleep(FINALITY_POLL_INTERVAL).await;
            }
        };

        match tokio::time::timeout(timeout, poll).await {
            Ok(result) => result,
            Err(_) => Err(ChainError::FinalityTimeout {
                digest: digest.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }
}
