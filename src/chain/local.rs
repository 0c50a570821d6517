// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! In-process chain implementing the `allowlist` package
//!
//! Used by the development server and the test suite. Transactions are
//! BCS-decoded, their signatures checked (Ed25519 and zkLogin), and their
//! Move calls applied atomically. Finality can be made manual to exercise
//! timeouts.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{
    allowlist::abort,
    transaction::{AUTHORIZE_EPHEMERAL_KEY, SEAL_APPROVE},
    Allowlist, ChainClient, ChainError, CreatedAllowlist, MoveCall, ObjectId, SuiAddress,
    TransactionData, TransactionDigest, TransactionKind, SUI_CLOCK_OBJECT_ID,
};
use crate::crypto::{hash::blake2b256_parts, signature::ED25519_FLAG, Ed25519Signature};
use crate::utils::Clock;
use crate::zklogin::{ZkLoginSignature, ZKLOGIN_FLAG};
use base64::{engine::general_purpose::STANDARD as B64, Engine as _};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalityMode {
    /// Transactions are final as soon as they execute
    Immediate,
    /// Transactions stay pending until `finalize` is called
    Manual,
}

#[derive(Debug, Default)]
struct ChainState {
    allowlists: HashMap<ObjectId, Allowlist>,
    /// digest -> finalized
    transactions: HashMap<TransactionDigest, bool>,
    epoch: u64,
    object_counter: u64,
}

pub struct LocalChain {
    package_id: ObjectId,
    module: String,
    clock: Arc<dyn Clock>,
    finality: FinalityMode,
    state: Arc<RwLock<ChainState>>,
}

impl LocalChain {
    pub fn new(package_id: ObjectId, module: &str, clock: Arc<dyn Clock>) -> Self {
        Self {
            package_id,
            module: module.to_string(),
            clock,
            finality: FinalityMode::Immediate,
            state: Arc::new(RwLock::new(ChainState::default())),
        }
    }

    pub fn with_finality(mut self, finality: FinalityMode) -> Self {
        self.finality = finality;
        self
    }

    pub fn package_id(&self) -> ObjectId {
        self.package_id
    }

    pub async fn set_epoch(&self, epoch: u64) {
        self.state.write().await.epoch = epoch;
    }

    pub async fn finalize(&self, digest: &TransactionDigest) -> Result<(), ChainError> {
        let mut state = self.state.write().await;
        match state.transactions.get_mut(digest) {
            Some(finalized) => {
                *finalized = true;
                Ok(())
            }
            None => Err(ChainError::NotFound(digest.to_string())),
        }
    }

    pub async fn finalize_all(&self) {
        let mut state = self.state.write().await;
        for finalized in state.transactions.values_mut() {
            *finalized = true;
        }
    }

    /// Number of transactions recorded, including allowlist creation
    pub async fn transaction_count(&self) -> usize {
        self.state.read().await.transactions.len()
    }

    /// `allowlist::add(allowlist, cap, account)`
    pub async fn add_member(
        &self,
        allowlist_id: ObjectId,
        cap_id: ObjectId,
        member: SuiAddress,
    ) -> Result<(), ChainError> {
        let mut state = self.state.write().await;
        let allowlist = state
            .allowlists
            .get_mut(&allowlist_id)
            .ok_or_else(|| ChainError::NotFound(allowlist_id.to_string()))?;
        if allowlist.cap_id != cap_id {
            return Err(ChainError::MoveAbort {
                function: "add".to_string(),
                code: abort::E_INVALID_CAP,
                reason: "capability mismatch".to_string(),
            });
        }
        if !allowlist.members.insert(member) {
            return Err(ChainError::MoveAbort {
                function: "add".to_string(),
                code: abort::E_DUPLICATE,
                reason: format!("{} is already a member", member),
            });
        }
        allowlist.version += 1;
        Ok(())
    }

    fn new_object_id(state: &mut ChainState, label: &[u8]) -> ObjectId {
        state.object_counter += 1;
        SuiAddress(blake2b256_parts(&[
            b"epochone-local-object",
            &state.object_counter.to_le_bytes(),
            label,
        ]))
    }

    fn check_package(&self, call: &MoveCall) -> Result<(), ChainError> {
        if call.package != self.package_id || call.module != self.module {
            return Err(ChainError::InvalidTransaction(format!(
                "unknown function {}::{}::{}",
                call.package, call.module, call.function
            )));
        }
        Ok(())
    }

    fn verify_signer(signature: &str, tx_bytes: &[u8], epoch: u64) -> Result<SuiAddress, ChainError> {
        let bytes = B64
            .decode(signature.trim())
            .map_err(|e| ChainError::InvalidSignature(format!("signature is not base64: {}", e)))?;
        match bytes.first() {
            Some(&ED25519_FLAG) => {
                let signature = Ed25519Signature::from_bytes(&bytes)?;
                signature.verify_transaction(tx_bytes)?;
                Ok(signature.signer_address())
            }
            Some(&ZKLOGIN_FLAG) => ZkLoginSignature::from_bytes(&bytes)
                .and_then(|sig| sig.verify_transaction(tx_bytes, epoch))
                .map_err(|e| ChainError::InvalidSignature(e.to_string())),
            _ => Err(ChainError::InvalidSignature("unsupported signature scheme".to_string())),
        }
    }

    fn apply_call(
        &self,
        call: &MoveCall,
        sender: SuiAddress,
        staged: &mut HashMap<ObjectId, Allowlist>,
        state: &ChainState,
        now_ms: u64,
    ) -> Result<(), ChainError> {
        self.check_package(call)?;
        match call.function.as_str() {
            AUTHORIZE_EPHEMERAL_KEY => {
                let allowlist_id = call.object_arg(0)?;
                let ephemeral: SuiAddress = call.pure_arg(1)?;
                let document_id: Vec<u8> = call.pure_arg(2)?;
                let validity_ms: u64 = call.pure_arg(3)?;
                if call.object_arg(4)? != SUI_CLOCK_OBJECT_ID {
                    return Err(ChainError::InvalidTransaction(
                        "authorize_ephemeral_key expects the shared clock".to_string(),
                    ));
                }

                if !staged.contains_key(&allowlist_id) {
                    let list = state
                        .allowlists
                        .get(&allowlist_id)
                        .cloned()
                        .ok_or_else(|| ChainError::NotFound(allowlist_id.to_string()))?;
                    staged.insert(allowlist_id, list);
                }
                let allowlist = staged
                    .get_mut(&allowlist_id)
                    .ok_or_else(|| ChainError::NotFound(allowlist_id.to_string()))?;
                allowlist.authorize(sender, ephemeral, document_id, validity_ms, now_ms)
            }
            SEAL_APPROVE => Err(ChainError::InvalidTransaction(
                "seal_approve can only be evaluated by dry run".to_string(),
            )),
            other => Err(ChainError::InvalidTransaction(format!(
                "unknown function {}::{}",
                self.module, other
            ))),
        }
    }
}

#[async_trait]
impl ChainClient for LocalChain {
    async fn create_allowlist(
        &self,
        owner: SuiAddress,
        name: &str,
        members: &[SuiAddress],
    ) -> Result<CreatedAllowlist, ChainError> {
        let mut state = self.state.write().await;
        let allowlist_id = Self::new_object_id(&mut state, name.as_bytes());
        let cap_id = Self::new_object_id(&mut state, owner.as_bytes());

        state
            .allowlists
            .insert(allowlist_id, Allowlist::new(allowlist_id, cap_id, name, members));

        let digest = TransactionDigest(blake2b256_parts(&[
            b"create_allowlist_entry",
            allowlist_id.as_bytes(),
        ]));
        let finalized = self.finality == FinalityMode::Immediate;
        state.transactions.insert(digest, finalized);

        info!(
            "📜 Created allowlist {} ({} members) for {}",
            allowlist_id,
            members.len(),
            owner
        );
        Ok(CreatedAllowlist {
            allowlist_id,
            cap_id,
            digest,
        })
    }

    async fn execute_transaction(
        &self,
        tx_bytes: &[u8],
        signatures: &[String],
    ) -> Result<TransactionDigest, ChainError> {
        let tx = TransactionData::from_bytes(tx_bytes)?;
        let digest = TransactionData::digest_of(tx_bytes);

        if tx.gas_budget == 0 {
            return Err(ChainError::InvalidTransaction("gas budget must be positive".to_string()));
        }

        let mut state = self.state.write().await;

        let mut signers = HashSet::new();
        for signature in signatures {
            signers.insert(Self::verify_signer(signature, tx_bytes, state.epoch)?);
        }
        for required in [tx.sender, tx.gas_owner] {
            if !signers.contains(&required) {
                warn!("Transaction {} missing signature from {}", digest, required);
                return Err(ChainError::InvalidSignature(format!(
                    "missing signature from {}",
                    required
                )));
            }
        }

        // Re-submitting identical bytes returns the original effects
        if state.transactions.contains_key(&digest) {
            debug!("Transaction {} already executed", digest);
            return Ok(digest);
        }

        let now_ms = self.clock.now_ms();
        let mut staged = HashMap::new();
        for call in &tx.kind.calls {
            self.apply_call(call, tx.sender, &mut staged, &state, now_ms)?;
        }
        state.allowlists.extend(staged);

        let finalized = self.finality == FinalityMode::Immediate;
        state.transactions.insert(digest, finalized);
        info!(
            "✅ Executed transaction {} ({} calls, sponsored: {})",
            digest,
            tx.kind.calls.len(),
            tx.is_sponsored()
        );
        Ok(digest)
    }

    async fn is_finalized(&self, digest: &TransactionDigest) -> Result<bool, ChainError> {
        self.state
            .read()
            .await
            .transactions
            .get(digest)
            .copied()
            .ok_or_else(|| ChainError::NotFound(digest.to_string()))
    }

    async fn dry_run_transaction_kind(
        &self,
        tx_kind_bytes: &[u8],
        sender: SuiAddress,
    ) -> Result<(), ChainError> {
        let kind = TransactionKind::from_bytes(tx_kind_bytes)?;
        if kind.calls.is_empty() {
            return Err(ChainError::InvalidTransaction("empty transaction".to_string()));
        }

        let state = self.state.read().await;
        let now_ms = self.clock.now_ms();
        for call in &kind.calls {
            self.check_package(call)?;
            if call.function != SEAL_APPROVE {
                return Err(ChainError::InvalidTransaction(format!(
                    "only {} may be simulated, got {}",
                    SEAL_APPROVE, call.function
                )));
            }
            let id: Vec<u8> = call.pure_arg(0)?;
            let allowlist_id = call.object_arg(1)?;
            let allowlist = state
                .allowlists
                .get(&allowlist_id)
                .ok_or_else(|| ChainError::NotFound(allowlist_id.to_string()))?;

            if !allowlist.check_access(&sender, &id, now_ms) {
                return Err(ChainError::MoveAbort {
                    function: SEAL_APPROVE.to_string(),
                    code: abort::E_NO_ACCESS,
                    reason: format!("{} has no access to {}", sender, hex::encode(&id)),
                });
            }
        }
        Ok(())
    }

    async fn clean_expired_keys(
        &self,
        allowlist_id: ObjectId,
        cap_id: ObjectId,
    ) -> Result<usize, ChainError> {
        let now_ms = self.clock.now_ms();
        let mut state = self.state.write().await;
        let allowlist = state
            .allowlists
            .get_mut(&allowlist_id)
            .ok_or_else(|| ChainError::NotFound(allowlist_id.to_string()))?;
        let removed = allowlist.clean_expired(&cap_id, now_ms)?;
        info!("🧹 Removed {} expired ephemeral keys from {}", removed, allowlist_id);
        Ok(removed)
    }

    async fn get_allowlist(&self, allowlist_id: ObjectId) -> Result<Allowlist, ChainError> {
        self.state
            .read()
            .await
            .allowlists
            .get(&allowlist_id)
            .cloned()
            .ok_or_else(|| ChainError::NotFound(allowlist_id.to_string()))
    }

    async fn current_epoch(&self) -> Result<u64, ChainError> {
        Ok(self.state.read().await.epoch)
    }
}
