// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Ephemeral key authorization
//!
//! The session's ephemeral key is registered on the document's allowlist
//! by a sponsored `authorize_ephemeral_key` transaction sent from the
//! contract's zkLogin address. Once final, a Seal session key endorsed by
//! the ephemeral key can fetch key shares for that document.

use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::error::{Result, WorkflowError};
use super::progress::{report, DecryptionStep, ProgressCallback};
use super::WorkflowContext;
use crate::api::{ExecuteRequest, SponsorRequest};
use crate::chain::{ObjectId, TransactionData};
use crate::seal::SessionKey;
use crate::zklogin::{ZkLoginError, ZkLoginSignature};

/// Assumed JWT lifetime when the token carries no readable `exp`
pub const FALLBACK_JWT_VALIDITY_MS: u64 = 24 * 60 * 60 * 1000;

/// A signed session key together with the allowlist its ephemeral key was
/// registered on. Only usable for documents under that allowlist.
#[derive(Debug, Clone)]
pub struct AuthorizedSession {
    pub allowlist_id: ObjectId,
    pub session_key: SessionKey,
}

impl AuthorizedSession {
    /// Signed, unexpired and registered on `allowlist_id`
    pub fn is_usable_for(&self, allowlist_id: &ObjectId, now_ms: u64) -> bool {
        self.allowlist_id == *allowlist_id
            && self.session_key.is_signed()
            && !self.session_key.is_expired_at(now_ms)
    }
}

pub struct EphemeralAuthorizer {
    ctx: Arc<WorkflowContext>,
}

impl EphemeralAuthorizer {
    pub fn new(ctx: Arc<WorkflowContext>) -> Self {
        Self { ctx }
    }

    /// Authorize the ephemeral key for `document_id` and return a signed
    /// session key scoped to `allowlist_id`. On-chain state applied before a failure stays in place.
    pub async fn authorize(
        &self,
        contract_id: &str,
        allowlist_id: ObjectId,
        document_id: &[u8],
        progress: Option<&ProgressCallback>,
    ) -> Result<AuthorizedSession> {
        let session = &self.ctx.session;
        let now = self.ctx.clock.now_ms();

        let jwt_expiry = session.jwt_expiry_ms();
        let expiry = match jwt_expiry {
            Some(expiry) => expiry,
            None => {
                warn!("JWT expiry unreadable, assuming 24h validity");
                now + FALLBACK_JWT_VALIDITY_MS
            }
        };
        if expiry <= now {
            return Err(ZkLoginError::ExpiredJwt {
                expired_at_ms: expiry,
                now_ms: now,
            }
            .into());
        }

        let wallet = session.contract_wallet(contract_id)?;
        let ephemeral = session.ephemeral_keypair()?;

        report(progress, DecryptionStep::Authorizing);
        let sponsored = self
            .ctx
            .api
            .sponsor(&SponsorRequest {
                sender: Some(wallet.address.to_string()),
                allowlist_id: Some(allowlist_id.to_string()),
                ephemeral_address: Some(ephemeral.address().to_string()),
                document_id: Some(hex::encode(document_id)),
                validity_ms: Some(expiry - now),
                encrypted_jwt: None,
                jwt_expiry_ms: jwt_expiry,
            })
            .await?;

        let tx_bytes = B64
            .decode(&sponsored.sponsored_tx_bytes)
            .map_err(|e| WorkflowError::InvalidSponsoredTransaction(e.to_string()))?;
        let tx = TransactionData::from_bytes(&tx_bytes)
            .map_err(|e| WorkflowError::InvalidSponsoredTransaction(e.to_string()))?;
        if tx.sender != wallet.address {
            return Err(WorkflowError::InvalidSponsoredTransaction(format!(
                "sender {} is not {}",
                tx.sender, wallet.address
            )));
        }

        let user_signature = ephemeral.sign_transaction(&tx_bytes);
        let zk_signature = ZkLoginSignature::new(
            session.zklogin_inputs(&wallet),
            session.max_epoch,
            &user_signature,
        )
        .to_base64()?;

        let executed = self
            .ctx
            .api
            .execute(&ExecuteRequest {
                sponsored_tx_bytes: Some(sponsored.sponsored_tx_bytes),
                zk_login_signature: Some(zk_signature),
            })
            .await?;
        debug!("Authorization submitted as {}", executed.digest);

        self.ctx
            .chain
            .wait_for_transaction(&executed.digest, self.ctx.config.finality_timeout())
            .await?;

        report(progress, DecryptionStep::Signing);
        let mut session_key = SessionKey::new(
            ephemeral.address(),
            self.ctx.config.package_id,
            self.ctx.config.session_ttl_min,
            self.ctx.clock.now_ms(),
        )?;
        session_key.sign_personal_message(&ephemeral)?;

        info!(
            "🔐 Ephemeral key {} authorized on {} for contract {}",
            ephemeral.address(),
            allowlist_id,
            contract_id
        );
        Ok(AuthorizedSession {
            allowlist_id,
            session_key,
        })
    }
}
