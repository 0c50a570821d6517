// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::authorize::{AuthorizedSession, EphemeralAuthorizer};
use super::error::{Result, WorkflowError};
use super::metadata::resolve_encryption_meta;
use super::progress::{report, DecryptionStep, ProgressCallback};
use super::WorkflowContext;
use crate::chain::build_seal_approve_kind;
use crate::contract::{Contract, EncryptionMeta};
use crate::storage::CachedPdf;

#[derive(Debug)]
pub struct DecryptedDocument {
    pub data: Vec<u8>,
    /// Session used, for the caller to cache per allowlist
    pub session: AuthorizedSession,
    pub session_reused: bool,
    pub ciphertext_from_cache: bool,
}

pub struct DecryptionOrchestrator {
    ctx: Arc<WorkflowContext>,
    authorizer: EphemeralAuthorizer,
}

impl DecryptionOrchestrator {
    pub fn new(ctx: Arc<WorkflowContext>) -> Self {
        let authorizer = EphemeralAuthorizer::new(Arc::clone(&ctx));
        Self { ctx, authorizer }
    }

    pub async fn decrypt(
        &self,
        contract: &Contract,
        cached_session: Option<AuthorizedSession>,
        progress: Option<ProgressCallback>,
    ) -> Result<DecryptedDocument> {
        let progress = progress.as_ref();

        report(progress, DecryptionStep::LoadingMetadata);
        let (contract, meta) = resolve_encryption_meta(self.ctx.api.as_ref(), contract).await?;
        let document_id = meta
            .document_id_bytes()
            .map_err(|e| WorkflowError::InvalidDocumentId(e.to_string()))?;

        report(progress, DecryptionStep::Downloading);
        let (ciphertext, ciphertext_from_cache) = self.load_ciphertext(&contract, &meta).await?;

        let now = self.ctx.clock.now_ms();
        let (session, session_reused) = match cached_session {
            Some(cached) if cached.is_usable_for(&meta.allowlist_id, now) => {
                debug!("Reusing session key until {}", cached.session_key.expires_at_ms());
                (cached, true)
            }
            stale => {
                if let Some(stale) = stale {
                    info!(
                        "Cached session key (allowlist {}) is not usable for {}",
                        stale.allowlist_id, contract.id
                    );
                }
                let fresh = self
                    .authorizer
                    .authorize(&contract.id, meta.allowlist_id, &document_id, progress)
                    .await?;
                (fresh, false)
            }
        };

        report(progress, DecryptionStep::FetchingKeys);
        let tx_kind = build_seal_approve_kind(
            self.ctx.config.package_id,
            &self.ctx.config.module_name,
            &document_id,
            meta.allowlist_id,
        )?;
        let keys = self
            .ctx
            .seal
            .fetch_keys(&ciphertext, &tx_kind, &session.session_key)
            .await?;

        report(progress, DecryptionStep::Decrypting);
        let data = self.ctx.seal.decrypt(&ciphertext, &keys)?;

        report(progress, DecryptionStep::Complete);
        info!("🔓 Decrypted contract {} ({} bytes)", contract.id, data.len());
        Ok(DecryptedDocument {
            data,
            session,
            session_reused,
            ciphertext_from_cache,
        })
    }

    /// Cached ciphertext if it belongs to `meta`, else a download that is
    /// then cached. Cache failures only cost a download.
    async fn load_ciphertext(&self, contract: &Contract, meta: &EncryptionMeta) -> Result<(Vec<u8>, bool)> {
        match self.ctx.cache.get(&contract.id).await {
            Ok(Some(cached)) if cached.matches(meta) => {
                debug!("Ciphertext for {} served from cache", contract.id);
                return Ok((cached.encrypted_data, true));
            }
            Ok(Some(_)) => debug!("Cached ciphertext for {} is stale", contract.id),
            Ok(None) => debug!("No cached ciphertext for {}", contract.id),
            Err(e) => warn!("Ciphertext cache read failed for {}: {}", contract.id, e),
        }

        let ciphertext = self.ctx.api.download_pdf(&contract.id).await?;
        let entry = CachedPdf {
            encrypted_data: ciphertext.clone(),
            file_name: contract
                .file_name
                .clone()
                .unwrap_or_else(|| format!("{}.pdf", contract.id)),
            encryption_meta: meta.clone(),
        };
        if let Err(e) = self.ctx.cache.put(&contract.id, entry).await {
            warn!("Failed to cache ciphertext for {}: {}", contract.id, e);
        }
        Ok((ciphertext, false))
    }
}
