// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Client-side document workflow
//!
//! Encryption creates an allowlist and Seal-encrypts a PDF to a fresh
//! document identity under it. Decryption resolves metadata and
//! ciphertext, obtains a signed session key (reusing a cached one while it
//! is live and scoped to the same allowlist), then fetches key shares and decrypts locally.

pub mod authorize;
pub mod decrypt;
pub mod encrypt;
pub mod error;
pub mod metadata;
pub mod progress;

pub use authorize::{AuthorizedSession, EphemeralAuthorizer, FALLBACK_JWT_VALIDITY_MS};
pub use decrypt::{DecryptedDocument, DecryptionOrchestrator};
pub use encrypt::{
    hash_signer_identifier, merge_signer_addresses, new_document_id, EncryptedDocument,
    EncryptionOrchestrator, DOCUMENT_SALT_LEN,
};
pub use error::WorkflowError;
pub use metadata::resolve_encryption_meta;
pub use progress::{DecryptionStep, ProgressCallback};

use std::sync::Arc;

use crate::api::EpochOneApi;
use crate::chain::ChainClient;
use crate::config::SealConfig;
use crate::seal::SealClient;
use crate::storage::PdfCache;
use crate::utils::Clock;
use crate::zklogin::ZkLoginSession;

/// Dependencies shared by the orchestrators, constructed by the caller
#[derive(Clone)]
pub struct WorkflowContext {
    pub api: Arc<dyn EpochOneApi>,
    pub chain: Arc<dyn ChainClient>,
    pub seal: Arc<SealClient>,
    pub cache: Arc<dyn PdfCache>,
    pub session: Arc<ZkLoginSession>,
    pub config: SealConfig,
    pub clock: Arc<dyn Clock>,
}
