// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use thiserror::Error;

use crate::api::ApiError;
use crate::chain::ChainError;
use crate::crypto::CryptoError;
use crate::seal::SealError;
use crate::zklogin::ZkLoginError;

/// Failures of the document workflow
///
/// Lower layers are wrapped transparently so their messages reach the
/// caller unchanged.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Encryption metadata not found for contract {0}")]
    MetadataNotFound(String),

    #[error("Invalid signer identifier '{0}'")]
    InvalidSigner(String),

    #[error("Invalid document id: {0}")]
    InvalidDocumentId(String),

    #[error("Invalid sponsored transaction: {0}")]
    InvalidSponsoredTransaction(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Seal(#[from] SealError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    ZkLogin(#[from] ZkLoginError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

pub type Result<T> = std::result::Result<T, WorkflowError>;
