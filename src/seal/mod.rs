// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Seal: identity-based threshold encryption gated by on-chain approval

pub mod client;
pub mod encrypted_object;
pub mod key_server;
pub mod session_key;

pub use client::{DerivedKeys, SealClient};
pub use encrypted_object::{EncryptedObject, WrappedShare};
pub use key_server::{
    FetchKeyRequest, FetchKeyResponse, KeyServer, KeyServerError, KeyServerInfo, LocalKeyServer,
};
pub use session_key::{Certificate, SessionKey, MAX_TTL_MIN};

use thiserror::Error;

use crate::chain::{ChainError, ObjectId};
use crate::crypto::CryptoError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SealError {
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error(transparent)]
    KeyServer(#[from] KeyServerError),
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error("Invalid session key TTL: {0} minutes")]
    InvalidTtl(u16),
    #[error("Session key expired")]
    ExpiredSessionKey,
    #[error("Session key has no personal message signature")]
    MissingSignature,
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),
    #[error("Invalid encrypted object: {0}")]
    InvalidObject(String),
    #[error("Unknown key server {0}")]
    UnknownKeyServer(ObjectId),
    #[error("Not enough key shares: need {needed}, got {got}")]
    NotEnoughShares { needed: usize, got: usize },
}
