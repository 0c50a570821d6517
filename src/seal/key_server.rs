// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Key servers
//!
//! A key server releases its share of a document identity only after:
//!
//! 1. the certificate shows the user endorsed the session key,
//! 2. the session key is still inside its TTL,
//! 3. the request is signed by that session key, and
//! 4. the supplied `seal_approve` transaction kind dry-runs successfully
//!    with the certificate's user as sender.
//!
//! The released point is sealed to the requester's one-off `enc_key`, so
//! only the session that asked can unwrap it.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use k256::SecretKey;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{encrypted_object::full_id, session_key::signed_message, Certificate, MAX_TTL_MIN};
use crate::chain::{
    transaction::SEAL_APPROVE, ChainClient, ChainError, ObjectId, SuiAddress, TransactionKind,
};
use crate::crypto::{
    ecdh::{derive_share_point, encode_point, encrypt_to_public_key, secret_from_seed},
    hash::blake2b256_parts,
    CryptoError, Ed25519Signature,
};
use crate::utils::Clock;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum KeyServerError {
    #[error("Invalid certificate: {0}")]
    InvalidCertificate(String),
    #[error("Session key expired")]
    ExpiredSessionKey,
    #[error("Invalid request signature: {0}")]
    InvalidRequestSignature(String),
    #[error("Invalid PTB: {0}")]
    InvalidPtb(String),
    #[error("Access denied: {0}")]
    NoAccess(String),
    #[error("Chain error: {0}")]
    Chain(String),
    #[error("Key derivation failed: {0}")]
    Crypto(String),
}

impl From<CryptoError> for KeyServerError {
    fn from(e: CryptoError) -> Self {
        KeyServerError::Crypto(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyServerInfo {
    pub object_id: ObjectId,
    pub name: String,
    pub url: String,
    /// SEC1-compressed secp256k1 public key, hex
    pub public_key: String,
}

impl KeyServerInfo {
    pub fn public_key_bytes(&self) -> Result<Vec<u8>, CryptoError> {
        Ok(hex::decode(&self.public_key)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyRequestItem {
    /// Inner identity (document ID), hex
    pub id: String,
    /// Encryptor's point `R` for this server's share, hex
    pub ephemeral_point: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchKeyRequest {
    /// BCS transaction-kind bytes, base64
    pub ptb: String,
    /// Requester's response encryption key, hex
    pub enc_key: String,
    pub items: Vec<KeyRequestItem>,
    pub request_signature: String,
    pub certificate: Certificate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptionKey {
    pub id: String,
    pub response_point: String,
    /// Sealed share point, base64
    pub encrypted_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchKeyResponse {
    pub keys: Vec<DecryptionKey>,
}

#[derive(Serialize)]
struct RequestFormat<'a> {
    ptb: &'a [u8],
    enc_key: &'a [u8],
    items: Vec<(Vec<u8>, Vec<u8>)>,
}

/// Bytes the session key signs for a key request
pub fn signed_request(
    ptb: &[u8],
    enc_key: &[u8],
    items: &[KeyRequestItem],
) -> Result<Vec<u8>, CryptoError> {
    let items = items
        .iter()
        .map(|item| Ok((hex::decode(&item.id)?, hex::decode(&item.ephemeral_point)?)))
        .collect::<Result<Vec<_>, CryptoError>>()?;
    Ok(bcs::to_bytes(&RequestFormat {
        ptb,
        enc_key,
        items,
    })?)
}

#[async_trait]
pub trait KeyServer: Send + Sync {
    fn info(&self) -> KeyServerInfo;

    async fn fetch_key(&self, request: &FetchKeyRequest) -> Result<FetchKeyResponse, KeyServerError>;
}

/// In-process key server backed by a `ChainClient`
pub struct LocalKeyServer {
    object_id: ObjectId,
    name: String,
    secret: SecretKey,
    package_id: ObjectId,
    chain: Arc<dyn ChainClient>,
    clock: Arc<dyn Clock>,
}

impl LocalKeyServer {
    pub fn new(
        name: &str,
        seed: &[u8],
        package_id: ObjectId,
        chain: Arc<dyn ChainClient>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, CryptoError> {
        Ok(Self {
            object_id: SuiAddress(blake2b256_parts(&[b"epochone-key-server", name.as_bytes()])),
            name: name.to_string(),
            secret: secret_from_seed(seed)?,
            package_id,
            chain,
            clock,
        })
    }

    fn verify_certificate(&self, certificate: &Certificate) -> Result<(), KeyServerError> {
        if certificate.ttl_min == 0 || certificate.ttl_min > MAX_TTL_MIN {
            return Err(KeyServerError::InvalidCertificate(format!(
                "ttl {} outside 1..={}",
                certificate.ttl_min, MAX_TTL_MIN
            )));
        }

        let signature = Ed25519Signature::from_base64(&certificate.signature)
            .map_err(|e| KeyServerError::InvalidCertificate(e.to_string()))?;
        if signature.signer_address() != certificate.user {
            return Err(KeyServerError::InvalidCertificate(
                "signature does not belong to the certificate user".to_string(),
            ));
        }

        let message = signed_message(
            &self.package_id,
            &certificate.session_vk,
            certificate.creation_time,
            certificate.ttl_min,
        );
        signature
            .verify_personal_message(message.as_bytes())
            .map_err(|e| KeyServerError::InvalidCertificate(e.to_string()))?;

        let expires_at = certificate.creation_time + u64::from(certificate.ttl_min) * 60_000;
        if self.clock.now_ms() >= expires_at {
            return Err(KeyServerError::ExpiredSessionKey);
        }
        Ok(())
    }

    fn verify_request_signature(&self, request: &FetchKeyRequest, ptb: &[u8]) -> Result<Vec<u8>, KeyServerError> {
        let session_vk = B64
            .decode(&request.certificate.session_vk)
            .map_err(|e| KeyServerError::InvalidCertificate(e.to_string()))?;
        let enc_key = hex::decode(&request.enc_key)
            .map_err(|e| KeyServerError::InvalidRequestSignature(format!("enc_key: {}", e)))?;

        let signature = Ed25519Signature::from_base64(&request.request_signature)
            .map_err(|e| KeyServerError::InvalidRequestSignature(e.to_string()))?;
        if signature.public_key.as_slice() != session_vk.as_slice() {
            return Err(KeyServerError::InvalidRequestSignature(
                "request not signed by the certified session key".to_string(),
            ));
        }

        let bytes = signed_request(ptb, &enc_key, &request.items)
            .map_err(|e| KeyServerError::InvalidRequestSignature(e.to_string()))?;
        signature
            .verify_raw(&bytes)
            .map_err(|e| KeyServerError::InvalidRequestSignature(e.to_string()))?;
        Ok(enc_key)
    }

    /// IDs approved by the transaction's `seal_approve` calls
    fn approved_ids(&self, ptb: &[u8]) -> Result<HashSet<Vec<u8>>, KeyServerError> {
        let kind = TransactionKind::from_bytes(ptb).map_err(|e| KeyServerError::InvalidPtb(e.to_string()))?;
        let mut ids = HashSet::new();
        for call in &kind.calls {
            if call.package != self.package_id || call.function != SEAL_APPROVE {
                return Err(KeyServerError::InvalidPtb(format!(
                    "only {}::{} calls are allowed",
                    self.package_id, SEAL_APPROVE
                )));
            }
            let id: Vec<u8> = call
                .pure_arg(0)
                .map_err(|e| KeyServerError::InvalidPtb(e.to_string()))?;
            ids.insert(id);
        }
        if ids.is_empty() {
            return Err(KeyServerError::InvalidPtb("no seal_approve call".to_string()));
        }
        Ok(ids)
    }
}

#[async_trait]
impl KeyServer for LocalKeyServer {
    fn info(&self) -> KeyServerInfo {
        KeyServerInfo {
            object_id: self.object_id,
            name: self.name.clone(),
            url: format!("local://{}", self.name),
            public_key: hex::encode(encode_point(&self.secret.public_key().to_projective())),
        }
    }

    async fn fetch_key(&self, request: &FetchKeyRequest) -> Result<FetchKeyResponse, KeyServerError> {
        let ptb = B64
            .decode(&request.ptb)
            .map_err(|e| KeyServerError::InvalidPtb(e.to_string()))?;

        self.verify_certificate(&request.certificate)?;
        let enc_key = self.verify_request_signature(request, &ptb)?;

        let approved = self.approved_ids(&ptb)?;
        let mut requested = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let id = hex::decode(&item.id).map_err(|e| KeyServerError::InvalidPtb(e.to_string()))?;
            if !approved.contains(&id) {
                return Err(KeyServerError::InvalidPtb(format!(
                    "id {} is not covered by seal_approve",
                    item.id
                )));
            }
            let point = hex::decode(&item.ephemeral_point)
                .map_err(|e| KeyServerError::Crypto(e.to_string()))?;
            requested.push((id, point));
        }

        self.chain
            .dry_run_transaction_kind(&ptb, request.certificate.user)
            .await
            .map_err(|e| match e {
                ChainError::MoveAbort { .. } | ChainError::NotFound(_) => {
                    warn!("🚫 {} denied {}: {}", self.name, request.certificate.user, e);
                    KeyServerError::NoAccess(e.to_string())
                }
                other => KeyServerError::Chain(other.to_string()),
            })?;

        let mut keys = Vec::with_capacity(requested.len());
        for (id, point) in requested {
            let share_point = derive_share_point(&self.secret, &full_id(&self.package_id, &id), &point)?;
            let (response_point, sealed) =
                encrypt_to_public_key(&enc_key, &share_point, self.object_id.as_bytes())?;
            keys.push(DecryptionKey {
                id: hex::encode(&id),
                response_point: hex::encode(response_point),
                encrypted_key: B64.encode(sealed),
            });
        }

        debug!("{} served {} keys", self.name, keys.len());
        info!("🔑 Key server {} released keys to {}", self.name, request.certificate.user);
        Ok(FetchKeyResponse { keys })
    }
}
