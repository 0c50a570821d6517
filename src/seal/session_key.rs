// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Time-boxed Seal session keys
//!
//! A session key is a fresh Ed25519 keypair whose public half is endorsed by
//! the user's address through a signed personal message. Key servers accept
//! requests signed by the session keypair for `ttl_min` minutes after
//! `creation_time_ms`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SealError;
use crate::chain::{ObjectId, SuiAddress};
use crate::crypto::{Ed25519Signature, SuiKeypair};

pub const MAX_TTL_MIN: u16 = 30;

/// Canonical message the user signs to endorse a session public key
pub fn signed_message(
    package_id: &ObjectId,
    session_public_key_b64: &str,
    creation_time_ms: u64,
    ttl_min: u16,
) -> String {
    let created = DateTime::<Utc>::from_timestamp((creation_time_ms / 1000) as i64, 0)
        .map(|dt| dt.to_string())
        .unwrap_or_else(|| creation_time_ms.to_string());
    format!(
        "Accessing keys of package {} for {} mins from {}, session key {}",
        package_id, ttl_min, created, session_public_key_b64
    )
}

/// What key servers receive in place of the session key itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub user: SuiAddress,
    pub session_vk: String,
    pub creation_time: u64,
    pub ttl_min: u16,
    pub signature: String,
}

#[derive(Clone)]
pub struct SessionKey {
    address: SuiAddress,
    package_id: ObjectId,
    ttl_min: u16,
    creation_time_ms: u64,
    session_keypair: SuiKeypair,
    personal_message_signature: Option<Ed25519Signature>,
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKey")
            .field("address", &self.address)
            .field("package_id", &self.package_id)
            .field("ttl_min", &self.ttl_min)
            .field("creation_time_ms", &self.creation_time_ms)
            .field("signed", &self.personal_message_signature.is_some())
            .finish()
    }
}

impl SessionKey {
    pub fn new(
        address: SuiAddress,
        package_id: ObjectId,
        ttl_min: u16,
        creation_time_ms: u64,
    ) -> Result<Self, SealError> {
        if ttl_min == 0 || ttl_min > MAX_TTL_MIN {
            return Err(SealError::InvalidTtl(ttl_min));
        }
        Ok(Self {
            address,
            package_id,
            ttl_min,
            creation_time_ms,
            session_keypair: SuiKeypair::generate(),
            personal_message_signature: None,
        })
    }

    pub fn address(&self) -> SuiAddress {
        self.address
    }

    pub fn package_id(&self) -> ObjectId {
        self.package_id
    }

    pub fn ttl_min(&self) -> u16 {
        self.ttl_min
    }

    pub fn creation_time_ms(&self) -> u64 {
        self.creation_time_ms
    }

    pub fn expires_at_ms(&self) -> u64 {
        self.creation_time_ms
            .saturating_add(u64::from(self.ttl_min) * 60_000)
    }

    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at_ms()
    }

    pub fn personal_message(&self) -> String {
        signed_message(
            &self.package_id,
            &self.session_keypair.public_key_base64(),
            self.creation_time_ms,
            self.ttl_min,
        )
    }

    /// Attach the user's signature, rejecting one from any other address
    pub fn set_personal_message_signature(
        &mut self,
        signature: Ed25519Signature,
    ) -> Result<(), SealError> {
        signature.verify_personal_message(self.personal_message().as_bytes())?;
        if signature.signer_address() != self.address {
            return Err(SealError::InvalidSignature(format!(
                "personal message signed by {} instead of {}",
                signature.signer_address(),
                self.address
            )));
        }
        self.personal_message_signature = Some(signature);
        Ok(())
    }

    pub fn sign_personal_message(&mut self, keypair: &SuiKeypair) -> Result<(), SealError> {
        let signature = keypair.sign_personal_message(self.personal_message().as_bytes())?;
        self.set_personal_message_signature(signature)
    }

    pub fn is_signed(&self) -> bool {
        self.personal_message_signature.is_some()
    }

    pub fn certificate(&self) -> Result<Certificate, SealError> {
        let signature = self
            .personal_message_signature
            .as_ref()
            .ok_or(SealError::MissingSignature)?;
        Ok(Certificate {
            user: self.address,
            session_vk: self.session_keypair.public_key_base64(),
            creation_time: self.creation_time_ms,
            ttl_min: self.ttl_min,
            signature: signature.to_base64(),
        })
    }

    /// Session-key signature over a key request
    pub fn sign_request(&self, request_bytes: &[u8]) -> Ed25519Signature {
        self.session_keypair.sign_raw(request_bytes)
    }
}
