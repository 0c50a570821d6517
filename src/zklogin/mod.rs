// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! zkLogin identities, signatures and the persisted client session

pub mod jwt;
pub mod session;
pub mod signature;

pub use jwt::{decode_jwt_claims, jwt_expiry_ms, Audience, JwtClaims};
pub use session::{ContractWallet, ZkLoginSession, ZkProof};
pub use signature::{IssBase64Details, ZkLoginInputs, ZkLoginSignature, ZkProofPoints, ZKLOGIN_FLAG};

use thiserror::Error;

use crate::chain::SuiAddress;
use crate::crypto::{blake2b256, hash::sha256_parts};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ZkLoginError {
    #[error("Invalid JWT: {0}")]
    InvalidJwt(String),
    #[error("JWT expired at {expired_at_ms} (now {now_ms})")]
    ExpiredJwt { expired_at_ms: u64, now_ms: u64 },
    #[error("Invalid zkLogin signature: {0}")]
    InvalidSignature(String),
    #[error("zkLogin max epoch {max_epoch} is behind current epoch {current_epoch}")]
    EpochExpired { max_epoch: u64, current_epoch: u64 },
    #[error("Invalid session: {0}")]
    InvalidSession(String),
}

/// `blake2b256(0x05 || len(iss) || iss || address_seed)`
pub fn zklogin_address(iss: &str, address_seed: &[u8; 32]) -> SuiAddress {
    let iss_bytes = iss.as_bytes();
    let mut data = Vec::with_capacity(2 + iss_bytes.len() + 32);
    data.push(ZKLOGIN_FLAG);
    data.push(iss_bytes.len().min(u8::MAX as usize) as u8);
    data.extend_from_slice(iss_bytes);
    data.extend_from_slice(address_seed);
    SuiAddress(blake2b256(&data))
}

/// Address seed binding salt, subject and audience
///
/// SHA-256 stands in for the Poseidon hash the prover uses; only equality
/// of seeds matters to this crate.
pub fn gen_address_seed(salt: &str, claim_name: &str, claim_value: &str, aud: &str) -> [u8; 32] {
    sha256_parts(&[
        b"epochone-zklogin-seed",
        salt.as_bytes(),
        claim_name.as_bytes(),
        claim_value.as_bytes(),
        aud.as_bytes(),
    ])
}
