// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Persisted `epochone_session` state
//!
//! Produced by the login flow and read, never written, by the document
//! workflow. Each contract gets its own zkLogin address (salted by contract
//! ID) so allowlist membership does not link a user's contracts together.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{
    decode_jwt_claims, gen_address_seed, jwt_expiry_ms, zklogin_address, IssBase64Details,
    JwtClaims, ZkLoginError, ZkLoginInputs, ZkProofPoints,
};
use crate::chain::SuiAddress;
use crate::crypto::{hash::sha256_parts, SuiKeypair};

/// Storage key the login flow persists the session under
pub const SESSION_STORAGE_KEY: &str = "epochone_session";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZkProof {
    pub proof_points: ZkProofPoints,
    pub iss_base64_details: IssBase64Details,
    pub header_base64: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractWallet {
    pub contract_id: String,
    pub address: SuiAddress,
    /// Hex-encoded address seed
    pub address_seed: String,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZkLoginSession {
    pub jwt: String,
    /// Ephemeral key the proof's nonce commits to (hex or flagged base64)
    pub ephemeral_private_key: String,
    pub zk_proof: ZkProof,
    pub max_epoch: u64,
    pub user_salt: String,
    #[serde(default)]
    pub contract_wallets: HashMap<String, ContractWallet>,
}

impl std::fmt::Debug for ZkLoginSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZkLoginSession")
            .field("max_epoch", &self.max_epoch)
            .field("contract_wallets", &self.contract_wallets.len())
            .finish_non_exhaustive()
    }
}

impl ZkLoginSession {
    pub fn from_json(json: &str) -> Result<Self, ZkLoginError> {
        serde_json::from_str(json).map_err(|e| ZkLoginError::InvalidSession(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, ZkLoginError> {
        serde_json::to_string(self).map_err(|e| ZkLoginError::InvalidSession(e.to_string()))
    }

    pub fn claims(&self) -> Result<JwtClaims, ZkLoginError> {
        decode_jwt_claims(&self.jwt)
    }

    pub fn jwt_expiry_ms(&self) -> Option<u64> {
        jwt_expiry_ms(&self.jwt)
    }

    pub fn ephemeral_keypair(&self) -> Result<SuiKeypair, ZkLoginError> {
        SuiKeypair::from_private_key_str(&self.ephemeral_private_key)
            .map_err(|e| ZkLoginError::InvalidSession(format!("ephemeral key: {}", e)))
    }

    /// Stored wallet for the contract, or the deterministic derivation
    pub fn contract_wallet(&self, contract_id: &str) -> Result<ContractWallet, ZkLoginError> {
        if let Some(wallet) = self.contract_wallets.get(contract_id) {
            return Ok(wallet.clone());
        }

        let claims = self.claims()?;
        let aud = claims
            .aud
            .primary()
            .ok_or_else(|| ZkLoginError::InvalidJwt("token has no audience".to_string()))?;
        let contract_salt = hex::encode(sha256_parts(&[
            self.user_salt.as_bytes(),
            contract_id.as_bytes(),
        ]));
        let seed = gen_address_seed(&contract_salt, "sub", &claims.sub, aud);

        Ok(ContractWallet {
            contract_id: contract_id.to_string(),
            address: zklogin_address(&claims.iss, &seed),
            address_seed: hex::encode(seed),
        })
    }

    pub fn contract_address(&self, contract_id: &str) -> Result<SuiAddress, ZkLoginError> {
        Ok(self.contract_wallet(contract_id)?.address)
    }

    pub fn zklogin_inputs(&self, wallet: &ContractWallet) -> ZkLoginInputs {
        ZkLoginInputs {
            proof_points: self.zk_proof.proof_points.clone(),
            iss_base64_details: self.zk_proof.iss_base64_details.clone(),
            header_base64: self.zk_proof.header_base64.clone(),
            address_seed: wallet.address_seed.clone(),
        }
    }
}
