// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! On-chain allowlist object and its Move-level rules

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{ChainError, ObjectId, SuiAddress};

/// Move abort codes of the `allowlist` module
pub mod abort {
    pub const E_INVALID_CAP: u64 = 0;
    pub const E_NO_ACCESS: u64 = 1;
    pub const E_DUPLICATE: u64 = 2;
    pub const E_INVALID_VALIDITY: u64 = 3;
    pub const E_INVALID_DOCUMENT: u64 = 4;
    pub const E_DELEGATION_CONFLICT: u64 = 5;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EphemeralEntry {
    pub expires_at_ms: u64,
    #[serde(with = "hex_bytes")]
    pub document_id: Vec<u8>,
    pub authorized_by: SuiAddress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allowlist {
    pub id: ObjectId,
    pub cap_id: ObjectId,
    pub name: String,
    pub members: BTreeSet<SuiAddress>,
    pub ephemeral: BTreeMap<SuiAddress, EphemeralEntry>,
    pub version: u64,
}

impl Allowlist {
    pub fn new(id: ObjectId, cap_id: ObjectId, name: &str, members: &[SuiAddress]) -> Self {
        Self {
            id,
            cap_id,
            name: name.to_string(),
            members: members.iter().copied().collect(),
            ephemeral: BTreeMap::new(),
            version: 1,
        }
    }

    /// Document IDs in this allowlist's namespace start with its object ID bytes
    pub fn owns_document(&self, id: &[u8]) -> bool {
        id.len() >= self.id.as_bytes().len() && id.starts_with(self.id.as_bytes())
    }

    /// Record (or refresh) a delegated ephemeral key. A live entry can only
    /// be replaced by its delegator or by a member.
    pub fn authorize(
        &mut self,
        sender: SuiAddress,
        ephemeral: SuiAddress,
        document_id: Vec<u8>,
        validity_ms: u64,
        now_ms: u64,
    ) -> Result<(), ChainError> {
        if validity_ms == 0 {
            return Err(self.abort("authorize_ephemeral_key", abort::E_INVALID_VALIDITY, "zero validity"));
        }
        if !self.owns_document(&document_id) {
            return Err(self.abort(
                "authorize_ephemeral_key",
                abort::E_INVALID_DOCUMENT,
                "document id outside allowlist namespace",
            ));
        }
        if let Some(existing) = self.ephemeral.get(&ephemeral) {
            let live = existing.expires_at_ms > now_ms;
            if live && existing.authorized_by != sender && !self.members.contains(&sender) {
                return Err(self.abort(
                    "authorize_ephemeral_key",
                    abort::E_DELEGATION_CONFLICT,
                    "ephemeral key already delegated by another sender",
                ));
            }
        }

        self.ephemeral.insert(
            ephemeral,
            EphemeralEntry {
                expires_at_ms: now_ms.saturating_add(validity_ms),
                document_id,
                authorized_by: sender,
            },
        );
        self.version += 1;
        Ok(())
    }

    /// `seal_approve` rule: members directly, or a live ephemeral key whose
    /// delegating sender is a member
    pub fn check_access(&self, caller: &SuiAddress, id: &[u8], now_ms: u64) -> bool {
        if !self.owns_document(id) {
            return false;
        }
        if self.members.contains(caller) {
            return true;
        }
        match self.ephemeral.get(caller) {
            Some(entry) => entry.expires_at_ms > now_ms && self.members.contains(&entry.authorized_by),
            None => false,
        }
    }

    /// Drop entries with `expires_at_ms <= now`, returning how many were removed
    pub fn clean_expired(&mut self, cap_id: &ObjectId, now_ms: u64) -> Result<usize, ChainError> {
        if *cap_id != self.cap_id {
            return Err(self.abort("clean_expired_keys", abort::E_INVALID_CAP, "capability mismatch"));
        }
        let before = self.ephemeral.len();
        self.ephemeral.retain(|_, entry| entry.expires_at_ms > now_ms);
        let removed = before - self.ephemeral.len();
        if removed > 0 {
            self.version += 1;
        }
        Ok(removed)
    }

    fn abort(&self, function: &str, code: u64, reason: &str) -> ChainError {
        ChainError::MoveAbort {
            function: function.to_string(),
            code,
            reason: reason.to_string(),
        }
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.trim_start_matches("0x")).map_err(serde::de::Error::custom)
    }
}
