// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Digest helpers
//!
//! Sui derives addresses, intent digests and transaction digests with
//! Blake2b-256. SHA-256 is used for signer-identifier hashing and wallet
//! seed derivation.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use sha2::Sha256;

type Blake2b256 = Blake2b<U32>;

pub fn blake2b256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Blake2b-256 over several parts without concatenating them first
pub fn blake2b256_parts(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// SHA-256 over length-prefixed parts, so ("ab", "c") and ("a", "bc") differ
pub fn sha256_parts(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update((part.len() as u32).to_le_bytes());
        hasher.update(part);
    }
    hasher.finalize().into()
}
