// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Cryptographic primitives for the document workflow
//!
//! - **Encryption**: AES-256-GCM document envelope bound to the Seal identity
//! - **ECDH**: identity-bound secp256k1 key-share wrapping
//! - **Shamir**: threshold splitting of the document key across key servers
//! - **Signature**: Sui intent signing with Ed25519
//! - **Hash**: Blake2b-256 / SHA-256 helpers
//!
//! ## Security Considerations
//!
//! - Private keys are never logged; `SuiKeypair` only prints its address
//! - A fresh document key and nonce are drawn for every encryption
//! - The Seal identity is authenticated as AAD, so ciphertexts cannot be
//!   moved between allowlists

pub mod ecdh;
pub mod encryption;
pub mod error;
pub mod hash;
pub mod shamir;
pub mod signature;

pub use encryption::{decrypt_aes_gcm, encrypt_aes_gcm};
pub use error::CryptoError;
pub use hash::{blake2b256, sha256};
pub use shamir::{combine_shares, split_secret};
pub use signature::{intent_digest, Ed25519Signature, IntentScope, SuiKeypair};
