// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Identity-bound ECDH for key-share wrapping
//!
//! Each key server holds a static secp256k1 key `s` with public key `P = s·G`.
//! For an identity `full_id` the encryptor picks an ephemeral scalar `r` and
//! computes `r·h(full_id)·P`; the key server, once the request is approved,
//! answers with `s·h(full_id)·R` where `R = r·G`. Both sides reach the same
//! point, so the share wrapping key can only be derived by someone the key
//! server agreed to serve for that identity.

use hkdf::Hkdf;
use k256::{
    elliptic_curve::{ops::Reduce, sec1::ToEncodedPoint},
    FieldBytes, NonZeroScalar, ProjectivePoint, PublicKey, Scalar, SecretKey, U256,
};
use rand::rngs::OsRng;
use sha2::Sha256;

use super::{decrypt_aes_gcm, encrypt_aes_gcm, hash::sha256_parts, CryptoError};

/// HKDF info parameter for share wrapping domain separation
pub const SHARE_HKDF_INFO: &[u8] = b"epochone-seal-share-v1";

/// HKDF info parameter for key-server responses sealed to a session
pub const RESPONSE_HKDF_INFO: &[u8] = b"epochone-seal-response-v1";

/// Map an identity to a non-zero scalar
pub fn hash_to_scalar(full_id: &[u8]) -> Scalar {
    let mut counter: u32 = 0;
    loop {
        let digest = sha256_parts(&[b"epochone-seal-h2s", full_id, &counter.to_le_bytes()]);
        let scalar = <Scalar as Reduce<U256>>::reduce_bytes(&FieldBytes::clone_from_slice(&digest));
        if !bool::from(scalar.is_zero()) {
            return scalar;
        }
        counter += 1;
    }
}

/// Parse a SEC1-encoded point (33 or 65 bytes)
pub fn parse_point(bytes: &[u8], key_type: &str) -> Result<ProjectivePoint, CryptoError> {
    if bytes.len() != 33 && bytes.len() != 65 {
        return Err(CryptoError::InvalidKey {
            key_type: key_type.to_string(),
            reason: format!("expected 33 or 65 bytes, got {}", bytes.len()),
        });
    }
    let public = PublicKey::from_sec1_bytes(bytes).map_err(|e| CryptoError::InvalidKey {
        key_type: key_type.to_string(),
        reason: e.to_string(),
    })?;
    Ok(public.to_projective())
}

pub fn encode_point(point: &ProjectivePoint) -> Vec<u8> {
    point.to_affine().to_encoded_point(true).as_bytes().to_vec()
}

/// Derive a key server's static secret from seed material
pub fn secret_from_seed(seed: &[u8]) -> Result<SecretKey, CryptoError> {
    let mut counter: u32 = 0;
    loop {
        let digest = sha256_parts(&[b"epochone-key-server", seed, &counter.to_le_bytes()]);
        if let Ok(secret) = SecretKey::from_slice(&digest) {
            return Ok(secret);
        }
        counter += 1;
        if counter > 16 {
            return Err(CryptoError::InvalidKey {
                key_type: "key_server_secret".to_string(),
                reason: "could not derive a valid scalar from seed".to_string(),
            });
        }
    }
}

/// Encryptor side: returns `(R, wrap_key)` for one key server
pub fn encapsulate(
    server_public_key: &[u8],
    full_id: &[u8],
    server_id: &[u8],
) -> Result<(Vec<u8>, [u8; 32]), CryptoError> {
    let server_point = parse_point(server_public_key, "key_server_public_key")?;
    let r = NonZeroScalar::random(&mut OsRng);
    let ephemeral = ProjectivePoint::GENERATOR * *r;
    let shared = server_point * (hash_to_scalar(full_id) * *r);

    let wrap_key = wrap_key_from_point(&encode_point(&shared), full_id, server_id)?;
    Ok((encode_point(&ephemeral), wrap_key))
}

/// Key-server side: `s·h(full_id)·R`
pub fn derive_share_point(
    server_secret: &SecretKey,
    full_id: &[u8],
    ephemeral_point: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let ephemeral = parse_point(ephemeral_point, "ephemeral_point")?;
    let scalar = *server_secret.to_nonzero_scalar() * hash_to_scalar(full_id);
    Ok(encode_point(&(ephemeral * scalar)))
}

/// HKDF-SHA256 over the x-coordinate of the shared point
pub fn wrap_key_from_point(
    shared_point: &[u8],
    full_id: &[u8],
    server_id: &[u8],
) -> Result<[u8; 32], CryptoError> {
    if shared_point.len() != 33 {
        return Err(CryptoError::InvalidKey {
            key_type: "shared_point".to_string(),
            reason: format!("expected 33-byte compressed point, got {}", shared_point.len()),
        });
    }
    let x_coordinate = &shared_point[1..];

    let hkdf = Hkdf::<Sha256>::new(Some(server_id), x_coordinate);
    let mut info = Vec::with_capacity(SHARE_HKDF_INFO.len() + full_id.len());
    info.extend_from_slice(SHARE_HKDF_INFO);
    info.extend_from_slice(full_id);

    let mut key = [0u8; 32];
    hkdf.expand(&info, &mut key)
        .map_err(|e| CryptoError::KeyDerivationFailed {
            operation: "share_wrap".to_string(),
            reason: e.to_string(),
        })?;
    Ok(key)
}

fn response_key(shared: &ProjectivePoint) -> Result<[u8; 32], CryptoError> {
    let encoded = encode_point(shared);
    let hkdf = Hkdf::<Sha256>::new(None, &encoded[1..]);
    let mut key = [0u8; 32];
    hkdf.expand(RESPONSE_HKDF_INFO, &mut key)
        .map_err(|e| CryptoError::KeyDerivationFailed {
            operation: "response_key".to_string(),
            reason: e.to_string(),
        })?;
    Ok(key)
}

/// ECIES-style sealing of a key-server response to the requester's
/// encryption key. Returns `(K, ciphertext)` with `K = k·G`.
pub fn encrypt_to_public_key(
    recipient_public_key: &[u8],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<(Vec<u8>, Vec<u8>), CryptoError> {
    let recipient = parse_point(recipient_public_key, "enc_key")?;
    let k = NonZeroScalar::random(&mut OsRng);
    let key = response_key(&(recipient * *k))?;
    let ciphertext = encrypt_aes_gcm(plaintext, &key, aad)?;
    Ok((encode_point(&(ProjectivePoint::GENERATOR * *k)), ciphertext))
}

pub fn decrypt_with_secret(
    secret: &SecretKey,
    ephemeral_point: &[u8],
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let ephemeral = parse_point(ephemeral_point, "response_point")?;
    let key = response_key(&(ephemeral * *secret.to_nonzero_scalar()))?;
    decrypt_aes_gcm(ciphertext, &key, aad)
}

pub fn xor_32(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    let mut out = [0u8; 32];
    for i in 0..32 {
        out[i] = a[i] ^ b[i];
    }
    out
}
