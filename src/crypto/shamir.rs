// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shamir secret sharing over GF(2^8)
//!
//! Splits the 32-byte document key across key servers. With threshold 1
//! every share equals the key itself, which is the configuration the
//! document workflow uses: the allowlist check is the security boundary.

use rand::{rngs::OsRng, RngCore};

use super::CryptoError;

pub type Share = (u8, [u8; 32]);

fn gf_mul(mut a: u8, mut b: u8) -> u8 {
    let mut product = 0u8;
    while b != 0 {
        if b & 1 != 0 {
            product ^= a;
        }
        let carry = a & 0x80;
        a <<= 1;
        if carry != 0 {
            a ^= 0x1b;
        }
        b >>= 1;
    }
    product
}

fn gf_inv(a: u8) -> u8 {
    // a^254 = a^-1 in GF(2^8)
    let mut result = 1u8;
    let mut base = a;
    let mut exp = 254u8;
    while exp != 0 {
        if exp & 1 != 0 {
            result = gf_mul(result, base);
        }
        base = gf_mul(base, base);
        exp >>= 1;
    }
    result
}

/// Split `secret` into `shares` shares with indices `1..=shares`
pub fn split_secret(secret: &[u8; 32], threshold: usize, shares: usize) -> Result<Vec<Share>, CryptoError> {
    if threshold == 0 || threshold > shares || shares > 255 {
        return Err(CryptoError::InvalidThreshold { threshold, shares });
    }

    // coefficients[k][byte] for k in 1..threshold
    let mut coefficients = vec![[0u8; 32]; threshold - 1];
    for coefficient in coefficients.iter_mut() {
        OsRng.fill_bytes(coefficient);
    }

    let mut out = Vec::with_capacity(shares);
    for index in 1..=shares as u8 {
        let mut share = [0u8; 32];
        for byte in 0..32 {
            // Horner evaluation at x = index
            let mut value = 0u8;
            for coefficient in coefficients.iter().rev() {
                value = gf_mul(value, index) ^ coefficient[byte];
            }
            share[byte] = gf_mul(value, index) ^ secret[byte];
        }
        out.push((index, share));
    }
    Ok(out)
}

/// Lagrange interpolation at zero
pub fn combine_shares(shares: &[Share]) -> Result<[u8; 32], CryptoError> {
    if shares.is_empty() {
        return Err(CryptoError::InvalidThreshold {
            threshold: 1,
            shares: 0,
        });
    }
    for (i, (a, _)) in shares.iter().enumerate() {
        if *a == 0 || shares[i + 1..].iter().any(|(b, _)| b == a) {
            return Err(CryptoError::InvalidPayload {
                field: "share_index".to_string(),
                reason: format!("share index {} is zero or duplicated", a),
            });
        }
    }

    let mut secret = [0u8; 32];
    for (i, (xi, yi)) in shares.iter().enumerate() {
        let mut numerator = 1u8;
        let mut denominator = 1u8;
        for (j, (xj, _)) in shares.iter().enumerate() {
            if i != j {
                numerator = gf_mul(numerator, *xj);
                denominator = gf_mul(denominator, xi ^ xj);
            }
        }
        let basis = gf_mul(numerator, gf_inv(denominator));
        for byte in 0..32 {
            secret[byte] ^= gf_mul(yi[byte], basis);
        }
    }
    Ok(secret)
}
