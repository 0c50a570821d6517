// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! JWT claim decoding
//!
//! Signatures are not checked here: the OAuth provider's JWT was already
//! bound into the zk proof by the prover. We only read the claims the
//! workflow needs (`iss`, `sub`, `aud`, `exp`).

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};

use super::ZkLoginError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Multiple(Vec<String>),
}

impl Audience {
    /// First audience, which is what address derivation uses
    pub fn primary(&self) -> Option<&str> {
        match self {
            Audience::Single(aud) => Some(aud.as_str()),
            Audience::Multiple(auds) => auds.first().map(String::as_str),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub iss: String,
    pub sub: String,
    pub aud: Audience,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

fn payload_segment(jwt: &str) -> Result<&str, ZkLoginError> {
    let mut parts = jwt.split('.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_)) if !payload.is_empty() => Ok(payload),
        _ => Err(ZkLoginError::InvalidJwt(
            "expected three dot-separated segments".to_string(),
        )),
    }
}

pub fn decode_jwt_claims(jwt: &str) -> Result<JwtClaims, ZkLoginError> {
    let payload = payload_segment(jwt.trim())?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| ZkLoginError::InvalidJwt(format!("payload is not base64url: {}", e)))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ZkLoginError::InvalidJwt(format!("payload is not valid claims JSON: {}", e)))
}

/// `exp` in milliseconds, or `None` when the token or claim is unreadable
pub fn jwt_expiry_ms(jwt: &str) -> Option<u64> {
    let payload = payload_segment(jwt.trim()).ok()?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let value: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    value.get("exp")?.as_u64().map(|exp| exp.saturating_mul(1000))
}

/// Build an unsigned (`alg: none`) token carrying `claims`
pub fn unsigned_jwt(claims: &JwtClaims) -> Result<String, ZkLoginError> {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let body = serde_json::to_vec(claims)
        .map_err(|e| ZkLoginError::InvalidJwt(e.to_string()))?;
    Ok(format!("{}.{}.", header, URL_SAFE_NO_PAD.encode(body)))
}
