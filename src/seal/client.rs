// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Seal client: threshold encryption to key servers and key retrieval

use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use futures::future::join_all;
use k256::SecretKey;
use rand::{rngs::OsRng, RngCore};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{
    encrypted_object::{full_id, ENCRYPTED_OBJECT_VERSION},
    key_server::{signed_request, FetchKeyRequest, KeyRequestItem, KeyServer, KeyServerInfo},
    EncryptedObject, SealError, SessionKey, WrappedShare,
};
use crate::chain::ObjectId;
use crate::crypto::{
    combine_shares, decrypt_aes_gcm,
    ecdh::{decrypt_with_secret, encapsulate, encode_point, wrap_key_from_point, xor_32},
    encrypt_aes_gcm,
    shamir::Share,
    split_secret, CryptoError,
};
use crate::utils::Clock;

/// Shares recovered for one identity, ready for `decrypt`
#[derive(Debug, Clone)]
pub struct DerivedKeys {
    pub full_id: Vec<u8>,
    pub shares: Vec<Share>,
}

pub struct SealClient {
    key_servers: Vec<Arc<dyn KeyServer>>,
    clock: Arc<dyn Clock>,
}

impl SealClient {
    pub fn new(key_servers: Vec<Arc<dyn KeyServer>>, clock: Arc<dyn Clock>) -> Self {
        Self { key_servers, clock }
    }

    /// Restrict to the configured server IDs; an empty list keeps all
    pub fn with_allowlist(
        key_servers: Vec<Arc<dyn KeyServer>>,
        allowed: &[ObjectId],
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SealError> {
        if allowed.is_empty() {
            return Ok(Self::new(key_servers, clock));
        }
        for id in allowed {
            if !key_servers.iter().any(|server| server.info().object_id == *id) {
                return Err(SealError::UnknownKeyServer(*id));
            }
        }
        let filtered = key_servers
            .into_iter()
            .filter(|server| allowed.contains(&server.info().object_id))
            .collect();
        Ok(Self::new(filtered, clock))
    }

    pub fn allowlisted_key_servers(&self) -> Vec<KeyServerInfo> {
        self.key_servers.iter().map(|server| server.info()).collect()
    }

    fn server(&self, id: &ObjectId) -> Option<&Arc<dyn KeyServer>> {
        self.key_servers.iter().find(|server| server.info().object_id == *id)
    }

    /// Encrypt `data` to identity `package_id || id` across every
    /// allowlisted server, recoverable from any `threshold` of them
    pub fn encrypt(
        &self,
        package_id: ObjectId,
        id: &[u8],
        data: &[u8],
        threshold: usize,
    ) -> Result<Vec<u8>, SealError> {
        let servers = self.allowlisted_key_servers();
        if servers.len() > u8::MAX as usize {
            return Err(CryptoError::InvalidThreshold {
                threshold,
                shares: servers.len(),
            }
            .into());
        }

        let mut document_key = [0u8; 32];
        OsRng.fill_bytes(&mut document_key);
        let shares = split_secret(&document_key, threshold, servers.len())?;
        let identity = full_id(&package_id, id);

        let mut wrapped = Vec::with_capacity(servers.len());
        for (server, (index, share)) in servers.iter().zip(shares) {
            let (ephemeral_point, wrap_key) =
                encapsulate(&server.public_key_bytes()?, &identity, server.object_id.as_bytes())?;
            wrapped.push(WrappedShare {
                server_id: server.object_id,
                index,
                ephemeral_point,
                encrypted_share: xor_32(&share, &wrap_key),
            });
        }

        let object = EncryptedObject {
            version: ENCRYPTED_OBJECT_VERSION,
            package_id,
            id: id.to_vec(),
            threshold: threshold as u8,
            shares: wrapped,
            ciphertext: encrypt_aes_gcm(data, &document_key, &identity)?,
        };
        debug!(
            "Encrypted {} bytes for {} with threshold {}/{}",
            data.len(),
            hex::encode(id),
            threshold,
            servers.len()
        );
        object.to_bytes()
    }

    /// Ask the servers holding shares of `encrypted` for their keys,
    /// proving access with `tx_kind_bytes` under `session_key`
    pub async fn fetch_keys(
        &self,
        encrypted: &[u8],
        tx_kind_bytes: &[u8],
        session_key: &SessionKey,
    ) -> Result<DerivedKeys, SealError> {
        let object = EncryptedObject::from_bytes(encrypted)?;
        if session_key.is_expired_at(self.clock.now_ms()) {
            return Err(SealError::ExpiredSessionKey);
        }
        let certificate = session_key.certificate()?;
        let identity = object.full_id();

        let enc_secret = SecretKey::random(&mut OsRng);
        let enc_key = encode_point(&enc_secret.public_key().to_projective());
        let ptb = B64.encode(tx_kind_bytes);

        let mut pending = Vec::new();
        for wrapped in &object.shares {
            let Some(server) = self.server(&wrapped.server_id) else {
                debug!("Skipping share for unconfigured server {}", wrapped.server_id);
                continue;
            };
            let items = vec![KeyRequestItem {
                id: hex::encode(&object.id),
                ephemeral_point: hex::encode(&wrapped.ephemeral_point),
            }];
            let request_bytes = signed_request(tx_kind_bytes, &enc_key, &items)?;
            let request = FetchKeyRequest {
                ptb: ptb.clone(),
                enc_key: hex::encode(&enc_key),
                items,
                request_signature: session_key.sign_request(&request_bytes).to_base64(),
                certificate: certificate.clone(),
            };
            pending.push((wrapped, Arc::clone(server), request));
        }

        let needed = usize::from(object.threshold);
        let responses = join_all(
            pending
                .iter()
                .map(|(_, server, request)| async move { server.fetch_key(request).await }),
        )
        .await;

        let mut shares = Vec::with_capacity(needed);
        let mut first_error = None;
        for ((wrapped, _, _), response) in pending.iter().zip(responses) {
            match response {
                Ok(response) => {
                    let key = response
                        .keys
                        .iter()
                        .find(|key| key.id == hex::encode(&object.id))
                        .ok_or_else(|| SealError::InvalidObject("response missing requested id".to_string()))?;
                    let sealed = B64.decode(&key.encrypted_key).map_err(CryptoError::from)?;
                    let response_point = hex::decode(&key.response_point).map_err(CryptoError::from)?;
                    let share_point = decrypt_with_secret(
                        &enc_secret,
                        &response_point,
                        &sealed,
                        wrapped.server_id.as_bytes(),
                    )?;
                    let wrap_key =
                        wrap_key_from_point(&share_point, &identity, wrapped.server_id.as_bytes())?;
                    shares.push((wrapped.index, xor_32(&wrapped.encrypted_share, &wrap_key)));
                }
                Err(e) => {
                    warn!("Key server {} refused: {}", wrapped.server_id, e);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        if shares.len() < needed {
            return Err(match first_error {
                Some(e) => SealError::KeyServer(e),
                None => SealError::NotEnoughShares {
                    needed,
                    got: shares.len(),
                },
            });
        }

        info!("🔑 Collected {}/{} key shares", shares.len(), object.shares.len());
        Ok(DerivedKeys {
            full_id: identity,
            shares,
        })
    }

    pub fn decrypt(&self, encrypted: &[u8], keys: &DerivedKeys) -> Result<Vec<u8>, SealError> {
        let object = EncryptedObject::from_bytes(encrypted)?;
        let identity = object.full_id();
        if keys.full_id != identity {
            return Err(SealError::InvalidObject(
                "keys were derived for a different identity".to_string(),
            ));
        }

        let needed = usize::from(object.threshold);
        if keys.shares.len() < needed {
            return Err(SealError::NotEnoughShares {
                needed,
                got: keys.shares.len(),
            });
        }
        let document_key = combine_shares(&keys.shares[..needed])?;
        Ok(decrypt_aes_gcm(&object.ciphertext, &document_key, &identity)?)
    }
}
