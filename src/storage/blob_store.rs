// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::crypto::blake2b256;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Invalid blob id: {0}")]
    InvalidBlobId(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Server error: {0}")]
    ServerError(String),
    #[error("Cache error: {0}")]
    CacheError(String),
}

impl From<reqwest::Error> for StorageError {
    fn from(e: reqwest::Error) -> Self {
        StorageError::NetworkError(e.to_string())
    }
}

/// Content-addressed blob storage for ciphertexts
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data`, returning its blob ID
    async fn store(&self, data: Vec<u8>) -> Result<String, StorageError>;

    async fn read(&self, blob_id: &str) -> Result<Vec<u8>, StorageError>;

    // Mock-specific (no-op for real backends)
    async fn inject_error(&self, _error: StorageError) {}
}

#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    injected_error: Arc<Mutex<Option<StorageError>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blob_id_for(data: &[u8]) -> String {
        URL_SAFE_NO_PAD.encode(blake2b256(data))
    }

    pub async fn len(&self) -> usize {
        self.blobs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.lock().await.is_empty()
    }

    async fn check_injected_error(&self) -> Result<(), StorageError> {
        let mut error_opt = self.injected_error.lock().await;
        if let Some(error) = error_opt.take() {
            return Err(error);
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn store(&self, data: Vec<u8>) -> Result<String, StorageError> {
        self.check_injected_error().await?;
        let blob_id = Self::blob_id_for(&data);
        self.blobs.lock().await.insert(blob_id.clone(), data);
        Ok(blob_id)
    }

    async fn read(&self, blob_id: &str) -> Result<Vec<u8>, StorageError> {
        self.check_injected_error().await?;
        if blob_id.is_empty() {
            return Err(StorageError::InvalidBlobId("empty blob id".to_string()));
        }
        self.blobs
            .lock()
            .await
            .get(blob_id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(blob_id.to_string()))
    }

    async fn inject_error(&self, error: StorageError) {
        *self.injected_error.lock().await = Some(error);
    }
}
