// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Local ciphertext cache keyed by contract ID

use async_trait::async_trait;
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::StorageError;
use crate::contract::EncryptionMeta;

pub const DEFAULT_CACHE_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedPdf {
    pub encrypted_data: Vec<u8>,
    pub file_name: String,
    pub encryption_meta: EncryptionMeta,
}

impl CachedPdf {
    /// Entries written under a different allowlist or document are stale
    pub fn matches(&self, meta: &EncryptionMeta) -> bool {
        self.encryption_meta.same_identity(meta)
    }
}

#[async_trait]
pub trait PdfCache: Send + Sync {
    async fn get(&self, contract_id: &str) -> Result<Option<CachedPdf>, StorageError>;

    /// Whole-record replacement
    async fn put(&self, contract_id: &str, pdf: CachedPdf) -> Result<(), StorageError>;

    async fn remove(&self, contract_id: &str) -> Result<(), StorageError>;

    // Mock-specific (no-op for real backends)
    async fn inject_error(&self, _error: StorageError) {}
}

pub struct MemoryPdfCache {
    entries: Arc<Mutex<LruCache<String, CachedPdf>>>,
    injected_error: Arc<Mutex<Option<StorageError>>>,
}

impl MemoryPdfCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Arc::new(Mutex::new(LruCache::new(capacity))),
            injected_error: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    async fn check_injected_error(&self) -> Result<(), StorageError> {
        if let Some(error) = self.injected_error.lock().await.take() {
            return Err(error);
        }
        Ok(())
    }
}

impl Default for MemoryPdfCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

#[async_trait]
impl PdfCache for MemoryPdfCache {
    async fn get(&self, contract_id: &str) -> Result<Option<CachedPdf>, StorageError> {
        self.check_injected_error().await?;
        Ok(self.entries.lock().await.get(contract_id).cloned())
    }

    async fn put(&self, contract_id: &str, pdf: CachedPdf) -> Result<(), StorageError> {
        self.check_injected_error().await?;
        self.entries.lock().await.put(contract_id.to_string(), pdf);
        Ok(())
    }

    async fn remove(&self, contract_id: &str) -> Result<(), StorageError> {
        self.check_injected_error().await?;
        self.entries.lock().await.pop(contract_id);
        Ok(())
    }

    async fn inject_error(&self, error: StorageError) {
        *self.injected_error.lock().await = Some(error);
    }
}
