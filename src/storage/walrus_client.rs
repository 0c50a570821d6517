// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Walrus publisher/aggregator HTTP client
//!
//! Uploads go to `PUT {publisher}/v1/blobs?epochs=N`, downloads to
//! `GET {aggregator}/v1/blobs/{blobId}`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info};

use super::{BlobStore, StorageError};
use crate::config::WalrusConfig;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlobObject {
    blob_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewlyCreated {
    blob_object: BlobObject,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlreadyCertified {
    blob_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreResponse {
    newly_created: Option<NewlyCreated>,
    already_certified: Option<AlreadyCertified>,
}

impl StoreResponse {
    fn blob_id(self) -> Option<String> {
        match (self.newly_created, self.already_certified) {
            (Some(created), _) => Some(created.blob_object.blob_id),
            (None, Some(certified)) => Some(certified.blob_id),
            (None, None) => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct WalrusClient {
    client: Client,
    config: WalrusConfig,
}

impl WalrusClient {
    pub fn new(config: WalrusConfig) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    fn store_url(&self) -> String {
        let mut url = format!(
            "{}/v1/blobs?epochs={}",
            self.config.publisher_url.trim_end_matches('/'),
            self.config.epochs
        );
        if self.config.deletable {
            url.push_str("&deletable=true");
        }
        url
    }

    fn read_url(&self, blob_id: &str) -> String {
        format!(
            "{}/v1/blobs/{}",
            self.config.aggregator_url.trim_end_matches('/'),
            blob_id
        )
    }
}

#[async_trait]
impl BlobStore for WalrusClient {
    async fn store(&self, data: Vec<u8>) -> Result<String, StorageError> {
        let size = data.len();
        let url = self.store_url();
        info!("📤 [Walrus] PUT {} ({} bytes)", url, size);

        let response = self
            .client
            .put(&url)
            .header("Content-Type", "application/octet-stream")
            .body(data)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("📤 [Walrus] ❌ upload failed: status={}, error='{}'", status, error_text);
            return Err(StorageError::ServerError(format!("{} - {}", status, error_text)));
        }

        let body: StoreResponse = response
            .json()
            .await
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        let blob_id = body.blob_id().ok_or_else(|| {
            StorageError::SerializationError("publisher response has no blobId".to_string())
        })?;

        info!("📤 [Walrus] ✅ stored blob {}", blob_id);
        Ok(blob_id)
    }

    async fn read(&self, blob_id: &str) -> Result<Vec<u8>, StorageError> {
        if blob_id.is_empty() || blob_id.contains('/') {
            return Err(StorageError::InvalidBlobId(blob_id.to_string()));
        }
        let url = self.read_url(blob_id);
        debug!("📥 [Walrus] GET {}", url);

        let response = self.client.get(&url).send().await?;
        if response.status() == 404 {
            return Err(StorageError::NotFound(blob_id.to_string()));
        }
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(StorageError::ServerError(format!("{} - {}", status, error_text)));
        }

        Ok(response.bytes().await?.to_vec())
    }
}
