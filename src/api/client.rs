// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Client view of the EpochOne API
//!
//! Failures surface as `ApiError::Upstream` whose display reads
//! `"{context}: {status} {message}"`, e.g.
//! `Sponsorship failed: 400 Missing required parameters`.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use super::{
    types::{
        CleanExpiredKeysRequest, CleanExpiredKeysResponse, CreateAllowlistRequest,
        CreateAllowlistResponse, ExecuteRequest, ExecuteResponse, SponsorRequest, SponsorResponse,
        UploadEncryptedPdfRequest,
    },
    ApiError, ErrorBody,
};
use crate::contract::Contract;

pub const CREATE_ALLOWLIST_FAILED: &str = "Allowlist creation failed";
pub const SPONSOR_FAILED: &str = "Sponsorship failed";
pub const EXECUTE_FAILED: &str = "Transaction execution failed";
pub const CLEANUP_FAILED: &str = "Key cleanup failed";
pub const CONTRACT_FETCH_FAILED: &str = "Contract fetch failed";
pub const UPLOAD_FAILED: &str = "Upload failed";
pub const DOWNLOAD_FAILED: &str = "Download failed";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EpochOneApi: Send + Sync {
    async fn create_allowlist(
        &self,
        request: &CreateAllowlistRequest,
    ) -> Result<CreateAllowlistResponse, ApiError>;

    async fn sponsor(&self, request: &SponsorRequest) -> Result<SponsorResponse, ApiError>;

    async fn execute(&self, request: &ExecuteRequest) -> Result<ExecuteResponse, ApiError>;

    async fn clean_expired_keys(
        &self,
        request: &CleanExpiredKeysRequest,
    ) -> Result<CleanExpiredKeysResponse, ApiError>;

    async fn get_contract(&self, contract_id: &str) -> Result<Contract, ApiError>;

    async fn upload_encrypted_pdf(
        &self,
        contract_id: &str,
        request: &UploadEncryptedPdfRequest,
    ) -> Result<Contract, ApiError>;

    /// Raw ciphertext (`?view=inline`)
    async fn download_pdf(&self, contract_id: &str) -> Result<Vec<u8>, ApiError>;
}

#[derive(Clone, Debug)]
pub struct HttpApiClient {
    client: Client,
    base_url: String,
}

impl HttpApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        url::Url::parse(base_url)
            .map_err(|e| ApiError::BadRequest(format!("Invalid API URL '{}': {}", base_url, e)))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder, context: &str) -> Result<reqwest::Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("{}: {}", context, e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or_else(|_| {
                if text.is_empty() {
                    status.canonical_reason().unwrap_or("Unknown error").to_string()
                } else {
                    text
                }
            });
        Err(ApiError::Upstream {
            context: context.to_string(),
            status: status.as_u16(),
            message,
        })
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder, context: &str) -> Result<T, ApiError> {
        self.send(request, context)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Transport(format!("{}: invalid response body: {}", context, e)))
    }
}

#[async_trait]
impl EpochOneApi for HttpApiClient {
    async fn create_allowlist(
        &self,
        request: &CreateAllowlistRequest,
    ) -> Result<CreateAllowlistResponse, ApiError> {
        let builder = self.client.post(self.url("/api/seal/create-allowlist")).json(request);
        self.json(builder, CREATE_ALLOWLIST_FAILED).await
    }

    async fn sponsor(&self, request: &SponsorRequest) -> Result<SponsorResponse, ApiError> {
        let builder = self.client.post(self.url("/api/auth/sponsor")).json(request);
        self.json(builder, SPONSOR_FAILED).await
    }

    async fn execute(&self, request: &ExecuteRequest) -> Result<ExecuteResponse, ApiError> {
        let builder = self.client.post(self.url("/api/auth/execute")).json(request);
        self.json(builder, EXECUTE_FAILED).await
    }

    async fn clean_expired_keys(
        &self,
        request: &CleanExpiredKeysRequest,
    ) -> Result<CleanExpiredKeysResponse, ApiError> {
        let builder = self.client.post(self.url("/api/seal/clean-expired-keys")).json(request);
        self.json(builder, CLEANUP_FAILED).await
    }

    async fn get_contract(&self, contract_id: &str) -> Result<Contract, ApiError> {
        let builder = self.client.get(self.url(&format!("/api/contracts/{}", contract_id)));
        self.json(builder, CONTRACT_FETCH_FAILED).await
    }

    async fn upload_encrypted_pdf(
        &self,
        contract_id: &str,
        request: &UploadEncryptedPdfRequest,
    ) -> Result<Contract, ApiError> {
        let builder = self
            .client
            .post(self.url(&format!("/api/contracts/{}/encrypted-pdf", contract_id)))
            .json(request);
        self.json(builder, UPLOAD_FAILED).await
    }

    async fn download_pdf(&self, contract_id: &str) -> Result<Vec<u8>, ApiError> {
        let builder = self
            .client
            .get(self.url(&format!("/api/contracts/download-pdf/{}", contract_id)))
            .query(&[("view", "inline")]);
        let response = self.send(builder, DOWNLOAD_FAILED).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(format!("{}: {}", DOWNLOAD_FAILED, e)))?;
        debug!("Downloaded {} bytes for contract {}", bytes.len(), contract_id);
        Ok(bytes.to_vec())
    }
}
