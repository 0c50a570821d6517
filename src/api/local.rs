// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! `EpochOneApi` served in-process by a `SealService`

use async_trait::async_trait;
use std::sync::Arc;

use super::{
    client::{
        CLEANUP_FAILED, CONTRACT_FETCH_FAILED, CREATE_ALLOWLIST_FAILED, DOWNLOAD_FAILED,
        EXECUTE_FAILED, SPONSOR_FAILED, UPLOAD_FAILED,
    },
    types::{
        CleanExpiredKeysRequest, CleanExpiredKeysResponse, CreateAllowlistRequest,
        CreateAllowlistResponse, ExecuteRequest, ExecuteResponse, SponsorRequest, SponsorResponse,
        UploadEncryptedPdfRequest,
    },
    ApiError, EpochOneApi, SealService,
};
use crate::contract::Contract;

#[derive(Clone)]
pub struct LocalApi {
    service: Arc<SealService>,
}

impl LocalApi {
    pub fn new(service: Arc<SealService>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &Arc<SealService> {
        &self.service
    }
}

#[async_trait]
impl EpochOneApi for LocalApi {
    async fn create_allowlist(
        &self,
        request: &CreateAllowlistRequest,
    ) -> Result<CreateAllowlistResponse, ApiError> {
        self.service
            .create_allowlist(request)
            .await
            .map_err(|e| e.with_context(CREATE_ALLOWLIST_FAILED))
    }

    async fn sponsor(&self, request: &SponsorRequest) -> Result<SponsorResponse, ApiError> {
        self.service
            .sponsor(request)
            .await
            .map_err(|e| e.with_context(SPONSOR_FAILED))
    }

    async fn execute(&self, request: &ExecuteRequest) -> Result<ExecuteResponse, ApiError> {
        self.service
            .execute(request)
            .await
            .map_err(|e| e.with_context(EXECUTE_FAILED))
    }

    async fn clean_expired_keys(
        &self,
        request: &CleanExpiredKeysRequest,
    ) -> Result<CleanExpiredKeysResponse, ApiError> {
        self.service
            .clean_expired_keys(request)
            .await
            .map_err(|e| e.with_context(CLEANUP_FAILED))
    }

    async fn get_contract(&self, contract_id: &str) -> Result<Contract, ApiError> {
        self.service
            .get_contract(contract_id)
            .await
            .map_err(|e| e.with_context(CONTRACT_FETCH_FAILED))
    }

    async fn upload_encrypted_pdf(
        &self,
        contract_id: &str,
        request: &UploadEncryptedPdfRequest,
    ) -> Result<Contract, ApiError> {
        self.service
            .upload_encrypted_pdf(contract_id, request)
            .await
            .map_err(|e| e.with_context(UPLOAD_FAILED))
    }

    async fn download_pdf(&self, contract_id: &str) -> Result<Vec<u8>, ApiError> {
        self.service
            .download_pdf(contract_id)
            .await
            .map(|pdf| pdf.data)
            .map_err(|e| e.with_context(DOWNLOAD_FAILED))
    }
}
