// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod client;
pub mod contracts;
pub mod errors;
pub mod local;
pub mod server;
pub mod service;
pub mod types;

pub use client::{EpochOneApi, HttpApiClient};
pub use contracts::ContractRegistry;
pub use errors::{ApiError, ErrorBody};
pub use local::LocalApi;
pub use server::{create_app, start_server, ApiErrorResponse, AppState};
pub use service::{DownloadedPdf, SealService};
pub use types::*;

#[cfg(test)]
pub use client::MockEpochOneApi;
