// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod chain;
pub mod cli;
pub mod config;
pub mod contract;
pub mod crypto;
pub mod seal;
pub mod storage;
pub mod utils;
pub mod workflow;
pub mod zklogin;

pub use api::{create_app, EpochOneApi, HttpApiClient, LocalApi, SealService};
pub use chain::{ChainClient, LocalChain, ObjectId, SuiAddress};
pub use config::{AppConfig, SealConfig, ServerConfig, WalrusConfig};
pub use contract::{Contract, EncryptionMeta};
pub use seal::{SealClient, SessionKey};
pub use workflow::{
    AuthorizedSession, DecryptedDocument, DecryptionOrchestrator, DecryptionStep, EncryptionOrchestrator,
    EphemeralAuthorizer, WorkflowContext, WorkflowError,
};
pub use zklogin::ZkLoginSession;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
