// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shared fixtures: an in-process chain, two key servers and the API
//! service, all driven by one manual clock.
#![allow(dead_code)]

use epochone_seal::{
    api::{LocalApi, SealService},
    chain::{FinalityMode, LocalChain, ObjectId, SuiAddress},
    config::{SealConfig, ServerConfig},
    crypto::blake2b256,
    seal::{KeyServer, LocalKeyServer, SealClient},
    storage::{MemoryBlobStore, MemoryPdfCache, PdfCache},
    utils::ManualClock,
    workflow::WorkflowContext,
    zklogin::{
        jwt::unsigned_jwt, Audience, IssBase64Details, JwtClaims, ZkLoginSession, ZkProof,
        ZkProofPoints,
    },
};
use std::collections::HashMap;
use std::sync::Arc;

pub const MODULE: &str = "allowlist";
pub const ISS: &str = "https://accounts.google.com";
pub const AUDIENCE: &str = "epochone-web";
pub const START_MS: u64 = 1_700_000_000_000;
pub const JWT_LIFETIME_MS: u64 = 60 * 60 * 1000;
pub const FINALITY_TIMEOUT_MS: u64 = 200;
pub const PDF: &[u8] = b"%PDF-1.7\n1 0 obj << /Type /Catalog >> endobj\n%%EOF";

pub struct TestWorld {
    pub clock: ManualClock,
    pub chain: Arc<LocalChain>,
    pub key_servers: Vec<Arc<dyn KeyServer>>,
    pub blobs: Arc<MemoryBlobStore>,
    pub service: Arc<SealService>,
    pub api: Arc<LocalApi>,
    pub package_id: ObjectId,
}

impl TestWorld {
    pub fn new() -> Self {
        Self::with_finality(FinalityMode::Immediate)
    }

    pub fn with_finality(finality: FinalityMode) -> Self {
        let clock = ManualClock::new(START_MS);
        let package_id = SuiAddress([0x5e; 32]);
        let chain = Arc::new(
            LocalChain::new(package_id, MODULE, Arc::new(clock.clone())).with_finality(finality),
        );

        let key_servers: Vec<Arc<dyn KeyServer>> = ["key-server-1", "key-server-2"]
            .iter()
            .map(|name| {
                let server = LocalKeyServer::new(
                    name,
                    name.as_bytes(),
                    package_id,
                    chain.clone(),
                    Arc::new(clock.clone()),
                )
                .expect("key server");
                Arc::new(server) as Arc<dyn KeyServer>
            })
            .collect();

        let server_config = ServerConfig {
            package_id,
            module_name: MODULE.to_string(),
            admin_private_key: format!("0x{}", hex::encode([0x42u8; 32])),
            gas_budget: 10_000_000,
            port: 0,
        };
        let blobs = Arc::new(MemoryBlobStore::new());
        let service = Arc::new(
            SealService::new(&server_config, chain.clone(), blobs.clone(), Arc::new(clock.clone()))
                .expect("service"),
        );
        let api = Arc::new(LocalApi::new(service.clone()));

        Self {
            clock,
            chain,
            key_servers,
            blobs,
            service,
            api,
            package_id,
        }
    }

    pub fn seal_config(&self) -> SealConfig {
        SealConfig {
            package_id: self.package_id,
            module_name: MODULE.to_string(),
            key_server_ids: Vec::new(),
            threshold: 2,
            session_ttl_min: 30,
            finality_timeout_ms: FINALITY_TIMEOUT_MS,
            api_url: "http://localhost:3000".to_string(),
        }
    }

    pub fn seal_client(&self) -> SealClient {
        SealClient::new(self.key_servers.clone(), Arc::new(self.clock.clone()))
    }

    pub fn jwt_expiry_ms(&self) -> u64 {
        START_MS + JWT_LIFETIME_MS
    }

    /// Session for `user` whose JWT expires one hour after `START_MS`
    pub fn session(&self, user: &str) -> ZkLoginSession {
        session_with_exp(user, Some((START_MS + JWT_LIFETIME_MS) / 1000))
    }

    pub fn context(&self, session: ZkLoginSession) -> Arc<WorkflowContext> {
        self.context_with_cache(session, Arc::new(MemoryPdfCache::new(16)))
    }

    pub fn context_with_cache(
        &self,
        session: ZkLoginSession,
        cache: Arc<dyn PdfCache>,
    ) -> Arc<WorkflowContext> {
        Arc::new(WorkflowContext {
            api: self.api.clone(),
            chain: self.chain.clone(),
            seal: Arc::new(self.seal_client()),
            cache,
            session: Arc::new(session),
            config: self.seal_config(),
            clock: Arc::new(self.clock.clone()),
        })
    }
}

pub fn session_with_exp(user: &str, exp_secs: Option<u64>) -> ZkLoginSession {
    let jwt = unsigned_jwt(&JwtClaims {
        iss: ISS.to_string(),
        sub: user.to_string(),
        aud: Audience::Single(AUDIENCE.to_string()),
        exp: exp_secs,
        iat: Some(START_MS / 1000),
        nonce: None,
    })
    .expect("jwt");

    ZkLoginSession {
        jwt,
        ephemeral_private_key: format!("0x{}", hex::encode(blake2b256(user.as_bytes()))),
        zk_proof: ZkProof {
            proof_points: ZkProofPoints {
                a: vec!["1".to_string()],
                b: vec![vec!["2".to_string()]],
                c: vec!["3".to_string()],
            },
            iss_base64_details: IssBase64Details::from_iss(ISS),
            header_base64: "eyJhbGciOiJSUzI1NiJ9".to_string(),
        },
        max_epoch: 10,
        user_salt: format!("salt-{}", user),
        contract_wallets: HashMap::new(),
    }
}
