// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use crate::common::{TestWorld, PDF};
use epochone_seal::{
    api::CreateAllowlistRequest,
    chain::ChainClient,
    contract::Contract,
    seal::{KeyServerError, SealError},
    storage::{CachedPdf, MemoryPdfCache, PdfCache, StorageError},
    workflow::{
        DecryptionOrchestrator, DecryptionStep, EncryptionOrchestrator, ProgressCallback,
        WorkflowError,
    },
    utils::Clock,
    zklogin::ZkLoginSession,
    EpochOneApi,
};
use std::sync::{Arc, Mutex};

const CONTRACT: &str = "contract-1";

/// Alice encrypts and uploads with Bob as co-signer
async fn shared_with_bob(world: &TestWorld) -> (ZkLoginSession, Contract) {
    let bob = world.session("bob");
    let bob_address = bob.contract_address(CONTRACT).unwrap();
    let (_, contract) = EncryptionOrchestrator::new(world.context(world.session("alice")))
        .encrypt_and_upload(CONTRACT, PDF, "lease.pdf", &[bob_address.to_string()])
        .await
        .unwrap();
    (bob, contract)
}

fn recorder() -> (ProgressCallback, Arc<Mutex<Vec<DecryptionStep>>>) {
    let steps = Arc::new(Mutex::new(Vec::new()));
    let sink = steps.clone();
    let callback: ProgressCallback = Arc::new(move |step| sink.lock().unwrap().push(step));
    (callback, steps)
}

#[tokio::test]
async fn test_cosigner_decrypts_on_slow_path() {
    let world = TestWorld::new();
    let (bob, contract) = shared_with_bob(&world).await;
    let orchestrator = DecryptionOrchestrator::new(world.context(bob));
    let (progress, steps) = recorder();

    let result = orchestrator.decrypt(&contract, None, Some(progress)).await.unwrap();

    assert_eq!(result.data, PDF);
    assert!(!result.session_reused);
    assert!(!result.ciphertext_from_cache);
    assert_eq!(
        *steps.lock().unwrap(),
        vec![
            DecryptionStep::LoadingMetadata,
            DecryptionStep::Downloading,
            DecryptionStep::Authorizing,
            DecryptionStep::Signing,
            DecryptionStep::FetchingKeys,
            DecryptionStep::Decrypting,
            DecryptionStep::Complete,
        ]
    );
}

#[tokio::test]
async fn test_cached_session_key_takes_fast_path() {
    let world = TestWorld::new();
    let (bob, contract) = shared_with_bob(&world).await;
    let orchestrator = DecryptionOrchestrator::new(world.context(bob));

    let first = orchestrator.decrypt(&contract, None, None).await.unwrap();
    let transactions = world.chain.transaction_count().await;

    world.clock.advance_minutes(10);
    let (progress, steps) = recorder();
    let second = orchestrator
        .decrypt(&contract, Some(first.session), Some(progress))
        .await
        .unwrap();

    assert_eq!(second.data, PDF);
    assert!(second.session_reused);
    assert!(second.ciphertext_from_cache);
    assert_eq!(world.chain.transaction_count().await, transactions);
    let steps = steps.lock().unwrap();
    assert!(!steps.contains(&DecryptionStep::Authorizing));
    assert!(!steps.contains(&DecryptionStep::Signing));
}

#[tokio::test]
async fn test_session_key_ttl_boundary() {
    let world = TestWorld::new();
    let (bob, contract) = shared_with_bob(&world).await;
    let orchestrator = DecryptionOrchestrator::new(world.context(bob));

    let first = orchestrator.decrypt(&contract, None, None).await.unwrap();
    let key = first.session;
    let expires_at = key.session_key.expires_at_ms();

    world.clock.set(expires_at - 1);
    let inside = orchestrator.decrypt(&contract, Some(key.clone()), None).await.unwrap();
    assert!(inside.session_reused);

    world.clock.set(expires_at + 1);
    let outside = orchestrator.decrypt(&contract, Some(key), None).await.unwrap();
    assert!(!outside.session_reused);
    assert_eq!(outside.data, PDF);
}

#[tokio::test]
async fn test_expired_session_key_reauthorizes() {
    let world = TestWorld::new();
    let (bob, contract) = shared_with_bob(&world).await;
    let orchestrator = DecryptionOrchestrator::new(world.context(bob));

    let first = orchestrator.decrypt(&contract, None, None).await.unwrap();
    world.clock.advance_minutes(31);
    assert!(first.session.session_key.is_expired_at(world.clock.now_ms()));

    let (progress, steps) = recorder();
    let second = orchestrator
        .decrypt(&contract, Some(first.session), Some(progress))
        .await
        .unwrap();
    assert!(!second.session_reused);
    assert!(steps.lock().unwrap().contains(&DecryptionStep::Authorizing));
}

#[tokio::test]
async fn test_session_from_another_contract_reauthorizes() {
    let world = TestWorld::new();
    let (bob, first_contract) = shared_with_bob(&world).await;
    let second_contract = {
        let bob_address = bob.contract_address("contract-2").unwrap();
        let (_, contract) = EncryptionOrchestrator::new(world.context(world.session("alice")))
            .encrypt_and_upload("contract-2", PDF, "annex.pdf", &[bob_address.to_string()])
            .await
            .unwrap();
        contract
    };
    let orchestrator = DecryptionOrchestrator::new(world.context(bob));

    let first = orchestrator.decrypt(&first_contract, None, None).await.unwrap();
    world.clock.advance_minutes(1);
    let (progress, steps) = recorder();
    let second = orchestrator
        .decrypt(&second_contract, Some(first.session.clone()), Some(progress))
        .await
        .unwrap();

    assert_eq!(second.data, PDF);
    assert!(!second.session_reused);
    assert!(steps.lock().unwrap().contains(&DecryptionStep::Authorizing));
    let second_allowlist = second_contract.encryption_meta().unwrap().allowlist_id;
    assert_eq!(second.session.allowlist_id, second_allowlist);
    assert_ne!(first.session.allowlist_id, second_allowlist);
}

#[tokio::test]
async fn test_unlisted_user_is_denied_after_authorizing() {
    let world = TestWorld::new();
    let (_, contract) = shared_with_bob(&world).await;
    let mallory = world.session("mallory");
    let ephemeral = mallory.ephemeral_keypair().unwrap().address();
    let orchestrator = DecryptionOrchestrator::new(world.context(mallory));

    let err = orchestrator.decrypt(&contract, None, None).await.unwrap_err();

    assert!(matches!(
        err,
        WorkflowError::Seal(SealError::KeyServer(KeyServerError::NoAccess(_)))
    ));
    // The authorization itself went through
    let meta = contract.encryption_meta().unwrap();
    let allowlist = world.chain.get_allowlist(meta.allowlist_id).await.unwrap();
    assert!(allowlist.ephemeral.contains_key(&ephemeral));
}

#[tokio::test]
async fn test_metadata_fetched_once_when_missing_locally() {
    let world = TestWorld::new();
    let (bob, _) = shared_with_bob(&world).await;
    let orchestrator = DecryptionOrchestrator::new(world.context(bob));

    // Bare record: metadata comes from GET /api/contracts/{id}
    let result = orchestrator.decrypt(&Contract::new(CONTRACT), None, None).await.unwrap();
    assert_eq!(result.data, PDF);
}

#[tokio::test]
async fn test_metadata_not_found() {
    let world = TestWorld::new();
    let alice = world.session("alice");
    world
        .api
        .create_allowlist(&CreateAllowlistRequest {
            contract_id: Some("plain".to_string()),
            signer_addresses: Some(vec![alice.contract_address("plain").unwrap().to_string()]),
        })
        .await
        .unwrap();
    let orchestrator = DecryptionOrchestrator::new(world.context(alice));

    let err = orchestrator
        .decrypt(&Contract::new("plain"), None, None)
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("Encryption metadata not found"));
}

#[tokio::test]
async fn test_stale_cache_entry_is_bypassed() {
    let world = TestWorld::new();
    let (bob, contract) = shared_with_bob(&world).await;
    let cache = Arc::new(MemoryPdfCache::new(4));
    let mut stale_meta = contract.encryption_meta().unwrap();
    stale_meta.document_id = "00".repeat(37);
    cache
        .put(
            CONTRACT,
            CachedPdf {
                encrypted_data: b"old ciphertext".to_vec(),
                file_name: "lease.pdf".to_string(),
                encryption_meta: stale_meta,
            },
        )
        .await
        .unwrap();
    let orchestrator = DecryptionOrchestrator::new(world.context_with_cache(bob, cache.clone()));

    let result = orchestrator.decrypt(&contract, None, None).await.unwrap();

    assert!(!result.ciphertext_from_cache);
    assert_eq!(result.data, PDF);
    let refreshed = cache.get(CONTRACT).await.unwrap().unwrap();
    assert!(refreshed.matches(&contract.encryption_meta().unwrap()));
}

#[tokio::test]
async fn test_cache_failure_is_not_fatal() {
    let world = TestWorld::new();
    let (bob, contract) = shared_with_bob(&world).await;
    let cache = Arc::new(MemoryPdfCache::new(4));
    cache
        .inject_error(StorageError::CacheError("disk full".to_string()))
        .await;
    let orchestrator = DecryptionOrchestrator::new(world.context_with_cache(bob, cache));

    let result = orchestrator.decrypt(&contract, None, None).await.unwrap();
    assert_eq!(result.data, PDF);
    assert!(!result.ciphertext_from_cache);
}

#[tokio::test]
async fn test_download_failure_propagates() {
    let world = TestWorld::new();
    let bob = world.session("bob");
    let orchestrator = DecryptionOrchestrator::new(world.context(bob));

    let mut contract = Contract::new("missing");
    contract.seal_allowlist_id = Some(format!("0x{}", "11".repeat(32)));
    contract.seal_document_id = Some("11".repeat(37));

    let err = orchestrator.decrypt(&contract, None, None).await.unwrap_err();
    assert!(err.to_string().starts_with("Download failed: 404"));
}
