// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use crate::common::{TestWorld, PDF};
use epochone_seal::{
    chain::ChainClient,
    workflow::{hash_signer_identifier, EncryptionOrchestrator, WorkflowError},
    EpochOneApi,
};

#[tokio::test]
async fn test_allowlist_holds_own_address_and_hashed_emails() {
    let world = TestWorld::new();
    let alice = world.session("alice");
    let own = alice.contract_address("contract-1").unwrap();
    let orchestrator = EncryptionOrchestrator::new(world.context(alice));

    let document = orchestrator
        .encrypt_document("contract-1", PDF, &["Carol@Example.com".to_string()])
        .await
        .unwrap();

    let allowlist = world.chain.get_allowlist(document.allowlist_id).await.unwrap();
    assert_eq!(allowlist.members.len(), 2);
    assert!(allowlist.members.contains(&own));
    assert!(allowlist
        .members
        .contains(&hash_signer_identifier("carol@example.com").unwrap()));
    assert_eq!(allowlist.cap_id, document.cap_id);

    // Document identity lives in the allowlist's namespace
    let document_id = hex::decode(&document.document_id).unwrap();
    assert!(document_id.starts_with(document.allowlist_id.as_bytes()));
    assert_ne!(document.encrypted_data, PDF);
}

#[tokio::test]
async fn test_each_call_creates_a_new_allowlist() {
    let world = TestWorld::new();
    let orchestrator = EncryptionOrchestrator::new(world.context(world.session("alice")));

    let first = orchestrator.encrypt_document("contract-1", PDF, &[]).await.unwrap();
    let second = orchestrator.encrypt_document("contract-1", PDF, &[]).await.unwrap();

    assert_ne!(first.allowlist_id, second.allowlist_id);
    assert_ne!(first.document_id, second.document_id);
    // The earlier allowlist is left behind
    world.chain.get_allowlist(first.allowlist_id).await.unwrap();
}

#[tokio::test]
async fn test_encrypt_and_upload_attaches_metadata() {
    let world = TestWorld::new();
    let orchestrator = EncryptionOrchestrator::new(world.context(world.session("alice")));

    let (document, contract) = orchestrator
        .encrypt_and_upload("contract-1", PDF, "lease.pdf", &[])
        .await
        .unwrap();

    assert_eq!(contract.encryption_meta(), Some(document.encryption_meta()));
    assert_eq!(contract.file_name.as_deref(), Some("lease.pdf"));
    assert!(contract.blob_id.is_some());

    let stored = world.api.download_pdf("contract-1").await.unwrap();
    assert_eq!(stored, document.encrypted_data);
}

#[tokio::test]
async fn test_invalid_signer_aborts_before_allowlist() {
    let world = TestWorld::new();
    let orchestrator = EncryptionOrchestrator::new(world.context(world.session("alice")));

    let err = orchestrator
        .encrypt_document("contract-1", PDF, &["not a signer".to_string()])
        .await
        .unwrap_err();

    assert!(matches!(err, WorkflowError::InvalidSigner(_)));
    assert!(world.service.contracts().is_empty().await);
}
