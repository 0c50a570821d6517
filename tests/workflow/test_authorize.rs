// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use crate::common::{session_with_exp, TestWorld, PDF, START_MS};
use epochone_seal::{
    chain::{ChainClient, ChainError, FinalityMode},
    workflow::{EncryptionOrchestrator, EphemeralAuthorizer, WorkflowError, FALLBACK_JWT_VALIDITY_MS},
    zklogin::{ZkLoginError, ZkLoginSession},
};

async fn encrypted(world: &TestWorld, session: &ZkLoginSession) -> (epochone_seal::chain::ObjectId, Vec<u8>) {
    let document = EncryptionOrchestrator::new(world.context(session.clone()))
        .encrypt_document("contract-1", PDF, &[])
        .await
        .unwrap();
    (document.allowlist_id, hex::decode(document.document_id).unwrap())
}

#[tokio::test]
async fn test_authorization_registers_ephemeral_key() {
    let world = TestWorld::new();
    let alice = world.session("alice");
    let (allowlist_id, document_id) = encrypted(&world, &alice).await;
    let ephemeral = alice.ephemeral_keypair().unwrap().address();

    world.clock.advance_ms(1_000);
    let authorizer = EphemeralAuthorizer::new(world.context(alice.clone()));
    let session = authorizer
        .authorize("contract-1", allowlist_id, &document_id, None)
        .await
        .unwrap();
    let session_key = &session.session_key;

    assert_eq!(session.allowlist_id, allowlist_id);
    assert!(session_key.is_signed());
    assert_eq!(session_key.address(), ephemeral);
    assert_eq!(session_key.ttl_min(), 30);
    assert_eq!(session_key.creation_time_ms(), START_MS + 1_000);

    let allowlist = world.chain.get_allowlist(allowlist_id).await.unwrap();
    let entry = &allowlist.ephemeral[&ephemeral];
    // Validity ends with the JWT
    assert_eq!(entry.expires_at_ms, world.jwt_expiry_ms());
    assert_eq!(entry.authorized_by, alice.contract_address("contract-1").unwrap());
    assert_eq!(entry.document_id, document_id);
}

#[tokio::test]
async fn test_missing_exp_falls_back_to_a_day() {
    let world = TestWorld::new();
    let session = session_with_exp("alice", None);
    let (allowlist_id, document_id) = encrypted(&world, &session).await;

    EphemeralAuthorizer::new(world.context(session.clone()))
        .authorize("contract-1", allowlist_id, &document_id, None)
        .await
        .unwrap();

    let ephemeral = session.ephemeral_keypair().unwrap().address();
    let allowlist = world.chain.get_allowlist(allowlist_id).await.unwrap();
    assert_eq!(allowlist.ephemeral[&ephemeral].expires_at_ms, START_MS + FALLBACK_JWT_VALIDITY_MS);
}

#[tokio::test]
async fn test_expired_jwt_aborts_without_chain_calls() {
    let world = TestWorld::new();
    let fresh = world.session("alice");
    let (allowlist_id, document_id) = encrypted(&world, &fresh).await;
    let stale = session_with_exp("alice", Some(START_MS / 1000 - 60));
    let before = world.chain.transaction_count().await;

    let err = EphemeralAuthorizer::new(world.context(stale))
        .authorize("contract-1", allowlist_id, &document_id, None)
        .await
        .unwrap_err();

    assert!(matches!(err, WorkflowError::ZkLogin(ZkLoginError::ExpiredJwt { .. })));
    assert_eq!(world.chain.transaction_count().await, before);
}

#[tokio::test]
async fn test_repeat_authorization_refreshes_entry() {
    let world = TestWorld::new();
    let alice = world.session("alice");
    let (allowlist_id, document_id) = encrypted(&world, &alice).await;
    let authorizer = EphemeralAuthorizer::new(world.context(alice.clone()));

    authorizer.authorize("contract-1", allowlist_id, &document_id, None).await.unwrap();
    world.clock.advance_minutes(5);
    authorizer.authorize("contract-1", allowlist_id, &document_id, None).await.unwrap();

    let allowlist = world.chain.get_allowlist(allowlist_id).await.unwrap();
    assert_eq!(allowlist.ephemeral.len(), 1);
}

#[tokio::test]
async fn test_finality_timeout_surfaces() {
    let world = TestWorld::with_finality(FinalityMode::Manual);
    let alice = world.session("alice");
    let (allowlist_id, document_id) = encrypted(&world, &alice).await;

    let err = EphemeralAuthorizer::new(world.context(alice))
        .authorize("contract-1", allowlist_id, &document_id, None)
        .await
        .unwrap_err();

    assert!(matches!(err, WorkflowError::Chain(ChainError::FinalityTimeout { .. })));
}
