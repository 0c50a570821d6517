// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Seal encryption against the in-process key servers, with access granted
//! to an allowlist member directly

use crate::common::{TestWorld, MODULE, PDF};
use epochone_seal::{
    chain::{build_seal_approve_kind, ChainClient, ObjectId},
    crypto::SuiKeypair,
    seal::{KeyServerError, SealClient, SealError, SessionKey},
    utils::{Clock, ManualClock},
};
use std::sync::Arc;

struct Fixture {
    world: TestWorld,
    member: SuiKeypair,
    allowlist_id: ObjectId,
}

async fn fixture() -> Fixture {
    let world = TestWorld::new();
    let member = SuiKeypair::from_seed(&[11u8; 32]);
    let created = world
        .chain
        .create_allowlist(member.address(), "contract-1", &[member.address()])
        .await
        .unwrap();
    Fixture {
        world,
        member,
        allowlist_id: created.allowlist_id,
    }
}

fn document_id(allowlist_id: &ObjectId) -> Vec<u8> {
    let mut id = allowlist_id.as_bytes().to_vec();
    id.extend_from_slice(&[9, 8, 7, 6, 5]);
    id
}

fn signed_key(fixture: &Fixture, signer: &SuiKeypair) -> SessionKey {
    let mut key = SessionKey::new(
        signer.address(),
        fixture.world.package_id,
        30,
        fixture.world.clock.now_ms(),
    )
    .unwrap();
    key.sign_personal_message(signer).unwrap();
    key
}

async fn round_trip(fixture: &Fixture, client: &SealClient, data: &[u8], threshold: usize) -> Result<Vec<u8>, SealError> {
    let id = document_id(&fixture.allowlist_id);
    let encrypted = fixture.world.seal_client().encrypt(fixture.world.package_id, &id, data, threshold)?;
    let kind = build_seal_approve_kind(fixture.world.package_id, MODULE, &id, fixture.allowlist_id)?;
    let key = signed_key(fixture, &fixture.member);
    let keys = client.fetch_keys(&encrypted, &kind, &key).await?;
    client.decrypt(&encrypted, &keys)
}

#[tokio::test]
async fn test_round_trip_threshold_two_of_two() {
    let fixture = fixture().await;
    let client = fixture.world.seal_client();
    assert_eq!(round_trip(&fixture, &client, PDF, 2).await.unwrap(), PDF);
}

#[tokio::test]
async fn test_round_trip_empty_document() {
    let fixture = fixture().await;
    let client = fixture.world.seal_client();
    assert!(round_trip(&fixture, &client, b"", 1).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_one_of_two_with_single_server() {
    let fixture = fixture().await;
    let first = fixture.world.key_servers[0].info().object_id;
    let client = SealClient::with_allowlist(
        fixture.world.key_servers.clone(),
        &[first],
        Arc::new(fixture.world.clock.clone()),
    )
    .unwrap();

    assert_eq!(round_trip(&fixture, &client, PDF, 1).await.unwrap(), PDF);
    // Two shares are needed but only one server is reachable
    let err = round_trip(&fixture, &client, PDF, 2).await.unwrap_err();
    assert_eq!(err, SealError::NotEnoughShares { needed: 2, got: 1 });
}

#[tokio::test]
async fn test_unknown_key_server_rejected() {
    let fixture = fixture().await;
    let result = SealClient::with_allowlist(
        fixture.world.key_servers.clone(),
        &[ObjectId::from_u8(1)],
        Arc::new(ManualClock::new(0)),
    );
    assert!(matches!(result, Err(SealError::UnknownKeyServer(_))));
}

#[tokio::test]
async fn test_non_member_denied() {
    let fixture = fixture().await;
    let outsider = SuiKeypair::from_seed(&[12u8; 32]);
    let id = document_id(&fixture.allowlist_id);
    let client = fixture.world.seal_client();
    let encrypted = client.encrypt(fixture.world.package_id, &id, PDF, 1).unwrap();
    let kind = build_seal_approve_kind(fixture.world.package_id, MODULE, &id, fixture.allowlist_id).unwrap();

    let err = client
        .fetch_keys(&encrypted, &kind, &signed_key(&fixture, &outsider))
        .await
        .unwrap_err();
    assert!(matches!(err, SealError::KeyServer(KeyServerError::NoAccess(_))));
}

#[tokio::test]
async fn test_expired_session_key_rejected_client_side() {
    let fixture = fixture().await;
    let id = document_id(&fixture.allowlist_id);
    let client = fixture.world.seal_client();
    let encrypted = client.encrypt(fixture.world.package_id, &id, PDF, 1).unwrap();
    let kind = build_seal_approve_kind(fixture.world.package_id, MODULE, &id, fixture.allowlist_id).unwrap();
    let key = signed_key(&fixture, &fixture.member);

    fixture.world.clock.advance_minutes(30);
    let err = client.fetch_keys(&encrypted, &kind, &key).await.unwrap_err();
    assert_eq!(err, SealError::ExpiredSessionKey);
}

#[tokio::test]
async fn test_tampered_ciphertext_fails() {
    let fixture = fixture().await;
    let id = document_id(&fixture.allowlist_id);
    let client = fixture.world.seal_client();
    let mut encrypted = client.encrypt(fixture.world.package_id, &id, PDF, 1).unwrap();
    let kind = build_seal_approve_kind(fixture.world.package_id, MODULE, &id, fixture.allowlist_id).unwrap();
    let keys = client
        .fetch_keys(&encrypted, &kind, &signed_key(&fixture, &fixture.member))
        .await
        .unwrap();

    let last = encrypted.len() - 1;
    encrypted[last] ^= 0x01;
    assert!(client.decrypt(&encrypted, &keys).is_err());
}
