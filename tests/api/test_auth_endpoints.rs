// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Sponsorship, execution and key cleanup over HTTP

use crate::common::{TestWorld, PDF, START_MS};
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use epochone_seal::{
    api::{create_app, AppState},
    chain::{ChainClient, SuiAddress},
    crypto::SuiKeypair,
    workflow::{DecryptionOrchestrator, EncryptionOrchestrator},
};
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot`

fn app(world: &TestWorld) -> Router {
    create_app(AppState::new(world.service.clone()))
}

async fn post(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn address(byte: u8) -> String {
    SuiAddress([byte; 32]).to_string()
}

#[tokio::test]
async fn test_sponsor_missing_fields_is_400_without_chain_call() {
    let world = TestWorld::new();
    let before = world.chain.transaction_count().await;

    let (status, body) = post(
        app(&world),
        "/api/auth/sponsor",
        json!({ "sender": address(1), "allowlistId": address(2) }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required parameters");
    assert_eq!(world.chain.transaction_count().await, before);
}

#[tokio::test]
async fn test_sponsor_rejects_expired_jwt() {
    let world = TestWorld::new();

    let (status, body) = post(
        app(&world),
        "/api/auth/sponsor",
        json!({
            "sender": address(1),
            "allowlistId": address(2),
            "ephemeralAddress": address(3),
            "documentId": "0202",
            "validityMs": 60_000,
            "jwtExpiryMs": START_MS - 1,
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "JWT has expired");
}

#[tokio::test]
async fn test_sponsor_returns_transaction_with_sponsor_as_gas_owner() {
    let world = TestWorld::new();

    let (status, body) = post(
        app(&world),
        "/api/auth/sponsor",
        json!({
            "sender": address(1),
            "allowlistId": address(2),
            "ephemeralAddress": address(3),
            "documentId": "0202",
            "validityMs": 120_000,
            "jwtExpiryMs": START_MS + 60_000,
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    use base64::Engine as _;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(body["sponsoredTxBytes"].as_str().unwrap())
        .unwrap();
    let tx = epochone_seal::chain::TransactionData::from_bytes(&bytes).unwrap();
    assert_eq!(tx.sender.to_string(), address(1));
    assert_eq!(tx.gas_owner, world.service.sponsor_address());
    // Validity is clamped to the JWT's remaining lifetime
    let validity: u64 = tx.kind.calls[0].pure_arg(3).unwrap();
    assert_eq!(validity, 60_000);
}

#[tokio::test]
async fn test_execute_refuses_foreign_sponsor() {
    let world = TestWorld::new();
    let user = SuiKeypair::from_seed(&[7u8; 32]);
    let tx = epochone_seal::chain::TransactionData {
        sender: user.address(),
        gas_owner: user.address(),
        gas_budget: 1_000,
        kind: epochone_seal::chain::TransactionKind { calls: vec![] },
    };
    let bytes = tx.to_bytes().unwrap();
    use base64::Engine as _;

    let (status, body) = post(
        app(&world),
        "/api/auth/execute",
        json!({
            "sponsoredTxBytes": base64::engine::general_purpose::STANDARD.encode(&bytes),
            "zkLoginSignature": user.sign_transaction(&bytes).to_base64(),
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Transaction is not sponsored by this server");
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let world = TestWorld::new();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/execute")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app(&world).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_clean_expired_keys_removes_lapsed_authorizations() {
    let world = TestWorld::new();
    let bob = world.session("bob");
    let (document, contract) = EncryptionOrchestrator::new(world.context(world.session("alice")))
        .encrypt_and_upload(
            "contract-1",
            PDF,
            "lease.pdf",
            &[bob.contract_address("contract-1").unwrap().to_string()],
        )
        .await
        .unwrap();
    DecryptionOrchestrator::new(world.context(bob))
        .decrypt(&contract, None, None)
        .await
        .unwrap();

    let request = json!({
        "allowlistId": document.allowlist_id.to_string(),
        "capId": document.cap_id.to_string(),
    });
    let (status, body) = post(app(&world), "/api/seal/clean-expired-keys", request.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], 0);

    // Past the JWT lifetime the delegation has lapsed
    world.clock.set(world.jwt_expiry_ms());
    let (status, body) = post(app(&world), "/api/seal/clean-expired-keys", request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], 1);
    let allowlist = world.chain.get_allowlist(document.allowlist_id).await.unwrap();
    assert!(allowlist.ephemeral.is_empty());
}

#[tokio::test]
async fn test_clean_expired_keys_with_wrong_cap_is_500() {
    let world = TestWorld::new();
    let (status, body) = post(
        app(&world),
        "/api/seal/create-allowlist",
        json!({ "contractId": "c1", "signerAddresses": [address(1)] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post(
        app(&world),
        "/api/seal/clean-expired-keys",
        json!({ "allowlistId": body["allowlistId"], "capId": address(9) }),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
