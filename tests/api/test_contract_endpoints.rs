// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Allowlist creation, contract lookup and ciphertext upload/download

use crate::common::TestWorld;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use epochone_seal::{
    api::{create_app, AppState},
    chain::{ChainClient, ObjectId, SuiAddress},
};
use serde_json::{json, Value};
use std::str::FromStr;
use tower::util::ServiceExt;

fn app(world: &TestWorld) -> Router {
    create_app(AppState::new(world.service.clone()))
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let world = TestWorld::new();
    let response = send(app(&world), Method::GET, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}

#[tokio::test]
async fn test_create_allowlist_records_contract() {
    let world = TestWorld::new();
    let member = SuiAddress([1u8; 32]);

    let response = send(
        app(&world),
        Method::POST,
        "/api/seal/create-allowlist",
        Some(json!({ "contractId": "c1", "signerAddresses": [member.to_string()] })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let created = json_body(response).await;
    let allowlist_id = ObjectId::from_str(created["allowlistId"].as_str().unwrap()).unwrap();

    let allowlist = world.chain.get_allowlist(allowlist_id).await.unwrap();
    assert!(allowlist.members.contains(&member));

    let response = send(app(&world), Method::GET, "/api/contracts/c1", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let contract = json_body(response).await;
    assert_eq!(contract["sealAllowlistId"], created["allowlistId"]);
    assert_eq!(contract["sealCapId"], created["capId"]);
}

#[tokio::test]
async fn test_create_allowlist_requires_signers() {
    let world = TestWorld::new();
    let response = send(
        app(&world),
        Method::POST,
        "/api/seal/create-allowlist",
        Some(json!({ "contractId": "c1", "signerAddresses": [] })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Missing required parameters");
}

#[tokio::test]
async fn test_unknown_contract_is_404() {
    let world = TestWorld::new();
    let response = send(app(&world), Method::GET, "/api/contracts/nope", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(app(&world), Method::GET, "/api/contracts/download-pdf/nope", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_then_download_inline() {
    let world = TestWorld::new();
    let allowlist = SuiAddress([2u8; 32]);
    let ciphertext = b"opaque ciphertext bytes".to_vec();

    let response = send(
        app(&world),
        Method::POST,
        "/api/contracts/c1/encrypted-pdf",
        Some(json!({
            "encryptedData": B64.encode(&ciphertext),
            "fileName": "lease.pdf",
            "allowlistId": allowlist.to_string(),
            "documentId": format!("0x{}0102030405", hex::encode(allowlist.as_bytes())),
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let contract = json_body(response).await;
    assert_eq!(contract["isEncrypted"], true);
    assert_eq!(contract["sealAllowlistId"], allowlist.to_string());
    // Stored without the 0x prefix
    assert!(!contract["sealDocumentId"].as_str().unwrap().starts_with("0x"));
    assert_eq!(world.blobs.len().await, 1);

    let response = send(
        app(&world),
        Method::GET,
        "/api/contracts/download-pdf/c1?view=inline",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/octet-stream");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "inline; filename=\"lease.pdf\""
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(bytes.to_vec(), ciphertext);
}

#[tokio::test]
async fn test_upload_rejects_bad_base64() {
    let world = TestWorld::new();
    let response = send(
        app(&world),
        Method::POST,
        "/api/contracts/c1/encrypted-pdf",
        Some(json!({
            "encryptedData": "***",
            "fileName": "lease.pdf",
            "allowlistId": SuiAddress([2u8; 32]).to_string(),
            "documentId": "aa",
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
