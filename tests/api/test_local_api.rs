// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! In-process client: errors carry the same context strings as the HTTP one

use crate::common::TestWorld;
use epochone_seal::api::{ApiError, CreateAllowlistRequest, EpochOneApi, ExecuteRequest, SponsorRequest};
use epochone_seal::chain::SuiAddress;
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn test_sponsor_error_has_context_and_status() {
    let world = TestWorld::new();
    let err = assert_err!(world.api.sponsor(&SponsorRequest::default()).await);

    assert!(matches!(err, ApiError::Upstream { status: 400, .. }));
    assert_eq!(err.to_string(), "Sponsorship failed: 400 Missing required parameters");
}

#[tokio::test]
async fn test_execute_error_context() {
    let world = TestWorld::new();
    let err = assert_err!(
        world
            .api
            .execute(&ExecuteRequest {
                sponsored_tx_bytes: Some("!!".to_string()),
                zk_login_signature: Some("sig".to_string()),
            })
            .await
    );
    assert!(err.to_string().starts_with("Transaction execution failed: 400"));
}

#[tokio::test]
async fn test_contract_fetch_error_context() {
    let world = TestWorld::new();
    let err = assert_err!(world.api.get_contract("ghost").await);
    assert_eq!(err.status_code(), 404);
    assert!(err.to_string().starts_with("Contract fetch failed: 404"));
}

#[tokio::test]
async fn test_create_allowlist_then_fetch_contract() {
    let world = TestWorld::new();
    let member = SuiAddress([4u8; 32]);
    let created = assert_ok!(
        world
            .api
            .create_allowlist(&CreateAllowlistRequest {
                contract_id: Some("c9".to_string()),
                signer_addresses: Some(vec![member.to_string()]),
            })
            .await
    );

    let contract = assert_ok!(world.api.get_contract("c9").await);
    assert_eq!(contract.seal_allowlist_id, Some(created.allowlist_id.to_string()));
    assert_eq!(contract.authorized_users, vec![member.to_string()]);
    // No document yet, so no usable encryption metadata
    assert!(contract.encryption_meta().is_none());
}
