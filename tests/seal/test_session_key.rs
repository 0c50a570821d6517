// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use epochone_seal::{
    chain::SuiAddress,
    crypto::SuiKeypair,
    seal::{SealError, SessionKey, MAX_TTL_MIN},
};

const CREATED: u64 = 1_700_000_000_000;

#[test]
fn test_ttl_bounds() {
    let user = SuiAddress([1u8; 32]);
    let package = SuiAddress([2u8; 32]);

    assert_eq!(SessionKey::new(user, package, 0, CREATED).unwrap_err(), SealError::InvalidTtl(0));
    assert_eq!(
        SessionKey::new(user, package, MAX_TTL_MIN + 1, CREATED).unwrap_err(),
        SealError::InvalidTtl(31)
    );
    assert!(SessionKey::new(user, package, MAX_TTL_MIN, CREATED).is_ok());
}

#[test]
fn test_expiry_edges() {
    let key = SessionKey::new(SuiAddress([1u8; 32]), SuiAddress([2u8; 32]), 30, CREATED).unwrap();
    let expires = CREATED + 30 * 60_000;

    assert_eq!(key.expires_at_ms(), expires);
    assert!(!key.is_expired_at(expires - 1));
    assert!(key.is_expired_at(expires));
    assert!(key.is_expired_at(CREATED + 31 * 60_000));
}

#[test]
fn test_personal_message_names_package_and_ttl() {
    let package = SuiAddress([2u8; 32]);
    let key = SessionKey::new(SuiAddress([1u8; 32]), package, 10, CREATED).unwrap();
    let message = key.personal_message();

    assert!(message.starts_with(&format!("Accessing keys of package {} for 10 mins from ", package)));
    assert!(message.contains("session key "));
}

#[test]
fn test_signature_must_come_from_key_owner() {
    let owner = SuiKeypair::from_seed(&[1u8; 32]);
    let other = SuiKeypair::from_seed(&[2u8; 32]);
    let mut key = SessionKey::new(owner.address(), SuiAddress([9u8; 32]), 30, CREATED).unwrap();

    assert!(key.certificate().is_err());
    assert!(key.sign_personal_message(&other).is_err());
    assert!(!key.is_signed());

    key.sign_personal_message(&owner).unwrap();
    assert!(key.is_signed());
    assert_eq!(key.certificate().unwrap().user, owner.address());
}
