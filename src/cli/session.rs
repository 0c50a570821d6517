// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use clap::Args;
use serde_json::Value;
use std::path::PathBuf;

use crate::zklogin::{session::SESSION_STORAGE_KEY, ZkLoginSession};

/// Arguments for inspect-session command
#[derive(Args, Debug)]
pub struct InspectSessionArgs {
    /// Session JSON file, either the bare session or an object holding it
    /// under `epochone_session`
    #[arg(long)]
    pub file: PathBuf,

    /// Contract IDs to derive addresses for
    #[arg(long, value_delimiter = ',')]
    pub contracts: Vec<String>,
}

/// Accepts the session itself or a storage dump keyed by `epochone_session`,
/// where the value may be the session object or its JSON string
pub fn load_session(raw: &str) -> Result<ZkLoginSession> {
    let value: Value = serde_json::from_str(raw).context("session file is not JSON")?;
    let session_value = match value.get(SESSION_STORAGE_KEY) {
        Some(Value::String(inner)) => serde_json::from_str(inner)
            .with_context(|| format!("'{}' is not valid JSON", SESSION_STORAGE_KEY))?,
        Some(inner) => inner.clone(),
        None => value,
    };
    Ok(serde_json::from_value(session_value).context("not a zkLogin session")?)
}

pub async fn inspect_session(args: InspectSessionArgs) -> Result<()> {
    let raw = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let session = load_session(&raw)?;
    let claims = session.claims()?;

    println!("🔐 zkLogin session");
    println!("   Issuer:      {}", claims.iss);
    println!("   Max epoch:   {}", session.max_epoch);
    match session.jwt_expiry_ms() {
        Some(expiry) => match Utc.timestamp_millis_opt(expiry as i64).single() {
            Some(at) => println!("   JWT expires: {}", at.to_rfc3339()),
            None => println!("   JWT expires: {} ms", expiry),
        },
        None => println!("   JWT expires: unknown"),
    }
    println!("   Ephemeral:   {}", session.ephemeral_keypair()?.address());

    let mut contract_ids: Vec<String> = session.contract_wallets.keys().cloned().collect();
    for id in args.contracts {
        if !contract_ids.contains(&id) {
            contract_ids.push(id);
        }
    }
    contract_ids.sort();

    if contract_ids.is_empty() {
        println!("   No contract wallets");
    }
    for id in contract_ids {
        let wallet = session.contract_wallet(&id)?;
        let source = if session.contract_wallets.contains_key(&id) {
            "stored"
        } else {
            "derived"
        };
        println!("   📄 {} → {} ({})", id, wallet.address, source);
    }
    Ok(())
}
