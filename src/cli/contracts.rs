// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use crate::api::{CleanExpiredKeysRequest, EpochOneApi, HttpApiClient};
use crate::config::DEFAULT_API_URL;

/// Arguments for clean-expired-keys command
#[derive(Args, Debug)]
pub struct CleanExpiredKeysArgs {
    /// Allowlist object ID
    #[arg(long)]
    pub allowlist_id: String,

    /// Capability object ID for the allowlist
    #[arg(long)]
    pub cap_id: String,

    /// EpochOne API base URL
    #[arg(long, env = "EPOCHONE_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,
}

/// Arguments for download command
#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Contract ID
    #[arg(long)]
    pub contract_id: String,

    /// Output file (defaults to <contract-id>.pdf.enc)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// EpochOne API base URL
    #[arg(long, env = "EPOCHONE_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,
}

pub async fn clean_expired_keys(args: CleanExpiredKeysArgs) -> Result<()> {
    dotenv::dotenv().ok();
    let client = HttpApiClient::new(&args.api_url)?;

    println!("🧹 Cleaning expired keys on {}...", args.allowlist_id);
    let response = client
        .clean_expired_keys(&CleanExpiredKeysRequest {
            allowlist_id: Some(args.allowlist_id),
            cap_id: Some(args.cap_id),
        })
        .await?;
    println!("✅ Removed {} expired ephemeral key(s)", response.removed);
    Ok(())
}

pub async fn download(args: DownloadArgs) -> Result<()> {
    dotenv::dotenv().ok();
    let client = HttpApiClient::new(&args.api_url)?;

    let ciphertext = client.download_pdf(&args.contract_id).await?;
    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(format!("{}.pdf.enc", args.contract_id)));
    tokio::fs::write(&output, &ciphertext)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!("Wrote {} bytes of ciphertext", ciphertext.len());
    println!("📥 Saved {} ({} bytes)", output.display(), ciphertext.len());
    Ok(())
}
