// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod contracts;
pub mod session;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// EpochOne encrypted document CLI
#[derive(Parser, Debug)]
#[command(name = "epochone-cli")]
#[command(version)]
#[command(about = "CLI tools for EpochOne encrypted contracts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show JWT expiry and per-contract addresses of a stored session
    InspectSession(session::InspectSessionArgs),

    /// Remove expired ephemeral keys from an allowlist
    CleanExpiredKeys(contracts::CleanExpiredKeysArgs),

    /// Download a contract's ciphertext to a file
    Download(contracts::DownloadArgs),
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::InspectSession(args) => session::inspect_session(args).await,
        Commands::CleanExpiredKeys(args) => contracts::clean_expired_keys(args).await,
        Commands::Download(args) => contracts::download(args).await,
    }
}
