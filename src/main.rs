// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use epochone_seal::{
    api::{start_server, SealService},
    chain::LocalChain,
    config::{ServerConfig, WalrusConfig},
    seal::{KeyServer, LocalKeyServer},
    storage::{BlobStore, MemoryBlobStore, WalrusClient},
    utils::SystemClock,
};
use std::{env, sync::Arc};

/// Key servers run in-process next to the local chain
const LOCAL_KEY_SERVERS: [&str; 2] = ["key-server-1", "key-server-2"];

#[tokio::main]
async fn main() -> Result<()> {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    println!("🚀 Starting EpochOne Seal service v{}...\n", epochone_seal::VERSION);

    let config = ServerConfig::from_env()?;
    println!("📦 Package:       {}", config.package_id);
    println!("📜 Module:        {}", config.module_name);

    let clock = Arc::new(SystemClock);
    let chain = Arc::new(LocalChain::new(config.package_id, &config.module_name, clock.clone()));

    let blobs: Arc<dyn BlobStore> = match WalrusConfig::from_env()? {
        Some(walrus) => {
            println!("🐘 Blob store:    Walrus ({})", walrus.publisher_url);
            Arc::new(WalrusClient::new(walrus)?)
        }
        None => {
            println!("🧠 Blob store:    in-memory (set WALRUS_PUBLISHER_URL for Walrus)");
            Arc::new(MemoryBlobStore::new())
        }
    };

    for name in LOCAL_KEY_SERVERS {
        let seed = env::var(format!("{}_SEED", name.to_uppercase().replace('-', "_")))
            .unwrap_or_else(|_| name.to_string());
        let server = LocalKeyServer::new(name, seed.as_bytes(), config.package_id, chain.clone(), clock.clone())?;
        let info = server.info();
        println!("🔑 Key server:    {} {} ({})", info.name, info.object_id, info.public_key);
    }

    let service = Arc::new(SealService::new(&config, chain, blobs, clock)?);
    println!("💸 Sponsor:       {}", service.sponsor_address());

    let separator = "=".repeat(60);
    println!("\n{}", separator);
    println!("API Endpoints:");
    println!("  Health:          GET  http://localhost:{}/health", config.port);
    println!("  Allowlist:       POST http://localhost:{}/api/seal/create-allowlist", config.port);
    println!("  Sponsor:         POST http://localhost:{}/api/auth/sponsor", config.port);
    println!("  Execute:         POST http://localhost:{}/api/auth/execute", config.port);
    println!("  Clean keys:      POST http://localhost:{}/api/seal/clean-expired-keys", config.port);
    println!("  Contract:        GET  http://localhost:{}/api/contracts/:id", config.port);
    println!("  Upload:          POST http://localhost:{}/api/contracts/:id/encrypted-pdf", config.port);
    println!("  Download:        GET  http://localhost:{}/api/contracts/download-pdf/:id", config.port);
    println!("{}\n", separator);

    tokio::select! {
        result = start_server(service, config.port) => result?,
        _ = tokio::signal::ctrl_c() => println!("\n⏹️  Shutting down..."),
    }

    println!("👋 Goodbye!");
    Ok(())
}
