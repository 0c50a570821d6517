// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod blob_store;
pub mod pdf_cache;
pub mod walrus_client;

pub use blob_store::{BlobStore, MemoryBlobStore, StorageError};
pub use pdf_cache::{CachedPdf, MemoryPdfCache, PdfCache, DEFAULT_CACHE_CAPACITY};
pub use walrus_client::WalrusClient;
