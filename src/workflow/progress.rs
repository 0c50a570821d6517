// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Named stages reported while a document is being decrypted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecryptionStep {
    LoadingMetadata,
    Downloading,
    Authorizing,
    Signing,
    FetchingKeys,
    Decrypting,
    Complete,
}

impl DecryptionStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecryptionStep::LoadingMetadata => "loading-metadata",
            DecryptionStep::Downloading => "downloading",
            DecryptionStep::Authorizing => "authorizing",
            DecryptionStep::Signing => "signing",
            DecryptionStep::FetchingKeys => "fetching-keys",
            DecryptionStep::Decrypting => "decrypting",
            DecryptionStep::Complete => "complete",
        }
    }
}

impl fmt::Display for DecryptionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type ProgressCallback = Arc<dyn Fn(DecryptionStep) + Send + Sync>;

pub(crate) fn report(progress: Option<&ProgressCallback>, step: DecryptionStep) {
    if let Some(callback) = progress {
        callback(step);
    }
}
