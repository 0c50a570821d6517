// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! In-memory contract records served by the API

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::contract::Contract;

#[derive(Clone, Default)]
pub struct ContractRegistry {
    contracts: Arc<RwLock<HashMap<String, Contract>>>,
}

impl ContractRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: &str) -> Option<Contract> {
        self.contracts.read().await.get(id).cloned()
    }

    pub async fn insert(&self, contract: Contract) {
        self.contracts
            .write()
            .await
            .insert(contract.id.clone(), contract);
    }

    /// Apply `update` to the record, creating an empty one first if needed
    pub async fn upsert<F>(&self, id: &str, update: F) -> Contract
    where
        F: FnOnce(&mut Contract),
    {
        let mut contracts = self.contracts.write().await;
        let contract = contracts
            .entry(id.to_string())
            .or_insert_with(|| Contract::new(id));
        update(contract);
        contract.clone()
    }

    pub async fn len(&self) -> usize {
        self.contracts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.contracts.read().await.is_empty()
    }
}
