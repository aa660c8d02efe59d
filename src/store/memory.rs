// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store for tests and sessions that should not outlive the process.

use super::{SecureStore, StoreError, StoreKey};
use async_trait::async_trait;
use dashmap::DashMap;

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<StoreKey, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl SecureStore for MemoryStore {
    async fn get(&self, key: StoreKey) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(&key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: StoreKey, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key, value.to_string());
        Ok(())
    }

    async fn delete(&self, key: StoreKey) -> Result<(), StoreError> {
        self.entries.remove(&key);
        Ok(())
    }
}
