#![cfg(test)]
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::registry::TABLES;
use crate::request::ServiceRequest;
use crate::storage::{table_store::TableStore, EntityStore, IndexQuery, Item, QueryOutput, StoreError};

/// Calls observed per store primitive.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallCounts {
    pub get: usize,
    pub put: usize,
    pub delete: usize,
    pub batch_get: usize,
    pub batch_delete: usize,
    pub query_index: usize,
}

/// Wraps a store and counts every call made through it.
pub struct CountingStore {
    inner: Arc<dyn EntityStore>,
    counts: Mutex<CallCounts>,
}

impl CountingStore {
    pub fn wrap(inner: Arc<dyn EntityStore>) -> Arc<Self> {
        Arc::new(Self { inner, counts: Mutex::new(CallCounts::default()) })
    }

    /// In-memory store holding every Chatter table.
    pub fn fresh() -> Arc<Self> { Self::wrap(TableStore::in_memory(&TABLES)) }

    pub fn counts(&self) -> CallCounts { *self.counts.lock().unwrap() }

    fn bump(&self, f: impl FnOnce(&mut CallCounts)) { f(&mut self.counts.lock().unwrap()) }
}

#[async_trait]
impl EntityStore for CountingStore {
    async fn get(&self, table: &str, key: &str) -> Result<Option<Item>, StoreError> {
        self.bump(|c| c.get += 1);
        self.inner.get(table, key).await
    }

    async fn put(&self, table: &str, item: Item) -> Result<(), StoreError> {
        self.bump(|c| c.put += 1);
        self.inner.put(table, item).await
    }

    async fn delete(&self, table: &str, key: &str) -> Result<(), StoreError> {
        self.bump(|c| c.delete += 1);
        self.inner.delete(table, key).await
    }

    async fn batch_get(&self, table: &str, keys: &[String]) -> Result<Vec<Item>, StoreError> {
        self.bump(|c| c.batch_get += 1);
        self.inner.batch_get(table, keys).await
    }

    async fn batch_delete(&self, table: &str, keys: &[String]) -> Result<(), StoreError> {
        self.bump(|c| c.batch_delete += 1);
        self.inner.batch_delete(table, keys).await
    }

    async fn query_index(&self, query: &IndexQuery) -> Result<QueryOutput, StoreError> {
        self.bump(|c| c.query_index += 1);
        self.inner.query_index(query).await
    }
}

/// A store whose every call fails.
pub struct FailingStore;

fn unavailable() -> StoreError {
    StoreError::Io(std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "store unavailable"))
}

#[async_trait]
impl EntityStore for FailingStore {
    async fn get(&self, _: &str, _: &str) -> Result<Option<Item>, StoreError> { Err(unavailable()) }
    async fn put(&self, _: &str, _: Item) -> Result<(), StoreError> { Err(unavailable()) }
    async fn delete(&self, _: &str, _: &str) -> Result<(), StoreError> { Err(unavailable()) }
    async fn batch_get(&self, _: &str, _: &[String]) -> Result<Vec<Item>, StoreError> { Err(unavailable()) }
    async fn batch_delete(&self, _: &str, _: &[String]) -> Result<(), StoreError> { Err(unavailable()) }
    async fn query_index(&self, _: &IndexQuery) -> Result<QueryOutput, StoreError> { Err(unavailable()) }
}

/// Build a request from an operation tag and a JSON object of arguments.
pub fn request(operation: &str, args: Value) -> ServiceRequest {
    ServiceRequest {
        operation: Some(operation.to_string()),
        request_timestamp: Some(0),
        args: args.as_object().cloned(),
    }
}
