//! Storage abstractions for service layer
//!
//! [`EntityStore`] is the narrow key-value surface the core relies on; the
//! bundled [`table_store::TableStore`] keeps tables in memory and can persist
//! them as JSON files. [`blob_store::BlobStore`] covers uploaded files.

pub mod blob_store;
pub mod table_store;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use models::Item;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unknown table: {0}")]
    UnknownTable(String),
    #[error("unknown index `{index}` on table {table}")]
    UnknownIndex { table: String, index: String },
    #[error("item is missing key attribute `{0}`")]
    MissingKey(String),
    #[error("invalid object key: {0}")]
    InvalidKey(String),
    #[error("encoding error: {0}")]
    Encoding(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Position of the last item of a page, as reported by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastEvaluatedKey {
    pub key: String,
    pub hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<i64>,
}

/// Inclusive bounds on an index's range attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RangeCondition {
    pub from: Option<i64>,
    pub to: Option<i64>,
}

impl RangeCondition {
    pub fn contains(&self, value: i64) -> bool {
        self.from.map_or(true, |f| value >= f) && self.to.map_or(true, |t| value <= t)
    }
}

/// One bounded range query against a secondary index.
#[derive(Debug, Clone)]
pub struct IndexQuery {
    pub table: String,
    pub index: String,
    pub hash_value: String,
    pub range: Option<RangeCondition>,
    pub limit: usize,
    pub exclusive_start: Option<LastEvaluatedKey>,
}

/// A page as returned by the store. `last_evaluated_key` is present only when
/// more items exist beyond this page.
#[derive(Debug, Clone, Default)]
pub struct QueryOutput {
    pub items: Vec<Item>,
    pub count: usize,
    pub last_evaluated_key: Option<LastEvaluatedKey>,
}

/// Ordered key-value store with single-item, batch and index-query primitives.
///
/// Reads are eventually consistent; concurrent writers to one key are last-write-wins.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn get(&self, table: &str, key: &str) -> Result<Option<Item>, StoreError>;
    async fn put(&self, table: &str, item: Item) -> Result<(), StoreError>;
    async fn delete(&self, table: &str, key: &str) -> Result<(), StoreError>;
    /// Items for the keys that exist, in request order. Missing keys are skipped.
    async fn batch_get(&self, table: &str, keys: &[String]) -> Result<Vec<Item>, StoreError>;
    async fn batch_delete(&self, table: &str, keys: &[String]) -> Result<(), StoreError>;
    async fn query_index(&self, query: &IndexQuery) -> Result<QueryOutput, StoreError>;
}
