use std::{
    collections::{BTreeMap, HashMap, HashSet},
    path::PathBuf,
    sync::Arc,
};

use async_trait::async_trait;
use models::TableSchema;
use tokio::{fs, sync::RwLock};

use super::{EntityStore, IndexQuery, Item, LastEvaluatedKey, QueryOutput, StoreError};

type Table = BTreeMap<String, Item>;

/// Ordered in-process table store with optional JSON-file persistence.
///
/// Each table is kept as a `key -> item` map and, when opened on a directory,
/// written to `<dir>/<table>.json` after every mutation. Secondary indexes are
/// evaluated on read from the table schemas given at construction.
#[derive(Clone)]
pub struct TableStore {
    inner: Arc<RwLock<HashMap<String, Table>>>,
    schemas: Arc<HashMap<String, TableSchema>>,
    data_dir: Option<PathBuf>,
}

impl TableStore {
    /// A store that never touches the filesystem.
    pub fn in_memory(schemas: &[TableSchema]) -> Arc<Self> {
        let tables = schemas.iter().map(|s| (s.name.to_string(), Table::new())).collect();
        Arc::new(Self {
            inner: Arc::new(RwLock::new(tables)),
            schemas: Arc::new(Self::schema_map(schemas)),
            data_dir: None,
        })
    }

    /// Initialize the store from a directory. Creates missing table files.
    pub async fn open<P: Into<PathBuf>>(dir: P, schemas: &[TableSchema]) -> Result<Arc<Self>, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;

        let mut tables = HashMap::new();
        for schema in schemas {
            let path = dir.join(format!("{}.json", schema.name));
            let table: Table = match fs::read(&path).await {
                Ok(bytes) => serde_json::from_slice(&bytes)
                    .map_err(|e| StoreError::Encoding(format!("{}: {e}", path.display())))?,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    let empty = Table::new();
                    fs::write(&path, serde_json::to_vec(&empty).map_err(|e| StoreError::Encoding(e.to_string()))?)
                        .await?;
                    empty
                }
                Err(e) => return Err(e.into()),
            };
            tables.insert(schema.name.to_string(), table);
        }

        Ok(Arc::new(Self {
            inner: Arc::new(RwLock::new(tables)),
            schemas: Arc::new(Self::schema_map(schemas)),
            data_dir: Some(dir),
        }))
    }

    fn schema_map(schemas: &[TableSchema]) -> HashMap<String, TableSchema> {
        schemas.iter().map(|s| (s.name.to_string(), *s)).collect()
    }

    fn schema(&self, table: &str) -> Result<&TableSchema, StoreError> {
        self.schemas.get(table).ok_or_else(|| StoreError::UnknownTable(table.to_string()))
    }

    async fn save(&self, table: &str, data: &Table) -> Result<(), StoreError> {
        let Some(dir) = &self.data_dir else { return Ok(()) };
        let bytes = serde_json::to_vec(data).map_err(|e| StoreError::Encoding(e.to_string()))?;
        fs::write(dir.join(format!("{table}.json")), bytes).await?;
        Ok(())
    }

    /// Apply a mutation to one table and persist it while the write lock is held.
    ///
    /// The mutation runs on a copy; the in-memory table is replaced only once
    /// the file write succeeded, so a failed write leaves no visible change.
    async fn update_table<F>(&self, table: &str, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Table) -> Result<bool, StoreError>,
    {
        self.schema(table)?;
        let mut tables = self.inner.write().await;
        let data = tables.entry(table.to_string()).or_default();
        let mut next = data.clone();
        if f(&mut next)? {
            self.save(table, &next).await?;
            *data = next;
        }
        Ok(())
    }
}

#[async_trait]
impl EntityStore for TableStore {
    async fn get(&self, table: &str, key: &str) -> Result<Option<Item>, StoreError> {
        self.schema(table)?;
        let tables = self.inner.read().await;
        Ok(tables.get(table).and_then(|t| t.get(key)).cloned())
    }

    async fn put(&self, table: &str, item: Item) -> Result<(), StoreError> {
        let key_attribute = self.schema(table)?.key_attribute;
        let key = item
            .get(key_attribute)
            .and_then(|v| v.as_str())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| StoreError::MissingKey(key_attribute.to_string()))?
            .to_string();
        self.update_table(table, |data| {
            data.insert(key, item);
            Ok(true)
        })
        .await
    }

    async fn delete(&self, table: &str, key: &str) -> Result<(), StoreError> {
        self.update_table(table, |data| Ok(data.remove(key).is_some())).await
    }

    async fn batch_get(&self, table: &str, keys: &[String]) -> Result<Vec<Item>, StoreError> {
        self.schema(table)?;
        let tables = self.inner.read().await;
        let Some(data) = tables.get(table) else { return Ok(Vec::new()) };
        let mut seen = HashSet::new();
        Ok(keys
            .iter()
            .filter(|k| seen.insert(k.as_str()))
            .filter_map(|k| data.get(k).cloned())
            .collect())
    }

    async fn batch_delete(&self, table: &str, keys: &[String]) -> Result<(), StoreError> {
        self.update_table(table, |data| {
            let mut changed = false;
            for key in keys {
                changed |= data.remove(key).is_some();
            }
            Ok(changed)
        })
        .await
    }

    async fn query_index(&self, query: &IndexQuery) -> Result<QueryOutput, StoreError> {
        let schema = self.schema(&query.table)?;
        let index = schema.index(&query.index).ok_or_else(|| StoreError::UnknownIndex {
            table: query.table.clone(),
            index: query.index.clone(),
        })?;

        let tables = self.inner.read().await;
        let Some(data) = tables.get(&query.table) else { return Ok(QueryOutput::default()) };

        // items without the index attributes are not in the index
        let mut hits: Vec<(Option<i64>, &String, &Item)> = data
            .iter()
            .filter_map(|(key, item)| {
                let hash = item.get(index.hash_attribute)?.as_str()?;
                if hash != query.hash_value {
                    return None;
                }
                let range = match index.range_attribute {
                    Some(attribute) => Some(item.get(attribute)?.as_i64()?),
                    None => None,
                };
                if let (Some(cond), Some(value)) = (query.range, range) {
                    if !cond.contains(value) {
                        return None;
                    }
                }
                Some((range, key, item))
            })
            .collect();
        hits.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        if let Some(start) = &query.exclusive_start {
            let position = (start.range, &start.key);
            hits.retain(|(range, key, _)| (*range, *key) > position);
        }

        let limit = query.limit.max(1);
        let more = hits.len() > limit;
        hits.truncate(limit);

        let last_evaluated_key = if more {
            hits.last().map(|(range, key, _)| LastEvaluatedKey {
                key: (*key).clone(),
                hash: query.hash_value.clone(),
                range: *range,
            })
        } else {
            None
        };
        let items: Vec<Item> = hits.into_iter().map(|(_, _, item)| item.clone()).collect();
        Ok(QueryOutput { count: items.len(), items, last_evaluated_key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::{Entity, Forum};
    use serde_json::json;
    use uuid::Uuid;

    fn item(v: serde_json::Value) -> Item {
        v.as_object().cloned().unwrap_or_default()
    }

    fn forum_item(id: &str, creator: &str, ts: i64) -> Item {
        item(json!({"forumId": id, "createdBy": creator, "title": "t", "timeStamp": ts}))
    }

    fn query(hash: &str, limit: usize, start: Option<LastEvaluatedKey>) -> IndexQuery {
        IndexQuery {
            table: Forum::SCHEMA.name.into(),
            index: "created_by_index".into(),
            hash_value: hash.into(),
            range: None,
            limit,
            exclusive_start: start,
        }
    }

    #[tokio::test]
    async fn table_store_crud_persists() -> Result<(), anyhow::Error> {
        let dir = std::env::temp_dir().join(format!("table_store_{}", Uuid::new_v4()));
        let store = TableStore::open(&dir, &[Forum::SCHEMA]).await?;

        assert!(store.get("Chatter_Forum", "f1").await?.is_none());
        store.put("Chatter_Forum", forum_item("f1", "alice", 1)).await?;
        store.put("Chatter_Forum", forum_item("f2", "alice", 2)).await?;
        store.delete("Chatter_Forum", "f2").await?;

        // reload from disk
        let reloaded = TableStore::open(&dir, &[Forum::SCHEMA]).await?;
        assert!(reloaded.get("Chatter_Forum", "f1").await?.is_some());
        assert!(reloaded.get("Chatter_Forum", "f2").await?.is_none());

        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[tokio::test]
    async fn failed_write_leaves_table_unchanged() -> Result<(), anyhow::Error> {
        let dir = std::env::temp_dir().join(format!("table_store_{}", Uuid::new_v4()));
        let store = TableStore::open(&dir, &[Forum::SCHEMA]).await?;
        store.put("Chatter_Forum", forum_item("f0", "alice", 0)).await?;

        // a directory in place of the table file makes every write fail
        let path = dir.join("Chatter_Forum.json");
        tokio::fs::remove_file(&path).await?;
        tokio::fs::create_dir(&path).await?;

        assert!(store.put("Chatter_Forum", forum_item("f1", "alice", 1)).await.is_err());
        assert!(store.get("Chatter_Forum", "f1").await?.is_none());
        let listed = store.query_index(&query("alice", 10, None)).await?;
        assert_eq!(listed.count, 1);

        assert!(store.delete("Chatter_Forum", "f0").await.is_err());
        assert!(store.get("Chatter_Forum", "f0").await?.is_some());

        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[tokio::test]
    async fn put_requires_key_attribute() {
        let store = TableStore::in_memory(&[Forum::SCHEMA]);
        let err = store.put("Chatter_Forum", item(json!({"createdBy": "alice"}))).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingKey(k) if k == "forumId"));
    }

    #[tokio::test]
    async fn unknown_table_and_index_are_errors() {
        let store = TableStore::in_memory(&[Forum::SCHEMA]);
        assert!(matches!(store.get("Nope", "x").await, Err(StoreError::UnknownTable(_))));
        let mut q = query("alice", 5, None);
        q.index = "missing_index".into();
        assert!(matches!(store.query_index(&q).await, Err(StoreError::UnknownIndex { .. })));
    }

    #[tokio::test]
    async fn batch_get_skips_missing_and_duplicate_keys() -> Result<(), StoreError> {
        let store = TableStore::in_memory(&[Forum::SCHEMA]);
        store.put("Chatter_Forum", forum_item("f1", "alice", 1)).await?;
        store.put("Chatter_Forum", forum_item("f2", "alice", 2)).await?;
        let keys: Vec<String> = ["f2", "nope", "f1", "f2"].iter().map(|s| s.to_string()).collect();
        let items = store.batch_get("Chatter_Forum", &keys).await?;
        let ids: Vec<&str> = items.iter().filter_map(|i| i["forumId"].as_str()).collect();
        assert_eq!(ids, vec!["f2", "f1"]);
        Ok(())
    }

    #[tokio::test]
    async fn full_final_page_carries_no_marker() -> Result<(), StoreError> {
        let store = TableStore::in_memory(&[Forum::SCHEMA]);
        for i in 0..4 {
            store.put("Chatter_Forum", forum_item(&format!("f{i}"), "alice", i)).await?;
        }
        let first = store.query_index(&query("alice", 2, None)).await?;
        assert_eq!(first.count, 2);
        let marker = first.last_evaluated_key.clone().expect("more results");
        assert_eq!(marker.range, Some(1));

        let second = store.query_index(&query("alice", 2, Some(marker))).await?;
        assert_eq!(second.count, 2);
        assert!(second.last_evaluated_key.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn index_orders_by_range_then_key_and_filters_hash() -> Result<(), StoreError> {
        let store = TableStore::in_memory(&[Forum::SCHEMA]);
        store.put("Chatter_Forum", forum_item("b", "alice", 5)).await?;
        store.put("Chatter_Forum", forum_item("a", "alice", 5)).await?;
        store.put("Chatter_Forum", forum_item("c", "alice", 1)).await?;
        store.put("Chatter_Forum", forum_item("d", "bob", 0)).await?;
        let out = store.query_index(&query("alice", 10, None)).await?;
        let ids: Vec<&str> = out.items.iter().filter_map(|i| i["forumId"].as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
        Ok(())
    }

    #[tokio::test]
    async fn range_condition_narrows_results() -> Result<(), StoreError> {
        let store = TableStore::in_memory(&[Forum::SCHEMA]);
        for i in 0..10 {
            store.put("Chatter_Forum", forum_item(&format!("f{i}"), "alice", i * 10)).await?;
        }
        let mut q = query("alice", 100, None);
        q.range = Some(super::super::RangeCondition { from: Some(20), to: Some(50) });
        let out = store.query_index(&q).await?;
        assert_eq!(out.count, 4);
        Ok(())
    }
}
