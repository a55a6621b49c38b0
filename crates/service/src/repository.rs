//! Typed access to one entity table over an [`EntityStore`].

use std::{marker::PhantomData, sync::Arc};

use models::Entity;
use tracing::debug;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::storage::{EntityStore, IndexQuery, LastEvaluatedKey, QueryOutput, RangeCondition};

/// Creation timestamp in epoch milliseconds.
pub fn now_millis() -> i64 { chrono::Utc::now().timestamp_millis() }

pub struct Repository<E: Entity> {
    store: Arc<dyn EntityStore>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Clone for Repository<E> {
    fn clone(&self) -> Self { Self { store: self.store.clone(), _entity: PhantomData } }
}

/// One page of typed entities plus the store's position marker.
#[derive(Debug, Clone)]
pub struct EntityPage<E> {
    pub items: Vec<E>,
    pub last_evaluated_key: Option<LastEvaluatedKey>,
}

impl<E: Entity> Repository<E> {
    pub fn new(store: Arc<dyn EntityStore>) -> Self { Self { store, _entity: PhantomData } }

    fn table() -> &'static str { E::SCHEMA.name }

    fn decode_all(items: Vec<models::Item>) -> Result<Vec<E>, ServiceError> {
        items.into_iter().map(|i| E::from_item(i).map_err(ServiceError::from)).collect()
    }

    pub async fn get(&self, id: &str) -> Result<Option<E>, ServiceError> {
        match self.store.get(Self::table(), id).await? {
            Some(item) => Ok(Some(E::from_item(item)?)),
            None => Ok(None),
        }
    }

    /// Assign a fresh identifier and persist once. Never looks up an existing record.
    pub async fn create(&self, mut entity: E) -> Result<E, ServiceError> {
        entity.assign_id(Uuid::new_v4().to_string());
        self.store.put(Self::table(), entity.to_item()?).await?;
        debug!(table = Self::table(), id = entity.id().unwrap_or_default(), "entity_created");
        Ok(entity)
    }

    pub async fn save(&self, entity: &E) -> Result<(), ServiceError> {
        self.store.put(Self::table(), entity.to_item()?).await?;
        Ok(())
    }

    /// Get-then-delete. `false` when the record was already absent.
    pub async fn delete(&self, id: &str) -> Result<bool, ServiceError> {
        if self.store.get(Self::table(), id).await?.is_none() {
            return Ok(false);
        }
        self.store.delete(Self::table(), id).await?;
        Ok(true)
    }

    pub async fn batch_get(&self, ids: &[String]) -> Result<Vec<E>, ServiceError> {
        Self::decode_all(self.store.batch_get(Self::table(), ids).await?)
    }

    /// Delete the records that exist and return exactly their identifiers.
    pub async fn batch_delete(&self, ids: &[String]) -> Result<Vec<String>, ServiceError> {
        let found = self.batch_get(ids).await?;
        let existing: Vec<String> = found.iter().filter_map(|e| e.id().map(str::to_string)).collect();
        if !existing.is_empty() {
            self.store.batch_delete(Self::table(), &existing).await?;
        }
        Ok(existing)
    }

    pub async fn query(
        &self,
        index: &str,
        hash_value: &str,
        range: Option<RangeCondition>,
        limit: usize,
        exclusive_start: Option<LastEvaluatedKey>,
    ) -> Result<EntityPage<E>, ServiceError> {
        let query = IndexQuery {
            table: Self::table().to_string(),
            index: index.to_string(),
            hash_value: hash_value.to_string(),
            range,
            limit,
            exclusive_start,
        };
        let QueryOutput { items, last_evaluated_key, .. } = self.store.query_index(&query).await?;
        Ok(EntityPage { items: Self::decode_all(items)?, last_evaluated_key })
    }

    /// Load, apply `f`, and persist only when `f` reports a change.
    ///
    /// Returns `None` without touching the store further when the record is absent.
    pub async fn modify<F>(&self, id: &str, f: F) -> Result<Option<E>, ServiceError>
    where
        F: FnOnce(&mut E) -> bool,
    {
        let Some(mut entity) = self.get(id).await? else {
            debug!(table = Self::table(), id, "modify_target_absent");
            return Ok(None);
        };
        if f(&mut entity) {
            self.save(&entity).await?;
        }
        Ok(Some(entity))
    }
}
