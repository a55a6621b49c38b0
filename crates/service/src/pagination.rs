//! Cursor-paginated index queries
//!
//! A page carries a continuation cursor only when the store reported a
//! position marker; a full page alone never implies more results.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use models::Entity;
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;
use crate::repository::Repository;
use crate::storage::{LastEvaluatedKey, RangeCondition, StoreError};
use crate::validation::{ArgReader, ValidationError};

pub const CURSOR_FIELD: &str = "cursor";

/// One page of a listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultPage<E> {
    pub items: Vec<E>,
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    pub more_results: bool,
}

impl<E> ResultPage<E> {
    pub fn new(items: Vec<E>, cursor: Option<String>) -> Self {
        Self { count: items.len(), more_results: cursor.is_some(), items, cursor }
    }
}

pub fn encode_cursor(key: &LastEvaluatedKey) -> Result<String, ServiceError> {
    let json = serde_json::to_vec(key).map_err(|e| StoreError::Encoding(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

pub fn decode_cursor(cursor: &str) -> Result<LastEvaluatedKey, ValidationError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(cursor.trim())
        .map_err(|_| ValidationError::malformed(CURSOR_FIELD, "not a continuation cursor"))?;
    serde_json::from_slice(&bytes).map_err(|_| ValidationError::malformed(CURSOR_FIELD, "not a continuation cursor"))
}

/// Read the optional inclusive `timeStampFrom` / `timeStampTo` bounds.
pub fn time_range(args: &ArgReader<'_>) -> Result<Option<RangeCondition>, ValidationError> {
    let from = args.opt_int("timeStampFrom")?;
    let to = args.opt_int("timeStampTo")?;
    match (from, to) {
        (None, None) => Ok(None),
        (Some(f), Some(t)) if f > t => {
            Err(ValidationError::malformed("timeStampTo", format!("range end {t} precedes start {f}")))
        }
        _ => Ok(Some(RangeCondition { from, to })),
    }
}

/// Runs bounded secondary-index queries with a fixed service-wide page size.
pub struct QueryEngine<E: Entity> {
    repo: Repository<E>,
    page_limit: usize,
}

impl<E: Entity> QueryEngine<E> {
    pub fn new(repo: Repository<E>, page_limit: usize) -> Self {
        Self { repo, page_limit: page_limit.max(1) }
    }

    pub fn page_limit(&self) -> usize { self.page_limit }

    pub async fn query_by_index(
        &self,
        index: &str,
        hash_value: &str,
        range: Option<RangeCondition>,
        cursor: Option<&str>,
    ) -> Result<ResultPage<E>, ServiceError> {
        let start = cursor.map(decode_cursor).transpose()?;
        if let Some(start) = &start {
            if start.hash != hash_value {
                return Err(ValidationError::malformed(CURSOR_FIELD, "cursor belongs to a different listing").into());
            }
        }
        let page = self.repo.query(index, hash_value, range, self.page_limit, start).await?;
        let cursor = page.last_evaluated_key.as_ref().map(encode_cursor).transpose()?;
        Ok(ResultPage::new(page.items, cursor))
    }
}
