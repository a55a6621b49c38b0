use std::collections::BTreeSet;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::errors::ModelError;

/// Flat attribute map as written to the entity store.
pub type Item = serde_json::Map<String, Value>;

/// Secondary index: exact match on `hash_attribute`, ordered by `range_attribute`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSchema {
    pub name: &'static str,
    pub hash_attribute: &'static str,
    pub range_attribute: Option<&'static str>,
}

/// Table layout for one entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    pub name: &'static str,
    pub key_attribute: &'static str,
    pub indexes: &'static [IndexSchema],
}

impl TableSchema {
    pub fn index(&self, name: &str) -> Option<&IndexSchema> {
        self.indexes.iter().find(|i| i.name == name)
    }
}

/// Entity descriptor: table layout plus identifier access.
///
/// The identifier is absent until the repository assigns one on create and
/// never changes afterwards.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const SCHEMA: TableSchema;

    fn id(&self) -> Option<&str>;

    fn assign_id(&mut self, id: String);

    fn to_item(&self) -> Result<Item, ModelError> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(ModelError::Encoding(format!(
                "{} did not serialize to an attribute map: {other}",
                Self::SCHEMA.name
            ))),
            Err(e) => Err(ModelError::Encoding(e.to_string())),
        }
    }

    fn from_item(item: Item) -> Result<Self, ModelError> {
        serde_json::from_value(Value::Object(item)).map_err(|e| ModelError::Encoding(e.to_string()))
    }
}

/// Add `member` to a set-valued field, creating the set when absent.
/// Returns whether the field changed.
pub fn add_member(field: &mut Option<BTreeSet<String>>, member: &str) -> bool {
    field.get_or_insert_with(BTreeSet::new).insert(member.to_string())
}

/// Remove `member` from a set-valued field. Removing the last member nulls the field.
/// Returns whether the field changed.
pub fn remove_member(field: &mut Option<BTreeSet<String>>, member: &str) -> bool {
    let Some(set) = field.as_mut() else { return false };
    let removed = set.remove(member);
    if set.is_empty() {
        *field = None;
    }
    removed
}

pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<(), ModelError> {
    if value.trim().is_empty() {
        return Err(ModelError::Validation(format!("{field} required")));
    }
    Ok(())
}
