use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::entity::{require_non_empty, Entity, IndexSchema, TableSchema};
use crate::errors::ModelError;

pub const CREATED_BY_INDEX: &str = "created_by_index";
pub const TITLE_INDEX: &str = "title_index";

/// A forum thread. `comment_ids` is absent rather than empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forum {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forum_id: Option<String>,
    pub created_by: String,
    pub title: String,
    pub time_stamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_ids: Option<BTreeSet<String>>,
}

impl Forum {
    pub fn new(created_by: &str, title: &str, time_stamp: i64) -> Result<Self, ModelError> {
        require_non_empty("createdBy", created_by)?;
        require_non_empty("title", title)?;
        Ok(Self {
            forum_id: None,
            created_by: created_by.to_string(),
            title: title.to_string(),
            time_stamp,
            comment_ids: None,
        })
    }
}

impl Entity for Forum {
    const SCHEMA: TableSchema = TableSchema {
        name: "Chatter_Forum",
        key_attribute: "forumId",
        indexes: &[
            IndexSchema { name: CREATED_BY_INDEX, hash_attribute: "createdBy", range_attribute: Some("timeStamp") },
            IndexSchema { name: TITLE_INDEX, hash_attribute: "title", range_attribute: None },
        ],
    };

    fn id(&self) -> Option<&str> { self.forum_id.as_deref() }

    fn assign_id(&mut self, id: String) { self.forum_id = Some(id); }
}
