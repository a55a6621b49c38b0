use serde::{Deserialize, Serialize};

use crate::entity::{require_non_empty, Entity, IndexSchema, TableSchema};
use crate::errors::ModelError;

pub const CREATED_BY_INDEX: &str = "created_by_index";
pub const COMMENT_ID_INDEX: &str = "comment_id_index";

/// A moderation flag raised against a comment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flag {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag_id: Option<String>,
    pub created_by: String,
    pub time_stamp: i64,
    pub forum_id: String,
    pub comment_id: String,
    pub flag_description: String,
}

impl Flag {
    pub fn new(
        created_by: &str,
        forum_id: &str,
        comment_id: &str,
        flag_description: &str,
        time_stamp: i64,
    ) -> Result<Self, ModelError> {
        require_non_empty("createdBy", created_by)?;
        require_non_empty("forumId", forum_id)?;
        require_non_empty("commentId", comment_id)?;
        require_non_empty("flagDescription", flag_description)?;
        Ok(Self {
            flag_id: None,
            created_by: created_by.to_string(),
            time_stamp,
            forum_id: forum_id.to_string(),
            comment_id: comment_id.to_string(),
            flag_description: flag_description.to_string(),
        })
    }
}

impl Entity for Flag {
    const SCHEMA: TableSchema = TableSchema {
        name: "Chatter_Flag",
        key_attribute: "flagId",
        indexes: &[
            IndexSchema { name: CREATED_BY_INDEX, hash_attribute: "createdBy", range_attribute: Some("timeStamp") },
            IndexSchema { name: COMMENT_ID_INDEX, hash_attribute: "commentId", range_attribute: Some("timeStamp") },
        ],
    };

    fn id(&self) -> Option<&str> { self.flag_id.as_deref() }

    fn assign_id(&mut self, id: String) { self.flag_id = Some(id); }
}
