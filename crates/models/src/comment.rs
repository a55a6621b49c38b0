use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::entity::{require_non_empty, Entity, IndexSchema, TableSchema};
use crate::errors::ModelError;

pub const CREATED_BY_INDEX: &str = "created_by_index";
pub const FORUM_ID_INDEX: &str = "forum_id_index";

/// Location of an uploaded object in the blob store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileLink {
    pub bucket_name: String,
    pub key_name: String,
}

/// A comment posted to a forum, optionally carrying an audio recording.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<String>,
    pub created_by: String,
    pub time_stamp: i64,
    pub forum_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_ids: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag_ids: Option<BTreeSet<String>>,
    #[serde(default)]
    pub concur_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_file_link: Option<FileLink>,
}

impl Comment {
    pub fn new(created_by: &str, forum_id: &str, time_stamp: i64) -> Result<Self, ModelError> {
        require_non_empty("createdBy", created_by)?;
        require_non_empty("forumId", forum_id)?;
        Ok(Self {
            comment_id: None,
            created_by: created_by.to_string(),
            time_stamp,
            forum_id: forum_id.to_string(),
            reply_ids: None,
            flag_ids: None,
            concur_count: 0,
            audio_file_link: None,
        })
    }

    pub fn with_audio(mut self, bucket_name: &str, key_name: &str) -> Self {
        self.audio_file_link = Some(FileLink {
            bucket_name: bucket_name.to_string(),
            key_name: key_name.to_string(),
        });
        self
    }
}

impl Entity for Comment {
    const SCHEMA: TableSchema = TableSchema {
        name: "Chatter_Comment",
        key_attribute: "commentId",
        indexes: &[
            IndexSchema { name: CREATED_BY_INDEX, hash_attribute: "createdBy", range_attribute: Some("timeStamp") },
            IndexSchema { name: FORUM_ID_INDEX, hash_attribute: "forumId", range_attribute: Some("timeStamp") },
        ],
    };

    fn id(&self) -> Option<&str> { self.comment_id.as_deref() }

    fn assign_id(&mut self, id: String) { self.comment_id = Some(id); }
}
