use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// What the blob store reports back after an object was written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub e_tag: String,
    pub content_length: u64,
    pub content_type: String,
    pub user_metadata: BTreeMap<String, String>,
}
