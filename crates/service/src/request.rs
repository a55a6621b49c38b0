use serde::{Deserialize, Serialize};

use crate::validation::Args;

/// Wire request: `{operation, requestTimestamp, args}`.
///
/// Every field is optional on the wire so that an absent operation can be
/// reported as such instead of failing deserialization.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    #[serde(default)]
    pub operation: Option<String>,
    #[serde(default)]
    pub request_timestamp: Option<i64>,
    #[serde(default)]
    pub args: Option<Args>,
}
