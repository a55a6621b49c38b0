use configs::{PropertyError, ServiceIdentity};
use serde::Serialize;

/// Payload of the `SERVICE_INFO` operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub env: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ServiceInfo {
    /// Name, version and environment are required; the description is optional.
    pub fn from_identity(identity: &ServiceIdentity) -> Result<Self, PropertyError> {
        Ok(Self {
            name: identity.require("service.name")?.to_string(),
            version: identity.require("service.version")?.to_string(),
            env: identity.require("service.env")?.to_string(),
            description: identity.require("service.description").ok().map(str::to_string),
        })
    }
}
