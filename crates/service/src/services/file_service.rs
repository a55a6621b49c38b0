use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use configs::ServiceIdentity;
use tracing::info;

use crate::dispatch::{dispatch, OperationHandler};
use crate::errors::ServiceError;
use crate::info::ServiceInfo;
use crate::operation::operations;
use crate::repository::now_millis;
use crate::request::ServiceRequest;
use crate::response::{Outcome, ServiceResponse};
use crate::storage::blob_store::{BlobStore, ObjectMetadata};
use crate::validation::{ArgReader, FieldSpec, ValidationError};

operations! {
    /// Operations served by the file service.
    pub enum FileOperation {
        SaveFile => "SAVE_FILE" [
            FieldSpec::str("createdBy"),
            FieldSpec::str("bucketName"),
            FieldSpec::str("keyName"),
            FieldSpec::str("fileData"),
        ],
        DeleteFile => "DELETE_FILE" [FieldSpec::str("bucketName"), FieldSpec::str("keyName")],
        Ping => "PING" [],
        ServiceInfo => "SERVICE_INFO" [],
    }
}

/// Uploaded files (comment audio) kept in the blob store.
pub struct FileService {
    blobs: Arc<dyn BlobStore>,
    identity: ServiceIdentity,
}

impl FileService {
    pub fn new(blobs: Arc<dyn BlobStore>, identity: ServiceIdentity) -> Self { Self { blobs, identity } }

    pub async fn handle(&self, request: &ServiceRequest) -> ServiceResponse {
        dispatch(self, request).await
    }

    fn user_metadata(args: &ArgReader<'_>, created_by: &str) -> Result<BTreeMap<String, String>, ValidationError> {
        let mut meta = BTreeMap::new();
        meta.insert("createdBy".to_string(), created_by.to_string());
        meta.insert("dateCreated".to_string(), now_millis().to_string());
        for field in ["commentId", "forumId"] {
            if let Some(value) = args.opt_str(field)? {
                meta.insert(field.to_string(), value.to_string());
            }
        }
        Ok(meta)
    }
}

#[async_trait]
impl OperationHandler for FileService {
    type Op = FileOperation;
    const SERVICE: &'static str = "file";

    async fn execute(&self, op: FileOperation, args: ArgReader<'_>) -> Result<Outcome, ServiceError> {
        match op {
            FileOperation::SaveFile => {
                let (bucket, key) = (args.str("bucketName")?, args.str("keyName")?);
                let data = STANDARD
                    .decode(args.str("fileData")?)
                    .map_err(|_| ValidationError::malformed("fileData", "not base64-encoded"))?;
                let metadata = ObjectMetadata {
                    content_type: args.opt_str("contentType")?.map(str::to_string),
                    user_metadata: Self::user_metadata(&args, args.str("createdBy")?)?,
                };
                let saved = self.blobs.put_object(bucket, key, data, metadata).await?;
                info!(bucket, key, content_length = saved.content_length, "file_saved");
                Outcome::with_payload(&saved)
            }
            FileOperation::DeleteFile => {
                let (bucket, key) = (args.str("bucketName")?, args.str("keyName")?);
                Ok(Outcome::deleted(self.blobs.delete_object(bucket, key).await?))
            }
            FileOperation::Ping => Ok(Outcome::empty()),
            FileOperation::ServiceInfo => Outcome::with_payload(&ServiceInfo::from_identity(&self.identity)?),
        }
    }
}
