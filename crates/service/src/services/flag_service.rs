use std::sync::Arc;

use async_trait::async_trait;
use configs::ServiceIdentity;
use models::flag::{COMMENT_ID_INDEX, CREATED_BY_INDEX};
use models::{Entity, Flag};
use tracing::info;

use crate::dispatch::{dispatch, OperationHandler};
use crate::errors::ServiceError;
use crate::info::ServiceInfo;
use crate::operation::operations;
use crate::pagination::{time_range, QueryEngine, CURSOR_FIELD};
use crate::repository::{now_millis, Repository};
use crate::request::ServiceRequest;
use crate::response::{Outcome, ServiceResponse};
use crate::storage::EntityStore;
use crate::validation::{ArgReader, FieldSpec};

operations! {
    /// Operations served by the flag service.
    pub enum FlagOperation {
        Create => "CREATE" [
            FieldSpec::str("createdBy"),
            FieldSpec::str("forumId"),
            FieldSpec::str("commentId"),
            FieldSpec::str("flagDescription"),
        ],
        Retrieve => "RETRIEVE" [FieldSpec::str("flagId")],
        Update => "UPDATE" [FieldSpec::str("flagId")],
        Delete => "DELETE" [FieldSpec::str("flagId")],
        BatchRetrieve => "BATCH_RETRIEVE" [FieldSpec::str_list("flagIds")],
        BatchDelete => "BATCH_DELETE" [FieldSpec::str_list("flagIds")],
        QueryByCreator => "QUERY_BY_CREATOR" [FieldSpec::str("createdBy")],
        QueryByComment => "QUERY_BY_COMMENT" [FieldSpec::str("commentId")],
        Ping => "PING" [],
        ServiceInfo => "SERVICE_INFO" [],
    }
}

/// Moderation flags raised against comments.
pub struct FlagService {
    repo: Repository<Flag>,
    queries: QueryEngine<Flag>,
    identity: ServiceIdentity,
}

impl FlagService {
    pub fn new(store: Arc<dyn EntityStore>, page_limit: usize, identity: ServiceIdentity) -> Self {
        let repo = Repository::new(store);
        Self { queries: QueryEngine::new(repo.clone(), page_limit), repo, identity }
    }

    pub async fn handle(&self, request: &ServiceRequest) -> ServiceResponse {
        dispatch(self, request).await
    }
}

#[async_trait]
impl OperationHandler for FlagService {
    type Op = FlagOperation;
    const SERVICE: &'static str = "flag";

    async fn execute(&self, op: FlagOperation, args: ArgReader<'_>) -> Result<Outcome, ServiceError> {
        match op {
            FlagOperation::Create => {
                let flag = Flag::new(
                    args.str("createdBy")?,
                    args.str("forumId")?,
                    args.str("commentId")?,
                    args.str("flagDescription")?,
                    now_millis(),
                )?;
                let flag = self.repo.create(flag).await?;
                info!(flag_id = flag.id().unwrap_or_default(), comment_id = %flag.comment_id, "flag_created");
                Outcome::with_payload(&flag)
            }
            FlagOperation::Retrieve => Outcome::found(self.repo.get(args.str("flagId")?).await?),
            FlagOperation::Update => {
                let id = args.str("flagId")?;
                let description = args.opt_str("flagDescriptionUpdate")?;
                let updated = self
                    .repo
                    .modify(id, |flag| match description {
                        Some(d) if d != flag.flag_description => {
                            flag.flag_description = d.to_string();
                            true
                        }
                        _ => false,
                    })
                    .await?;
                Outcome::found(updated)
            }
            FlagOperation::Delete => Ok(Outcome::deleted(self.repo.delete(args.str("flagId")?).await?)),
            FlagOperation::BatchRetrieve => {
                Outcome::with_payload(&self.repo.batch_get(&args.str_list("flagIds")?).await?)
            }
            FlagOperation::BatchDelete => {
                let requested = args.str_list("flagIds")?;
                let deleted = self.repo.batch_delete(&requested).await?;
                info!(requested = requested.len(), deleted = deleted.len(), "flags_batch_deleted");
                Outcome::with_payload(&deleted)
            }
            FlagOperation::QueryByCreator => {
                let (creator, range, cursor) = (args.str("createdBy")?, time_range(&args)?, args.opt_str(CURSOR_FIELD)?);
                Outcome::with_payload(&self.queries.query_by_index(CREATED_BY_INDEX, creator, range, cursor).await?)
            }
            FlagOperation::QueryByComment => {
                let (comment_id, range, cursor) = (args.str("commentId")?, time_range(&args)?, args.opt_str(CURSOR_FIELD)?);
                Outcome::with_payload(&self.queries.query_by_index(COMMENT_ID_INDEX, comment_id, range, cursor).await?)
            }
            FlagOperation::Ping => Ok(Outcome::empty()),
            FlagOperation::ServiceInfo => Outcome::with_payload(&ServiceInfo::from_identity(&self.identity)?),
        }
    }
}
