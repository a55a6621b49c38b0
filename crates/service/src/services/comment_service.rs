use std::sync::Arc;

use async_trait::async_trait;
use configs::ServiceIdentity;
use models::comment::{CREATED_BY_INDEX, FORUM_ID_INDEX};
use models::entity::{add_member, remove_member};
use models::{Comment, Entity};
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
use crate::validation::{ArgReader, FieldSpec, ValidationError};

operations! {
    /// Operations served by the comment service.
    pub enum CommentOperation {
        Create => "CREATE" [FieldSpec::str("createdBy"), FieldSpec::str("forumId")],
        Retrieve => "RETRIEVE" [FieldSpec::str("commentId")],
        Delete => "DELETE" [FieldSpec::str("commentId")],
        BatchRetrieve => "BATCH_RETRIEVE" [FieldSpec::str_list("commentIds")],
        BatchDelete => "BATCH_DELETE" [FieldSpec::str_list("commentIds")],
        AddReply => "ADD_REPLY" [FieldSpec::str("commentId"), FieldSpec::str("replyId")],
        RemoveReply => "REMOVE_REPLY" [FieldSpec::str("commentId"), FieldSpec::str("replyId")],
        AddFlag => "ADD_FLAG" [FieldSpec::str("commentId"), FieldSpec::str("flagId")],
        RemoveFlag => "REMOVE_FLAG" [FieldSpec::str("commentId"), FieldSpec::str("flagId")],
        IncrementConcur => "INCREMENT_CONCUR" [FieldSpec::str("commentId")],
        QueryByCreator => "QUERY_BY_CREATOR" [FieldSpec::str("createdBy")],
        QueryByForum => "QUERY_BY_FORUM" [FieldSpec::str("forumId")],
        Ping => "PING" [],
        ServiceInfo => "SERVICE_INFO" [],
    }
}

/// Comments, their replies, flags and concur counter.
pub struct CommentService {
    repo: Repository<Comment>,
    queries: QueryEngine<Comment>,
    identity: ServiceIdentity,
}

impl CommentService {
    pub fn new(store: Arc<dyn EntityStore>, page_limit: usize, identity: ServiceIdentity) -> Self {
        let repo = Repository::new(store);
        Self { queries: QueryEngine::new(repo.clone(), page_limit), repo, identity }
    }

    pub async fn handle(&self, request: &ServiceRequest) -> ServiceResponse {
        dispatch(self, request).await
    }

    /// Audio link from `bucketName` + `fileName`; both or neither.
    fn audio_link<'a>(args: &ArgReader<'a>) -> Result<Option<(&'a str, &'a str)>, ValidationError> {
        match (args.opt_str("bucketName")?, args.opt_str("fileName")?) {
            (Some(bucket), Some(file)) => Ok(Some((bucket, file))),
            (None, None) => Ok(None),
            (Some(_), None) => Err(ValidationError::malformed("fileName", "required together with bucketName")),
            (None, Some(_)) => Err(ValidationError::malformed("bucketName", "required together with fileName")),
        }
    }
}

#[async_trait]
impl OperationHandler for CommentService {
    type Op = CommentOperation;
    const SERVICE: &'static str = "comment";

    async fn execute(&self, op: CommentOperation, args: ArgReader<'_>) -> Result<Outcome, ServiceError> {
        match op {
            CommentOperation::Create => {
                let mut comment = Comment::new(args.str("createdBy")?, args.str("forumId")?, now_millis())?;
                if let Some((bucket, file)) = Self::audio_link(&args)? {
                    comment = comment.with_audio(bucket, file);
                }
                let comment = self.repo.create(comment).await?;
                info!(comment_id = comment.id().unwrap_or_default(), forum_id = %comment.forum_id, "comment_created");
                Outcome::with_payload(&comment)
            }
            CommentOperation::Retrieve => Outcome::found(self.repo.get(args.str("commentId")?).await?),
            CommentOperation::Delete => Ok(Outcome::deleted(self.repo.delete(args.str("commentId")?).await?)),
            CommentOperation::BatchRetrieve => {
                Outcome::with_payload(&self.repo.batch_get(&args.str_list("commentIds")?).await?)
            }
            CommentOperation::BatchDelete => {
                let requested = args.str_list("commentIds")?;
                let deleted = self.repo.batch_delete(&requested).await?;
                info!(requested = requested.len(), deleted = deleted.len(), "comments_batch_deleted");
                Outcome::with_payload(&deleted)
            }
            CommentOperation::AddReply => {
                let (id, reply_id) = (args.str("commentId")?, args.str("replyId")?);
                Outcome::found(self.repo.modify(id, |c| add_member(&mut c.reply_ids, reply_id)).await?)
            }
            CommentOperation::RemoveReply => {
                let (id, reply_id) = (args.str("commentId")?, args.str("replyId")?);
                Outcome::found(self.repo.modify(id, |c| remove_member(&mut c.reply_ids, reply_id)).await?)
            }
            CommentOperation::AddFlag => {
                let (id, flag_id) = (args.str("commentId")?, args.str("flagId")?);
                Outcome::found(self.repo.modify(id, |c| add_member(&mut c.flag_ids, flag_id)).await?)
            }
            CommentOperation::RemoveFlag => {
                let (id, flag_id) = (args.str("commentId")?, args.str("flagId")?);
                Outcome::found(self.repo.modify(id, |c| remove_member(&mut c.flag_ids, flag_id)).await?)
            }
            CommentOperation::IncrementConcur => {
                let updated = self
                    .repo
                    .modify(args.str("commentId")?, |c| {
                        c.concur_count += 1;
                        true
                    })
                    .await?;
                Outcome::found(updated)
            }
            CommentOperation::QueryByCreator => {
                let (creator, range, cursor) = (args.str("createdBy")?, time_range(&args)?, args.opt_str(CURSOR_FIELD)?);
                Outcome::with_payload(&self.queries.query_by_index(CREATED_BY_INDEX, creator, range, cursor).await?)
            }
            CommentOperation::QueryByForum => {
                let (forum_id, cursor) = (args.str("forumId")?, args.opt_str(CURSOR_FIELD)?);
                Outcome::with_payload(&self.queries.query_by_index(FORUM_ID_INDEX, forum_id, None, cursor).await?)
            }
            CommentOperation::Ping => Ok(Outcome::empty()),
            CommentOperation::ServiceInfo => Outcome::with_payload(&ServiceInfo::from_identity(&self.identity)?),
        }
    }
}
