use std::sync::Arc;

use async_trait::async_trait;
use configs::ServiceIdentity;
use models::entity::{add_member, remove_member};
use models::forum::{CREATED_BY_INDEX, TITLE_INDEX};
use models::{Entity, Forum};
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
    /// Operations served by the forum service.
    pub enum ForumOperation {
        Create => "CREATE" [FieldSpec::str("createdBy"), FieldSpec::str("title")],
        Retrieve => "RETRIEVE" [FieldSpec::str("forumId")],
        Update => "UPDATE" [FieldSpec::str("forumId")],
        Delete => "DELETE" [FieldSpec::str("forumId")],
        AddComment => "ADD_COMMENT" [FieldSpec::str("forumId"), FieldSpec::str("commentId")],
        RemoveComment => "REMOVE_COMMENT" [FieldSpec::str("forumId"), FieldSpec::str("commentId")],
        QueryByCreator => "QUERY_BY_CREATOR" [FieldSpec::str("createdBy")],
        QueryByTitle => "QUERY_BY_TITLE" [FieldSpec::str("title")],
        Ping => "PING" [],
        ServiceInfo => "SERVICE_INFO" [],
    }
}

/// Forum threads and their attached comment ids.
pub struct ForumService {
    repo: Repository<Forum>,
    queries: QueryEngine<Forum>,
    identity: ServiceIdentity,
}

impl ForumService {
    pub fn new(store: Arc<dyn EntityStore>, page_limit: usize, identity: ServiceIdentity) -> Self {
        let repo = Repository::new(store);
        Self { queries: QueryEngine::new(repo.clone(), page_limit), repo, identity }
    }

    pub async fn handle(&self, request: &ServiceRequest) -> ServiceResponse {
        dispatch(self, request).await
    }
}

#[async_trait]
impl OperationHandler for ForumService {
    type Op = ForumOperation;
    const SERVICE: &'static str = "forum";

    async fn execute(&self, op: ForumOperation, args: ArgReader<'_>) -> Result<Outcome, ServiceError> {
        match op {
            ForumOperation::Create => {
                let forum = Forum::new(args.str("createdBy")?, args.str("title")?, now_millis())?;
                let forum = self.repo.create(forum).await?;
                info!(forum_id = forum.id().unwrap_or_default(), created_by = %forum.created_by, "forum_created");
                Outcome::with_payload(&forum)
            }
            ForumOperation::Retrieve => Outcome::found(self.repo.get(args.str("forumId")?).await?),
            ForumOperation::Update => {
                let id = args.str("forumId")?;
                let title = args.opt_str("titleUpdate")?;
                let updated = self
                    .repo
                    .modify(id, |forum| match title {
                        Some(t) if t != forum.title => {
                            forum.title = t.to_string();
                            true
                        }
                        _ => false,
                    })
                    .await?;
                Outcome::found(updated)
            }
            ForumOperation::Delete => Ok(Outcome::deleted(self.repo.delete(args.str("forumId")?).await?)),
            ForumOperation::AddComment => {
                let (id, comment_id) = (args.str("forumId")?, args.str("commentId")?);
                Outcome::found(self.repo.modify(id, |f| add_member(&mut f.comment_ids, comment_id)).await?)
            }
            ForumOperation::RemoveComment => {
                let (id, comment_id) = (args.str("forumId")?, args.str("commentId")?);
                Outcome::found(self.repo.modify(id, |f| remove_member(&mut f.comment_ids, comment_id)).await?)
            }
            ForumOperation::QueryByCreator => {
                let (creator, range, cursor) = (args.str("createdBy")?, time_range(&args)?, args.opt_str(CURSOR_FIELD)?);
                Outcome::with_payload(&self.queries.query_by_index(CREATED_BY_INDEX, creator, range, cursor).await?)
            }
            ForumOperation::QueryByTitle => {
                let (title, cursor) = (args.str("title")?, args.opt_str(CURSOR_FIELD)?);
                Outcome::with_payload(&self.queries.query_by_index(TITLE_INDEX, title, None, cursor).await?)
            }
            ForumOperation::Ping => Ok(Outcome::empty()),
            ForumOperation::ServiceInfo => Outcome::with_payload(&ServiceInfo::from_identity(&self.identity)?),
        }
    }
}
