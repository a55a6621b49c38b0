//! Process-wide service state, built once at startup and shared read-only.

use std::path::PathBuf;
use std::sync::Arc;

use configs::{AppConfig, ServiceIdentity};
use models::{Comment, Entity, Flag, Forum, TableSchema};
use tracing::info;

use crate::services::{CommentService, FileService, FlagService, ForumService};
use crate::storage::blob_store::{BlobStore, FsBlobStore, MemoryBlobStore};
use crate::storage::table_store::TableStore;
use crate::storage::{EntityStore, StoreError};

/// Every table the Chatter services use.
pub const TABLES: [TableSchema; 3] = [Forum::SCHEMA, Comment::SCHEMA, Flag::SCHEMA];

pub struct ServiceRegistry {
    pub forums: ForumService,
    pub comments: CommentService,
    pub flags: FlagService,
    pub files: FileService,
}

impl ServiceRegistry {
    /// Open the configured stores: `<data_dir>/tables` and `<data_dir>/blobs`
    /// when persisting, in-memory otherwise.
    pub async fn from_config(cfg: &AppConfig) -> Result<Self, StoreError> {
        let data_dir = PathBuf::from(&cfg.store.data_dir);
        let store: Arc<dyn EntityStore> = if cfg.store.persist {
            TableStore::open(data_dir.join("tables"), &TABLES).await?
        } else {
            TableStore::in_memory(&TABLES)
        };
        let blobs: Arc<dyn BlobStore> = if cfg.store.persist {
            FsBlobStore::open(data_dir.join("blobs")).await?
        } else {
            MemoryBlobStore::new()
        };
        info!(
            persist = cfg.store.persist,
            data_dir = %data_dir.display(),
            page_limit = cfg.query.page_limit,
            "service_registry_ready"
        );
        Ok(Self::with_stores(store, blobs, cfg.query.page_limit, &cfg.service))
    }

    pub fn with_stores(
        store: Arc<dyn EntityStore>,
        blobs: Arc<dyn BlobStore>,
        page_limit: usize,
        identity: &ServiceIdentity,
    ) -> Self {
        Self {
            forums: ForumService::new(store.clone(), page_limit, identity.clone()),
            comments: CommentService::new(store.clone(), page_limit, identity.clone()),
            flags: FlagService::new(store, page_limit, identity.clone()),
            files: FileService::new(blobs, identity.clone()),
        }
    }
}
