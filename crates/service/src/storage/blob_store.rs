use std::{
    collections::{BTreeMap, HashMap},
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use models::FileMetadata;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::{fs, sync::RwLock};

use super::StoreError;

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Metadata supplied by the caller when writing an object.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    pub content_type: Option<String>,
    pub user_metadata: BTreeMap<String, String>,
}

/// Object store addressed by bucket and key.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        metadata: ObjectMetadata,
    ) -> Result<FileMetadata, StoreError>;

    /// Returns whether an object existed under the key.
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<bool, StoreError>;
}

fn describe(data: &[u8], metadata: ObjectMetadata) -> FileMetadata {
    FileMetadata {
        e_tag: format!("{:x}", Sha256::digest(data)),
        content_length: data.len() as u64,
        content_type: metadata.content_type.unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
        user_metadata: metadata.user_metadata,
    }
}

/// Reject names that would escape the store root.
fn check_name(kind: &str, name: &str) -> Result<(), StoreError> {
    let path = Path::new(name);
    let escapes = path.components().any(|c| !matches!(c, Component::Normal(_)));
    if name.is_empty() || name.starts_with('.') || escapes {
        return Err(StoreError::InvalidKey(format!("{kind} `{name}`")));
    }
    Ok(())
}

/// Filesystem-backed blob store: `<root>/<bucket>/<key>`, with metadata kept
/// under `<root>/.metadata/<bucket>/<key>.json`.
#[derive(Clone, Debug)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub async fn open<P: Into<PathBuf>>(root: P) -> Result<Arc<Self>, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Arc::new(Self { root }))
    }

    fn paths(&self, bucket: &str, key: &str) -> Result<(PathBuf, PathBuf), StoreError> {
        check_name("bucket", bucket)?;
        check_name("key", key)?;
        let object = self.root.join(bucket).join(key);
        let meta = self.root.join(".metadata").join(bucket).join(format!("{key}.json"));
        Ok((object, meta))
    }
}

async fn write_creating_parents(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, bytes).await?;
    Ok(())
}

async fn remove_if_present(path: &Path) -> Result<bool, StoreError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        metadata: ObjectMetadata,
    ) -> Result<FileMetadata, StoreError> {
        let (object, meta) = self.paths(bucket, key)?;
        let described = describe(&data, metadata);
        let meta_bytes = serde_json::to_vec_pretty(&described).map_err(|e| StoreError::Encoding(e.to_string()))?;
        write_creating_parents(&object, &data).await?;
        write_creating_parents(&meta, &meta_bytes).await?;
        Ok(described)
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<bool, StoreError> {
        let (object, meta) = self.paths(bucket, key)?;
        let existed = remove_if_present(&object).await?;
        remove_if_present(&meta).await?;
        Ok(existed)
    }
}

/// Blob store kept entirely in memory.
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: RwLock<HashMap<(String, String), (Vec<u8>, FileMetadata)>>,
}

impl MemoryBlobStore {
    pub fn new() -> Arc<Self> { Arc::new(Self::default()) }

    pub async fn get_object(&self, bucket: &str, key: &str) -> Option<(Vec<u8>, FileMetadata)> {
        self.objects.read().await.get(&(bucket.to_string(), key.to_string())).cloned()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        metadata: ObjectMetadata,
    ) -> Result<FileMetadata, StoreError> {
        check_name("bucket", bucket)?;
        check_name("key", key)?;
        let described = describe(&data, metadata);
        self.objects
            .write()
            .await
            .insert((bucket.to_string(), key.to_string()), (data, described.clone()));
        Ok(described)
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<bool, StoreError> {
        check_name("bucket", bucket)?;
        check_name("key", key)?;
        Ok(self.objects.write().await.remove(&(bucket.to_string(), key.to_string())).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn names_may_not_escape_root() {
        assert!(check_name("key", "audio/clip.mp3").is_ok());
        assert!(check_name("key", "../etc/passwd").is_err());
        assert!(check_name("key", "/abs").is_err());
        assert!(check_name("bucket", ".metadata").is_err());
        assert!(check_name("bucket", "").is_err());
    }

    #[tokio::test]
    async fn fs_store_put_then_delete() -> Result<(), anyhow::Error> {
        let dir = std::env::temp_dir().join(format!("blob_store_{}", Uuid::new_v4()));
        let store = FsBlobStore::open(&dir).await?;

        let meta = ObjectMetadata { content_type: Some("audio/mpeg".into()), ..Default::default() };
        let out = store.put_object("chatter", "a/b.mp3", b"hello".to_vec(), meta).await?;
        assert_eq!(out.content_length, 5);
        assert_eq!(out.content_type, "audio/mpeg");
        assert_eq!(out.e_tag.len(), 64);
        assert_eq!(fs::read(dir.join("chatter/a/b.mp3")).await?, b"hello");

        assert!(store.delete_object("chatter", "a/b.mp3").await?);
        assert!(!store.delete_object("chatter", "a/b.mp3").await?);

        let _ = fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[tokio::test]
    async fn memory_store_defaults_content_type() -> Result<(), StoreError> {
        let store = MemoryBlobStore::new();
        let out = store.put_object("b", "k", vec![1, 2, 3], ObjectMetadata::default()).await?;
        assert_eq!(out.content_type, DEFAULT_CONTENT_TYPE);
        assert!(store.get_object("b", "k").await.is_some());
        assert!(store.delete_object("b", "k").await?);
        Ok(())
    }
}
