use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;

#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes) -> anyhow::Result<()>;
}

/// Stores uploaded files as plain files under one directory.
#[derive(Clone)]
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    pub async fn new(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("create upload dir {}", root.display()))?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> anyhow::Result<PathBuf> {
        let name = Path::new(key)
            .file_name()
            .filter(|n| n.to_str() == Some(key))
            .with_context(|| format!("invalid object key {key:?}"))?;
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl StorageClient for DiskStorage {
    async fn put_object(&self, key: &str, body: Bytes) -> anyhow::Result<()> {
        let path = self.path_for(key)?;
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write {}", path.display()))?;
        tracing::debug!(key, bytes = body.len(), "object stored");
        Ok(())
    }
}
