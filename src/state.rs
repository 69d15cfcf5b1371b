use crate::auth::repo::{MemoryUserStore, PgUserStore, UserStore};
use crate::config::AppConfig;
use crate::posts::repo::{MemoryPostStore, PgPostStore, PostStore};
use crate::storage::{DiskStorage, StorageClient};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub posts: Arc<dyn PostStore>,
    pub storage: Arc<dyn StorageClient>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init(config: AppConfig, db: PgPool) -> anyhow::Result<Self> {
        let storage = Arc::new(DiskStorage::new(&config.upload_dir).await?) as Arc<dyn StorageClient>;
        Ok(Self {
            users: Arc::new(PgUserStore::new(db.clone())),
            posts: Arc::new(PgPostStore::new(db)),
            storage,
            config: Arc::new(config),
        })
    }

    pub fn from_parts(
        users: Arc<dyn UserStore>,
        posts: Arc<dyn PostStore>,
        storage: Arc<dyn StorageClient>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            users,
            posts,
            storage,
            config,
        }
    }

    /// Database-free state: in-memory tables, uploads on disk under `config.upload_dir`.
    pub async fn in_memory(config: AppConfig) -> anyhow::Result<Self> {
        let users: Arc<dyn UserStore> = Arc::new(MemoryUserStore::new());
        let posts = Arc::new(MemoryPostStore::new(users.clone())) as Arc<dyn PostStore>;
        let storage = Arc::new(DiskStorage::new(&config.upload_dir).await?) as Arc<dyn StorageClient>;
        Ok(Self::from_parts(users, posts, storage, Arc::new(config)))
    }
}
