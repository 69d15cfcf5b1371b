use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repo_types::{NewUser, User};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    /// Inserts the user; `None` means the username is already taken.
    async fn create(&self, user: NewUser<'_>) -> anyhow::Result<Option<User>>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, name, password_hash, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, name, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create(&self, user: NewUser<'_>) -> anyhow::Result<Option<User>> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, name, password_hash)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (username) DO NOTHING
            RETURNING id, username, name, password_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user.username)
        .bind(user.name)
        .bind(user.password_hash)
        .fetch_optional(&self.db)
        .await?;
        Ok(created)
    }
}

/// Process-local user table for tests and database-less runs.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, user: NewUser<'_>) -> anyhow::Result<Option<User>> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.username == user.username) {
            return Ok(None);
        }
        let created = User {
            id: Uuid::new_v4(),
            username: user.username.to_string(),
            name: user.name.to_string(),
            password_hash: user.password_hash.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(created.clone());
        Ok(Some(created))
    }
}
