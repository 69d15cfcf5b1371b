use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    category::Category,
    repo_types::{NewPost, Post, PostChanges, PostDetails, PostDetailsRow, PostRow},
};
use crate::auth::repo::UserStore;

#[async_trait]
pub trait PostStore: Send + Sync {
    /// Newest first, optionally restricted to one category.
    async fn list(&self, cat: Option<Category>) -> anyhow::Result<Vec<Post>>;
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<PostDetails>>;
    async fn insert(&self, post: NewPost, uid: Uuid) -> anyhow::Result<Post>;
    /// Overwrites the post only if `uid` owns it; `None` when no row matched.
    async fn update(&self, id: Uuid, uid: Uuid, changes: PostChanges) -> anyhow::Result<Option<Post>>;
    /// Removes the post only if `uid` owns it; `false` when no row matched.
    async fn delete(&self, id: Uuid, uid: Uuid) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgPostStore {
    db: PgPool,
}

impl PgPostStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn list(&self, cat: Option<Category>) -> anyhow::Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, title, description, category, img, date, uid
            FROM posts
            WHERE ($1::text IS NULL OR category = $1)
            ORDER BY date DESC
            "#,
        )
        .bind(cat.map(Category::as_str))
        .fetch_all(&self.db)
        .await
        .context("list posts")?;
        rows.into_iter().map(Post::try_from).collect()
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<PostDetails>> {
        let row = sqlx::query_as::<_, PostDetailsRow>(
            r#"
            SELECT p.id, p.title, p.description, p.category, p.img, p.date, p.uid, u.username
            FROM posts p
            JOIN users u ON u.id = p.uid
            WHERE p.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("get post")?;
        row.map(PostDetails::try_from).transpose()
    }

    async fn insert(&self, post: NewPost, uid: Uuid) -> anyhow::Result<Post> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            INSERT INTO posts (id, title, description, category, img, date, uid)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, title, description, category, img, date, uid
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&post.title)
        .bind(&post.desc)
        .bind(post.cat.as_str())
        .bind(&post.img)
        .bind(post.date)
        .bind(uid)
        .fetch_one(&self.db)
        .await
        .context("insert post")?;
        row.try_into()
    }

    async fn update(&self, id: Uuid, uid: Uuid, changes: PostChanges) -> anyhow::Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            UPDATE posts
               SET title = $3, description = $4, category = $5, img = $6
             WHERE id = $1 AND uid = $2
            RETURNING id, title, description, category, img, date, uid
            "#,
        )
        .bind(id)
        .bind(uid)
        .bind(&changes.title)
        .bind(&changes.desc)
        .bind(changes.cat.as_str())
        .bind(&changes.img)
        .fetch_optional(&self.db)
        .await
        .context("update post")?;
        row.map(Post::try_from).transpose()
    }

    async fn delete(&self, id: Uuid, uid: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(r#"DELETE FROM posts WHERE id = $1 AND uid = $2"#)
            .bind(id)
            .bind(uid)
            .execute(&self.db)
            .await
            .context("delete post")?;
        Ok(result.rows_affected() > 0)
    }
}

/// Process-local post table; resolves owners through the paired user store.
pub struct MemoryPostStore {
    posts: RwLock<Vec<Post>>,
    users: Arc<dyn UserStore>,
}

impl MemoryPostStore {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self {
            posts: RwLock::new(Vec::new()),
            users,
        }
    }
}

#[async_trait]
impl PostStore for MemoryPostStore {
    async fn list(&self, cat: Option<Category>) -> anyhow::Result<Vec<Post>> {
        let posts = self.posts.read().await;
        let mut out: Vec<Post> = posts
            .iter()
            .rev()
            .filter(|p| cat.map_or(true, |c| p.cat == c))
            .cloned()
            .collect();
        // stable: equal dates keep newest-inserted first
        out.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(out)
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<PostDetails>> {
        let post = self.posts.read().await.iter().find(|p| p.id == id).cloned();
        let Some(post) = post else {
            return Ok(None);
        };
        let owner = self
            .users
            .find_by_id(post.uid)
            .await?
            .with_context(|| format!("post {} references missing user {}", post.id, post.uid))?;
        Ok(Some(PostDetails {
            post,
            username: owner.username,
        }))
    }

    async fn insert(&self, post: NewPost, uid: Uuid) -> anyhow::Result<Post> {
        if self.users.find_by_id(uid).await?.is_none() {
            anyhow::bail!("insert post: user {uid} does not exist");
        }
        let created = Post {
            id: Uuid::new_v4(),
            title: post.title,
            desc: post.desc,
            cat: post.cat,
            img: post.img,
            date: post.date,
            uid,
        };
        self.posts.write().await.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: Uuid, uid: Uuid, changes: PostChanges) -> anyhow::Result<Option<Post>> {
        let mut posts = self.posts.write().await;
        let Some(post) = posts.iter_mut().find(|p| p.id == id && p.uid == uid) else {
            return Ok(None);
        };
        post.title = changes.title;
        post.desc = changes.desc;
        post.cat = changes.cat;
        post.img = changes.img;
        Ok(Some(post.clone()))
    }

    async fn delete(&self, id: Uuid, uid: Uuid) -> anyhow::Result<bool> {
        let mut posts = self.posts.write().await;
        let before = posts.len();
        posts.retain(|p| !(p.id == id && p.uid == uid));
        Ok(posts.len() != before)
    }
}
