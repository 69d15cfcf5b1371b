use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use super::category::Category;

/// Raw `posts` row; `category` is validated on conversion.
#[derive(Debug, FromRow)]
pub struct PostRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub img: Option<String>,
    pub date: OffsetDateTime,
    pub uid: Uuid,
}

#[derive(Debug, FromRow)]
pub struct PostDetailsRow {
    #[sqlx(flatten)]
    pub post: PostRow,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub desc: String,
    pub cat: Category,
    pub img: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub uid: Uuid, // owner
}

/// A post together with its owner's username, as shown on the single-post page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDetails {
    #[serde(flatten)]
    pub post: Post,
    pub username: String,
}

impl TryFrom<PostRow> for Post {
    type Error = anyhow::Error;

    fn try_from(r: PostRow) -> Result<Self, Self::Error> {
        Ok(Self {
            cat: r.category.parse()?,
            id: r.id,
            title: r.title,
            desc: r.description,
            img: r.img,
            date: r.date,
            uid: r.uid,
        })
    }
}

impl TryFrom<PostDetailsRow> for PostDetails {
    type Error = anyhow::Error;

    fn try_from(r: PostDetailsRow) -> Result<Self, Self::Error> {
        Ok(Self {
            post: r.post.try_into()?,
            username: r.username,
        })
    }
}

/// Fields of a post about to be inserted.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub desc: String,
    pub cat: Category,
    pub img: Option<String>,
    pub date: OffsetDateTime,
}

/// The owner-mutable fields of a post.
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub title: String,
    pub desc: String,
    pub cat: Category,
    pub img: Option<String>,
}
