use time::{format_description::well_known::Rfc3339, macros::format_description, OffsetDateTime, PrimitiveDateTime};
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    category::Category,
    dto::{CreatePostRequest, UpdatePostRequest},
    repo::PostStore,
    repo_types::{NewPost, Post, PostChanges, PostDetails},
};
use crate::{
    auth::repo::UserStore,
    error::{AppError, Result},
};

/// Accepts RFC 3339 or `YYYY-MM-DD HH:MM:SS` (taken as UTC).
pub fn parse_post_date(raw: &str) -> Result<OffsetDateTime> {
    let raw = raw.trim();
    if let Ok(date) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(date);
    }
    let plain = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    PrimitiveDateTime::parse(raw, plain)
        .map(PrimitiveDateTime::assume_utc)
        .map_err(|_| AppError::BadRequest(format!("Invalid date {raw:?}")))
}

fn normalize_img(img: Option<String>) -> Option<String> {
    img.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn require_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(AppError::BadRequest("Title is required".into()));
    }
    Ok(())
}

fn post_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Post {id} not found"))
}

pub async fn list(posts: &dyn PostStore, cat: Option<Category>) -> Result<Vec<Post>> {
    Ok(posts.list(cat).await?)
}

pub async fn get(posts: &dyn PostStore, id: Uuid) -> Result<PostDetails> {
    posts.get(id).await?.ok_or_else(|| post_not_found(id))
}

pub async fn create(
    posts: &dyn PostStore,
    users: &dyn UserStore,
    payload: CreatePostRequest,
    owner: Uuid,
) -> Result<Post> {
    require_title(&payload.title)?;
    let date = match payload.date.as_deref() {
        Some(raw) if !raw.trim().is_empty() => parse_post_date(raw)?,
        _ => OffsetDateTime::now_utc(),
    };

    if users.find_by_id(owner).await?.is_none() {
        warn!(%owner, "session refers to unknown user");
        return Err(AppError::Unauthorized);
    }

    let post = posts
        .insert(
            NewPost {
                title: payload.title,
                desc: payload.desc,
                cat: payload.cat,
                img: normalize_img(payload.img),
                date,
            },
            owner,
        )
        .await?;

    info!(post_id = %post.id, %owner, cat = %post.cat, "post created");
    Ok(post)
}

/// Loads the post and checks that `requester` owns it.
async fn authorize_owner(posts: &dyn PostStore, id: Uuid, requester: Uuid) -> Result<()> {
    let existing = posts.get(id).await?.ok_or_else(|| post_not_found(id))?;
    if existing.post.uid != requester {
        warn!(post_id = %id, owner = %existing.post.uid, %requester, "ownership check failed");
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// The payload is checked only after the ownership check, so a non-owner is
/// refused with `Forbidden` whatever the body contained.
pub async fn update(
    posts: &dyn PostStore,
    id: Uuid,
    payload: Result<UpdatePostRequest>,
    requester: Uuid,
) -> Result<Post> {
    authorize_owner(posts, id, requester).await?;
    let payload = payload?;
    require_title(&payload.title)?;

    let changes = PostChanges {
        title: payload.title,
        desc: payload.desc,
        cat: payload.cat,
        img: normalize_img(payload.img),
    };
    // the row may vanish between the check and the write
    let post = posts
        .update(id, requester, changes)
        .await?
        .ok_or_else(|| post_not_found(id))?;

    info!(post_id = %id, %requester, "post updated");
    Ok(post)
}

pub async fn delete(posts: &dyn PostStore, id: Uuid, requester: Uuid) -> Result<()> {
    authorize_owner(posts, id, requester).await?;
    if !posts.delete(id, requester).await? {
        return Err(post_not_found(id));
    }
    info!(post_id = %id, %requester, "post deleted");
    Ok(())
}
