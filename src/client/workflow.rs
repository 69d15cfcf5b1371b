use async_trait::async_trait;
use time::{macros::format_description, OffsetDateTime};
use tracing::{info, warn};
use uuid::Uuid;

use super::api::{ApiClient, ClientError, ImageFile};
use crate::{
    auth::dto::PublicUser,
    posts::{
        category::Category,
        dto::{CreatePostRequest, UpdatePostRequest},
        repo_types::{Post, PostDetails},
    },
};

/// Where the client goes after a successful publish.
pub const LISTING_ROUTE: &str = "/";

/// The calls a draft needs to publish itself.
#[async_trait]
pub trait PostApi: Send + Sync {
    async fn upload(&self, file: &ImageFile) -> Result<String, ClientError>;
    async fn create_post(&self, post: &CreatePostRequest) -> Result<Post, ClientError>;
    async fn update_post(&self, id: Uuid, post: &UpdatePostRequest) -> Result<Post, ClientError>;
}

#[async_trait]
impl PostApi for ApiClient {
    async fn upload(&self, file: &ImageFile) -> Result<String, ClientError> {
        ApiClient::upload(self, file).await
    }

    async fn create_post(&self, post: &CreatePostRequest) -> Result<Post, ClientError> {
        ApiClient::create_post(self, post).await
    }

    async fn update_post(&self, id: Uuid, post: &UpdatePostRequest) -> Result<Post, ClientError> {
        ApiClient::update_post(self, id, post).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Please log in to publish.")]
    NotAuthenticated,
    #[error("Please choose a category.")]
    MissingCategory,
    #[error("image upload failed: {0}")]
    Upload(#[source] ClientError),
    #[error("publishing failed: {0}")]
    Submit(#[source] ClientError),
}

#[derive(Debug)]
pub struct Published {
    pub post: Post,
    pub navigate_to: &'static str,
}

#[derive(Debug, Clone)]
struct EditTarget {
    id: Uuid,
    prior_img: Option<String>,
}

/// Client-held state of a post being written or edited.
#[derive(Debug, Clone, Default)]
pub struct Draft {
    pub title: String,
    pub body: String,
    pub category: Option<Category>,
    staged_image: Option<ImageFile>,
    editing: Option<EditTarget>,
}

impl Draft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draft pre-filled from an existing post; publishing it updates that post.
    pub fn edit(existing: &PostDetails) -> Self {
        let post = &existing.post;
        Self {
            title: post.title.clone(),
            body: post.desc.clone(),
            category: Some(post.cat),
            staged_image: None,
            editing: Some(EditTarget {
                id: post.id,
                prior_img: post.img.clone(),
            }),
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn stage_image(&mut self, file: ImageFile) {
        self.staged_image = Some(file);
    }

    pub fn staged_image(&self) -> Option<&ImageFile> {
        self.staged_image.as_ref()
    }

    pub fn clear_staged_image(&mut self) {
        self.staged_image = None;
    }

    /// Appends assistant text to the body, separated by a blank line unless the body is empty.
    pub fn apply_suggestion(&mut self, text: &str) {
        if self.body.is_empty() {
            self.body = text.to_string();
        } else {
            self.body.push_str("\n\n");
            self.body.push_str(text);
        }
    }

    /// Uploads the staged image (if any), then creates or updates the post.
    /// A new draft stays new after publishing; an edit keeps its target.
    ///
    /// The upload is awaited before anything is submitted; a failed upload aborts
    /// the publish so no post goes out pointing at a missing image.
    pub async fn publish(
        &mut self,
        identity: Option<&PublicUser>,
        api: &dyn PostApi,
    ) -> Result<Published, WorkflowError> {
        let Some(user) = identity else {
            return Err(WorkflowError::NotAuthenticated);
        };
        let cat = self.category.ok_or(WorkflowError::MissingCategory)?;

        let img = match &self.staged_image {
            Some(file) => Some(api.upload(file).await.map_err(|e| {
                warn!(error = %e, file = %file.name, "image upload failed; publish aborted");
                WorkflowError::Upload(e)
            })?),
            None => self.editing.as_ref().and_then(|t| t.prior_img.clone()),
        };

        let post = match &self.editing {
            Some(target) => {
                let body = UpdatePostRequest {
                    title: self.title.clone(),
                    desc: self.body.clone(),
                    cat,
                    img: Some(img.unwrap_or_default()),
                };
                api.update_post(target.id, &body).await
            }
            None => {
                let body = CreatePostRequest {
                    title: self.title.clone(),
                    desc: self.body.clone(),
                    cat,
                    img: Some(img.unwrap_or_default()),
                    date: Some(format_created_at(OffsetDateTime::now_utc())),
                };
                api.create_post(&body).await
            }
        }
        .map_err(WorkflowError::Submit)?;

        info!(post_id = %post.id, user = %user.username, "post published");
        self.staged_image = None;
        if let Some(target) = self.editing.as_mut() {
            target.prior_img = post.img.clone();
        }

        Ok(Published {
            post,
            navigate_to: LISTING_ROUTE,
        })
    }
}

fn format_created_at(now: OffsetDateTime) -> String {
    now.format(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second]"
    ))
    .unwrap_or_default()
}
