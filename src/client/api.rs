use bytes::Bytes;
use reqwest::{multipart, Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::{
    auth::dto::PublicUser,
    posts::{
        category::Category,
        dto::{CreatePostRequest, UpdatePostRequest},
        repo_types::{Post, PostDetails},
    },
};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server origin, e.g. `http://localhost:8000`; API paths are appended to it.
    pub base_url: String,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(
            std::env::var("INKPOST_API_URL").unwrap_or_else(|_| "http://localhost:8000".into()),
        )
    }
}

/// Failure classes the server reports, recovered from the response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    BadRequest,
    Other,
}

impl ErrorKind {
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => ErrorKind::Unauthorized,
            StatusCode::FORBIDDEN => ErrorKind::Forbidden,
            StatusCode::NOT_FOUND => ErrorKind::NotFound,
            StatusCode::CONFLICT => ErrorKind::Conflict,
            StatusCode::BAD_REQUEST => ErrorKind::BadRequest,
            _ => ErrorKind::Other,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("{kind:?} ({status}): {message}")]
    Api {
        kind: ErrorKind,
        status: u16,
        message: String,
    },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ClientError {
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ClientError::Api { kind, .. } => Some(*kind),
            ClientError::Transport(_) => None,
        }
    }
}

/// An image picked for upload.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub name: String,
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP client shared by every page. Keeps the session cookie between calls.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = Client::builder().cookie_store(true).build()?;
        Ok(Self {
            http,
            base_url: config.base_url,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json::<T>().await?);
        }
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or(body);
        debug!(%status, %message, "api call failed");
        Err(ClientError::Api {
            kind: ErrorKind::from_status(status),
            status: status.as_u16(),
            message,
        })
    }

    pub async fn register(&self, username: &str, password: &str, name: &str) -> Result<PublicUser, ClientError> {
        let resp = self
            .http
            .post(self.url("/api/auth/register"))
            .json(&json!({ "username": username, "password": password, "name": name }))
            .send()
            .await?;
        Self::decode(resp).await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<PublicUser, ClientError> {
        let resp = self
            .http
            .post(self.url("/api/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;
        Self::decode(resp).await
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        let resp = self.http.post(self.url("/api/auth/logout")).send().await?;
        Self::decode::<serde_json::Value>(resp).await.map(|_| ())
    }

    pub async fn me(&self) -> Result<PublicUser, ClientError> {
        let resp = self.http.get(self.url("/api/auth/me")).send().await?;
        Self::decode(resp).await
    }

    pub async fn list_posts(&self, cat: Option<Category>) -> Result<Vec<Post>, ClientError> {
        let mut req = self.http.get(self.url("/api/posts"));
        if let Some(cat) = cat {
            req = req.query(&[("cat", cat.as_str())]);
        }
        Self::decode(req.send().await?).await
    }

    pub async fn get_post(&self, id: Uuid) -> Result<PostDetails, ClientError> {
        let resp = self.http.get(self.url(&format!("/api/posts/{id}"))).send().await?;
        Self::decode(resp).await
    }

    pub async fn create_post(&self, post: &CreatePostRequest) -> Result<Post, ClientError> {
        let resp = self.http.post(self.url("/api/posts")).json(post).send().await?;
        Self::decode(resp).await
    }

    pub async fn update_post(&self, id: Uuid, post: &UpdatePostRequest) -> Result<Post, ClientError> {
        let resp = self
            .http
            .put(self.url(&format!("/api/posts/{id}")))
            .json(post)
            .send()
            .await?;
        Self::decode(resp).await
    }

    pub async fn delete_post(&self, id: Uuid) -> Result<(), ClientError> {
        let resp = self
            .http
            .delete(self.url(&format!("/api/posts/{id}")))
            .send()
            .await?;
        Self::decode::<serde_json::Value>(resp).await.map(|_| ())
    }

    /// Sends the file as multipart field `file`; returns the server-generated filename.
    pub async fn upload(&self, file: &ImageFile) -> Result<String, ClientError> {
        let mut part = multipart::Part::bytes(file.bytes.to_vec()).file_name(file.name.clone());
        if let Some(ct) = &file.content_type {
            part = part.mime_str(ct)?;
        }
        let form = multipart::Form::new().part("file", part);
        let resp = self.http.post(self.url("/api/upload")).multipart(form).send().await?;
        Self::decode(resp).await
    }

    pub fn image_url(&self, filename: &str) -> String {
        self.url(&format!("/upload/{filename}"))
    }
}
