use serde::{Deserialize, Serialize};

use super::category::Category;

/// Body of `POST /api/posts`. `date` is optional; the server stamps the time when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub desc: String,
    pub cat: Category,
    #[serde(default)]
    pub img: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Body of `PUT /api/posts/:id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePostRequest {
    pub title: String,
    pub desc: String,
    pub cat: Category,
    #[serde(default)]
    pub img: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub cat: Option<String>,
}
