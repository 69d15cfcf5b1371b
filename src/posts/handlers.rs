use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    category::Category,
    dto::{CreatePostRequest, ListQuery, UpdatePostRequest},
    repo_types::{Post, PostDetails},
    services,
};
use crate::{
    auth::{dto::MessageResponse, extractors::AuthUser},
    error::{AppError, Result},
    state::AppState,
};

type JsonBody<T> = std::result::Result<Json<T>, JsonRejection>;
type PostId = std::result::Result<Path<Uuid>, PathRejection>;

pub fn post_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/posts/:id",
            get(get_post).put(update_post).delete(delete_post),
        )
}

fn parse_category_filter(raw: Option<&str>) -> Result<Option<Category>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e: super::category::UnknownCategory| AppError::BadRequest(e.to_string())),
    }
}

#[instrument(skip(state, query))]
pub async fn list_posts(
    State(state): State<AppState>,
    query: std::result::Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<Post>>> {
    let Query(query) = query?;
    let cat = parse_category_filter(query.cat.as_deref())?;
    let posts = services::list(state.posts.as_ref(), cat).await?;
    Ok(Json(posts))
}

#[instrument(skip(state, id))]
pub async fn get_post(State(state): State<AppState>, id: PostId) -> Result<Json<PostDetails>> {
    let Path(id) = id?;
    let post = services::get(state.posts.as_ref(), id).await?;
    Ok(Json(post))
}

#[instrument(skip(state, payload))]
pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: JsonBody<CreatePostRequest>,
) -> Result<Json<Post>> {
    let Json(payload) = payload?;
    let post = services::create(state.posts.as_ref(), state.users.as_ref(), payload, user_id).await?;
    Ok(Json(post))
}

#[instrument(skip(state, id, payload))]
pub async fn update_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    id: PostId,
    payload: JsonBody<UpdatePostRequest>,
) -> Result<Json<Post>> {
    let Path(id) = id?;
    let payload = payload.map(|Json(p)| p).map_err(AppError::from);
    let post = services::update(state.posts.as_ref(), id, payload, user_id).await?;
    Ok(Json(post))
}

#[instrument(skip(state, id))]
pub async fn delete_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    id: PostId,
) -> Result<Json<MessageResponse>> {
    let Path(id) = id?;
    services::delete(state.posts.as_ref(), id, user_id).await?;
    Ok(Json(MessageResponse {
        message: "Post has been deleted".into(),
    }))
}
