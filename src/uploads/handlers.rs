use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::services::{store_upload, UploadItem};
use crate::{
    error::{AppError, Result},
    state::AppState,
};

pub fn upload_routes(max_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_file))
        .layer(DefaultBodyLimit::max(max_bytes))
}

/// POST /upload (multipart), field `file`. Responds with the stored filename.
#[instrument(skip(state, mp))]
pub async fn upload_file(
    State(state): State<AppState>,
    mp: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<String>> {
    let mut mp = mp?;
    let mut file = None;
    while let Some(field) = mp.next_field().await.map_err(log_multipart_error)? {
        if field.name() == Some("file") {
            let original_name = field.file_name().map(str::to_string);
            let body = field.bytes().await.map_err(log_multipart_error)?;
            file = Some(UploadItem { original_name, body });
            break;
        }
    }

    let Some(item) = file else {
        warn!("upload without a file field");
        return Err(AppError::BadRequest("No file uploaded".into()));
    };

    let size = item.body.len();
    let filename = store_upload(state.storage.as_ref(), item).await?;
    info!(%filename, size, "file uploaded");
    Ok(Json(filename))
}

fn log_multipart_error(err: axum::extract::multipart::MultipartError) -> AppError {
    warn!(error = %err, status = %err.status(), "multipart body rejected");
    err.into()
}
