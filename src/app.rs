use std::net::SocketAddr;

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::state::AppState;
use crate::{auth, posts, uploads};

#[derive(Debug, Serialize, Deserialize)]
pub struct Health {
    pub message: String,
    pub environment: String,
    pub timestamp: String,
}

pub fn build_app(state: AppState) -> Router {
    let upload_dir = state.config.upload_dir.clone();
    let upload_limit = state.config.upload_max_bytes;

    Router::new()
        .route("/", get(health))
        .nest(
            "/api",
            Router::new()
                .merge(auth::router())
                .merge(posts::router())
                .merge(uploads::router(upload_limit)),
        )
        .nest_service("/upload", ServeDir::new(upload_dir))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        message: "Blog API server is running".into(),
        environment: state.config.environment.clone(),
        timestamp: OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default(),
    })
}

pub async fn serve(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
