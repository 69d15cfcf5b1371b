use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{error, info, instrument};

use super::{
    dto::{LoginRequest, MessageResponse, PublicUser, RegisterRequest},
    extractors::{AuthUser, MaybeAuthUser},
    jwt::JwtKeys,
    services,
    session::{removal_cookie, session_cookie},
};
use crate::{error::Result, state::AppState};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<PublicUser>> {
    let Json(payload) = payload?;
    let user = services::register(state.users.as_ref(), payload).await?;
    Ok(Json(user))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<PublicUser>)> {
    let Json(payload) = payload?;
    let user = services::login(state.users.as_ref(), &payload).await?;

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        e
    })?;
    let cookie = session_cookie(&state.config.session, token, keys.ttl);

    Ok((jar.add(cookie), Json(user)))
}

#[instrument(skip(state, jar))]
pub async fn logout(
    State(state): State<AppState>,
    MaybeAuthUser(user_id): MaybeAuthUser,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    info!(user_id = ?user_id, "user logged out");
    (
        jar.add(removal_cookie(&state.config.session)),
        Json(MessageResponse {
            message: "User has been logged out".into(),
        }),
    )
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>> {
    let user = services::current_user(state.users.as_ref(), user_id).await?;
    Ok(Json(user))
}
