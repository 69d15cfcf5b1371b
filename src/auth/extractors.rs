use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;
use uuid::Uuid;

use super::jwt::JwtKeys;
use crate::{error::AppError, state::AppState};

/// Resolves the session cookie to a user ID, rejecting with 401 when absent or invalid.
pub struct AuthUser(pub Uuid);

/// Like [`AuthUser`] but never rejects: anonymous requests yield `None`.
pub struct MaybeAuthUser(pub Option<Uuid>);

fn session_user(parts: &Parts, state: &AppState) -> Option<Uuid> {
    let jar = CookieJar::from_headers(&parts.headers);
    let cookie = jar.get(&state.config.session.cookie_name)?;
    let keys = JwtKeys::from_ref(state);
    match keys.verify(cookie.value()) {
        Ok(claims) => Some(claims.sub),
        Err(e) => {
            warn!(error = %e, "invalid or expired session token");
            None
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        session_user(parts, state)
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(session_user(parts, state)))
    }
}
