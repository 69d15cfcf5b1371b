use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

use crate::config::SessionConfig;

/// httpOnly cookie carrying a signed session token.
pub fn session_cookie(cfg: &SessionConfig, token: String, ttl: std::time::Duration) -> Cookie<'static> {
    Cookie::build((cfg.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .secure(cfg.secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(ttl.as_secs() as i64))
        .build()
}

/// Expired, empty cookie that makes the browser drop the session.
pub fn removal_cookie(cfg: &SessionConfig) -> Cookie<'static> {
    Cookie::build((cfg.cookie_name.clone(), ""))
        .path("/")
        .http_only(true)
        .secure(cfg.secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::ZERO)
        .build()
}
