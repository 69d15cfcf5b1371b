use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{LoginRequest, PublicUser, RegisterRequest},
    password::{hash_password, verify_password},
    repo::UserStore,
    repo_types::NewUser,
};
use crate::error::{AppError, Result};

pub async fn register(users: &dyn UserStore, payload: RegisterRequest) -> Result<PublicUser> {
    let username = payload.username.trim();
    let name = payload.name.trim();

    if username.is_empty() {
        return Err(AppError::BadRequest("Username is required".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::BadRequest("Password is required".into()));
    }
    if name.is_empty() {
        return Err(AppError::BadRequest("Name is required".into()));
    }

    if users.find_by_username(username).await?.is_some() {
        warn!(%username, "username already registered");
        return Err(AppError::Conflict("User already exists".into()));
    }

    let password_hash = hash_password(&payload.password)?;
    let user = users
        .create(NewUser {
            username,
            name,
            password_hash: &password_hash,
        })
        .await?
        .ok_or_else(|| {
            warn!(%username, "username taken concurrently");
            AppError::Conflict("User already exists".into())
        })?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(user.into())
}

/// Checks credentials. Unknown usernames and wrong passwords are indistinguishable.
pub async fn login(users: &dyn UserStore, payload: &LoginRequest) -> Result<PublicUser> {
    let username = payload.username.trim();

    let Some(user) = users.find_by_username(username).await? else {
        warn!(%username, "login unknown username");
        return Err(AppError::Unauthorized);
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(%username, user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized);
    }

    info!(user_id = %user.id, %username, "user logged in");
    Ok(user.into())
}

pub async fn current_user(users: &dyn UserStore, user_id: Uuid) -> Result<PublicUser> {
    users
        .find_by_id(user_id)
        .await?
        .map(PublicUser::from)
        .ok_or(AppError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo::MemoryUserStore;

    fn register_req(username: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.into(),
            password: password.into(),
            name: "Alice A.".into(),
        }
    }

    fn login_req(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn register_then_login_succeeds() {
        let users = MemoryUserStore::new();
        let created = register(&users, register_req("alice", "pw1")).await.unwrap();
        assert_eq!(created.username, "alice");
        assert_eq!(created.name, "Alice A.");

        let logged_in = login(&users, &login_req("alice", "pw1")).await.unwrap();
        assert_eq!(logged_in.id, created.id);
    }

    #[tokio::test]
    async fn duplicate_username_is_conflict() {
        let users = MemoryUserStore::new();
        register(&users, register_req("alice", "pw1")).await.unwrap();
        let err = register(&users, register_req("alice", "other")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let users = MemoryUserStore::new();
        register(&users, register_req("alice", "pw1")).await.unwrap();
        let err = login(&users, &login_req("alice", "pw2")).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }

    #[tokio::test]
    async fn unknown_username_is_unauthorized() {
        let users = MemoryUserStore::new();
        let err = login(&users, &login_req("ghost", "pw1")).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }

    #[tokio::test]
    async fn blank_fields_are_rejected() {
        let users = MemoryUserStore::new();
        let err = register(&users, register_req("  ", "pw1")).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        let err = register(&users, register_req("alice", "")).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn current_user_requires_existing_user() {
        let users = MemoryUserStore::new();
        let err = current_user(&users, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }
}
