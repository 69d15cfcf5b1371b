use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use inkpost::{app::build_app, config::AppConfig, state::AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_config() -> AppConfig {
    let dir = std::env::temp_dir().join(format!("inkpost-api-{}", uuid::Uuid::new_v4()));
    AppConfig::for_tests(dir)
}

async fn spawn_app_with(config: AppConfig) -> Router {
    let state = AppState::in_memory(config).await.expect("in-memory state");
    build_app(state)
}

async fn spawn_app() -> Router {
    spawn_app_with(test_config()).await
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Option<String>, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, cookie, value)
}

fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// Registers and logs in; returns the `name=value` pair to send back as `Cookie`.
async fn login_as(app: &Router, username: &str) -> String {
    let (status, _, _) = send(
        app,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({ "username": username, "password": "secret", "name": username }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, cookie, body) = send(
        app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "username": username, "password": "secret" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], username);
    let cookie = cookie.expect("session cookie");
    assert!(cookie.contains("HttpOnly"));
    cookie.split(';').next().unwrap().to_string()
}

fn multipart_request(uri: &str, cookie: Option<&str>, field: &str, filename: &str, data: &[u8]) -> Request<Body> {
    let boundary = "inkpost-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).unwrap()
}

#[tokio::test]
async fn health_reports_running() {
    let app = spawn_app().await;
    let (status, _, body) = send(&app, get("/", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Blog API server is running");
    assert_eq!(body["environment"], "test");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = spawn_app().await;
    login_as(&app, "alice").await;

    let (status, _, body) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({ "username": "alice", "password": "other", "name": "Other" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "User already exists");
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = spawn_app().await;
    login_as(&app, "alice").await;

    let (status, cookie, _) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "username": "alice", "password": "nope" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(cookie.is_none());
}

#[tokio::test]
async fn me_requires_session() {
    let app = spawn_app().await;
    let (status, _, _) = send(&app, get("/api/auth/me", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let cookie = login_as(&app, "alice").await;
    let (status, _, body) = send(&app, get("/api/auth/me", Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn logout_expires_cookie() {
    let app = spawn_app().await;
    let cookie = login_as(&app, "alice").await;
    let (status, set_cookie, body) =
        send(&app, json_request("POST", "/api/auth/logout", Some(&cookie), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User has been logged out");
    assert!(set_cookie.unwrap().contains("Max-Age=0"));
}

#[tokio::test]
async fn create_requires_session() {
    let app = spawn_app().await;
    let (status, _, _) = send(
        &app,
        json_request(
            "POST",
            "/api/posts",
            None,
            json!({ "title": "Hi", "desc": "<p>x</p>", "cat": "science", "img": "" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn post_lifecycle_with_ownership() {
    let app = spawn_app().await;
    let alice = login_as(&app, "alice").await;
    let bob = login_as(&app, "bob").await;

    let (status, _, created) = send(
        &app,
        json_request(
            "POST",
            "/api/posts",
            Some(&alice),
            json!({ "title": "Hi", "desc": "<p>World</p>", "cat": "science", "img": "" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["img"], Value::Null);
    let id = created["id"].as_str().unwrap().to_string();

    let (_, _, listed) = send(&app, get("/api/posts?cat=science", None)).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    let (_, _, listed) = send(&app, get("/api/posts?cat=technology", None)).await;
    assert!(listed.as_array().unwrap().is_empty());
    let (status, _, _) = send(&app, get("/api/posts?cat=cooking", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, details) = send(&app, get(&format!("/api/posts/{id}"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["username"], "alice");
    assert_eq!(details["title"], "Hi");

    let edit = json!({ "title": "Hijack", "desc": "x", "cat": "science", "img": "" });
    let (status, _, body) =
        send(&app, json_request("PUT", &format!("/api/posts/{id}"), Some(&bob), edit)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "You can only modify your own posts");

    let (status, _, _) = send(
        &app,
        json_request("DELETE", &format!("/api/posts/{id}"), Some(&bob), Value::Null),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let edit = json!({ "title": "Hello", "desc": "<p>World</p>", "cat": "technology", "img": "" });
    let (status, _, updated) =
        send(&app, json_request("PUT", &format!("/api/posts/{id}"), Some(&alice), edit)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Hello");
    assert_eq!(updated["cat"], "technology");
    assert_eq!(updated["date"], created["date"]);

    let (status, _, body) = send(
        &app,
        json_request("DELETE", &format!("/api/posts/{id}"), Some(&alice), Value::Null),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Post has been deleted");

    let (status, _, _) = send(&app, get(&format!("/api/posts/{id}"), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_owner_update_is_forbidden_even_with_invalid_body() {
    let app = spawn_app().await;
    let alice = login_as(&app, "alice").await;
    let bob = login_as(&app, "bob").await;

    let (_, _, created) = send(
        &app,
        json_request(
            "POST",
            "/api/posts",
            Some(&alice),
            json!({ "title": "Hi", "desc": "<p>World</p>", "cat": "science" }),
        ),
    )
    .await;
    let uri = format!("/api/posts/{}", created["id"].as_str().unwrap());

    for body in [
        json!({ "title": "x", "desc": "y", "cat": "cooking" }),
        json!({ "title": "x" }),
        json!({ "title": "", "desc": "y", "cat": "science" }),
    ] {
        let (status, _, resp) = send(&app, json_request("PUT", &uri, Some(&bob), body)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(resp["error"], "You can only modify your own posts");
    }

    // the owner still sees the payload problem
    let (status, _, resp) = send(
        &app,
        json_request("PUT", &uri, Some(&alice), json!({ "title": "x", "desc": "y", "cat": "cooking" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(resp["error"].is_string());

    let (status, _, _) = send(
        &app,
        json_request("PUT", &format!("/api/posts/{}", uuid::Uuid::new_v4()), Some(&bob), json!({ "title": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_post_id_is_bad_request() {
    let app = spawn_app().await;
    let (status, _, body) = send(&app, get("/api/posts/not-a-uuid", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn upload_without_file_field_is_rejected() {
    let app = spawn_app().await;
    let (status, _, body) = send(
        &app,
        multipart_request("/api/upload", None, "other", "cat.png", b"png"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file uploaded");
}

#[tokio::test]
async fn uploaded_file_is_served_back() {
    let app = spawn_app().await;
    let (status, _, body) = send(
        &app,
        multipart_request("/api/upload", None, "file", "my cat.png", b"\x89PNG-bytes"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let filename = body.as_str().unwrap().to_string();
    assert!(filename.ends_with("my_cat.png"));
    assert!(filename[..filename.len() - "my_cat.png".len()]
        .chars()
        .all(|c| c.is_ascii_digit()));

    let response = app
        .clone()
        .oneshot(get(&format!("/upload/{filename}"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"\x89PNG-bytes");
}

#[tokio::test]
async fn non_multipart_upload_gets_json_error() {
    let app = spawn_app().await;
    let req = Request::builder()
        .method("POST")
        .uri("/api/upload")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn oversized_upload_is_payload_too_large() {
    let mut config = test_config();
    config.upload_max_bytes = 256;
    let app = spawn_app_with(config).await;

    let (status, _, body) = send(
        &app,
        multipart_request("/api/upload", None, "file", "big.png", &[7u8; 4096]),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"], "File is too large");
}
