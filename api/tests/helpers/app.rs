use api::{auth::generate_jwt, routes::routes, state::AppState};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use chrono::{TimeZone, Utc};
use db::test_utils::setup_test_db;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use services::active_sessions::ActiveSessionRegistry;
use services::image_store::{ImageStore, LocalImageStore};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use util::clock::ManualClock;
use util::config::AppConfig;
use util::test_helpers::setup_test_image_root;

pub const TEST_SECRET: &str = "test-secret";
pub const BOUNDARY: &str = "----geo-attend-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub db: DatabaseConnection,
    pub registry: ActiveSessionRegistry,
    pub clock: ManualClock,
    pub images: TempDir,
}

/// Router over a fresh in-memory database, a manual clock and a temporary image root.
///
/// Resets the global config, so callers must be `#[serial]`.
pub async fn make_test_app() -> TestApp {
    make_test_app_with(|| {}).await
}

/// Like [`make_test_app`], with extra config applied before the services read it.
pub async fn make_test_app_with(configure: impl FnOnce()) -> TestApp {
    AppConfig::reset();
    AppConfig::set_env("test");
    AppConfig::set_jwt_secret(TEST_SECRET);
    AppConfig::set_demo_mode(false);
    let images = setup_test_image_root();
    configure();

    let db = setup_test_db().await;
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap());
    let registry = ActiveSessionRegistry::new(Arc::new(clock.clone()));
    let store: Arc<dyn ImageStore> = Arc::new(LocalImageStore::from_config());
    let state = AppState::from_parts(db.clone(), registry.clone(), store);

    TestApp {
        router: routes(state),
        db,
        registry,
        clock,
        images,
    }
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or(Value::Null)
        };
        (status, json)
    }
}

pub fn token_for(email: &str) -> String {
    generate_jwt(email, None).unwrap().0
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

/// Multipart body with the given text fields and, optionally, an `image` file part.
pub fn multipart_body(fields: &[(&str, &str)], image: Option<&[u8]>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                .as_bytes(),
        );
    }
    if let Some(bytes) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"selfie.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_request(uri: &str, token: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}
