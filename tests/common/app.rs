//! Test application factories for integration tests.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use http_body_util::BodyExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use url::Url;

use signedurl::models::{AppConfig, ConfigFile};
use signedurl::server::{build_router, create_app_state};
use signedurl::AccessGate;

use super::fixtures::{self, files, KEY};

/// Full application router serving a temporary directory
pub struct TestApp {
    router: Router,
    pub config: AppConfig,
    _files_dir: TempDir,
}

impl TestApp {
    /// Create a new test application with base URL `https://h/`
    pub fn new() -> Self {
        Self::with_base_url(fixtures::BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        let files_dir = tempfile::tempdir().expect("Failed to create temp dir");
        std::fs::write(files_dir.path().join(files::HELLO), files::HELLO_CONTENT)
            .expect("Failed to write fixture");
        let nested = files_dir.path().join(files::NESTED);
        std::fs::create_dir_all(nested.parent().unwrap()).expect("Failed to create dirs");
        std::fs::write(&nested, files::NESTED_CONTENT).expect("Failed to write fixture");

        let env = fixtures::test_env(base_url, files_dir.path().to_str().unwrap());
        let config =
            AppConfig::from_sources(ConfigFile::default(), env).expect("Failed to build config");

        let router = build_router(create_app_state(config.clone()));

        Self {
            router,
            config,
            _files_dir: files_dir,
        }
    }

    /// Make a GET request to the given request target
    pub async fn get(&self, target: &str) -> TestResponse {
        send(&self.router, target).await
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// A single handler behind the gate that counts how often it runs
pub struct GatedHandler {
    router: Router,
    calls: Arc<AtomicUsize>,
}

impl GatedHandler {
    pub fn new(base_url: &str) -> Self {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let handler = move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                "success"
            }
        };

        let gate = AccessGate::new(Url::parse(base_url).expect("Invalid base URL"), KEY);
        let router = Router::new()
            .route("/", get(handler.clone()))
            .route("/*path", get(handler))
            .layer(gate);

        Self { router, calls }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn get(&self, target: &str) -> TestResponse {
        send(&self.router, target).await
    }
}

async fn send(router: &Router, target: &str) -> TestResponse {
    let request = Request::get(target).body(Body::empty()).unwrap();
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("Request failed");

    let status = response.status();
    let headers = response.headers().clone();
    let body = response
        .into_body()
        .collect()
        .await
        .expect("Failed to collect body")
        .to_bytes()
        .to_vec();

    TestResponse {
        status,
        headers,
        body,
    }
}

/// Test response with convenience methods
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Get body as string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}
