//! Shared helpers for router-level tests.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, HeaderMap, Request, StatusCode},
    routing::{get, post},
    Json, Router,
};
use mongodb::Client;
use serde_json::Value;
use std::time::Duration;
use tower::ServiceExt;

use storefront_api::{
    api::{ModuleRoutes, ParsedBody, Requirement, RouteModule},
    config::Config,
    db::Database,
    errors::ApiError,
    Result,
};

pub const WEBHOOK_SECRET: &str = "whsec_test_secret";

pub fn dev_config() -> Config {
    Config::default()
}

pub fn production_config(frontend_url: Option<&str>) -> Config {
    Config {
        node_env: Some("production".into()),
        frontend_url: frontend_url.map(str::to_string),
        ..Default::default()
    }
}

/// Client handle that is treated as connected without a running server
pub async fn preconnected_database() -> Database {
    let client = Client::with_uri_str("mongodb://127.0.0.1:27017/shop")
        .await
        .expect("client options should parse");
    Database::with_client(client)
}

/// Configured database whose server never answers
pub fn unreachable_database() -> Database {
    Database::with_config(
        Some("mongodb://127.0.0.1:1/shop?directConnection=true"),
        Duration::from_millis(200),
    )
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post_request(uri: &str, content_type: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, content_type)
        .body(body.into())
        .unwrap()
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub async fn send(app: Router, request: Request<Body>) -> TestResponse {
    let response = app.oneshot(request).await.expect("failed to make request");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = hyper::body::to_bytes(response.into_body())
        .await
        .expect("failed to read response body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body should be valid JSON")
    };

    TestResponse {
        status,
        headers,
        body,
    }
}

/// Echoes the parsed body back; mounts without a database
pub struct EchoModule;

impl RouteModule for EchoModule {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn mount_path(&self) -> &'static str {
        "/api/echo"
    }

    fn requirements(&self) -> &'static [Requirement] {
        &[]
    }

    fn routes(&self) -> Result<ModuleRoutes> {
        Ok(vec![
            (
                "/",
                post(|ParsedBody(body): ParsedBody| async move { Json(body) }),
            ),
            (
                "/raw",
                post(|body: String| async move { Json(Value::String(body)) }),
            ),
        ])
    }
}

/// Routes that fail in the ways handlers can fail
pub struct FaultyModule;

impl RouteModule for FaultyModule {
    fn name(&self) -> &'static str {
        "faulty"
    }

    fn mount_path(&self) -> &'static str {
        "/api/faulty"
    }

    fn requirements(&self) -> &'static [Requirement] {
        &[]
    }

    fn routes(&self) -> Result<ModuleRoutes> {
        Ok(vec![
            (
                "/error",
                get(|| async {
                    Err::<Json<Value>, _>(ApiError::Custom("inventory lookup failed".into()))
                }),
            ),
            ("/panic", get(panicking_handler)),
            (
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Json(Value::Null)
                }),
            ),
        ])
    }
}

async fn panicking_handler() -> Json<Value> {
    panic!("cart total overflowed")
}

/// Module whose router can't be built
pub struct BrokenModule;

impl RouteModule for BrokenModule {
    fn name(&self) -> &'static str {
        "chat"
    }

    fn mount_path(&self) -> &'static str {
        "/api/chat"
    }

    fn routes(&self) -> Result<ModuleRoutes> {
        Err(ApiError::Custom("socket registry unavailable".into()))
    }
}
