//! Request body parsing tests.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{dev_config, post_request, production_config, send, EchoModule};
use storefront_api::{api::AppBuilder, config::Config};

#[tokio::test]
async fn json_body_is_parsed() {
    let app = AppBuilder::new(dev_config()).module(EchoModule).build();

    let response = send(
        app,
        post_request(
            "/api/echo",
            "application/json; charset=utf-8",
            r#"{"sku":"TSHIRT-M","quantity":2}"#,
        ),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({ "sku": "TSHIRT-M", "quantity": 2 }));
}

#[tokio::test]
async fn empty_json_body_parses_to_empty_object() {
    let app = AppBuilder::new(dev_config()).module(EchoModule).build();

    let response = send(app, post_request("/api/echo", "application/json", "")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({}));
}

#[tokio::test]
async fn urlencoded_body_is_parsed() {
    let app = AppBuilder::new(dev_config()).module(EchoModule).build();

    let response = send(
        app,
        post_request(
            "/api/echo",
            "application/x-www-form-urlencoded",
            "email=ada%40example.com&tag=new&tag=vip",
        ),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body,
        json!({ "email": "ada@example.com", "tag": ["new", "vip"] })
    );
}

#[tokio::test]
async fn other_content_types_pass_through_unparsed() {
    let app = AppBuilder::new(dev_config()).module(EchoModule).build();

    let response = send(app, post_request("/api/echo", "text/plain", "hello")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, serde_json::Value::Null);
}

#[tokio::test]
async fn handlers_can_still_read_the_buffered_body() {
    let app = AppBuilder::new(dev_config()).module(EchoModule).build();

    let response = send(
        app,
        post_request("/api/echo/raw", "application/json", r#"{ "a":  1 }"#),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!(r#"{ "a":  1 }"#));
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let app = AppBuilder::new(dev_config()).module(EchoModule).build();

    let response = send(
        app,
        post_request("/api/echo", "application/json", r#"{"sku": "#),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Invalid request body");
    assert!(response.body["message"].is_string());
}

#[tokio::test]
async fn malformed_json_in_production_omits_message() {
    let app = AppBuilder::new(production_config(Some("https://shop.example.com")))
        .module(EchoModule)
        .build();

    let response = send(app, post_request("/api/echo", "application/json", "[1,")).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body, json!({ "error": "Invalid request body" }));
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let config = Config {
        body_limit_bytes: 64,
        ..dev_config()
    };
    let app = AppBuilder::new(config).module(EchoModule).build();
    let payload = json!({ "note": "x".repeat(256) }).to_string();

    let response = send(app, post_request("/api/echo", "application/json", payload)).await;

    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.body["error"], "Payload too large");
}

#[tokio::test]
async fn body_at_the_limit_is_accepted() {
    let payload = json!({ "note": "x".repeat(50) }).to_string();
    let config = Config {
        body_limit_bytes: payload.len(),
        ..dev_config()
    };
    let app = AppBuilder::new(config).module(EchoModule).build();

    let response = send(app, post_request("/api/echo", "application/json", payload)).await;

    assert_eq!(response.status, StatusCode::OK);
}
