use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    BoxError,
};
use std::any::Any;
use tracing::{error, warn};

use crate::{
    api::{handlers::route_not_found, state::AppState},
    errors::{ApiError, ErrorReport},
};

/// Terminal error stage
///
/// Renders every [`ErrorReport`] attached by [`ApiError`] into the JSON
/// envelope, with detail gated by the environment, and turns method
/// mismatches on known paths into the same 404 as unknown paths.
pub async fn render_errors(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next<Body>,
) -> Response {
    let path = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let method = req.method().clone();

    let mut response = next.run(req).await;

    if let Some(report) = response.extensions_mut().remove::<ErrorReport>() {
        if report.status.is_server_error() {
            error!(%method, %path, status = %report.status, error = %report.detail, "Unhandled error");
        } else {
            warn!(%method, %path, status = %report.status, error = %report.detail, "Request rejected");
        }
        return report.render(&state.environment());
    }

    if response.status() == StatusCode::METHOD_NOT_ALLOWED {
        return route_not_found(&path);
    }

    response
}

/// Converts errors raised by tower middleware (timeouts) into API errors
pub async fn handle_middleware_error(err: BoxError) -> ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        ApiError::Timeout
    } else {
        ApiError::Custom(format!("Unhandled error: {}", err))
    }
}

/// Converts a handler panic into a 500
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    ApiError::Panic(detail).into_response()
}
