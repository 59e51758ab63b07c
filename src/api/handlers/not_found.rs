use axum::{
    extract::OriginalUri,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::ErrorMessages;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotFoundResponse {
    pub error: String,
    pub path: String,
}

/// Fallback for any request no mounted route matches
pub async fn not_found(OriginalUri(uri): OriginalUri) -> Response {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    route_not_found(path)
}

/// 404 response echoing the requested path and query
pub fn route_not_found(path: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(NotFoundResponse {
            error: ErrorMessages::RouteNotFound.to_string(),
            path: path.to_string(),
        }),
    )
        .into_response()
}
