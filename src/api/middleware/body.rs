use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, State},
    http::{header::CONTENT_LENGTH, request::Parts, Request},
    middleware::Next,
    response::Response,
};
use http_body::{LengthLimitError, Limited};
use serde_json::Value;
use std::convert::Infallible;

use crate::{
    api::state::AppState,
    errors::ApiError,
    services::{parse_body, BodyKind},
};

/// Request payload parsed from a JSON or URL-encoded body
///
/// Requests without a parsed body extract as `Value::Null`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedBody(pub Value);

#[async_trait]
impl<S> FromRequestParts<S> for ParsedBody
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<ParsedBody>()
            .cloned()
            .unwrap_or(ParsedBody(Value::Null)))
    }
}

/// Buffers and parses JSON and URL-encoded bodies up to the configured limit
///
/// The buffered bytes are put back on the request so handlers can still
/// extract the body themselves.
pub async fn parse_request_body(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next<Body>,
) -> Result<Response, ApiError> {
    let Some(kind) = BodyKind::from_headers(req.headers()) else {
        return Ok(next.run(req).await);
    };

    let limit = state.config.body_limit_bytes;
    let declared_length = req
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<usize>().ok());
    if declared_length.is_some_and(|length| length > limit) {
        return Err(ApiError::PayloadTooLarge { limit });
    }

    let (mut parts, body) = req.into_parts();
    let bytes = hyper::body::to_bytes(Limited::new(body, limit))
        .await
        .map_err(|err| {
            if err.downcast_ref::<LengthLimitError>().is_some() {
                ApiError::PayloadTooLarge { limit }
            } else {
                ApiError::InvalidBody(err.to_string())
            }
        })?;

    let parsed = parse_body(kind, &bytes)?;
    parts.extensions.insert(ParsedBody(parsed));

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}
