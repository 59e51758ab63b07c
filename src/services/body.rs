use axum::http::{header::CONTENT_TYPE, HeaderMap};
use serde_json::{Map, Value};

use crate::errors::ApiError;

/// Request body encodings parsed before dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Json,
    UrlEncoded,
}

impl BodyKind {
    /// Determines the encoding from the `Content-Type` header
    ///
    /// # Returns
    /// * `Option<BodyKind>` - None for bodies that pass through unparsed
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let content_type = headers.get(CONTENT_TYPE)?.to_str().ok()?;
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
        {
            Some(BodyKind::Json)
        } else if mime == "application/x-www-form-urlencoded" {
            Some(BodyKind::UrlEncoded)
        } else {
            None
        }
    }
}

/// Parses a buffered body into a JSON value
///
/// An empty JSON body parses to `{}`. Repeated form keys collect into an array.
pub fn parse_body(kind: BodyKind, bytes: &[u8]) -> Result<Value, ApiError> {
    match kind {
        BodyKind::Json => {
            if bytes.iter().all(u8::is_ascii_whitespace) {
                return Ok(Value::Object(Map::new()));
            }
            serde_json::from_slice(bytes).map_err(|e| ApiError::InvalidBody(e.to_string()))
        }
        BodyKind::UrlEncoded => {
            let mut fields = Map::new();
            for (key, value) in url::form_urlencoded::parse(bytes).into_owned() {
                let value = Value::String(value);
                match fields.get_mut(&key) {
                    Some(Value::Array(values)) => values.push(value),
                    Some(existing) => {
                        let first = existing.take();
                        *existing = Value::Array(vec![first, value]);
                    }
                    None => {
                        fields.insert(key, value);
                    }
                }
            }
            Ok(Value::Object(fields))
        }
    }
}
