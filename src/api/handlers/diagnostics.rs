use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct TestResponse {
    pub message: &'static str,
    pub timestamp: DateTime<Utc>,
}

// Route handler for GET /api/test, reachable in limited mode too
pub async fn test_endpoint() -> Json<TestResponse> {
    Json(TestResponse {
        message: "Test endpoint working",
        timestamp: Utc::now(),
    })
}
