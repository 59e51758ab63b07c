use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    api::{features::FeatureTable, state::AppState},
    db::ConnectionState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerMode {
    Full,
    Limited,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub environment: String,
    pub message: &'static str,
    pub mongo_uri_set: bool,
    pub mode: ServerMode,
    pub database: ConnectionState,
    pub features: FeatureTable,
}

/// Health check endpoint
///
/// # Endpoint: GET /api/health
///
/// Never touches the database: the connection state is read without waiting
/// and the route sits outside the connection gate.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let mode = if state.db.is_configured() {
        ServerMode::Full
    } else {
        ServerMode::Limited
    };

    let health = HealthResponse {
        status: "OK",
        timestamp: Utc::now(),
        environment: state.environment().to_string(),
        message: "Server is running",
        mongo_uri_set: state.config.has_database(),
        mode,
        database: state.db.state(),
        features: state.features.as_ref().clone(),
    };

    (StatusCode::OK, Json(health))
}
