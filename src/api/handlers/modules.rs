use axum::Json;
use serde::Serialize;

use crate::{api::state::AppState, Result};

#[derive(Debug, Serialize)]
pub struct ModuleInfo {
    pub module: &'static str,
    pub path: &'static str,
    pub status: &'static str,
    /// Default database named in the connection string, if any
    pub database: Option<String>,
}

/// Describes a mounted route module
///
/// # Endpoint: GET <mount path>
pub async fn module_index(
    module: &'static str,
    path: &'static str,
    state: AppState,
) -> Result<Json<ModuleInfo>> {
    let client = state.db.client().await?;

    Ok(Json(ModuleInfo {
        module,
        path,
        status: "available",
        database: client.default_database().map(|db| db.name().to_string()),
    }))
}
