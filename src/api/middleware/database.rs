use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::{api::state::AppState, errors::ApiError};

/// Connects to the database before any gated route runs
///
/// Without a connection string the request passes straight through. A failed
/// connection short-circuits with a 500 before route logic executes; the
/// error stage logs it.
pub async fn ensure_database(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next<Body>,
) -> Result<Response, ApiError> {
    state.db.ensure_connected().await?;
    Ok(next.run(req).await)
}
