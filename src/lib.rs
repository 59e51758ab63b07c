//! HTTP entrypoint for the storefront backend.
//!
//! Boots with or without a database: when `MONGO_URI` is missing the server
//! runs in limited mode and only the health, diagnostics and 404 surfaces
//! respond.

pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod logging;
pub mod services;
pub mod validation;

/// Result type for API
pub type Result<T> = std::result::Result<T, errors::ApiError>;
