//! API module containing route handlers and initialization logic
//!
//! This module is responsible for:
//! - Resolving which route modules can be mounted
//! - Composing the middleware stack
//! - Serving health, diagnostics and the 404 fallback

/// Route module trait and the startup capability table
pub mod features;

/// Route handlers for the entrypoint's own endpoints
pub mod handlers;

/// Router initialization and configuration
pub mod init;

/// Body parsing, database gating and error rendering
pub mod middleware;

/// Storefront route modules
pub mod modules;

/// Shared application state
pub mod state;

pub use features::{
    BodyHandling, FeatureStatus, FeatureTable, ModuleRoutes, Requirement, RouteModule,
};
pub use init::{initialize_router, AppBuilder};
pub use middleware::ParsedBody;
pub use modules::standard_modules;
pub use state::AppState;
