//! Request middleware, outermost concerns first:
//! - error rendering and method-mismatch 404s
//! - database connection gating
//! - body parsing

pub mod body;
pub mod database;
pub mod errors;

pub use body::{parse_request_body, ParsedBody};
pub use database::ensure_database;
pub use errors::{handle_middleware_error, handle_panic, render_errors};
