//! API request handlers.
//! Feature modules mount their own routers; the handlers here cover the
//! entrypoint itself.

pub mod diagnostics; // GET /api/test
pub mod health; // GET /api/health
pub mod modules; // Mounted module descriptor
pub mod not_found; // Catch-all 404
pub mod stripe_webhook; // Raw-body payment webhook

pub(crate) use diagnostics::test_endpoint;
pub(crate) use health::health_check;
pub(crate) use modules::module_index;
pub(crate) use not_found::{not_found, route_not_found};
pub(crate) use stripe_webhook::handle_stripe_webhook;
