use axum::{
    error_handling::HandleErrorLayer,
    extract::DefaultBodyLimit,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware::from_fn_with_state,
    routing::{get, MethodRouter},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{warn, Level};

use super::{
    features::{BodyHandling, FeatureTable, MountedRoutes, RouteModule},
    handlers::{health_check, not_found, test_endpoint},
    middleware::{
        ensure_database, handle_middleware_error, handle_panic, parse_request_body, render_errors,
    },
    state::AppState,
};
use crate::{config::Config, db::Database};

/// Assembles the application router from configuration and route modules
pub struct AppBuilder {
    config: Config,
    database: Option<Database>,
    modules: Vec<Box<dyn RouteModule>>,
}

impl AppBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            database: None,
            modules: Vec::new(),
        }
    }

    /// Uses an existing database handle instead of one built from `MONGO_URI`
    pub fn database(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }

    pub fn module(mut self, module: impl RouteModule + 'static) -> Self {
        self.modules.push(Box::new(module));
        self
    }

    pub fn modules(mut self, modules: Vec<Box<dyn RouteModule>>) -> Self {
        self.modules.extend(modules);
        self
    }

    /// Resolves the capability table, mounts available modules and applies the middleware stack
    pub fn build(self) -> Router {
        let db = self
            .database
            .unwrap_or_else(|| Database::from_config(&self.config));
        let (features, mounted) = FeatureTable::resolve(&self.config, &db, self.modules);

        let state = AppState {
            config: Arc::new(self.config),
            db,
            features: Arc::new(features),
        };

        initialize_router(state, mounted)
    }
}

/// Builds the CORS policy for the configured environment
pub fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins()
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring CORS origin that is not a valid header value");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        warn!("FRONTEND_URL not set, cross-origin requests will be rejected");
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
}

/// Joins a module mount path with a route path relative to it
fn join_path(mount: &str, path: &str) -> String {
    match path.trim_start_matches('/') {
        "" => mount.to_string(),
        rest => format!("{}/{}", mount.trim_end_matches('/'), rest),
    }
}

/// Composes routes and middleware
///
/// Requests flow through:
/// 1. request id, tracing, CORS and compression
/// 2. error rendering (envelope, method-mismatch 404s)
/// 3. timeout and panic recovery
/// 4. database gate (every route except health and the 404 fallback)
/// 5. body parsing (every route except raw-body modules)
///
/// The gates wrap each method handler rather than the whole path, so a
/// request whose method the path doesn't serve goes straight to the 404.
pub fn initialize_router(state: AppState, mounted: Vec<MountedRoutes>) -> Router {
    let config = state.config.clone();
    let parse_body = from_fn_with_state(state.clone(), parse_request_body);
    let require_database = from_fn_with_state(state.clone(), ensure_database);

    let gate = |route: MethodRouter<AppState>, body: BodyHandling| {
        let route = match body {
            BodyHandling::Parsed => route.route_layer(parse_body.clone()),
            BodyHandling::Raw => route,
        };
        route.route_layer(require_database.clone())
    };

    let mut router = Router::new()
        .route("/api/health", get(health_check))
        .route("/api/test", gate(get(test_endpoint), BodyHandling::Parsed));

    for MountedRoutes {
        path: mount,
        body,
        routes,
        ..
    } in mounted
    {
        for (path, route) in routes {
            router = router.route(&join_path(mount, path), gate(route, body));
        }
    }

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().include_headers(true))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    router
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(trace_layer)
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors_layer(&config))
                .layer(CompressionLayer::new().zstd(true))
                .layer(from_fn_with_state(state.clone(), render_errors))
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .timeout(config.request_timeout())
                .layer(CatchPanicLayer::custom(handle_panic))
                .layer(DefaultBodyLimit::max(config.body_limit_bytes)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("/api/products", "/"), "/api/products");
        assert_eq!(join_path("/api/products", ""), "/api/products");
        assert_eq!(join_path("/api/products", "/:id"), "/api/products/:id");
        assert_eq!(join_path("/api/cart/", "items"), "/api/cart/items");
    }
}
