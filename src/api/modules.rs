use axum::{
    extract::State,
    routing::{get, post},
};

use super::{
    features::{BodyHandling, ModuleRoutes, Requirement, RouteModule},
    handlers::{handle_stripe_webhook, module_index, stripe_webhook::WEBHOOK_PATH},
    state::AppState,
};
use crate::Result;

/// Storefront feature mounted under `/api/<name>`
pub struct FeatureModule {
    name: &'static str,
    path: &'static str,
}

impl FeatureModule {
    pub const fn new(name: &'static str, path: &'static str) -> Self {
        Self { name, path }
    }
}

impl RouteModule for FeatureModule {
    fn name(&self) -> &'static str {
        self.name
    }

    fn mount_path(&self) -> &'static str {
        self.path
    }

    fn routes(&self) -> Result<ModuleRoutes> {
        let (name, path) = (self.name, self.path);
        Ok(vec![(
            "/",
            get(move |State(state): State<AppState>| module_index(name, path, state)),
        )])
    }
}

/// Stripe webhook endpoint; handlers see the raw body
pub struct StripeWebhookModule;

impl RouteModule for StripeWebhookModule {
    fn name(&self) -> &'static str {
        "stripe_webhook"
    }

    fn mount_path(&self) -> &'static str {
        WEBHOOK_PATH
    }

    fn requirements(&self) -> &'static [Requirement] {
        &[Requirement::Database, Requirement::WebhookSecret]
    }

    fn body(&self) -> BodyHandling {
        BodyHandling::Raw
    }

    fn routes(&self) -> Result<ModuleRoutes> {
        Ok(vec![("/", post(handle_stripe_webhook))])
    }
}

const FEATURES: [FeatureModule; 8] = [
    FeatureModule::new("auth", "/api/auth"),
    FeatureModule::new("users", "/api/users"),
    FeatureModule::new("password", "/api/password"),
    FeatureModule::new("products", "/api/products"),
    FeatureModule::new("orders", "/api/orders"),
    FeatureModule::new("cart", "/api/cart"),
    FeatureModule::new("chat", "/api/chat"),
    FeatureModule::new("payment", "/api/payment"),
];

/// Route modules mounted by the storefront server
pub fn standard_modules() -> Vec<Box<dyn RouteModule>> {
    let mut modules: Vec<Box<dyn RouteModule>> = vec![Box::new(StripeWebhookModule)];
    modules.extend(
        FEATURES
            .into_iter()
            .map(|module| Box::new(module) as Box<dyn RouteModule>),
    );
    modules
}
