use std::sync::Arc;

use crate::{
    api::features::FeatureTable,
    config::{Config, Environment},
    db::Database,
};

/// Shared state handed to every handler and middleware
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Database,
    pub features: Arc<FeatureTable>,
}

impl AppState {
    pub fn environment(&self) -> Environment {
        self.config.environment()
    }
}
