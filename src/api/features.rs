//! Route modules and the startup capability table.
//!
//! Every route module declares what it needs (a database, a webhook secret)
//! and how its request bodies are handled. At startup each module is either
//! mounted or recorded as unavailable with a reason, so a missing
//! configuration value shows up in `/api/health` instead of as a silent 404.

use axum::routing::MethodRouter;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::{api::state::AppState, config::Config, db::Database, Result};

/// Something a route module needs before it can be mounted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Database,
    WebhookSecret,
}

impl Requirement {
    fn is_met(&self, config: &Config, db: &Database) -> bool {
        match self {
            Requirement::Database => db.is_configured(),
            Requirement::WebhookSecret => config.stripe_webhook_secret.is_some(),
        }
    }

    fn missing_reason(&self) -> &'static str {
        match self {
            Requirement::Database => "MONGO_URI not set",
            Requirement::WebhookSecret => "STRIPE_WEBHOOK_SECRET not set",
        }
    }
}

/// Whether a module's requests pass through the body parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyHandling {
    /// JSON and URL-encoded bodies are parsed into [`ParsedBody`](crate::api::middleware::ParsedBody)
    Parsed,
    /// Handlers receive the bytes exactly as sent
    Raw,
}

/// Routes of a module, keyed by path relative to its mount path
///
/// Each path appears once; combine methods on its `MethodRouter`. The
/// connection gate and body parser wrap the method handlers only, so a
/// method the path doesn't serve never runs them.
pub type ModuleRoutes = Vec<(&'static str, MethodRouter<AppState>)>;

/// A group of routes mounted under one path prefix
pub trait RouteModule: Send + Sync {
    fn name(&self) -> &'static str;

    fn mount_path(&self) -> &'static str;

    fn requirements(&self) -> &'static [Requirement] {
        &[Requirement::Database]
    }

    fn body(&self) -> BodyHandling {
        BodyHandling::Parsed
    }

    fn routes(&self) -> Result<ModuleRoutes>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureStatus {
    pub name: &'static str,
    pub path: &'static str,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Startup-time table of which route modules are mounted
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct FeatureTable {
    entries: Vec<FeatureStatus>,
}

/// Routes of an available module, ready to be mounted
pub struct MountedRoutes {
    pub name: &'static str,
    pub path: &'static str,
    pub body: BodyHandling,
    pub routes: ModuleRoutes,
}

impl FeatureTable {
    /// Decides which modules can be mounted and builds their routes
    ///
    /// A module whose requirements aren't met, or whose routes fail to
    /// build, is recorded as unavailable; the remaining modules still mount.
    pub fn resolve(
        config: &Config,
        db: &Database,
        modules: Vec<Box<dyn RouteModule>>,
    ) -> (Self, Vec<MountedRoutes>) {
        if !db.is_configured() {
            warn!("MONGO_URI not found, running in limited mode");
        }

        let mut entries = Vec::with_capacity(modules.len());
        let mut mounted = Vec::new();

        for module in modules {
            let name = module.name();
            let path = module.mount_path();

            let missing: Vec<&str> = module
                .requirements()
                .iter()
                .filter(|req| !req.is_met(config, db))
                .map(Requirement::missing_reason)
                .collect();

            if !missing.is_empty() {
                let reason = missing.join(", ");
                warn!(module = name, %reason, "Skipping route module");
                entries.push(FeatureStatus {
                    name,
                    path,
                    available: false,
                    reason: Some(reason),
                });
                continue;
            }

            match module.routes() {
                Ok(routes) => {
                    entries.push(FeatureStatus {
                        name,
                        path,
                        available: true,
                        reason: None,
                    });
                    mounted.push(MountedRoutes {
                        name,
                        path,
                        body: module.body(),
                        routes,
                    });
                }
                Err(err) => {
                    error!(module = name, error = %err, "Error loading routes");
                    entries.push(FeatureStatus {
                        name,
                        path,
                        available: false,
                        reason: Some(format!("failed to load: {err}")),
                    });
                }
            }
        }

        let table = Self { entries };
        if table.unavailable().next().is_none() {
            info!("All routes loaded successfully");
        } else {
            info!(
                "{} of {} route modules loaded",
                mounted.len(),
                table.entries.len()
            );
        }

        (table, mounted)
    }

    pub fn get(&self, name: &str) -> Option<&FeatureStatus> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn is_available(&self, name: &str) -> bool {
        self.get(name).is_some_and(|entry| entry.available)
    }

    pub fn unavailable(&self) -> impl Iterator<Item = &FeatureStatus> {
        self.entries.iter().filter(|entry| !entry.available)
    }
}
