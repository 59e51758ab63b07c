use anyhow::Context;
use serde_json::Value;
use std::fs;
use tracing::info;
use tracing_appender::rolling;
use tracing_subscriber::filter::{EnvFilter, LevelFilter, Targets};
use tracing_subscriber::{fmt, layer::SubscriberExt, Layer, Registry};

use crate::config::Config;

/// Target routed to the rotating audit log file
pub const AUDIT_TARGET: &str = "webhook_audit";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

pub fn setup_logging(config: &Config) -> Result<(), anyhow::Error> {
    fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("Failed to create logs directory {}", config.log_dir))?;

    // Daily rotating file appender
    let file_appender = rolling::daily(&config.log_dir, "app.log");

    // Only the audit target lands in the file
    let target_filter = Targets::new().with_target(AUDIT_TARGET, LevelFilter::TRACE);

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_filter(target_filter);

    // Structured stdout for log collectors in production, human readable otherwise
    let json = config.environment().is_production();
    let stdout_json = json.then(|| {
        fmt::layer()
            .json()
            .with_writer(std::io::stdout)
            .with_filter(env_filter())
    });
    let stdout_text = (!json).then(|| {
        fmt::layer()
            .with_writer(std::io::stdout)
            .with_filter(env_filter())
    });

    let subscriber = Registry::default()
        .with(file_layer)
        .with(stdout_json)
        .with(stdout_text);

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set global default subscriber")?;

    Ok(())
}

/// Records a verified Stripe event in the audit log
///
/// Only identifiers are written; the event payload can carry customer details.
pub fn audit_webhook_event(event_id: &str, event_type: &str, livemode: bool, data: &Value) {
    let object = data.get("object");
    let field = |name: &str| {
        object
            .and_then(|o| o.get(name))
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string()
    };

    info!(
        target: AUDIT_TARGET,
        event_id,
        event_type,
        livemode,
        object_type = %field("object"),
        object_id = %field("id"),
        "Stripe webhook event verified"
    );
}
