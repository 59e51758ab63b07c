use serde::Deserialize;
use std::{fmt, net::SocketAddr, time::Duration};
use thiserror::Error;

use crate::validation::validate_origin;

/// Origins allowed by CORS outside production
pub const LOCAL_DEV_ORIGINS: [&str; 6] = [
    "http://localhost:5173",
    "http://localhost:5174",
    "http://localhost:5175",
    "http://localhost:5177",
    "http://localhost:5178",
    "http://localhost:5179",
];

const DEFAULT_PORT: u16 = 3003;
const DEFAULT_BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Env(#[from] envy::Error),

    #[error("Invalid FRONTEND_URL: {0}")]
    FrontendUrl(String),

    #[error("Invalid bind address {0}")]
    BindAddress(String),

    #[error("BODY_LIMIT_BYTES must be greater than zero")]
    BodyLimit,

    #[error("REQUEST_TIMEOUT_SECS must be greater than zero")]
    RequestTimeout,

    #[error("WEBHOOK_TOLERANCE_SECS must not be negative, got {0}")]
    WebhookTolerance(i64),
}

/// Configuration for the API server
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    /// Deployment environment name, `development` when unset
    pub node_env: Option<String>,
    /// MongoDB connection string; limited mode when unset
    pub mongo_uri: Option<String>,
    /// Frontend origin allowed by CORS in production
    pub frontend_url: Option<String>,
    /// Interface to bind outside production
    pub host: String,
    /// Port to run the server on
    pub port: u16,
    /// Signing secret for the Stripe webhook endpoint
    pub stripe_webhook_secret: Option<String>,
    /// Maximum age of a signed webhook timestamp
    pub webhook_tolerance_secs: i64,
    /// Ceiling for JSON, URL-encoded and raw webhook bodies
    pub body_limit_bytes: usize,
    pub request_timeout_secs: u64,
    /// Server selection timeout used when the connection string doesn't set one
    pub db_connect_timeout_secs: u64,
    /// Directory for the rotating audit log
    pub log_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node_env: None,
            mongo_uri: None,
            frontend_url: None,
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            stripe_webhook_secret: None,
            webhook_tolerance_secs: 300,
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
            request_timeout_secs: 30,
            db_connect_timeout_secs: 10,
            log_dir: "logs".to_string(),
        }
    }
}

/// Deployment environment derived from `NODE_ENV`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Other(String),
}

impl Environment {
    pub fn from_name(name: Option<&str>) -> Self {
        match name.map(str::trim) {
            None | Some("") | Some("development") => Environment::Development,
            Some("production") => Environment::Production,
            Some(other) => Environment::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Other(name) => name,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// Error responses carry the underlying message only in development
    pub fn exposes_error_details(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How the process serves requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupMode {
    /// Bind a socket and listen
    Listen(SocketAddr),
    /// Hand the router to an external serverless runtime
    Serverless,
}

impl Config {
    /// Loads configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Config = envy::from_iter(vars)?;
        let config = config.normalized();
        config.validate()?;
        Ok(config)
    }

    // `MONGO_URI=` in a .env file means unset
    fn normalized(mut self) -> Self {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        self.node_env = non_empty(self.node_env);
        self.mongo_uri = non_empty(self.mongo_uri);
        self.frontend_url = non_empty(self.frontend_url);
        self.stripe_webhook_secret = non_empty(self.stripe_webhook_secret);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.frontend_url {
            validate_origin(url).map_err(ConfigError::FrontendUrl)?;
        }
        if self.body_limit_bytes == 0 {
            return Err(ConfigError::BodyLimit);
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::RequestTimeout);
        }
        if self.webhook_tolerance_secs < 0 {
            return Err(ConfigError::WebhookTolerance(self.webhook_tolerance_secs));
        }
        Ok(())
    }

    pub fn environment(&self) -> Environment {
        Environment::from_name(self.node_env.as_deref())
    }

    pub fn has_database(&self) -> bool {
        self.mongo_uri.is_some()
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().map_err(|_| ConfigError::BindAddress(addr))
    }

    /// HOST and PORT are only checked when the process binds a socket
    pub fn startup_mode(&self) -> Result<StartupMode, ConfigError> {
        if self.environment().is_production() {
            Ok(StartupMode::Serverless)
        } else {
            Ok(StartupMode::Listen(self.bind_addr()?))
        }
    }

    /// CORS allow-list for the configured environment
    ///
    /// Production allows only `FRONTEND_URL`; an unset frontend yields an
    /// empty list since a wildcard can't be combined with credentials.
    pub fn cors_origins(&self) -> Vec<String> {
        if self.environment().is_production() {
            self.frontend_url
                .iter()
                .map(|url| url.trim_end_matches('/').to_string())
                .collect()
        } else {
            LOCAL_DEV_ORIGINS.iter().map(|o| o.to_string()).collect()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn db_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.db_connect_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = Config::from_vars(Vec::new()).unwrap();
        assert_eq!(config.environment(), Environment::Development);
        assert_eq!(config.port, 3003);
        assert_eq!(config.body_limit_bytes, 10 * 1024 * 1024);
        assert!(!config.has_database());
        assert_eq!(
            config.startup_mode().unwrap(),
            StartupMode::Listen("0.0.0.0:3003".parse().unwrap())
        );
    }

    #[test]
    fn test_reads_node_style_variables() {
        let config = Config::from_vars(vars(&[
            ("NODE_ENV", "production"),
            ("MONGO_URI", "mongodb://db.internal:27017/shop"),
            ("FRONTEND_URL", "https://shop.example.com/"),
            ("PORT", "8080"),
        ]))
        .unwrap();

        assert!(config.environment().is_production());
        assert!(config.has_database());
        assert_eq!(config.port, 8080);
        assert_eq!(config.startup_mode().unwrap(), StartupMode::Serverless);
        assert_eq!(config.cors_origins(), vec!["https://shop.example.com"]);
    }

    #[test]
    fn test_empty_values_are_unset() {
        let config =
            Config::from_vars(vars(&[("MONGO_URI", ""), ("NODE_ENV", "  ")])).unwrap();
        assert!(!config.has_database());
        assert_eq!(config.environment(), Environment::Development);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(matches!(
            Config::from_vars(vars(&[("FRONTEND_URL", "shop.example.com")])),
            Err(ConfigError::FrontendUrl(_))
        ));
        assert!(matches!(
            Config::from_vars(vars(&[("BODY_LIMIT_BYTES", "0")])),
            Err(ConfigError::BodyLimit)
        ));
        assert!(matches!(
            Config::from_vars(vars(&[("REQUEST_TIMEOUT_SECS", "0")])),
            Err(ConfigError::RequestTimeout)
        ));
        assert!(matches!(
            Config::from_vars(vars(&[("WEBHOOK_TOLERANCE_SECS", "-1")])),
            Err(ConfigError::WebhookTolerance(-1))
        ));
        assert!(matches!(
            Config::from_vars(vars(&[("PORT", "eighty")])),
            Err(ConfigError::Env(_))
        ));
    }

    #[test]
    fn test_bind_address_checked_only_when_listening() {
        let dev = Config::from_vars(vars(&[("HOST", "not an address")])).unwrap();
        assert!(matches!(
            dev.startup_mode(),
            Err(ConfigError::BindAddress(_))
        ));

        let prod = Config::from_vars(vars(&[
            ("NODE_ENV", "production"),
            ("HOST", "api.internal"),
        ]))
        .unwrap();
        assert_eq!(prod.startup_mode().unwrap(), StartupMode::Serverless);
    }

    #[test]
    fn test_environment_names() {
        assert_eq!(Environment::from_name(None).name(), "development");
        assert_eq!(Environment::from_name(Some("test")).name(), "test");
        assert!(Environment::Development.exposes_error_details());
        assert!(!Environment::Production.exposes_error_details());
        assert!(!Environment::Other("staging".into()).exposes_error_details());
    }

    #[test]
    fn test_cors_origins_per_environment() {
        let dev = Config::default();
        assert_eq!(dev.cors_origins().len(), 6);
        assert!(dev
            .cors_origins()
            .contains(&"http://localhost:5173".to_string()));

        let prod = Config {
            node_env: Some("production".into()),
            ..Default::default()
        };
        assert!(prod.cors_origins().is_empty());
    }
}
