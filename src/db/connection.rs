use futures::future::{BoxFuture, FutureExt, Shared};
use mongodb::{bson::doc, options::ClientOptions, Client};
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use tokio::sync::Mutex;

use crate::{config::Config, errors::ApiError, Result};

const APP_NAME: &str = "storefront_api";
const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

/// Connection state reported by the health endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    NotConfigured,
    Disconnected,
    Connecting,
    Connected,
}

type ConnectAttempt = Shared<BoxFuture<'static, std::result::Result<Client, mongodb::error::Error>>>;

enum Slot {
    Idle,
    Connecting(ConnectAttempt),
    Connected(Client),
}

/// Process-wide MongoDB handle, connected on first use
#[derive(Clone)]
pub struct Database {
    uri: Option<Arc<str>>,
    slot: Arc<Mutex<Slot>>,
    connect_timeout: Duration,
}

impl Database {
    pub fn new(uri: Option<&str>) -> Self {
        Self::with_config(uri, Duration::from_secs(DEFAULT_TIMEOUT_SECONDS))
    }

    pub fn with_config(uri: Option<&str>, connect_timeout: Duration) -> Self {
        Self {
            uri: uri.map(Arc::from),
            slot: Arc::new(Mutex::new(Slot::Idle)),
            connect_timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::with_config(config.mongo_uri.as_deref(), config.db_connect_timeout())
    }

    /// Wraps a client that is already connected, skipping the lazy connect
    pub fn with_client(client: Client) -> Self {
        Self {
            uri: None,
            slot: Arc::new(Mutex::new(Slot::Connected(client))),
            connect_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        }
    }

    /// Whether persistence is available to route modules
    pub fn is_configured(&self) -> bool {
        self.uri.is_some() || self.state() == ConnectionState::Connected
    }

    /// Reports the connection state without waiting on the lock
    pub fn state(&self) -> ConnectionState {
        match self.slot.try_lock().as_deref() {
            Ok(Slot::Connected(_)) => ConnectionState::Connected,
            Ok(Slot::Connecting(_)) | Err(_) => ConnectionState::Connecting,
            Ok(Slot::Idle) if self.uri.is_none() => ConnectionState::NotConfigured,
            Ok(Slot::Idle) => ConnectionState::Disconnected,
        }
    }

    /// Get the client (connects if it doesn't exist)
    ///
    /// Callers arriving while an attempt is in flight await that same attempt
    /// and all see its outcome. A failed attempt leaves the slot idle so the
    /// next caller retries.
    pub async fn client(&self) -> Result<Client> {
        let attempt = {
            let mut slot = self.slot.lock().await;
            match &*slot {
                Slot::Connected(client) => return Ok(client.clone()),
                Slot::Connecting(attempt) => attempt.clone(),
                Slot::Idle => {
                    let uri = self.uri.clone().ok_or(ApiError::DatabaseNotConfigured)?;
                    let attempt = connect(uri, self.connect_timeout).boxed().shared();
                    *slot = Slot::Connecting(attempt.clone());
                    attempt
                }
            }
        };

        let outcome = attempt.clone().await;

        let mut slot = self.slot.lock().await;
        // The first waiter to finish settles the slot; later ones find it settled
        if matches!(&*slot, Slot::Connecting(current) if current.ptr_eq(&attempt)) {
            *slot = match &outcome {
                Ok(client) => {
                    tracing::info!("Connected to MongoDB");
                    Slot::Connected(client.clone())
                }
                Err(err) => {
                    tracing::warn!(error = %err, "MongoDB connection attempt failed");
                    Slot::Idle
                }
            };
        }

        Ok(outcome?)
    }

    /// Connects when a connection string is configured and no client exists yet
    pub async fn ensure_connected(&self) -> Result<()> {
        if self.uri.is_some() {
            self.client().await?;
        }
        Ok(())
    }
}

async fn connect(
    uri: Arc<str>,
    connect_timeout: Duration,
) -> std::result::Result<Client, mongodb::error::Error> {
    let mut options = ClientOptions::parse(uri.as_ref()).await?;
    if options.server_selection_timeout.is_none() {
        options.server_selection_timeout = Some(connect_timeout);
    }
    if options.app_name.is_none() {
        options.app_name = Some(APP_NAME.to_string());
    }

    let client = Client::with_options(options)?;
    client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await?;

    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_err;

    #[tokio::test]
    async fn test_unconfigured_database() {
        let db = Database::new(None);
        assert!(!db.is_configured());
        assert_eq!(db.state(), ConnectionState::NotConfigured);
        assert!(db.ensure_connected().await.is_ok());
        assert!(matches!(
            db.client().await,
            Err(ApiError::DatabaseNotConfigured)
        ));
    }

    #[tokio::test]
    async fn test_invalid_uri_fails_and_stays_disconnected() {
        let db = Database::new(Some("not-a-mongodb-uri"));
        assert!(db.is_configured());
        assert_err!(db.ensure_connected().await);
        assert_eq!(db.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_unreachable_server_fails_within_timeout() {
        let db = Database::with_config(
            Some("mongodb://127.0.0.1:1/?directConnection=true"),
            Duration::from_millis(200),
        );
        let started = std::time::Instant::now();
        assert!(matches!(db.client().await, Err(ApiError::Database(_))));
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(db.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_attempt() {
        let timeout = Duration::from_millis(300);
        let db = Database::with_config(
            Some("mongodb://127.0.0.1:1/?directConnection=true"),
            timeout,
        );

        let started = std::time::Instant::now();
        let results = futures::future::join_all((0..8).map(|_| db.ensure_connected())).await;
        let elapsed = started.elapsed();

        assert!(results
            .iter()
            .all(|r| matches!(r, Err(ApiError::Database(_)))));
        // Eight sequential attempts would take at least 8 * 300ms
        assert!(elapsed >= timeout);
        assert!(elapsed < timeout * 4, "took {elapsed:?}");
        assert_eq!(db.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_failed_attempt_is_retried() {
        let db = Database::with_config(
            Some("mongodb://127.0.0.1:1/?directConnection=true"),
            Duration::from_millis(100),
        );

        assert_err!(db.ensure_connected().await);
        assert_eq!(db.state(), ConnectionState::Disconnected);

        let started = std::time::Instant::now();
        assert_err!(db.ensure_connected().await);
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_preconnected_client_is_reused() {
        let client = Client::with_uri_str("mongodb://127.0.0.1:27017/shop")
            .await
            .unwrap();
        let db = Database::with_client(client);
        assert!(db.is_configured());
        assert_eq!(db.state(), ConnectionState::Connected);

        let client = db.client().await.unwrap();
        assert_eq!(
            client.default_database().map(|d| d.name().to_string()),
            Some("shop".to_string())
        );
    }
}
