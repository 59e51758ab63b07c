use anyhow::Context;
use axum::{Router, Server};
use std::net::SocketAddr;
use tracing::info;

use storefront_api::{
    api::{standard_modules, AppBuilder},
    config::{Config, StartupMode},
    logging::setup_logging,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let config = Config::from_env().context("Failed to load configuration")?;

    // Initialize logging
    setup_logging(&config)?;

    let mode = config.startup_mode()?;
    info!(
        environment = %config.environment(),
        database = config.has_database(),
        "Starting storefront API"
    );

    // Setup API router; modules are resolved before the first request is served
    let app = AppBuilder::new(config).modules(standard_modules()).build();

    match mode {
        StartupMode::Listen(addr) => serve(app, addr).await,
        StartupMode::Serverless => run_serverless(app).await,
    }
}

async fn serve(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    info!("Server running on port {}", addr.port());

    Server::try_bind(&addr)
        .with_context(|| format!("Failed to bind {addr}"))?
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("HTTP server stopped gracefully");
    Ok(())
}

#[cfg(feature = "lambda")]
async fn run_serverless(app: Router) -> anyhow::Result<()> {
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    info!("Handing router to the Lambda runtime");

    let handler = app.map_request(|req: lambda_http::Request| {
        let (parts, body) = req.into_parts();
        Request::from_parts(parts, Body::from(body.to_vec()))
    });

    lambda_http::run(handler)
        .await
        .map_err(|err| anyhow::anyhow!("Lambda runtime error: {err}"))
}

#[cfg(not(feature = "lambda"))]
async fn run_serverless(_app: Router) -> anyhow::Result<()> {
    anyhow::bail!(
        "NODE_ENV=production hands requests to a serverless runtime; rebuild with `--features lambda` or set NODE_ENV to run a listening server"
    )
}

/// Waits for CTRL+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received CTRL+C, starting graceful shutdown"),
        () = terminate => info!("Received SIGTERM, starting graceful shutdown"),
    }
}
