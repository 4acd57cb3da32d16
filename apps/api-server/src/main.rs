//! # Post Pulse API Server
//!
//! The main entry point for the Actix-web HTTP server and the background
//! publishing scheduler.

use actix_web::{App, HttpServer, web};
use anyhow::Context;
use tracing_actix_web::TracingLogger;

#[cfg(feature = "scheduler")]
mod background;
mod config;
mod handlers;
mod middleware;
mod observability;
mod state;
mod telemetry;

use config::AppConfig;
use observability::RequestIdMiddleware;
use state::AppState;
use telemetry::{TelemetryConfig, init_telemetry};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env().context("invalid configuration")?;

    tracing::info!(
        "Starting Post Pulse API Server on {}:{}",
        config.host,
        config.port
    );

    let state = AppState::new(&config).await?;

    #[cfg(feature = "scheduler")]
    let runner = if config.scheduler.enabled {
        let runner = background::PublishRunner::start(state.scheduler.clone())
            .await
            .map_err(|e| anyhow::anyhow!("failed to start publish scheduler: {e:?}"))?;
        Some(runner)
    } else {
        tracing::info!("Publish scheduler disabled");
        None
    };

    let data = web::Data::new(state);
    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(RequestIdMiddleware)
            .app_data(data.clone())
            .configure(handlers::configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    // The server has drained; let an in-flight tick finish before exiting.
    #[cfg(feature = "scheduler")]
    if let Some(runner) = runner {
        runner
            .shutdown()
            .await
            .map_err(|e| anyhow::anyhow!("failed to stop publish scheduler: {e:?}"))?;
    }

    tracing::info!("Server stopped");
    Ok(())
}
