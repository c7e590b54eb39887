//! # Job Pipeline Server
//!
//! Entry point for the job processing pipeline and observability platform.
//!
//! Exit codes: `0` clean shutdown, `1` runtime error, `2` configuration error.

use clap::{Parser, Subcommand};
use pipeline_config::ConfigLoader;
use pipeline_core::telemetry;
use pipeline_server::app::AppBuilder;
use pipeline_server::startup::{print_banner, print_startup_info};
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

/// Job pipeline and observability platform.
#[derive(Parser)]
#[command(name = "pipeline-server", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Runs the pipeline supervisor and the REST/push API (the default).
    Serve,
    /// Starts the pipeline, stops accepting new work, and exits once in-flight
    /// jobs have drained.
    Drain,
    /// Loads and validates configuration without starting anything.
    CheckConfig,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config_loader = match ConfigLoader::from_default_location() {
        Ok(loader) => loader,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(2);
        }
    };
    let config = config_loader.get().await;

    let _ = telemetry::init_telemetry(&config.observability.to_telemetry_config());

    let exit_code = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => run_serve(config).await,
        Command::Drain => run_drain(config).await,
        Command::CheckConfig => {
            info!("configuration loaded and validated successfully");
            0
        }
    };

    std::process::exit(exit_code);
}

async fn run_serve(config: pipeline_config::AppConfig) -> i32 {
    print_banner();
    info!(version = env!("CARGO_PKG_VERSION"), "starting job pipeline server");

    let app = match AppBuilder::new().with_config(config.clone()).build().await {
        Ok(app) => app,
        Err(e) => {
            error!(error = %e, "failed to start application");
            return 1;
        }
    };

    print_startup_info(&config.server.host, config.server.port);

    let addr = config.server.addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(%addr, error = %e, "failed to bind REST listener");
            app.shutdown(Duration::from_secs(5)).await;
            return 1;
        }
    };

    info!(%addr, "serving REST API and push channel");

    let router = app.router.clone();
    let result = axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await;

    app.shutdown(Duration::from_secs(30)).await;

    match result {
        Ok(()) => {
            info!("server shutdown complete");
            0
        }
        Err(e) => {
            error!(error = %e, "server error");
            1
        }
    }
}

async fn run_drain(config: pipeline_config::AppConfig) -> i32 {
    info!("starting in drain mode: no REST listener, exiting once in-flight jobs complete");

    let app = match AppBuilder::new().with_config(config).build().await {
        Ok(app) => app,
        Err(e) => {
            error!(error = %e, "failed to start application");
            return 1;
        }
    };

    app.shutdown(Duration::from_secs(300)).await;
    info!("drain complete");
    0
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            info!("received terminate signal, initiating graceful shutdown...");
        }
    }
}
