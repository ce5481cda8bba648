//! paygate-server - HTTP gateway binary.

use std::net::SocketAddr;

use anyhow::Context;
use paygate_core::{DocumentModel, GatewayConfig};
use paygate_llm::ModelFactory;
use paygate_server::{create_server, AppState};
use tokio::signal;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive(Level::INFO.into())
                .add_directive("paygate_server=debug".parse()?),
        )
        .init();

    // Configuration errors stop the process before anything is bound
    let config = match GatewayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return Err(e).context("invalid gateway configuration");
        }
    };
    let default_schema = config.default_schema_version()?;

    let model = ModelFactory::from_config(&config)?;
    info!(
        model = model.model_name(),
        default_schema = %default_schema,
        timeout_secs = config.model.timeout_secs,
        "Document model configured"
    );

    let state = AppState::new(model, default_schema);
    let app = create_server(state, config.server.body_limit_bytes);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid listen address")?;
    info!("Starting paygate-server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            info!("Shutdown signal received");
        })
        .await?;

    info!("Server stopped cleanly");
    Ok(())
}
