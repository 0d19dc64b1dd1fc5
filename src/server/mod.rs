//! Dashboard server
//!
//! Serves the pipeline artifacts over a REST API: the schema that drives the
//! input widgets, the classification report, the batch attribution summaries,
//! and the interactive explain endpoint. The artifacts are built once at
//! startup and shared read-only across requests.

mod api;
mod error;
mod handlers;
mod state;

pub use api::create_router;
pub use error::ServerError;
pub use state::AppState;

use crate::pipeline::PipelineArtifacts;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            static_dir: std::env::var("STATIC_DIR").ok(),
        }
    }
}

/// Start the server with already-built pipeline artifacts
pub async fn run_server(config: ServerConfig, artifacts: PipelineArtifacts) -> anyhow::Result<()> {
    let start_time = chrono::Utc::now();

    if let Some(ref static_dir) = config.static_dir {
        if !std::path::Path::new(static_dir).exists() {
            warn!(static_dir = %static_dir, "Static directory not found, dashboard shell will be unavailable");
        }
    }

    let state = Arc::new(AppState::new(artifacts));
    let app = create_router(state, &config);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!(
        host = %config.host,
        port = config.port,
        started_at = %start_time.to_rfc3339(),
        "Dashboard server starting"
    );
    info!(url = %format!("http://{}/api/health", addr), "Health endpoint available");
    info!(url = %format!("http://{}/api/schema", addr), "Widget schema available");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, pid = std::process::id(), "Server listening");

    let shutdown_signal = async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
        let uptime = chrono::Utc::now().signed_duration_since(start_time);
        info!(
            uptime_secs = uptime.num_seconds(),
            "Shutdown signal received, stopping server gracefully"
        );
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}
