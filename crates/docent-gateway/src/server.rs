use crate::middleware::cors_layer;
use crate::router;
use axum::{extract::DefaultBodyLimit, Router};
use docent_agent::Tutor;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application state.
pub struct AppState {
    /// The tutor every handler calls into.
    pub tutor: Arc<Tutor>,
}

/// `[server]` section of the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed browser origins; `"*"` allows all.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
    /// Largest accepted request body, uploads included.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "http://localhost:3000".to_string(),
    ]
}
fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl ServerConfig {
    /// `host:port`, ready for binding.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// The HTTP gateway in front of a [`Tutor`].
pub struct GatewayServer;

impl GatewayServer {
    /// Build the router with CORS, request tracing and the upload size limit.
    pub fn build(tutor: Arc<Tutor>, config: &ServerConfig) -> Router {
        let state = Arc::new(AppState { tutor });

        router::routes()
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.max_upload_bytes))
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(&config.cors_origins))
    }

    /// Bind `config.addr()` and serve until Ctrl-C.
    pub async fn serve(tutor: Arc<Tutor>, config: &ServerConfig) -> std::io::Result<()> {
        let app = Self::build(tutor, config);
        let addr = config.addr();
        let listener = TcpListener::bind(&addr).await?;
        info!(addr = %addr, "Docent gateway listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
