//! API Server
//!
//! Builds the router with its middleware stack and serves it until a
//! shutdown signal arrives.

use super::{
    handlers::AppState,
    middleware::{create_cors_layer, request_id_middleware},
    routes::create_router,
};
use crate::{config::CasinoConfig, services::CasinoService};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};

/// Build the full application: routes, request ids, CORS, timeout, tracing.
pub fn build_app(config: &CasinoConfig, service: CasinoService) -> axum::Router {
    let state = Arc::new(AppState {
        service,
        version: env!("CARGO_PKG_VERSION").to_string(),
    });

    create_router(state)
        // Innermost, so handlers and body extractors see the id
        .layer(axum::middleware::from_fn(request_id_middleware))
        // Preflight is answered before the timeout applies
        .layer(create_cors_layer(&config.api))
        .layer(TimeoutLayer::new(Duration::from_secs(config.api.request_timeout_secs)))
        .layer(TraceLayer::new_for_http())
}

/// Install the global tracing subscriber, honouring `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crownwynn=info,tower_http=info".into()),
        )
        .try_init();
}

pub struct ApiServer {
    config: CasinoConfig,
}

impl ApiServer {
    pub fn new(config: CasinoConfig) -> Self {
        Self { config }
    }

    /// Start the API server
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        init_tracing();

        let service = CasinoService::from_config(&self.config);
        let app = build_app(&self.config, service);
        let addr = self.socket_addr()?;

        self.log_server_info(addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("API server stopped gracefully");
        Ok(())
    }

    fn socket_addr(&self) -> Result<SocketAddr, Box<dyn std::error::Error>> {
        Ok(SocketAddr::from((
            self.config.api.host.parse::<std::net::IpAddr>()?,
            self.config.api.port,
        )))
    }

    fn log_server_info(&self, addr: SocketAddr) {
        info!("Starting Crownwynn API server on http://{}", addr);
        info!("   CORS: {:?}", self.config.api.allowed_origins);
        info!("   Request timeout: {}s", self.config.api.request_timeout_secs);
        info!("   Mines house edge: {}bp", self.config.mines.house_edge_bp);
        info!("   Keno paytable: {}", self.config.keno.paytable.version);
        info!(
            "   Bets: {} - {}, starting balance {}",
            self.config.bets.min_bet, self.config.bets.max_bet, self.config.players.starting_balance
        );
        if self.config.api.allowed_origins.iter().any(|o| o == "*") {
            warn!("CORS allows every origin; restrict api.allowed_origins in production");
        }
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
}
