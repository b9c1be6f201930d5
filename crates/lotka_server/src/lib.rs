//! HTTP front end for the Lotka-Volterra phase explorer: serves the
//! dashboard page and a small JSON API around `lotka_core`.

pub mod config;
pub mod error;
pub mod handlers;
pub mod logger;
pub mod router;
pub mod state;

use crate::config::ServerConfig;
use crate::state::AppState;
use anyhow::{Context, Result};
use axum::Router;
use lotka_core::dashboard::DashboardOptions;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Router with no listener attached; used by the server and in tests.
pub fn app(options: DashboardOptions) -> Router {
    router::init(AppState::new(options))
}

pub struct ServerBuilder {
    cfg: ServerConfig,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            cfg: ServerConfig::default(),
        }
    }

    #[must_use]
    pub fn config(mut self, cfg: ServerConfig) -> Self {
        self.cfg = cfg;
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.cfg.port = port;
        self
    }

    pub async fn build(self) -> Result<Server> {
        let address = SocketAddr::new(self.cfg.address, self.cfg.port);
        info!(%address, solver = self.cfg.dashboard.solver.name(), "Initializing server");

        self.cfg
            .dashboard
            .grid
            .validate()
            .context("Invalid dashboard time grid")?;
        self.cfg
            .dashboard
            .solver
            .validate()
            .context("Invalid dashboard solver settings")?;

        let listener = TcpListener::bind(address)
            .await
            .with_context(|| format!("Failed to bind to {address}"))?;

        Ok(Server {
            listener,
            state: AppState::new(self.cfg.dashboard),
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Server {
    listener: TcpListener,
    state: AppState,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("Listener has no local address")
    }

    pub async fn run(self) -> Result<()> {
        let address = self.local_addr()?;
        let app = router::init(self.state);

        info!("Dashboard available at http://{address}");

        axum::serve(self.listener, app)
            .with_graceful_shutdown(shutdown())
            .await
            .context("HTTP server error")?;

        info!("Server shutdown complete");
        Ok(())
    }
}

async fn shutdown() {
    match shutdown_signal().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(err) => {
            // Without a signal handler the server can only be killed.
            error!(%err, "Failed to install shutdown handler");
            std::future::pending::<()>().await;
        }
    }
}

async fn shutdown_signal() -> Result<()> {
    let ctrl_c = async { tokio::signal::ctrl_c().await.context("ctrl-c handler") };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .context("SIGTERM handler")?
            .recv()
            .await;
        Ok::<(), anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        res = ctrl_c => res,
        res = terminate => res,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotka_core::trajectory::SolverChoice;
    use std::net::{IpAddr, Ipv4Addr};

    fn local_config() -> ServerConfig {
        ServerConfig {
            address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            ..ServerConfig::default()
        }
    }

    #[tokio::test]
    async fn build_rejects_invalid_solver_settings() {
        let mut cfg = local_config();
        cfg.dashboard.solver = SolverChoice::Rk4 { substeps: 0 };
        let err = Server::builder()
            .config(cfg)
            .build()
            .await
            .err()
            .expect("zero substeps");
        assert!(format!("{err:#}").contains("solver settings"));
    }

    #[tokio::test]
    async fn build_binds_an_ephemeral_port() {
        let server = Server::builder()
            .config(local_config())
            .build()
            .await
            .expect("server");
        assert_ne!(server.local_addr().expect("address").port(), 0);
    }
}
