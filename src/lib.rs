//! tabletopd - tabletop RPG session server daemon
//!
//! Keeps host and player dashboards in sync over a shared character store,
//! resolves dice rolls and runs host-side combat overlays.

pub mod api;
pub mod characters;
pub mod combat;
pub mod config;
pub mod db;
pub mod dice;
pub mod error;
pub mod sync;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use api::AppState;
use db::Database;
use dice::DiceEngine;

pub use config::{Config, LogFormat};

/// The tabletopd server instance
pub struct Server {
    config: Config,
    state: AppState,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Server {
    /// Open the database and load every stored character
    pub async fn new(config: Config) -> Result<Self> {
        let db = Arc::new(Database::new(config.db_path.as_deref()).await?);
        let dice = match config.dice_seed {
            Some(seed) => Arc::new(DiceEngine::seeded(seed)),
            None => DiceEngine::shared(),
        };
        let state = AppState::new(db, dice).await?;
        info!("Loaded {} characters", state.store.len());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            config,
            state,
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Shared application state
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the router
    pub fn router(&self) -> Router {
        api::router(self.state.clone())
    }

    /// Run the server until shutdown
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        info!("tabletopd listening on {}", local_addr);

        let router = self.router();
        let mut shutdown_rx = self.shutdown_rx.clone();

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown_rx.changed().await.ok();
            })
            .await?;

        info!("tabletopd shutdown complete");
        Ok(())
    }

    /// Signal the server to shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }
}
