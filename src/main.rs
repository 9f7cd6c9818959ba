//! bunnyhop-server: hosts BunnyHop sessions over TCP.
//!
//! Configuration comes from `bunnyhop.toml` (see `server::config`) with
//! `BUNNYHOP_*` environment overrides; `RUST_LOG` overrides the log level.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{info, warn};

use bunnyhop::server::{Server, CONFIG};
use bunnyhop::SessionRegistry;

fn init_tracing(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = &*CONFIG;
    init_tracing(&config.logging.level);
    info!(
        addr = %config.bind_addr(),
        win_threshold = config.game.win_threshold,
        hand_size = config.game.hand_size,
        seeded = config.game.seed.is_some(),
        "bunnyhop-server starting"
    );

    let registry = Arc::new(SessionRegistry::with_capacity(
        config.game.clone(),
        config.server.broadcast_capacity,
    ));
    let server = Server::bind(&config.bind_addr(), registry)
        .await
        .context("failed to start listener")?;

    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl+c");
            std::future::pending::<()>().await;
        }
        info!("shutdown signal received");
    };

    server.run_until(shutdown).await?;
    info!("bunnyhop-server stopped");
    Ok(())
}
