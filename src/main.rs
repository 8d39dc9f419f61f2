//! tabletopd - tabletop RPG session server daemon

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tabletopd::{Config, LogFormat, Server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Tabletop RPG session server
#[derive(Parser, Debug)]
#[command(name = "tabletopd", version, about = "Tabletop RPG session server")]
struct Args {
    /// Address to listen on
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// SQLite database file (in-memory when omitted)
    #[arg(short, long)]
    database: Option<String>,

    /// Configuration file (defaults to ./tabletopd.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(database) = args.database {
        config.db_path = Some(database);
    }

    // Initialize tracing
    let registry = tracing_subscriber::registry().with(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "tabletopd=info,tower_http=debug".into()),
    );
    match config.log_format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }

    let server = Server::new(config).await?;
    server.run().await?;

    Ok(())
}
