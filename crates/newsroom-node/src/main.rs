//! Newsroom Node - content store server.

use anyhow::Context;
use clap::Parser;
use newsroom_node::api::{create_router, AppState};
use newsroom_node::config::NodeConfig;
use newsroom_node::observability::init_logging;
use newsroom_node::persistence::{open_store, NoPersistence, SnapshotGateway, YamlSnapshotFile};
use std::path::PathBuf;
use std::sync::Arc;

/// Newsroom Node - users, articles, comments and votes over HTTP
#[derive(Parser, Debug)]
#[command(name = "newsroom-node")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen host
    #[arg(long)]
    host: Option<String>,

    /// Listen port
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Snapshot file
    #[arg(long)]
    database: Option<PathBuf>,

    /// Neither load nor save snapshots
    #[arg(long, env = "IS_TEST_MODE")]
    test_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Log format (pretty, json)
    #[arg(long)]
    log_format: Option<String>,
}

impl Args {
    /// Applies the flags that were given on top of `config`.
    fn apply(self, config: &mut NodeConfig) {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(path) = self.database {
            config.database_path = path;
        }
        if self.test_mode {
            config.persistence = false;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = Args::parse();
    let mut config =
        NodeConfig::load(args.config.take().as_deref()).context("failed to load configuration")?;
    args.apply(&mut config);

    init_logging(&config.log_level, config.log_format());
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting Newsroom node");

    let gateway: Arc<dyn SnapshotGateway> = if config.persistence {
        Arc::new(YamlSnapshotFile::new(&config.database_path))
    } else {
        tracing::info!("Test mode: snapshots are disabled");
        Arc::new(NoPersistence)
    };

    let store = Arc::new(open_store(gateway.as_ref()).await);
    let app = create_router(AppState::new(Arc::clone(&store), Arc::clone(&gateway)));

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(
        addr = %addr,
        database = %config.database_path.display(),
        persistence = config.persistence,
        "Listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Err(e) = gateway.save(&store.snapshot()).await {
        tracing::warn!(error = %e, "Failed to save final snapshot");
    }
    tracing::info!("Newsroom node stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = ?err, "Failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
