//! dynconf configuration store server.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │                CONFIG STORE                  │
//!   Service (client)     │  ┌─────────┐    ┌────────────┐               │
//!   ─────────────────────┼─▶│  http   │───▶│  handlers  │               │
//!   POST defaults        │  │ server  │    └─────┬──────┘               │
//!                        │  └─────────┘          ▼                      │
//!                        │               ┌──────────────┐   ┌────────┐  │
//!                        │               │ ConfigStore  │──▶│ cache  │  │
//!                        │               │ get_or_create│   └────────┘  │
//!                        │               └──────┬───────┘               │
//!                        │                      ▼                       │
//!                        │      ┌──────────────────────────────┐        │
//!                        │      │ format (line / TOML tree)    │        │
//!                        │      │ codec (dot paths ↔ tree)     │        │
//!                        │      └──────────────┬───────────────┘        │
//!                        │                     ▼                        │
//!                        │          root/{domain}/[{locale}/]{category} │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use dynconf::lifecycle::{signals, Shutdown};
use dynconf::observability::{logging, metrics};
use dynconf::settings::{load_settings, ServiceSettings};
use dynconf::HttpServer;

#[derive(Parser)]
#[command(name = "dynconf")]
#[command(about = "Dynamic configuration store", long_about = None)]
struct Args {
    /// Path to a TOML settings file; built-in defaults are used without it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(long)]
    bind: Option<String>,

    /// Override `storage.root`.
    #[arg(long)]
    root: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => load_settings(path)?,
        None => ServiceSettings::default(),
    };
    if let Some(bind) = args.bind {
        settings.listener.bind_address = bind;
    }
    if let Some(root) = args.root {
        settings.storage.root = root;
    }

    logging::init_logging(&settings.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "dynconf starting");
    tracing::info!(
        bind_address = %settings.listener.bind_address,
        storage_root = %settings.storage.root,
        request_timeout_secs = settings.timeouts.request_secs,
        "Settings loaded"
    );

    if settings.observability.metrics_enabled {
        match settings.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %settings.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&settings.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    let server = HttpServer::new(settings);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
