//! Camera proxy binary.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use cam_proxy::config::{load_config, watcher::watch_config, ProxyConfig};
use cam_proxy::http::HttpServer;
use cam_proxy::lifecycle::Shutdown;
use cam_proxy::observability::{logging, metrics};

/// Reverse proxy for a fixed-address camera device.
#[derive(Parser, Debug)]
#[command(name = "cam-proxy", version, about)]
struct Args {
    /// Path to a TOML config file; changes are applied while running.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the listener bind address from the config.
    #[arg(long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(listen) = args.listen {
        config.listener.bind_address = listen;
    }

    logging::init(&config.observability.log_filter);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        camera = %format!("{}:{}", config.upstream.address, config.upstream.port),
        "cam-proxy starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Hot reload only makes sense with a file to watch; without one the
    // reload channel simply stays empty.
    let (_watcher, config_updates) = match &args.config {
        Some(path) => {
            let (watcher, rx) = watch_config(path)?;
            (Some(watcher), rx)
        }
        None => (None, mpsc::unbounded_channel().1),
    };

    let shutdown = Shutdown::new();
    shutdown.trigger_on_ctrl_c();

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config);
    server
        .run(listener, config_updates, shutdown.subscribe())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
