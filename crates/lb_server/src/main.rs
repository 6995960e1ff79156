use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use lb_server::{AppState, ServerConfig};
use lb_store::Store;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Lockbox record server", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(long, env = "LOCKBOX_SERVER_CFG", default_value = "server.json")]
    config: PathBuf,
    /// Override the listen address from the config file
    #[arg(long)]
    listen: Option<String>,
    /// Override the store file from the config file
    #[arg(long)]
    store_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lb_server=info".parse()?)
                .add_directive("lb_store=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let mut config = ServerConfig::load(&cli.config)?;
    if let Some(listen) = cli.listen {
        config.listen_address = listen;
    }
    if let Some(store_file) = cli.store_file {
        config.store_file = store_file;
    }

    let store = Store::open(&config.store_file)
        .await
        .with_context(|| format!("opening store {}", config.store_file.display()))?;
    let listener = TcpListener::bind(&config.listen_address)
        .await
        .with_context(|| format!("binding {}", config.listen_address))?;

    lb_server::serve(listener, AppState::new(store.clone()), shutdown_signal()).await?;

    store.close().await;
    info!("server finished");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("interrupt received, shutting down"),
        Err(e) => {
            tracing::error!(error = %e, "cannot listen for shutdown signal");
            std::future::pending::<()>().await
        }
    }
}
