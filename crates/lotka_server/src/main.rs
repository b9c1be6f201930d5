use anyhow::{Context, Result};
use clap::Parser;
use lotka_server::config::load_config;
use lotka_server::logger::init_logger;
use lotka_server::Server;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "lotka-server", version, about = "Lotka-Volterra phase explorer dashboard")]
struct Cli {
    /// Config file; `lotka.toml` in the working directory is used when present.
    #[arg(short, long, env = "LOTKA_CONFIG")]
    config: Option<PathBuf>,

    /// Overrides the configured and platform-assigned port.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = load_config(cli.config.as_deref()).context("Configuration is malformed")?;
    if let Some(port) = cli.port {
        cfg.port = port;
    }
    init_logger(&cfg.log)?;
    match &cli.config {
        Some(path) => info!("Loaded config from {}", path.display()),
        None => info!("Loaded config from defaults, lotka.toml and environment"),
    }

    Server::builder().config(cfg).build().await?.run().await
}
