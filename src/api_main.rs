//! Crownwynn API Server Binary

use clap::Parser;
use crownwynn::{api::ApiServer, config::ConfigLoader};

#[derive(Parser, Debug)]
#[command(name = "crownwynn-api")]
#[command(about = "Provably-fair Mines & Keno API server", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<String>,

    /// Override api.host
    #[arg(long)]
    host: Option<String>,

    /// Override api.port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.with_path(path);
    }
    let mut config = loader.load()?;

    // Command line wins over file and environment
    if let Some(host) = args.host {
        config.api.host = host;
    }
    if let Some(port) = args.port {
        config.api.port = port;
    }
    crownwynn::config::validate(&config)?;

    ApiServer::new(config).run().await
}
