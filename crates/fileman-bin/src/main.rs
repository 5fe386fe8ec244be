use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use fileman_core::config::ServerConfig;
use fileman_core::ops::OpsHandler;
use fileman_core::server::FileServer;
use fileman_core::service::DirectoryService;
use fileman_platform::filesystem::FileSystem;

#[derive(Parser, Debug)]
#[command(name = "fileman-server")]
#[command(about = "Remote directory browser service")]
#[command(version)]
struct Cli {
    /// Address to listen on (e.g., 127.0.0.1:3001)
    #[arg(long, env = "FILEMAN_LISTEN_ADDR")]
    listen_addr: Option<String>,

    /// Path to config file
    #[arg(long, env = "FILEMAN_CONFIG_PATH")]
    config_path: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "FILEMAN_LOG_LEVEL")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    info!(
        "fileman-server v{} starting (os={}, arch={})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH,
    );

    // Load config, if present
    let config_path = cli
        .config_path
        .map(std::path::PathBuf::from)
        .unwrap_or_else(ServerConfig::default_path);

    let mut config = if config_path.exists() {
        info!("loading config from {}", config_path.display());
        ServerConfig::load(&config_path)?
    } else {
        ServerConfig::default()
    };

    // CLI args override config file
    if let Some(addr) = cli.listen_addr {
        config.listen_addr = addr;
    }

    let service = Arc::new(DirectoryService::new(create_filesystem()));
    let server = FileServer::bind(&config.listen_addr, OpsHandler::new(service)).await?;

    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("received Ctrl+C, shutting down");
            Ok(())
        }
    }
}

fn create_filesystem() -> Box<dyn FileSystem> {
    Box::new(fileman_host::filesystem::StdFileSystem::new())
}
