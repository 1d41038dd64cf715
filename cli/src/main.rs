//! NTS access server - CLI
//!
//! ```sh
//! # Run with default config (~/.config/nts-server/config.toml)
//! nts-server
//!
//! # Custom config path
//! nts-server --config /etc/nts-server/config.toml
//!
//! # Validate config without starting
//! nts-server --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info, warn};

use nts_server::config::AppConfig;
use nts_server::server::{init_tracing, ServerHandle, ServerOptions};

/// Token authentication, session lifecycle and IP access control server.
#[derive(Parser, Debug)]
#[command(
    name = "nts-server",
    version,
    about = "NTS access server: tokens, sessions and IP access control",
    long_about = "NTS access server: REST API for login, token verification, \
                  session administration and IP allow/block lists.\n\n\
                  Default config: ~/.config/nts-server/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "NTS_CONFIG")]
    config: Option<PathBuf>,

    /// Override the HTTP listen port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    no_migrate: bool,

    /// Skip provisioning the bootstrap admin account.
    #[arg(long)]
    no_admin: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(nts_server::default_config_path);
    let (mut config, load_error) = if config_path.exists() {
        match AppConfig::load(&config_path) {
            Ok(cfg) => (cfg, None),
            Err(e) => (AppConfig::from_env(), Some(e)),
        }
    } else {
        (AppConfig::from_env(), None)
    };

    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    init_tracing(&config);

    match load_error {
        Some(e) if cli.check => {
            error!("{}", e);
            return Err(e.into());
        }
        Some(e) => {
            error!("{}", e);
            warn!("Using default configuration");
        }
        None if config_path.exists() => info!("Configuration loaded from {}", config_path.display()),
        None => info!("No config file at {}; using defaults", config_path.display()),
    }

    if let Some(port) = cli.port {
        info!("CLI override: port = {}", port);
        config.server.port = port;
    }

    if cli.check {
        config.resolve_jwt_secret()?;
        println!("Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   Listen      : {}", config.address());
        println!("   Database    : {}", config.database.url);
        println!("   Environment : {:?}", config.security.environment);
        println!("   Log level   : {}", config.logging.level);
        return Ok(());
    }

    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !cli.no_migrate,
        ensure_admin: !cli.no_admin,
    })
    .await?;

    handle.install_signal_handler();
    info!("Press Ctrl+C to shut down gracefully");

    handle.shutdown_signal().wait().await;
    handle.wait().await;

    Ok(())
}
