//! Foodtruck booking service CLI
//!
//! ```sh
//! # Run with default config (~/.config/foodtruck-booking/config.toml)
//! foodtruck-booking
//!
//! # Custom config path and port
//! foodtruck-booking --config /etc/foodtruck-booking/config.toml --port 9000
//!
//! # Validate config without starting
//! foodtruck-booking --check
//!
//! # Mint a staff key: prints the key and the hash to paste into config
//! foodtruck-booking --generate-key
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use foodtruck_booking::config::{default_config_path, AppConfig};
use foodtruck_booking::infrastructure::crypto::{generate_api_key, hash_api_key};
use foodtruck_booking::server::{init_tracing, ServerHandle, ServerOptions};

/// Same-day pickup reservations with per-location daily stock.
#[derive(Parser, Debug)]
#[command(
    name = "foodtruck-booking",
    version,
    about = "Daily inventory and reservation service for foodtruck pickups",
    long_about = "REST API that tracks each location's daily stock, admits \
                  reservations against it without overbooking and drives them \
                  through pickup, no-show and cancellation.\n\n\
                  Default config: ~/.config/foodtruck-booking/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "BOOKING_CONFIG")]
    config: Option<PathBuf>,

    /// Override the REST API listen port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    no_migrate: bool,

    /// Print the SHA-256 hash of KEY for `[[security.api_keys]]` and exit.
    #[arg(long, value_name = "KEY")]
    hash_key: Option<String>,

    /// Generate a fresh API key, print it with its hash and exit.
    #[arg(long)]
    generate_key: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Key helpers ────────────────────────────────────────────
    if let Some(key) = cli.hash_key.as_deref() {
        println!("{}", hash_api_key(key));
        return Ok(());
    }
    if cli.generate_key {
        let key = generate_api_key();
        println!("key      : {}", key);
        println!("key_hash : {}", hash_api_key(&key));
        return Ok(());
    }

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli.config.unwrap_or_else(default_config_path);

    let loaded = AppConfig::load(&config_path);
    if cli.check {
        if let Err(e) = &loaded {
            eprintln!("Configuration is invalid: {}", e);
            eprintln!("   Config file : {}", config_path.display());
            return Err(e.to_string().into());
        }
    }

    let mut config = match loaded {
        Ok(cfg) => {
            // Init tracing first so subsequent logs are formatted properly
            init_tracing(&cfg);
            info!("Configuration loaded from {}", config_path.display());
            cfg
        }
        Err(e) => {
            let cfg = AppConfig::default();
            init_tracing(&cfg);
            error!("Failed to load config from {}: {}", config_path.display(), e);
            error!("Using default configuration.");
            cfg
        }
    };

    // ── Apply CLI overrides ────────────────────────────────────
    if let Some(port) = cli.port {
        info!("CLI override: port = {}", port);
        config.server.port = port;
    }
    if let Some(ref level) = cli.log_level {
        info!("CLI override: log_level = {}", level);
        config.logging.level = level.clone();
    }

    // ── Config validation mode ─────────────────────────────────
    if cli.check {
        println!("Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   API address : {}:{}", config.server.host, config.server.port);
        println!("   Storage     : {:?}", config.database.backend);
        println!("   Database    : {}", config.database.connection_url());
        println!("   Log level   : {}", config.logging.level);
        println!("   Locations   : {}", config.locations.len());
        println!("   API keys    : {}", config.security.api_keys.len());
        return Ok(());
    }

    // ── Start server ───────────────────────────────────────────
    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !cli.no_migrate,
        ..ServerOptions::default()
    })
    .await?;

    // Install OS signal handlers (SIGTERM, SIGINT)
    handle.install_signal_handler();

    info!("Press Ctrl+C to shutdown gracefully.");

    // Waits for the signal, then drains
    handle.wait().await;

    Ok(())
}
