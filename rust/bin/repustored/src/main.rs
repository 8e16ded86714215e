//! `repustored` — the RepuStore server binary.
//!
//! Usage:
//!   repustored -c <context-name-or-path> [--listen <addr>]
//!
//! The context name resolves to `/etc/repustore/<name>.toml`.
//! If a path with `/` or a `.toml` suffix is given, it's used directly.

mod bootstrap;
mod config;
mod routes;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use inventory::InventoryModule;
use repustore_core::Module;
use repustore_sql::{SQLStore, SqliteStore};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use config::{LogFormat, ServerConfig};

/// RepuStore server.
#[derive(Parser, Debug)]
#[command(name = "repustored", about = "RepuStore spare-part inventory server")]
struct Cli {
    /// Context name or path to config file.
    #[arg(short = 'c', long = "config", required = true)]
    config: String,

    /// Listen address (overrides `server.listen` from the config file).
    #[arg(long = "listen")]
    listen: Option<String>,
}

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load server configuration; it also picks the log format.
    let config_path = ServerConfig::resolve_path(&cli.config);
    let server_config = ServerConfig::load(&config_path)?;
    init_logging(server_config.log.format);
    info!("Loaded configuration from {}", config_path.display());

    let listen = cli
        .listen
        .clone()
        .unwrap_or_else(|| server_config.server.listen.clone());

    // Verify configuration is valid.
    bootstrap::verify_config(&server_config, &listen)?;

    // Initialize storage.
    let core_config = bootstrap::service_config(&server_config, &listen);
    if let Some(data_dir) = &core_config.data_dir {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data dir {}", data_dir.display()))?;
    }
    let sqlite_path = core_config.resolve_sqlite_path();
    let sql: Arc<dyn SQLStore> = Arc::new(
        SqliteStore::open(&sqlite_path)
            .with_context(|| format!("failed to open SQL store at {}", sqlite_path.display()))?,
    );

    // Modules.
    let authenticator = bootstrap::authenticator(&server_config.admin);
    let inventory_module = InventoryModule::new(
        Arc::clone(&sql),
        server_config.inventory.clone(),
        authenticator,
    )
    .context("failed to initialize inventory module")?;
    info!("Inventory module initialized");

    let modules: Vec<Box<dyn Module>> = vec![Box::new(inventory_module)];

    let schema_json = repustore_store::build_schema(
        "RepuStore",
        modules.iter().filter_map(|m| m.schema()).collect(),
    );

    let app = routes::build_router(&modules, schema_json);

    // Start server.
    let listener = tokio::net::TcpListener::bind(&core_config.listen)
        .await
        .with_context(|| format!("failed to bind {}", core_config.listen))?;
    info!("RepuStore server listening on {}", core_config.listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = signal::ctrl_c().await {
                error!(error = %e, "failed to install CTRL+C handler");
            }
            info!("shutting down gracefully");
        })
        .await?;

    Ok(())
}
