//! Bootstrap — startup checks and wiring decisions made from the config.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use repustore_core::{AllowAll, Authenticator, BearerToken, ServiceConfig};
use tracing::{info, warn};

use crate::config::{AdminAuthConfig, ServerConfig};

/// Verify server configuration before anything is opened.
pub fn verify_config(config: &ServerConfig, listen: &str) -> anyhow::Result<()> {
    if config.storage.data_dir.trim().is_empty() {
        anyhow::bail!("Storage data_dir is empty in configuration.");
    }
    if listen.parse::<SocketAddr>().is_err() {
        anyhow::bail!("Listen address '{}' is not a valid socket address.", listen);
    }
    Ok(())
}

/// Storage and listen settings for the core layer.
pub fn service_config(config: &ServerConfig, listen: &str) -> ServiceConfig {
    ServiceConfig {
        data_dir: Some(PathBuf::from(&config.storage.data_dir)),
        sqlite_path: config.storage.sqlite_path.as_ref().map(PathBuf::from),
        listen: listen.to_string(),
    }
}

/// Admin routes require the configured bearer token, or are open if none.
pub fn authenticator(admin: &AdminAuthConfig) -> Arc<dyn Authenticator> {
    if admin.token.is_empty() {
        warn!("No admin token configured; admin routes are open");
        Arc::new(AllowAll)
    } else {
        info!("Admin routes require a bearer token");
        Arc::new(BearerToken::new(admin.token.clone()))
    }
}
