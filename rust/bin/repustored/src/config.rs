//! Server-side configuration file (`/etc/repustore/<name>.toml`).

use std::path::{Path, PathBuf};

use anyhow::Context;
use inventory::InventoryConfig;
use serde::Deserialize;

/// Directory holding named server configs.
pub const CONFIG_DIR: &str = "/etc/repustore";

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ListenConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub admin: AdminAuthConfig,
    #[serde(default)]
    pub inventory: InventoryConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
    /// Defaults to `{data_dir}/data.sqlite`.
    #[serde(default)]
    pub sqlite_path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminAuthConfig {
    /// Bearer token required on admin routes. Empty leaves them open.
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub format: LogFormat,
}

impl ServerConfig {
    /// Resolve a context name or path to a config file path.
    ///
    /// Anything with a `/` or a `.toml` suffix is a path; a bare name maps
    /// to `/etc/repustore/<name>.toml`.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.ends_with(".toml") {
            PathBuf::from(name_or_path)
        } else {
            Path::new(CONFIG_DIR).join(format!("{}.toml", name_or_path))
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_names_and_paths() {
        assert_eq!(
            ServerConfig::resolve_path("shop"),
            PathBuf::from("/etc/repustore/shop.toml")
        );
        assert_eq!(
            ServerConfig::resolve_path("./dev.toml"),
            PathBuf::from("./dev.toml")
        );
        assert_eq!(
            ServerConfig::resolve_path("local.toml"),
            PathBuf::from("local.toml")
        );
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = ServerConfig::parse("[storage]\ndata_dir = \"/var/lib/repustore\"\n").unwrap();
        assert_eq!(config.server.listen, "0.0.0.0:8080");
        assert_eq!(config.storage.sqlite_path, None);
        assert!(config.admin.token.is_empty());
        assert!(config.inventory.allow_negative_price);
        assert_eq!(config.inventory.low_stock_threshold, 5);
        assert_eq!(config.log.format, LogFormat::Text);
    }

    #[test]
    fn full_config() {
        let config = ServerConfig::parse(
            r#"
[server]
listen = "127.0.0.1:9000"

[storage]
data_dir = "/data"
sqlite_path = "/data/parts.db"

[admin]
token = "s3cret"

[inventory]
allow_negative_price = false
low_stock_threshold = 10

[log]
format = "json"
"#,
        )
        .unwrap();
        assert_eq!(config.server.listen, "127.0.0.1:9000");
        assert_eq!(config.storage.sqlite_path.as_deref(), Some("/data/parts.db"));
        assert_eq!(config.admin.token, "s3cret");
        assert!(!config.inventory.allow_negative_price);
        assert_eq!(config.inventory.low_stock_threshold, 10);
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    fn rejects_missing_storage_and_negative_threshold() {
        assert!(ServerConfig::parse("[server]\nlisten = \"x\"\n").is_err());
        assert!(ServerConfig::parse(
            "[storage]\ndata_dir = \"/d\"\n[inventory]\nlow_stock_threshold = -1\n"
        )
        .is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dev.toml");
        std::fs::write(&path, "[storage]\ndata_dir = \"/tmp/rs\"\n").unwrap();
        let config = ServerConfig::load(&path).unwrap();
        assert_eq!(config.storage.data_dir, "/tmp/rs");

        let err = ServerConfig::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().contains("cannot read config file"));
    }
}
