pub mod admin;
pub mod api;
pub mod model;
pub mod price;
pub mod serializer;
mod store_impls;

use std::sync::Arc;

use axum::Router;
use repustore_core::{Authenticator, Module, ServiceError};
use repustore_sql::SQLStore;
use repustore_store::{admin_sql_router, ModuleDef, Resource, SqlOps};
use serde::Deserialize;
use tracing::info;

pub use model::{SparePart, StockStatus};
pub use serializer::SparePartSerializer;

/// Module id: route prefix and first part of permissions.
pub const MODULE: &str = "inventory";

/// `[inventory]` section of the server config.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// When false, a negative price is a field error.
    pub allow_negative_price: bool,
    /// Stock at or below this (and above zero) counts as low.
    pub low_stock_threshold: u32,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            allow_negative_price: true,
            low_stock_threshold: 5,
        }
    }
}

/// Inventory Module — spare parts on hand.
pub struct InventoryModule {
    spare_parts: Resource<SparePart>,
    config: InventoryConfig,
    auth: Arc<dyn Authenticator>,
}

impl InventoryModule {
    /// Create the module, making sure its tables exist.
    pub fn new(
        sql: Arc<dyn SQLStore>,
        config: InventoryConfig,
        auth: Arc<dyn Authenticator>,
    ) -> Result<Self, ServiceError> {
        let ops = SqlOps::<SparePart>::new(sql);
        ops.ensure_table()?;

        let serializer = SparePartSerializer {
            allow_negative_price: config.allow_negative_price,
            low_stock_threshold: config.low_stock_threshold,
        };
        info!(
            low_stock_threshold = config.low_stock_threshold,
            allow_negative_price = config.allow_negative_price,
            "inventory module ready"
        );
        Ok(Self {
            spare_parts: Resource::new(Arc::new(ops), Arc::new(serializer)),
            config,
            auth,
        })
    }
}

impl Module for InventoryModule {
    fn name(&self) -> &str {
        MODULE
    }

    fn routes(&self) -> Router {
        api::router(self.spare_parts.clone(), self.config.low_stock_threshold)
    }

    fn admin_routes(&self) -> Option<Router> {
        Some(admin_sql_router(
            self.spare_parts.clone(),
            admin::spare_part_admin(self.config.low_stock_threshold),
            self.auth.clone(),
        ))
    }

    fn schema(&self) -> Option<serde_json::Value> {
        let def = ModuleDef {
            id: MODULE,
            label: "Inventory",
            resources: vec![admin::spare_part_resource_def(self.config.low_stock_threshold)],
        };
        Some(def.to_json())
    }
}
