//! Repustore store layer.
//!
//! Models implement `SqlStore` to declare their table (columns, UNIQUE,
//! INDEX) and hooks; CRUD operations are provided by `SqlOps`. A
//! `RecordSerializer` maps JSON payloads onto models, and the routers
//! expose a model over HTTP.
//!
//! ```ignore
//! impl SqlStore for SparePart {
//!     const COLUMNS: &'static [Column] = &[Column::new("code", SqlType::Text, "NOT NULL")];
//!     const UNIQUE: &'static [&'static [&'static str]] = &[&["code"]];
//!     fn table_name() -> &'static str { "spare_parts" }
//!     // ...
//! }
//! ```

pub mod admin;
pub mod resource;
pub mod schema;
pub mod serializer;
pub mod sql;

pub use admin::{admin_sql_router, AdminConfig, FilterChoice, ListFilter};
pub use resource::{resource_router, Resource};
pub use schema::{build_schema, FieldDef, ModuleDef, ResourceDef};
pub use serializer::{expect_object, RecordSerializer, NON_FIELD_ERRORS};
pub use sql::{Column, Condition, Direction, ListQuery, SqlOps, SqlStore, SqlType};
