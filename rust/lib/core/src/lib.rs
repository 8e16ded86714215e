pub mod auth;
pub mod config;
pub mod error;
pub mod module;
pub mod types;

pub use auth::{AllowAll, Authenticator, BearerToken, DenyAll};
pub use config::ServiceConfig;
pub use error::{FieldErrors, ServiceError};
pub use module::Module;
pub use types::{CountResult, ListParams, ListResult, MAX_LIMIT};
