use axum::Router;

/// A business module that contributes HTTP routes.
///
/// The binary collects all modules, nests `routes()` under `/{name}` and
/// `admin_routes()` under `/admin/{name}`, and gathers `schema()` into the
/// `/meta/schema` document.
pub trait Module: Send + Sync {
    /// Module name, used for logging and route prefixes.
    fn name(&self) -> &str;

    /// Programmatic API routes, nested under `/{name}`.
    fn routes(&self) -> Router;

    /// Administrative browsing/editing routes, nested under `/admin/{name}`.
    fn admin_routes(&self) -> Option<Router> {
        None
    }

    /// Admin registration for this module, as served at `/meta/schema`.
    fn schema(&self) -> Option<serde_json::Value> {
        None
    }
}
