//! Route registration — collects all module routes + system endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use repustore_core::Module;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Request bodies above this size are rejected with 413.
pub const BODY_LIMIT_BYTES: usize = 64 * 1024;

/// Build the complete router with all routes.
///
/// Each module's `routes()` is mounted under `/{name}` and its
/// `admin_routes()` under `/admin/{name}`.
pub fn build_router(modules: &[Box<dyn Module>], schema: serde_json::Value) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .route("/meta/schema", get(schema_endpoint))
        .with_state(Arc::new(schema));

    for module in modules {
        let name = module.name();
        app = app.nest(&format!("/{}", name), module.routes());
        if let Some(admin) = module.admin_routes() {
            app = app.nest(&format!("/admin/{}", name), admin);
        }
        tracing::debug!(module = name, "routes mounted");
    }

    app.layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
    }))
}

async fn version() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "repustored",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Serve the admin registration of every module.
async fn schema_endpoint(State(schema): State<Arc<serde_json::Value>>) -> impl IntoResponse {
    Json(schema.as_ref().clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use inventory::{InventoryConfig, InventoryModule};
    use repustore_core::{Authenticator, BearerToken};
    use repustore_sql::{SQLStore, SqliteStore};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        let sql: Arc<dyn SQLStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let auth: Arc<dyn Authenticator> = Arc::new(BearerToken::new("t0k"));
        let module = InventoryModule::new(sql, InventoryConfig::default(), auth).unwrap();
        let schema = repustore_store::build_schema("RepuStore", vec![module.schema().unwrap()]);
        let modules: Vec<Box<dyn Module>> = vec![Box::new(module)];
        build_router(&modules, schema)
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn system_endpoints() {
        let app = app();
        let (s, json) = send(&app, get("/health")).await;
        assert_eq!(s, StatusCode::OK);
        assert_eq!(json["status"], "ok");

        let (_, json) = send(&app, get("/version")).await;
        assert_eq!(json["name"], "repustored");

        let (_, json) = send(&app, get("/meta/schema")).await;
        assert_eq!(json["name"], "RepuStore");
        assert_eq!(json["modules"][0]["resources"][0]["resource"], "spare_part");
        assert!(json["permissions"]["inventory"]["spare_part"]["actions"].is_array());
    }

    #[tokio::test]
    async fn module_routes_are_mounted() {
        let app = app();
        let req = Request::builder()
            .method("POST")
            .uri("/inventory/spare_parts")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({"name": "Filtro", "code": "FLT-1", "price": "9.90"}).to_string(),
            ))
            .unwrap();
        let (s, _) = send(&app, req).await;
        assert_eq!(s, StatusCode::CREATED);

        let (s, json) = send(&app, get("/inventory/spare_parts")).await;
        assert_eq!(s, StatusCode::OK);
        assert_eq!(json[0]["code"], "FLT-1");
    }

    #[tokio::test]
    async fn admin_routes_require_token() {
        let app = app();
        let (s, json) = send(&app, get("/admin/inventory/spare_parts")).await;
        assert_eq!(s, StatusCode::UNAUTHORIZED);
        assert_eq!(json["code"], "UNAUTHENTICATED");

        let req = Request::builder()
            .uri("/admin/inventory/spare_parts")
            .header(header::AUTHORIZATION, "Bearer t0k")
            .body(Body::empty())
            .unwrap();
        let (s, json) = send(&app, req).await;
        assert_eq!(s, StatusCode::OK);
        assert_eq!(json["total"], 0);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let app = app();
        let body = json!({"name": "x".repeat(BODY_LIMIT_BYTES + 1)}).to_string();
        let req = Request::builder()
            .method("POST")
            .uri("/inventory/spare_parts")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CONTENT_LENGTH, body.len())
            .body(Body::from(body))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
