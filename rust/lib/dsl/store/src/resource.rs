//! Resource router — programmatic CRUD endpoints for a SqlStore model.
//!
//! Routes:
//!   GET    /{resources}        — list (all records, key order)
//!   POST   /{resources}        — create (201)
//!   GET    /{resources}/{id}   — retrieve
//!   PUT    /{resources}/{id}   — full update
//!   PATCH  /{resources}/{id}   — partial update
//!   DELETE /{resources}/{id}   — delete (204)
//!
//! `Resource<T>` holds the operations both this router and the admin
//! router share.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use repustore_core::ServiceError;
use serde_json::Value;

use crate::serializer::RecordSerializer;
use crate::sql::{SqlOps, SqlStore};

/// A model's store operations paired with its serializer.
pub struct Resource<T: SqlStore> {
    pub ops: Arc<SqlOps<T>>,
    pub serializer: Arc<dyn RecordSerializer<T>>,
}

impl<T: SqlStore> Clone for Resource<T> {
    fn clone(&self) -> Self {
        Self {
            ops: Arc::clone(&self.ops),
            serializer: Arc::clone(&self.serializer),
        }
    }
}

impl<T: SqlStore> Resource<T> {
    pub fn new(ops: Arc<SqlOps<T>>, serializer: Arc<dyn RecordSerializer<T>>) -> Self {
        Self { ops, serializer }
    }

    pub fn render(&self, record: &T) -> Result<Value, ServiceError> {
        self.serializer.to_json(record)
    }

    pub fn render_all(&self, records: &[T]) -> Result<Vec<Value>, ServiceError> {
        records.iter().map(|r| self.render(r)).collect()
    }

    pub fn retrieve(&self, id: i64) -> Result<T, ServiceError> {
        self.ops.get_or_err(id)
    }

    /// Validate a payload and insert it.
    pub fn create(&self, payload: &Value) -> Result<T, ServiceError> {
        let record = self.serializer.create(payload)?;
        self.ops.save_new(record)
    }

    /// Validate a payload against the stored record and write the result.
    /// NotFound (and no write) if the record does not exist.
    pub fn update(&self, id: i64, payload: &Value, partial: bool) -> Result<T, ServiceError> {
        let current = self.ops.get_or_err(id)?;
        let mut record = self.serializer.update(&current, payload, partial)?;
        record.set_pk(id);
        self.ops.save(record)
    }

    pub fn destroy(&self, id: i64) -> Result<(), ServiceError> {
        self.ops.delete(id)
    }
}

/// Parse a path id. Anything that is not an integer cannot name a record,
/// so it is reported as NotFound.
pub fn parse_id<T: SqlStore>(raw: &str) -> Result<i64, ServiceError> {
    raw.parse::<i64>().map_err(|_| {
        ServiceError::NotFound(format!("{} '{}' not found", T::verbose_name(), raw))
    })
}

/// Unwrap a JSON body, turning extractor rejections into a 400.
pub fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ServiceError> {
    body.map(|Json(v)| v)
        .map_err(|rejection| ServiceError::Validation(rejection.body_text()))
}

/// Build an Axum router for programmatic CRUD on a SqlStore model.
///
/// - `resource_path`: URL segment (e.g. "spare_parts")
pub fn resource_router<T: SqlStore>(resource: Resource<T>, resource_path: &str) -> Router {
    let list_path = format!("/{}", resource_path);
    let item_path = format!("/{}/{{id}}", resource_path);

    Router::new()
        .route(&list_path, get(list_handler::<T>).post(create_handler::<T>))
        .route(
            &item_path,
            get(get_handler::<T>)
                .put(update_handler::<T>)
                .patch(patch_handler::<T>)
                .delete(delete_handler::<T>),
        )
        .with_state(Arc::new(resource))
}

async fn list_handler<T: SqlStore>(
    State(res): State<Arc<Resource<T>>>,
) -> Result<Json<Vec<Value>>, ServiceError> {
    let records = res.ops.list()?;
    Ok(Json(res.render_all(&records)?))
}

async fn get_handler<T: SqlStore>(
    State(res): State<Arc<Resource<T>>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ServiceError> {
    let record = res.retrieve(parse_id::<T>(&id)?)?;
    Ok(Json(res.render(&record)?))
}

async fn create_handler<T: SqlStore>(
    State(res): State<Arc<Resource<T>>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ServiceError> {
    let created = res.create(&json_body(body)?)?;
    Ok((StatusCode::CREATED, Json(res.render(&created)?)))
}

async fn update_handler<T: SqlStore>(
    State(res): State<Arc<Resource<T>>>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ServiceError> {
    let id = parse_id::<T>(&id)?;
    let updated = res.update(id, &json_body(body)?, false)?;
    Ok(Json(res.render(&updated)?))
}

async fn patch_handler<T: SqlStore>(
    State(res): State<Arc<Resource<T>>>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ServiceError> {
    let id = parse_id::<T>(&id)?;
    let patched = res.update(id, &json_body(body)?, true)?;
    Ok(Json(res.render(&patched)?))
}

async fn delete_handler<T: SqlStore>(
    State(res): State<Arc<Resource<T>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    res.destroy(parse_id::<T>(&id)?)?;
    Ok(StatusCode::NO_CONTENT)
}
