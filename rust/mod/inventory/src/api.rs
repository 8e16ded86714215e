//! Programmatic routes: generic CRUD plus the stock summary.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use repustore_core::ServiceError;
use repustore_sql::Value;
use repustore_store::{resource_router, Condition, ListQuery, Resource, SqlOps};
use serde::Serialize;

use crate::model::SparePart;

/// Stock totals across all spare parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSummary {
    pub total: usize,
    pub total_stock: i64,
    /// Parts at or below the low-stock threshold, empty ones included.
    pub low_stock: usize,
    pub out_of_stock: usize,
}

pub fn stock_summary(ops: &SqlOps<SparePart>, low_stock_threshold: u32) -> Result<StockSummary, ServiceError> {
    let all = ListQuery::new();
    let low = ListQuery::new().filter(Condition::Le("stock", Value::Integer(i64::from(low_stock_threshold))));
    let out = ListQuery::new().filter(Condition::Eq("stock", Value::Integer(0)));
    Ok(StockSummary {
        total: ops.count(&all)?,
        total_stock: ops.sum("stock", &all)?,
        low_stock: ops.count(&low)?,
        out_of_stock: ops.count(&out)?,
    })
}

#[derive(Clone)]
struct SummaryState {
    ops: Arc<SqlOps<SparePart>>,
    low_stock_threshold: u32,
}

/// Routes:
///   /spare_parts            — list, create
///   /spare_parts/@summary   — stock totals
///   /spare_parts/{id}       — retrieve, update, delete
pub fn router(resource: Resource<SparePart>, low_stock_threshold: u32) -> Router {
    let summary = Router::new()
        .route("/spare_parts/@summary", get(summary_handler))
        .with_state(SummaryState {
            ops: resource.ops.clone(),
            low_stock_threshold,
        });

    resource_router(resource, "spare_parts").merge(summary)
}

async fn summary_handler(State(state): State<SummaryState>) -> Result<Json<StockSummary>, ServiceError> {
    Ok(Json(stock_summary(&state.ops, state.low_stock_threshold)?))
}
