//! Admin router — browsing + editing routes driven by an explicit
//! `AdminConfig` registration (columns, search fields, filters, ordering).
//!
//! Permissions follow `{module}:{resource}:{action}` format.
//! Authentication is delegated to the `Authenticator` trait.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use repustore_core::{Authenticator, CountResult, ListParams, ListResult, ServiceError};
use repustore_sql::Value;
use serde_json::json;

use crate::resource::{json_body, parse_id, Resource};
use crate::sql::{Condition, Direction, ListQuery, SqlStore, SqlType};

/// One selectable value of a choices filter.
#[derive(Debug, Clone)]
pub struct FilterChoice {
    pub value: &'static str,
    pub label: String,
    pub conditions: Vec<Condition>,
}

/// A list filter shown beside the admin table.
#[derive(Debug, Clone)]
pub enum ListFilter {
    /// Exact match on a column: `?{column}=value`. Choices are the
    /// column's distinct values.
    Field(&'static str),
    /// Named choices, each standing for a fixed set of conditions:
    /// `?{param}=value`.
    Choices {
        param: &'static str,
        label: &'static str,
        choices: Vec<FilterChoice>,
    },
}

impl ListFilter {
    pub fn param(&self) -> &'static str {
        match self {
            ListFilter::Field(column) => *column,
            ListFilter::Choices { param, .. } => *param,
        }
    }
}

/// Admin registration for one resource.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Module id, first part of permissions (e.g. "inventory").
    pub module: &'static str,
    /// Snake_case resource name (e.g. "spare_part").
    pub resource: &'static str,
    /// URL path segment (e.g. "spare_parts").
    pub path: &'static str,
    /// Display label (e.g. "Spare parts").
    pub label: &'static str,
    /// Columns shown in the list table, in order.
    pub list_display: Vec<&'static str>,
    /// Columns matched by the `q` search box.
    pub search_fields: Vec<&'static str>,
    pub list_filter: Vec<ListFilter>,
    /// Default ordering; `-` prefix for descending.
    pub ordering: Vec<&'static str>,
}

impl AdminConfig {
    fn perm(&self, action: &str) -> String {
        format!("{}:{}:{}", self.module, self.resource, action)
    }

    /// Standard CRUD permissions for this resource.
    pub fn permissions(&self) -> Vec<String> {
        ["create", "read", "update", "delete", "list"]
            .iter()
            .map(|a| self.perm(a))
            .collect()
    }

    /// Columns the list may be sorted by: displayed columns that are stored,
    /// plus the primary key.
    fn sortable<T: SqlStore>(&self) -> Vec<&'static str> {
        let mut cols: Vec<&'static str> = self
            .list_display
            .iter()
            .copied()
            .filter(|c| T::column(c).is_some())
            .collect();
        cols.push(T::PK);
        cols
    }

    fn parse_order<T: SqlStore>(
        &self,
        spec: &str,
    ) -> Result<(&'static str, Direction), ServiceError> {
        let (name, dir) = match spec.strip_prefix('-') {
            Some(rest) => (rest, Direction::Desc),
            None => (spec, Direction::Asc),
        };
        self.sortable::<T>()
            .into_iter()
            .find(|c| *c == name)
            .map(|c| (c, dir))
            .ok_or_else(|| ServiceError::Validation(format!("cannot sort by '{}'", name)))
    }

    /// Translate list parameters into a store query.
    ///
    /// Search terms are whitespace-separated; each must match some search
    /// field. Unknown filter parameters are rejected.
    pub fn build_query<T: SqlStore>(&self, params: &ListParams) -> Result<ListQuery, ServiceError> {
        let mut query = ListQuery::new().page(params.limit, params.offset);

        if let Some(q) = &params.q {
            let terms: Vec<String> = q.split_whitespace().map(str::to_string).collect();
            if !terms.is_empty() && !self.search_fields.is_empty() {
                query = query.filter(Condition::Search {
                    columns: self.search_fields.clone(),
                    terms,
                });
            }
        }

        for (param, raw) in &params.filters {
            let filter = self
                .list_filter
                .iter()
                .find(|f| f.param() == param.as_str())
                .ok_or_else(|| ServiceError::Validation(format!("unknown filter '{}'", param)))?;
            match filter {
                ListFilter::Field(column) => {
                    let value = match T::column(column).map(|c| c.sql_type) {
                        Some(SqlType::Integer) => raw.trim().parse::<i64>().map(Value::Integer).map_err(|_| {
                            ServiceError::Validation(format!("filter '{}' expects an integer", param))
                        })?,
                        Some(SqlType::Text) => Value::Text(raw.clone()),
                        None => {
                            return Err(ServiceError::Internal(format!(
                                "filter column '{}' not declared",
                                column
                            )))
                        }
                    };
                    query = query.filter(Condition::Eq(*column, value));
                }
                ListFilter::Choices { choices, .. } => {
                    let choice = choices.iter().find(|c| c.value == raw.as_str()).ok_or_else(|| {
                        ServiceError::Validation(format!("invalid choice '{}' for filter '{}'", raw, param))
                    })?;
                    query.conditions.extend(choice.conditions.iter().cloned());
                }
            }
        }

        match &params.sort {
            Some(spec) => query.order.push(self.parse_order::<T>(spec)?),
            None => {
                for spec in &self.ordering {
                    query.order.push(self.parse_order::<T>(spec)?);
                }
            }
        }
        if !query.order.iter().any(|(c, _)| *c == T::PK) {
            query.order.push((T::PK, Direction::Asc));
        }

        Ok(query)
    }

    /// Registration as served to the admin UI.
    pub fn to_json(&self) -> serde_json::Value {
        let filters: Vec<serde_json::Value> = self
            .list_filter
            .iter()
            .map(|f| match f {
                ListFilter::Field(column) => json!({
                    "param": column,
                    "kind": "field",
                }),
                ListFilter::Choices { param, label, choices } => json!({
                    "param": param,
                    "label": label,
                    "kind": "choices",
                    "choices": choices
                        .iter()
                        .map(|c| json!({"value": c.value, "label": c.label}))
                        .collect::<Vec<_>>(),
                }),
            })
            .collect();

        json!({
            "module": self.module,
            "resource": self.resource,
            "path": self.path,
            "label": self.label,
            "listDisplay": self.list_display,
            "searchFields": self.search_fields,
            "listFilter": filters,
            "ordering": self.ordering,
            "permissions": self.permissions(),
        })
    }
}

fn value_to_json(v: &Value) -> serde_json::Value {
    match v {
        Value::Null => serde_json::Value::Null,
        Value::Integer(i) => json!(i),
        Value::Real(f) => json!(f),
        Value::Text(s) => json!(s),
        Value::Blob(_) => serde_json::Value::Null,
    }
}

/// Shared state for admin route handlers.
struct AdminState<T: SqlStore> {
    resource: Resource<T>,
    config: AdminConfig,
    auth: Arc<dyn Authenticator>,
}

impl<T: SqlStore> AdminState<T> {
    fn check(&self, headers: &HeaderMap, action: &str) -> Result<(), ServiceError> {
        self.auth.check(headers, &self.config.perm(action))
    }
}

/// Build an Axum router for admin browsing/editing of a SqlStore model.
///
/// Routes:
///   GET    /{resources}            — list (search `q`, filters, `sort`, paginated)
///   POST   /{resources}            — create
///   GET    /{resources}/@count     — count (same search/filters)
///   GET    /{resources}/@filters   — available filter values
///   GET    /{resources}/{id}       — get by id
///   PUT    /{resources}/{id}       — full update
///   PATCH  /{resources}/{id}       — partial update
///   DELETE /{resources}/{id}       — delete
pub fn admin_sql_router<T: SqlStore>(
    resource: Resource<T>,
    config: AdminConfig,
    auth: Arc<dyn Authenticator>,
) -> Router {
    let list_path = format!("/{}", config.path);
    let count_path = format!("/{}/@count", config.path);
    let filters_path = format!("/{}/@filters", config.path);
    let item_path = format!("/{}/{{id}}", config.path);

    let state = Arc::new(AdminState {
        resource,
        config,
        auth,
    });

    Router::new()
        .route(&list_path, get(list_handler::<T>).post(create_handler::<T>))
        .route(&count_path, get(count_handler::<T>))
        .route(&filters_path, get(filters_handler::<T>))
        .route(
            &item_path,
            get(get_handler::<T>)
                .put(update_handler::<T>)
                .patch(patch_handler::<T>)
                .delete(delete_handler::<T>),
        )
        .with_state(state)
}

async fn list_handler<T: SqlStore>(
    State(state): State<Arc<AdminState<T>>>,
    headers: HeaderMap,
    Query(raw): Query<HashMap<String, String>>,
) -> Result<Json<ListResult<serde_json::Value>>, ServiceError> {
    state.check(&headers, "list")?;

    let params = ListParams::from_query(raw)?;
    let query = state.config.build_query::<T>(&params)?;
    let records = state.resource.ops.query(&query)?;
    let total = state.resource.ops.count(&query)?;
    let items = state.resource.render_all(&records)?;
    Ok(Json(ListResult::new(items, total, params.offset)))
}

async fn count_handler<T: SqlStore>(
    State(state): State<Arc<AdminState<T>>>,
    headers: HeaderMap,
    Query(raw): Query<HashMap<String, String>>,
) -> Result<Json<CountResult>, ServiceError> {
    state.check(&headers, "list")?;

    let params = ListParams::from_query(raw)?;
    let query = state.config.build_query::<T>(&params)?;
    let count = state.resource.ops.count(&query)?;
    Ok(Json(CountResult { count }))
}

async fn filters_handler<T: SqlStore>(
    State(state): State<Arc<AdminState<T>>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ServiceError> {
    state.check(&headers, "list")?;

    let mut out = serde_json::Map::new();
    for filter in &state.config.list_filter {
        let values = match filter {
            ListFilter::Field(column) => state
                .resource
                .ops
                .distinct(*column)?
                .iter()
                .map(value_to_json)
                .collect::<Vec<_>>(),
            ListFilter::Choices { choices, .. } => choices
                .iter()
                .map(|c| json!({"value": c.value, "label": c.label}))
                .collect(),
        };
        out.insert(filter.param().to_string(), serde_json::Value::Array(values));
    }
    Ok(Json(serde_json::Value::Object(out)))
}

async fn get_handler<T: SqlStore>(
    State(state): State<Arc<AdminState<T>>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ServiceError> {
    state.check(&headers, "read")?;

    let record = state.resource.retrieve(parse_id::<T>(&id)?)?;
    Ok(Json(state.resource.render(&record)?))
}

async fn create_handler<T: SqlStore>(
    State(state): State<Arc<AdminState<T>>>,
    headers: HeaderMap,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<(StatusCode, Json<serde_json::Value>), ServiceError> {
    state.check(&headers, "create")?;

    let created = state.resource.create(&json_body(body)?)?;
    Ok((StatusCode::CREATED, Json(state.resource.render(&created)?)))
}

async fn update_handler<T: SqlStore>(
    State(state): State<Arc<AdminState<T>>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    state.check(&headers, "update")?;

    let id = parse_id::<T>(&id)?;
    let updated = state.resource.update(id, &json_body(body)?, false)?;
    Ok(Json(state.resource.render(&updated)?))
}

async fn patch_handler<T: SqlStore>(
    State(state): State<Arc<AdminState<T>>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    state.check(&headers, "update")?;

    let id = parse_id::<T>(&id)?;
    let patched = state.resource.update(id, &json_body(body)?, true)?;
    Ok(Json(state.resource.render(&patched)?))
}

async fn delete_handler<T: SqlStore>(
    State(state): State<Arc<AdminState<T>>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ServiceError> {
    state.check(&headers, "delete")?;

    state.resource.destroy(parse_id::<T>(&id)?)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::tests::{api, widget_resource};
    use repustore_core::{AllowAll, DenyAll};

    fn widget_admin() -> AdminConfig {
        AdminConfig {
            module: "test",
            resource: "widget",
            path: "widgets",
            label: "Widgets",
            list_display: vec!["label", "sku", "count"],
            search_fields: vec!["label", "sku"],
            list_filter: vec![
                ListFilter::Field("count"),
                ListFilter::Choices {
                    param: "level",
                    label: "Level",
                    choices: vec![
                        FilterChoice {
                            value: "empty",
                            label: "Empty".into(),
                            conditions: vec![Condition::Eq("count", Value::Integer(0))],
                        },
                        FilterChoice {
                            value: "some",
                            label: "Some".into(),
                            conditions: vec![Condition::Gt("count", Value::Integer(0))],
                        },
                    ],
                },
            ],
            ordering: vec!["label"],
        }
    }

    async fn seeded_router(auth: Arc<dyn Authenticator>) -> Router {
        let r = admin_sql_router(widget_resource(), widget_admin(), auth);
        for (label, sku, count) in [("Filtro", "FLT-1", 3), ("Aceite", "OIL-1", 0), ("Bomba", "PMP-1", 12)] {
            let (s, _) = api(
                &r,
                "POST",
                "/widgets",
                Some(json!({"label": label, "sku": sku, "count": count})),
            )
            .await;
            assert_eq!(s, StatusCode::CREATED);
        }
        r
    }

    fn labels(json: &serde_json::Value) -> Vec<String> {
        json["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["label"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn list_uses_default_ordering() {
        let r = seeded_router(Arc::new(AllowAll)).await;
        let (s, json) = api(&r, "GET", "/widgets", None).await;
        assert_eq!(s, StatusCode::OK);
        assert_eq!(labels(&json), ["Aceite", "Bomba", "Filtro"]);
        assert_eq!(json["total"], 3);
        assert_eq!(json["hasMore"], false);
    }

    #[tokio::test]
    async fn list_sort_search_filter_page() {
        let r = seeded_router(Arc::new(AllowAll)).await;

        let (_, json) = api(&r, "GET", "/widgets?sort=-count", None).await;
        assert_eq!(labels(&json), ["Bomba", "Filtro", "Aceite"]);

        let (_, json) = api(&r, "GET", "/widgets?q=flt", None).await;
        assert_eq!(labels(&json), ["Filtro"]);

        let (_, json) = api(&r, "GET", "/widgets?count=12", None).await;
        assert_eq!(labels(&json), ["Bomba"]);

        let (_, json) = api(&r, "GET", "/widgets?level=some", None).await;
        assert_eq!(labels(&json), ["Bomba", "Filtro"]);

        let (_, json) = api(&r, "GET", "/widgets?limit=1&offset=1", None).await;
        assert_eq!(labels(&json), ["Bomba"]);
        assert_eq!(json["total"], 3);
        assert_eq!(json["hasMore"], true);

        let (_, json) = api(&r, "GET", "/widgets/@count?q=o", None).await;
        assert_eq!(json["count"], 3);
    }

    #[tokio::test]
    async fn list_rejects_bad_parameters() {
        let r = seeded_router(Arc::new(AllowAll)).await;
        for uri in [
            "/widgets?sort=secret",
            "/widgets?color=red",
            "/widgets?count=lots",
            "/widgets?level=maybe",
            "/widgets?offset=9223372036854775808",
            "/widgets/@count?offset=99999999999999999999",
        ] {
            let (s, json) = api(&r, "GET", uri, None).await;
            assert_eq!(s, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(json["code"], "VALIDATION_FAILED");
        }
    }

    #[tokio::test]
    async fn filters_endpoint_lists_choices() {
        let r = seeded_router(Arc::new(AllowAll)).await;
        let (s, json) = api(&r, "GET", "/widgets/@filters", None).await;
        assert_eq!(s, StatusCode::OK);
        assert_eq!(json["count"], json!([0, 3, 12]));
        assert_eq!(json["level"][0]["value"], "empty");
    }

    #[tokio::test]
    async fn editor_writes_and_not_found() {
        let r = seeded_router(Arc::new(AllowAll)).await;
        let (s, json) = api(&r, "PATCH", "/widgets/1", Some(json!({"label": "Filtro HD"}))).await;
        assert_eq!(s, StatusCode::OK);
        assert_eq!(json["label"], "Filtro HD");

        let (s, _) = api(&r, "DELETE", "/widgets/1", None).await;
        assert_eq!(s, StatusCode::NO_CONTENT);
        let (s, _) = api(&r, "GET", "/widgets/1", None).await;
        assert_eq!(s, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn deny_all_blocks_everything() {
        let r = admin_sql_router(widget_resource(), widget_admin(), Arc::new(DenyAll));
        let (s, json) = api(&r, "GET", "/widgets", None).await;
        assert_eq!(s, StatusCode::FORBIDDEN);
        assert_eq!(json["code"], "PERMISSION_DENIED");
        let (s, _) = api(&r, "POST", "/widgets", Some(json!({"label": "x", "sku": "y"}))).await;
        assert_eq!(s, StatusCode::FORBIDDEN);
    }

    #[test]
    fn registration_json() {
        let json = widget_admin().to_json();
        assert_eq!(json["listDisplay"], json!(["label", "sku", "count"]));
        assert_eq!(json["listFilter"][0]["kind"], "field");
        assert_eq!(json["listFilter"][1]["choices"][1]["value"], "some");
        assert_eq!(json["permissions"][4], "test:widget:list");
    }
}
