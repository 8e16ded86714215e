use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::ServiceError;

/// Hard ceiling on `limit`, whatever the caller asks for.
pub const MAX_LIMIT: usize = 500;

/// Parameters for list/query operations.
///
/// Built from the raw query string so that resource-specific filter
/// parameters (e.g. `?stock=3`) survive alongside the common ones.
#[derive(Debug, Clone, PartialEq)]
pub struct ListParams {
    /// Maximum number of results to return.
    pub limit: usize,

    /// Offset for pagination.
    pub offset: usize,

    /// Sort field, `-` prefix for descending (e.g. `-price`).
    pub sort: Option<String>,

    /// Free-text search query.
    pub q: Option<String>,

    /// Every other query parameter, by name.
    pub filters: BTreeMap<String, String>,
}

fn default_limit() -> usize {
    100
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            offset: 0,
            sort: None,
            q: None,
            filters: BTreeMap::new(),
        }
    }
}

impl ListParams {
    /// Split a raw query map into the common parameters and filters.
    ///
    /// Empty `sort`/`q` values are treated as absent. `limit` is clamped
    /// to [`MAX_LIMIT`].
    pub fn from_query(query: HashMap<String, String>) -> Result<Self, ServiceError> {
        let mut params = ListParams::default();
        for (key, value) in query {
            match key.as_str() {
                "limit" => params.limit = parse_usize("limit", &value)?.min(MAX_LIMIT),
                "offset" => params.offset = parse_usize("offset", &value)?,
                "sort" => params.sort = non_empty(value),
                "q" => params.q = non_empty(value),
                _ => {
                    params.filters.insert(key, value);
                }
            }
        }
        Ok(params)
    }
}

/// Non-negative and within the store's signed 64-bit range.
fn parse_usize(name: &str, value: &str) -> Result<usize, ServiceError> {
    value
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|n| i64::try_from(*n).is_ok())
        .ok_or_else(|| {
            ServiceError::Validation(format!("'{}' must be a non-negative integer", name))
        })
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Result wrapper for paginated list operations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResult<T: Serialize> {
    pub items: Vec<T>,
    pub total: usize,
    pub has_more: bool,
}

impl<T: Serialize> ListResult<T> {
    pub fn new(items: Vec<T>, total: usize, offset: usize) -> Self {
        let has_more = offset + items.len() < total;
        Self {
            items,
            total,
            has_more,
        }
    }
}

/// Result of a count request.
#[derive(Debug, Clone, Serialize)]
pub struct CountResult {
    pub count: usize,
}
