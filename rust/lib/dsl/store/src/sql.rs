//! SqlStore trait + SqlOps CRUD operations.
//!
//! Models impl `SqlStore` to declare their table: columns, UNIQUE and INDEX
//! groups, and the field-for-field mapping between the struct and a row.
//! `SqlOps<T>` provides CRUD + filtered queries using a SQLStore backend.
//!
//! Every model gets an `INTEGER PRIMARY KEY AUTOINCREMENT` column named
//! `SqlStore::PK`; the remaining columns are declared in `COLUMNS`.

use std::sync::Arc;

use repustore_core::{FieldErrors, ServiceError};
use repustore_sql::{Row, SQLError, SQLStore, Value};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Storage class of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Text,
}

impl SqlType {
    fn ddl(self) -> &'static str {
        match self {
            SqlType::Integer => "INTEGER",
            SqlType::Text => "TEXT",
        }
    }
}

/// A non-key column of a model table.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub sql_type: SqlType,
    /// DDL appended after the type, e.g. `NOT NULL DEFAULT 0 CHECK (stock >= 0)`.
    pub constraints: &'static str,
}

impl Column {
    pub const fn new(name: &'static str, sql_type: SqlType, constraints: &'static str) -> Self {
        Self {
            name,
            sql_type,
            constraints,
        }
    }
}

/// Trait implemented by models for SQL-backed storage.
pub trait SqlStore: Serialize + Clone + Send + Sync + 'static {
    /// Primary key column (auto-assigned integer).
    const PK: &'static str = "id";

    /// Non-key columns, in the order `to_values()` yields them.
    const COLUMNS: &'static [Column];

    /// Unique constraints. Each entry is a set of columns forming a unique key.
    const UNIQUE: &'static [&'static [&'static str]] = &[];

    /// Index definitions. Each entry is a set of columns forming an index.
    const INDEX: &'static [&'static [&'static str]] = &[];

    /// Table name in SQL.
    fn table_name() -> &'static str;

    /// Human-readable singular name used in messages (e.g. "spare part").
    fn verbose_name() -> &'static str;

    /// Primary key, once assigned by the store.
    fn pk(&self) -> Option<i64>;

    fn set_pk(&mut self, id: i64);

    /// Column values, one per entry of `COLUMNS`.
    fn to_values(&self) -> Vec<Value>;

    /// Rebuild a record from a row holding `PK` + `COLUMNS`.
    fn from_row(row: &Row) -> Result<Self, ServiceError>;

    /// Look up a declared column by name.
    fn column(name: &str) -> Option<&'static Column> {
        Self::COLUMNS.iter().find(|c| c.name == name)
    }
}

// ── Queries ──

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// A WHERE condition over model columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(&'static str, Value),
    Le(&'static str, Value),
    Gt(&'static str, Value),
    /// Every term must appear (case-insensitive substring) in at least one
    /// of the columns.
    Search {
        columns: Vec<&'static str>,
        terms: Vec<String>,
    },
}

/// Filter + order + page for `SqlOps::query`.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub conditions: Vec<Condition>,
    pub order: Vec<(&'static str, Direction)>,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn order_by(mut self, column: &'static str, direction: Direction) -> Self {
        self.order.push((column, direction));
        self
    }

    pub fn page(mut self, limit: usize, offset: usize) -> Self {
        self.limit = Some(limit);
        self.offset = offset;
        self
    }
}

fn quote(name: &str) -> String {
    format!("\"{}\"", name)
}

/// Escape LIKE wildcards; used with `ESCAPE '\'`.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// Render conditions as a WHERE clause (empty string if none), appending
/// bound values to `params`.
fn where_clause(conditions: &[Condition], params: &mut Vec<Value>) -> String {
    let mut parts = Vec::new();
    for cond in conditions {
        match cond {
            Condition::Eq(col, v) | Condition::Le(col, v) | Condition::Gt(col, v) => {
                let op = match cond {
                    Condition::Eq(..) => "=",
                    Condition::Le(..) => "<=",
                    _ => ">",
                };
                params.push(v.clone());
                parts.push(format!("{} {} ?{}", quote(col), op, params.len()));
            }
            Condition::Search { columns, terms } => {
                for term in terms {
                    params.push(Value::Text(like_pattern(term)));
                    let n = params.len();
                    let any: Vec<String> = columns
                        .iter()
                        .map(|c| format!("{} LIKE ?{} ESCAPE '\\'", quote(c), n))
                        .collect();
                    parts.push(format!("({})", any.join(" OR ")));
                }
            }
        }
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

// ── SqlOps ──

/// CRUD operations for a SqlStore model.
pub struct SqlOps<T: SqlStore> {
    sql: Arc<dyn SQLStore>,
    _phantom: std::marker::PhantomData<T>,
}

impl<T: SqlStore> SqlOps<T> {
    pub fn new(sql: Arc<dyn SQLStore>) -> Self {
        Self {
            sql,
            _phantom: std::marker::PhantomData,
        }
    }

    fn sql_err(e: SQLError) -> ServiceError {
        match e {
            SQLError::Constraint(msg) => {
                warn!(table = T::table_name(), "store constraint violation: {}", msg);
                ServiceError::Conflict(format!(
                    "{} violates a store constraint: {}",
                    T::verbose_name(),
                    msg
                ))
            }
            other => ServiceError::Storage(other.to_string()),
        }
    }

    fn is_known_column(name: &str) -> bool {
        name == T::PK || T::column(name).is_some()
    }

    /// Ensure the table and its indexes exist. Call once at startup.
    pub fn ensure_table(&self) -> Result<(), ServiceError> {
        let table = T::table_name();

        let mut cols = vec![format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", quote(T::PK))];
        for c in T::COLUMNS {
            let mut col = format!("{} {}", quote(c.name), c.sql_type.ddl());
            if !c.constraints.is_empty() {
                col.push(' ');
                col.push_str(c.constraints);
            }
            cols.push(col);
        }

        let create_sql = format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote(table),
            cols.join(", ")
        );
        self.sql.exec(&create_sql, &[]).map_err(Self::sql_err)?;

        for (i, group) in T::UNIQUE.iter().enumerate() {
            let ucols: Vec<String> = group.iter().map(|c| quote(c)).collect();
            let idx_sql = format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS \"idx_{}_uq_{}\" ON {} ({})",
                table,
                i,
                quote(table),
                ucols.join(", ")
            );
            self.sql.exec(&idx_sql, &[]).map_err(Self::sql_err)?;
        }

        for (i, group) in T::INDEX.iter().enumerate() {
            let icols: Vec<String> = group.iter().map(|c| quote(c)).collect();
            let idx_sql = format!(
                "CREATE INDEX IF NOT EXISTS \"idx_{}_{}\" ON {} ({})",
                table,
                i,
                quote(table),
                icols.join(", ")
            );
            self.sql.exec(&idx_sql, &[]).map_err(Self::sql_err)?;
        }

        debug!(table, "table ready");
        Ok(())
    }

    fn select_prefix() -> String {
        let mut cols = vec![quote(T::PK)];
        cols.extend(T::COLUMNS.iter().map(|c| quote(c.name)));
        format!("SELECT {} FROM {}", cols.join(", "), quote(T::table_name()))
    }

    fn load(&self, sql: &str, params: &[Value]) -> Result<Vec<T>, ServiceError> {
        debug!(sql, "query");
        let rows = self.sql.query(sql, params).map_err(Self::sql_err)?;
        rows.iter().map(T::from_row).collect()
    }

    /// Get a record by primary key.
    pub fn get(&self, id: i64) -> Result<Option<T>, ServiceError> {
        let sql = format!("{} WHERE {} = ?1", Self::select_prefix(), quote(T::PK));
        Ok(self.load(&sql, &[Value::Integer(id)])?.into_iter().next())
    }

    /// Get a record or return NotFound.
    pub fn get_or_err(&self, id: i64) -> Result<T, ServiceError> {
        self.get(id)?.ok_or_else(|| {
            ServiceError::NotFound(format!("{} {} not found", T::verbose_name(), id))
        })
    }

    /// List all records in primary key order.
    pub fn list(&self) -> Result<Vec<T>, ServiceError> {
        let sql = format!("{} ORDER BY {} ASC", Self::select_prefix(), quote(T::PK));
        self.load(&sql, &[])
    }

    /// Filtered, ordered, paginated listing.
    pub fn query(&self, query: &ListQuery) -> Result<Vec<T>, ServiceError> {
        let mut params = Vec::new();
        let mut sql = Self::select_prefix();
        sql.push_str(&where_clause(&query.conditions, &mut params));

        if !query.order.is_empty() {
            let mut terms = Vec::with_capacity(query.order.len());
            for (col, dir) in &query.order {
                if !Self::is_known_column(col) {
                    return Err(ServiceError::Validation(format!(
                        "cannot order by unknown column '{}'",
                        col
                    )));
                }
                let dir = match dir {
                    Direction::Asc => "ASC",
                    Direction::Desc => "DESC",
                };
                terms.push(format!("{} {}", quote(col), dir));
            }
            sql.push_str(&format!(" ORDER BY {}", terms.join(", ")));
        }

        if query.limit.is_some() || query.offset > 0 {
            let limit = query.limit.map_or(Ok(-1), i64::try_from);
            let offset = i64::try_from(query.offset);
            let (Ok(limit), Ok(offset)) = (limit, offset) else {
                return Err(ServiceError::Validation("limit/offset out of range".into()));
            };
            params.push(Value::Integer(limit));
            params.push(Value::Integer(offset));
            sql.push_str(&format!(" LIMIT ?{} OFFSET ?{}", params.len() - 1, params.len()));
        }

        self.load(&sql, &params)
    }

    /// Count records matching the query's conditions (order and page ignored).
    pub fn count(&self, query: &ListQuery) -> Result<usize, ServiceError> {
        let mut params = Vec::new();
        let sql = format!(
            "SELECT COUNT(*) AS n FROM {}{}",
            quote(T::table_name()),
            where_clause(&query.conditions, &mut params)
        );
        let rows = self.sql.query(&sql, &params).map_err(Self::sql_err)?;
        let n = rows.first().and_then(|r| r.get_i64("n")).unwrap_or(0);
        Ok(n.max(0) as usize)
    }

    /// Sum of an integer column over records matching the query's conditions.
    pub fn sum(&self, column: &'static str, query: &ListQuery) -> Result<i64, ServiceError> {
        if T::column(column).map(|c| c.sql_type) != Some(SqlType::Integer) {
            return Err(ServiceError::Internal(format!(
                "cannot sum non-integer column '{}'",
                column
            )));
        }
        let mut params = Vec::new();
        let sql = format!(
            "SELECT COALESCE(SUM({}), 0) AS total FROM {}{}",
            quote(column),
            quote(T::table_name()),
            where_clause(&query.conditions, &mut params)
        );
        let rows = self.sql.query(&sql, &params).map_err(Self::sql_err)?;
        Ok(rows.first().and_then(|r| r.get_i64("total")).unwrap_or(0))
    }

    /// Distinct values of a column, ascending.
    pub fn distinct(&self, column: &'static str) -> Result<Vec<Value>, ServiceError> {
        if T::column(column).is_none() {
            return Err(ServiceError::Internal(format!("unknown column '{}'", column)));
        }
        let sql = format!(
            "SELECT DISTINCT {c} AS v FROM {t} ORDER BY {c} ASC",
            c = quote(column),
            t = quote(T::table_name())
        );
        let rows = self.sql.query(&sql, &[]).map_err(Self::sql_err)?;
        Ok(rows.into_iter().filter_map(|r| r.first().cloned()).collect())
    }

    /// Check UNIQUE groups against existing rows, excluding the record itself.
    ///
    /// Reports a field error per violated group. The store's unique index
    /// still guards against races between this check and the write.
    pub fn check_unique(&self, record: &T) -> Result<(), ServiceError> {
        let values = record.to_values();
        let mut errors = FieldErrors::new();

        for group in T::UNIQUE {
            let mut params = Vec::new();
            let mut clauses = Vec::new();
            for col in *group {
                let idx = T::COLUMNS
                    .iter()
                    .position(|c| c.name == *col)
                    .ok_or_else(|| {
                        ServiceError::Internal(format!("unique column '{}' not declared", col))
                    })?;
                params.push(values[idx].clone());
                clauses.push(format!("{} = ?{}", quote(col), params.len()));
            }
            if let Some(id) = record.pk() {
                params.push(Value::Integer(id));
                clauses.push(format!("{} != ?{}", quote(T::PK), params.len()));
            }
            let sql = format!(
                "SELECT {} FROM {} WHERE {} LIMIT 1",
                quote(T::PK),
                quote(T::table_name()),
                clauses.join(" AND ")
            );
            let rows = self.sql.query(&sql, &params).map_err(Self::sql_err)?;
            if rows.is_empty() {
                continue;
            }
            if let [col] = group {
                errors.add(
                    col,
                    format!("{} with this {} already exists.", T::verbose_name(), col),
                );
            } else {
                errors.add(
                    "non_field_errors",
                    format!("The fields {} must make a unique set.", group.join(", ")),
                );
            }
        }

        errors.into_result(()).map_err(ServiceError::Invalid)
    }

    /// Insert a new record and return it with its key.
    pub fn save_new(&self, mut record: T) -> Result<T, ServiceError> {
        self.check_unique(&record)?;

        let cols: Vec<String> = T::COLUMNS.iter().map(|c| quote(c.name)).collect();
        let placeholders: Vec<String> = (1..=cols.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            quote(T::table_name()),
            cols.join(", "),
            placeholders.join(", "),
            quote(T::PK)
        );

        let rows = self
            .sql
            .query(&sql, &record.to_values())
            .map_err(Self::sql_err)?;
        let id = rows
            .first()
            .and_then(|r| r.get_i64(T::PK))
            .ok_or_else(|| ServiceError::Internal("insert returned no key".into()))?;
        record.set_pk(id);

        info!(table = T::table_name(), id, "created");
        Ok(record)
    }

    /// Update an existing record in place.
    pub fn save(&self, record: T) -> Result<T, ServiceError> {
        let id = record.pk().ok_or_else(|| {
            ServiceError::Validation(format!("{} has no primary key", T::verbose_name()))
        })?;
        self.check_unique(&record)?;

        let mut params = record.to_values();
        let sets: Vec<String> = T::COLUMNS
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{} = ?{}", quote(c.name), i + 1))
            .collect();
        params.push(Value::Integer(id));
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?{}",
            quote(T::table_name()),
            sets.join(", "),
            quote(T::PK),
            params.len()
        );

        let affected = self.sql.exec(&sql, &params).map_err(Self::sql_err)?;
        if affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "{} {} not found",
                T::verbose_name(),
                id
            )));
        }
        info!(table = T::table_name(), id, "updated");
        Ok(record)
    }

    /// Delete a record by primary key. NotFound if it does not exist.
    pub fn delete(&self, id: i64) -> Result<(), ServiceError> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1",
            quote(T::table_name()),
            quote(T::PK)
        );
        let affected = self
            .sql
            .exec(&sql, &[Value::Integer(id)])
            .map_err(Self::sql_err)?;
        if affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "{} {} not found",
                T::verbose_name(),
                id
            )));
        }
        info!(table = T::table_name(), id, "deleted");
        Ok(())
    }
}
