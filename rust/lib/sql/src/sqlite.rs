use std::path::Path;
use std::sync::Mutex;

use rusqlite::types::ValueRef;
use rusqlite::{Connection, ErrorCode};

use crate::error::SQLError;
use crate::traits::{Row, SQLStore, Value};

/// SqliteStore is a SQLStore implementation backed by rusqlite (bundled SQLite).
///
/// All statements are serialized through one connection; SQLite itself
/// enforces UNIQUE/CHECK constraints atomically per statement.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path.
    pub fn open(path: &Path) -> Result<Self, SQLError> {
        let conn = Connection::open(path).map_err(|e| SQLError::Connection(e.to_string()))?;

        // WAL for concurrent readers from other processes (backups, sqlite3 shell).
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| SQLError::Connection(e.to_string()))?;

        tracing::debug!(path = %path.display(), "opened sqlite store");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite database (useful for tests).
    pub fn open_in_memory() -> Result<Self, SQLError> {
        let conn =
            Connection::open_in_memory().map_err(|e| SQLError::Connection(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

/// Convert our Value enum to rusqlite's ToSql.
fn bind_params(params: &[Value]) -> Vec<Box<dyn rusqlite::types::ToSql + '_>> {
    params
        .iter()
        .map(|v| -> Box<dyn rusqlite::types::ToSql + '_> {
            match v {
                Value::Null => Box::new(rusqlite::types::Null),
                Value::Integer(i) => Box::new(*i),
                Value::Real(f) => Box::new(*f),
                Value::Text(s) => Box::new(s.as_str()),
                Value::Blob(b) => Box::new(b.as_slice()),
            }
        })
        .collect()
}

/// Map a rusqlite error, singling out constraint violations.
fn classify(e: rusqlite::Error, fallback: fn(String) -> SQLError) -> SQLError {
    if e.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) {
        SQLError::Constraint(e.to_string())
    } else {
        fallback(e.to_string())
    }
}

impl SQLStore for SqliteStore {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SQLError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SQLError::Query(e.to_string()))?;

        let bound = bind_params(params);
        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            bound.iter().map(|b| b.as_ref()).collect();

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| classify(e, SQLError::Query))?;

        let column_names: Vec<String> = stmt
            .column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), |row| {
                let mut columns = Vec::with_capacity(column_names.len());
                for (i, name) in column_names.iter().enumerate() {
                    columns.push((name.clone(), row_value_at(row, i)?));
                }
                Ok(Row { columns })
            })
            .map_err(|e| classify(e, SQLError::Query))?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row.map_err(|e| classify(e, SQLError::Query))?);
        }
        Ok(result)
    }

    fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SQLError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SQLError::Execution(e.to_string()))?;

        let bound = bind_params(params);
        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            bound.iter().map(|b| b.as_ref()).collect();

        let affected = conn
            .execute(sql, param_refs.as_slice())
            .map_err(|e| classify(e, SQLError::Execution))?;

        Ok(affected as u64)
    }
}

/// Extract a Value from a rusqlite row at a given column index,
/// following the column's storage class.
fn row_value_at(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Value> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .exec(
                "CREATE TABLE parts (id INTEGER PRIMARY KEY AUTOINCREMENT, \
                 code TEXT NOT NULL UNIQUE, qty INTEGER NOT NULL DEFAULT 0 CHECK (qty >= 0))",
                &[],
            )
            .unwrap();
        store
    }

    #[test]
    fn insert_returning_assigns_ids() {
        let store = store();
        let rows = store
            .query(
                "INSERT INTO parts (code) VALUES (?1) RETURNING id",
                &[Value::from("FLT-01")],
            )
            .unwrap();
        assert_eq!(rows[0].get_i64("id"), Some(1));

        let rows = store
            .query("SELECT code, qty FROM parts WHERE id = ?1", &[Value::Integer(1)])
            .unwrap();
        assert_eq!(rows[0].get_str("code"), Some("FLT-01"));
        assert_eq!(rows[0].get_i64("qty"), Some(0));
    }

    #[test]
    fn unique_violation_is_constraint() {
        let store = store();
        store
            .exec("INSERT INTO parts (code) VALUES (?1)", &[Value::from("A")])
            .unwrap();
        let err = store
            .exec("INSERT INTO parts (code) VALUES (?1)", &[Value::from("A")])
            .unwrap_err();
        assert!(matches!(err, SQLError::Constraint(_)), "got {err:?}");

        let err = store
            .query(
                "INSERT INTO parts (code) VALUES (?1) RETURNING id",
                &[Value::from("A")],
            )
            .unwrap_err();
        assert!(matches!(err, SQLError::Constraint(_)), "got {err:?}");
    }

    #[test]
    fn check_violation_is_constraint() {
        let store = store();
        let err = store
            .exec(
                "INSERT INTO parts (code, qty) VALUES (?1, ?2)",
                &[Value::from("B"), Value::Integer(-1)],
            )
            .unwrap_err();
        assert!(matches!(err, SQLError::Constraint(_)));
    }

    #[test]
    fn syntax_error_is_not_constraint() {
        let store = store();
        let err = store.query("SELEC nothing", &[]).unwrap_err();
        assert!(matches!(err, SQLError::Query(_)));
    }

    #[test]
    fn file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.exec("CREATE TABLE t (v TEXT)", &[]).unwrap();
            store.exec("INSERT INTO t (v) VALUES ('kept')", &[]).unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        let rows = store.query("SELECT v FROM t", &[]).unwrap();
        assert_eq!(rows[0].first(), Some(&Value::Text("kept".into())));
    }
}
