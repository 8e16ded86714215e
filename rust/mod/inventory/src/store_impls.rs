//! SqlStore implementation for inventory models.

use repustore_core::ServiceError;
use repustore_sql::{Row, Value};
use repustore_store::{Column, SqlStore, SqlType};

use crate::model::SparePart;
use crate::price;

impl SqlStore for SparePart {
    const COLUMNS: &'static [Column] = &[
        Column::new("name", SqlType::Text, "NOT NULL"),
        Column::new("code", SqlType::Text, "NOT NULL"),
        Column::new("stock", SqlType::Integer, "NOT NULL DEFAULT 0 CHECK (\"stock\" >= 0)"),
        // Hundredths.
        Column::new("price", SqlType::Integer, "NOT NULL"),
    ];
    const UNIQUE: &'static [&'static [&'static str]] = &[&["code"]];
    const INDEX: &'static [&'static [&'static str]] = &[&["name"], &["stock"]];

    fn table_name() -> &'static str {
        "spare_parts"
    }

    fn verbose_name() -> &'static str {
        "spare part"
    }

    fn pk(&self) -> Option<i64> {
        self.id
    }

    fn set_pk(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.name.clone()),
            Value::Text(self.code.clone()),
            Value::Integer(i64::from(self.stock)),
            Value::Integer(price::to_cents(self.price)),
        ]
    }

    fn from_row(row: &Row) -> Result<Self, ServiceError> {
        let missing = |c: &str| ServiceError::Internal(format!("spare_parts row missing {}", c));
        let stock = row.get_i64("stock").ok_or_else(|| missing("stock"))?;
        Ok(Self {
            id: Some(row.get_i64("id").ok_or_else(|| missing("id"))?),
            name: row.get_str("name").ok_or_else(|| missing("name"))?.to_string(),
            code: row.get_str("code").ok_or_else(|| missing("code"))?.to_string(),
            stock: u32::try_from(stock)
                .map_err(|_| ServiceError::Internal(format!("stored stock {} out of range", stock)))?,
            price: price::from_cents(row.get_i64("price").ok_or_else(|| missing("price"))?),
        })
    }
}
