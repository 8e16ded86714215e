//! Payload mapping for SparePart.
//!
//! Every field is checked and all failures are reported together, keyed by
//! wire field name. `id` is read-only and ignored in payloads; unknown
//! fields are ignored.

use repustore_core::{FieldErrors, ServiceError};
use repustore_store::{expect_object, RecordSerializer};
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::model::SparePart;
use crate::price;

pub const NAME_MAX_LENGTH: usize = 100;
pub const CODE_MAX_LENGTH: usize = 50;
pub const STOCK_MAX: i64 = i32::MAX as i64;

const REQUIRED: &str = "This field is required.";
const NULL: &str = "This field may not be null.";
const BLANK: &str = "This field may not be blank.";
const NOT_A_STRING: &str = "Not a valid string.";
const NOT_AN_INTEGER: &str = "A valid integer is required.";
const NOT_NEGATIVE: &str = "Ensure this value is greater than or equal to 0.";

/// Serializer settings come from the `[inventory]` config section.
#[derive(Debug, Clone)]
pub struct SparePartSerializer {
    pub allow_negative_price: bool,
    pub low_stock_threshold: u32,
}

impl SparePartSerializer {
    fn text(
        obj: &Map<String, Value>,
        field: &str,
        max_length: usize,
        errors: &mut FieldErrors,
    ) -> Option<String> {
        let raw = match obj.get(field)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Null => {
                errors.add(field, NULL);
                return None;
            }
            _ => {
                errors.add(field, NOT_A_STRING);
                return None;
            }
        };
        if raw.is_empty() {
            errors.add(field, BLANK);
            return None;
        }
        if raw.chars().count() > max_length {
            errors.add(
                field,
                format!("Ensure this field has no more than {} characters.", max_length),
            );
            return None;
        }
        Some(raw)
    }

    fn stock(obj: &Map<String, Value>, errors: &mut FieldErrors) -> Option<u32> {
        let n = match obj.get("stock")? {
            Value::Null => {
                errors.add("stock", NULL);
                return None;
            }
            v => match parse_integer(v) {
                Some(n) => n,
                None => {
                    errors.add("stock", NOT_AN_INTEGER);
                    return None;
                }
            },
        };
        if n < 0 {
            errors.add("stock", NOT_NEGATIVE);
            return None;
        }
        if n > STOCK_MAX {
            errors.add(
                "stock",
                format!("Ensure this value is less than or equal to {}.", STOCK_MAX),
            );
            return None;
        }
        u32::try_from(n).ok()
    }

    fn price(&self, obj: &Map<String, Value>, errors: &mut FieldErrors) -> Option<Decimal> {
        let value = obj.get("price")?;
        if value.is_null() {
            errors.add("price", NULL);
            return None;
        }
        match price::parse(value) {
            Ok(p) if p.is_sign_negative() && !self.allow_negative_price => {
                errors.add("price", NOT_NEGATIVE);
                None
            }
            Ok(p) => Some(p),
            Err(msg) => {
                errors.add("price", msg);
                None
            }
        }
    }
}

/// Integers arrive as JSON integers, integral floats, or numeric strings.
/// A string may end in a point followed only by zeros (`"3.00"`, `"3."`).
fn parse_integer(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && f.abs() < 1e18).map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            match s.split_once('.') {
                Some((whole, zeros)) if zeros.bytes().all(|b| b == b'0') => whole.parse().ok(),
                Some(_) => None,
                None => s.parse().ok(),
            }
        }
        _ => None,
    }
}

impl RecordSerializer<SparePart> for SparePartSerializer {
    fn to_json(&self, record: &SparePart) -> Result<Value, ServiceError> {
        let mut json = serde_json::to_value(record)
            .map_err(|e| ServiceError::Internal(format!("serialize spare part: {}", e)))?;
        json["stockStatus"] = Value::from(record.stock_status(self.low_stock_threshold).as_str());
        Ok(json)
    }

    fn create(&self, payload: &Value) -> Result<SparePart, FieldErrors> {
        self.update(&SparePart::default(), payload, false)
    }

    fn update(&self, current: &SparePart, payload: &Value, partial: bool) -> Result<SparePart, FieldErrors> {
        let obj = expect_object(payload)?;
        let mut errors = FieldErrors::new();
        let mut out = current.clone();

        if !partial {
            for field in ["name", "code", "price"] {
                if !obj.contains_key(field) {
                    errors.add(field, REQUIRED);
                }
            }
        }

        if let Some(name) = Self::text(obj, "name", NAME_MAX_LENGTH, &mut errors) {
            out.name = name;
        }
        if let Some(code) = Self::text(obj, "code", CODE_MAX_LENGTH, &mut errors) {
            out.code = code;
        }
        if let Some(stock) = Self::stock(obj, &mut errors) {
            out.stock = stock;
        }
        if let Some(price) = self.price(obj, &mut errors) {
            out.price = price;
        }

        errors.into_result(out)
    }
}
