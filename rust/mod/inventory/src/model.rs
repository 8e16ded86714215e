use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::price;

/// SparePart — one stocked part ("repuesto").
///
/// `id` is assigned by the store on insert. `code` is the business
/// identifier and is unique across all parts.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SparePart {
    /// Store-assigned primary key. `None` until saved.
    pub id: Option<i64>,

    /// Part name, at most 100 characters.
    pub name: String,

    /// Unique part code, at most 50 characters.
    pub code: String,

    /// Units on hand.
    pub stock: u32,

    /// Unit price, at most 10 digits with 2 decimal places.
    #[serde(serialize_with = "price::serialize")]
    pub price: Decimal,
}

impl SparePart {
    pub fn new(name: &str, code: &str, stock: u32, price: Decimal) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            code: code.to_string(),
            stock,
            price,
        }
    }

    pub fn stock_status(&self, low_threshold: u32) -> StockStatus {
        StockStatus::of(self.stock, low_threshold)
    }
}

impl Default for SparePart {
    fn default() -> Self {
        Self::new("", "", 0, Decimal::ZERO)
    }
}

impl fmt::Display for SparePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}

/// Stock level bucket derived from `stock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StockStatus {
    Out,
    Low,
    Ok,
}

impl StockStatus {
    pub fn of(stock: u32, low_threshold: u32) -> Self {
        if stock == 0 {
            StockStatus::Out
        } else if stock <= low_threshold {
            StockStatus::Low
        } else {
            StockStatus::Ok
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StockStatus::Out => "out",
            StockStatus::Low => "low",
            StockStatus::Ok => "ok",
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
