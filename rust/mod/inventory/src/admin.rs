//! Admin registration for inventory resources.

use repustore_sql::Value;
use repustore_store::{AdminConfig, Condition, FieldDef, FilterChoice, ListFilter, ResourceDef};
use serde_json::json;

use crate::serializer::{CODE_MAX_LENGTH, NAME_MAX_LENGTH, STOCK_MAX};
use crate::{price, MODULE};

/// Spare parts: listed by name, searchable by name and code, filterable by
/// exact stock and by stock status.
pub fn spare_part_admin(low_stock_threshold: u32) -> AdminConfig {
    let t = i64::from(low_stock_threshold);
    AdminConfig {
        module: MODULE,
        resource: "spare_part",
        path: "spare_parts",
        label: "Spare parts",
        list_display: vec!["name", "code", "stock", "price", "stockStatus"],
        search_fields: vec!["name", "code"],
        list_filter: vec![
            ListFilter::Field("stock"),
            ListFilter::Choices {
                param: "status",
                label: "Stock status",
                choices: vec![
                    FilterChoice {
                        value: "out",
                        label: "Out of stock".into(),
                        conditions: vec![Condition::Eq("stock", Value::Integer(0))],
                    },
                    FilterChoice {
                        value: "low",
                        label: format!("Low (1-{})", t),
                        conditions: vec![
                            Condition::Gt("stock", Value::Integer(0)),
                            Condition::Le("stock", Value::Integer(t)),
                        ],
                    },
                    FilterChoice {
                        value: "ok",
                        label: "In stock".into(),
                        conditions: vec![Condition::Gt("stock", Value::Integer(t))],
                    },
                ],
            },
        ],
        ordering: vec!["name"],
    }
}

pub fn spare_part_resource_def(low_stock_threshold: u32) -> ResourceDef {
    ResourceDef::new(
        spare_part_admin(low_stock_threshold),
        vec![
            FieldDef::new("id", "ID", "integer").read_only(),
            FieldDef::new("name", "Name", "string").max_length(NAME_MAX_LENGTH),
            FieldDef::new("code", "Code", "string")
                .max_length(CODE_MAX_LENGTH)
                .unique(),
            FieldDef::new("stock", "Stock", "integer")
                .range(0, STOCK_MAX)
                .default(json!(0)),
            FieldDef::new("price", "Price", "decimal").digits(price::MAX_DIGITS, price::DECIMAL_PLACES),
            FieldDef::new("stockStatus", "Stock status", "string").read_only(),
        ],
    )
    .with_desc("Parts on hand, with unit price and stock level")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_shape() {
        let admin = spare_part_admin(5);
        assert_eq!(admin.ordering, ["name"]);
        assert_eq!(admin.search_fields, ["name", "code"]);
        assert_eq!(
            admin.permissions(),
            [
                "inventory:spare_part:create",
                "inventory:spare_part:read",
                "inventory:spare_part:update",
                "inventory:spare_part:delete",
                "inventory:spare_part:list",
            ]
        );

        let json = spare_part_resource_def(5).to_json();
        assert_eq!(json["listFilter"][1]["choices"][1]["label"], "Low (1-5)");
        assert_eq!(json["fields"][4]["maxDigits"], 10);
        assert_eq!(json["fields"][2]["unique"], true);
    }
}
