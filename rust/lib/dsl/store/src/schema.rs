//! Schema builder — collects admin registrations into the JSON document
//! served at `/meta/schema`.

use serde::Serialize;
use serde_json::{json, Value};

use crate::admin::AdminConfig;

/// Wire description of one model field.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    pub name: &'static str,
    pub label: &'static str,
    /// "integer", "string" or "decimal".
    pub kind: &'static str,
    pub required: bool,
    pub read_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_value: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_digits: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decimal_places: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub unique: bool,
}

impl FieldDef {
    pub fn new(name: &'static str, label: &'static str, kind: &'static str) -> Self {
        Self {
            name,
            label,
            kind,
            required: true,
            read_only: false,
            max_length: None,
            min_value: None,
            max_value: None,
            max_digits: None,
            decimal_places: None,
            default: None,
            unique: false,
        }
    }

    /// Server-assigned; never accepted from payloads.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self.required = false;
        self
    }

    pub fn max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }

    pub fn range(mut self, min: i64, max: i64) -> Self {
        self.min_value = Some(min);
        self.max_value = Some(max);
        self
    }

    pub fn digits(mut self, max_digits: u32, decimal_places: u32) -> Self {
        self.max_digits = Some(max_digits);
        self.decimal_places = Some(decimal_places);
        self
    }

    /// Optional in payloads, stored as `value` when omitted.
    pub fn default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self.required = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// A resource within a module: its fields plus admin registration.
pub struct ResourceDef {
    pub admin: AdminConfig,
    pub fields: Vec<FieldDef>,
    /// Short description shown beside the resource.
    pub description: String,
}

impl ResourceDef {
    pub fn new(admin: AdminConfig, fields: Vec<FieldDef>) -> Self {
        Self {
            admin,
            fields,
            description: String::new(),
        }
    }

    pub fn with_desc(mut self, desc: &str) -> Self {
        self.description = desc.to_string();
        self
    }

    pub fn to_json(&self) -> Value {
        let mut out = self.admin.to_json();
        out["description"] = json!(self.description);
        out["fields"] = json!(self.fields);
        out
    }
}

/// A module definition for the schema.
pub struct ModuleDef {
    pub id: &'static str,
    pub label: &'static str,
    pub resources: Vec<ResourceDef>,
}

impl ModuleDef {
    pub fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "label": self.label,
            "resources": self.resources.iter().map(|r| r.to_json()).collect::<Vec<_>>(),
        })
    }
}

/// Generate a human-readable description for a CRUD action.
fn action_description(action: &str, resource_label: &str) -> String {
    let singular = resource_label.trim_end_matches('s');
    match action {
        "create" => format!("Create {}", singular),
        "read" => format!("View {} details", singular),
        "update" => format!("Edit {}", singular),
        "delete" => format!("Delete {}", singular),
        "list" => format!("List all {}", resource_label),
        other => format!("{} {}", other, singular),
    }
}

/// Build the complete schema JSON from per-module documents
/// (as returned by `ModuleDef::to_json`).
pub fn build_schema(app_name: &str, modules: Vec<Value>) -> Value {
    let mut all_permissions = serde_json::Map::new();

    for m in &modules {
        let Some(id) = m["id"].as_str() else { continue };
        let mut mod_perms = serde_json::Map::new();
        for r in m["resources"].as_array().into_iter().flatten() {
            let label = r["label"].as_str().unwrap_or_default();
            let actions: Vec<Value> = r["permissions"]
                .as_array()
                .into_iter()
                .flatten()
                .filter_map(|p| p.as_str())
                .map(|p| {
                    let action = p.rsplit(':').next().unwrap_or(p);
                    json!({ "perm": p, "action": action, "desc": action_description(action, label) })
                })
                .collect();
            mod_perms.insert(
                r["resource"].as_str().unwrap_or_default().to_string(),
                json!({ "label": label, "actions": actions }),
            );
        }
        all_permissions.insert(id.to_string(), Value::Object(mod_perms));
    }

    json!({
        "name": app_name,
        "modules": modules,
        "permissions": all_permissions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::ListFilter;

    fn module() -> ModuleDef {
        ModuleDef {
            id: "test",
            label: "Test",
            resources: vec![ResourceDef::new(
                AdminConfig {
                    module: "test",
                    resource: "widget",
                    path: "widgets",
                    label: "Widgets",
                    list_display: vec!["label", "count"],
                    search_fields: vec!["label"],
                    list_filter: vec![ListFilter::Field("count")],
                    ordering: vec!["label"],
                },
                vec![
                    FieldDef::new("id", "ID", "integer").read_only(),
                    FieldDef::new("label", "Label", "string").max_length(10),
                    FieldDef::new("count", "Count", "integer")
                        .range(0, 9)
                        .default(json!(0)),
                ],
            )
            .with_desc("Things")],
        }
    }

    #[test]
    fn build_schema_basic() {
        let schema = build_schema("TestApp", vec![module().to_json()]);

        assert_eq!(schema["name"], "TestApp");
        let widget = &schema["modules"][0]["resources"][0];
        assert_eq!(widget["path"], "widgets");
        assert_eq!(widget["description"], "Things");
        assert_eq!(widget["fields"][0]["readOnly"], true);
        assert_eq!(widget["fields"][1]["maxLength"], 10);
        assert_eq!(widget["fields"][2]["required"], false);
        assert!(widget["fields"][1].get("unique").is_none());

        let perms = &schema["permissions"]["test"]["widget"];
        assert_eq!(perms["actions"].as_array().unwrap().len(), 5);
        assert_eq!(perms["actions"][0]["action"], "create");
        assert_eq!(perms["actions"][0]["desc"], "Create Widget");
        assert_eq!(perms["actions"][4]["desc"], "List all Widgets");
    }
}
