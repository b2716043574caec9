use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    Text,
    Email,
    Number,
    Boolean,
    Select,
    MultiSelect,
    ForeignKey,
    Date,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

pub fn select_options(pairs: &[(&str, &str)]) -> Vec<SelectOption> {
    pairs
        .iter()
        .map(|(value, label)| SelectOption {
            value: value.to_string(),
            label: label.to_string(),
        })
        .collect()
}

/// Where a foreign-key field loads its candidates from. `endpoint` is an
/// API path such as `areas` or `joined-academic-years`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeyConfig {
    pub endpoint: String,
    pub display_field: String,
    pub value_field: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldConfig {
    pub key: String,
    pub label: String,
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<ForeignKeyConfig>,
    pub required: bool,
    pub readonly: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(skip)]
    pub tab: Option<String>,
    /// Request key to send this field's value under, e.g. `program_id`
    /// for a `program` select.
    #[serde(skip)]
    pub write_as: Option<String>,
}

impl FieldConfig {
    fn new(key: &str, label: &str, kind: FieldKind) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind,
            options: Vec::new(),
            foreign_key: None,
            required: false,
            readonly: false,
            default_value: None,
            tab: None,
            write_as: None,
        }
    }

    pub fn text(key: &str, label: &str) -> Self {
        Self::new(key, label, FieldKind::Text)
    }

    pub fn email(key: &str, label: &str) -> Self {
        Self::new(key, label, FieldKind::Email)
    }

    pub fn number(key: &str, label: &str) -> Self {
        Self::new(key, label, FieldKind::Number)
    }

    pub fn boolean(key: &str, label: &str) -> Self {
        Self::new(key, label, FieldKind::Boolean)
    }

    pub fn date(key: &str, label: &str) -> Self {
        Self::new(key, label, FieldKind::Date)
    }

    pub fn select(key: &str, label: &str, options: Vec<SelectOption>) -> Self {
        Self {
            options,
            ..Self::new(key, label, FieldKind::Select)
        }
    }

    pub fn multi_select(key: &str, label: &str, options: Vec<SelectOption>) -> Self {
        Self {
            options,
            ..Self::new(key, label, FieldKind::MultiSelect)
        }
    }

    pub fn foreign_key(key: &str, label: &str, endpoint: &str, display_field: &str) -> Self {
        Self {
            foreign_key: Some(ForeignKeyConfig {
                endpoint: endpoint.to_string(),
                display_field: display_field.to_string(),
                value_field: "id".to_string(),
            }),
            ..Self::new(key, label, FieldKind::ForeignKey)
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn tab(mut self, tab: &str) -> Self {
        self.tab = Some(tab.to_string());
        self
    }

    pub fn write_as(mut self, key: &str) -> Self {
        self.write_as = Some(key.to_string());
        self
    }

    /// Initial value for an empty create form.
    pub fn seed_value(&self) -> Value {
        if let Some(default) = &self.default_value {
            return default.clone();
        }
        match self.kind {
            FieldKind::Boolean => Value::Bool(false),
            FieldKind::MultiSelect => Value::Array(Vec::new()),
            _ => Value::String(String::new()),
        }
    }
}

/// JavaScript-style truthiness, which decides whether a value is
/// considered "filled in".
pub fn is_filled(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Identifier values travel as strings through selects; numeric ones go
/// back to the API as numbers.
pub fn id_value(value: &Value) -> Value {
    match value {
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| value.clone()),
        other => other.clone(),
    }
}

pub fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(map) => map.get("id").and_then(id_string),
        _ => None,
    }
}

/// Copies `record` into a request body, moving every filled field that
/// declares `write_as` to its write key. Unfilled fields stay under their
/// own key.
pub fn build_payload(fields: &[FieldConfig], record: &Map<String, Value>) -> Map<String, Value> {
    let mut payload = record.clone();
    for field in fields {
        let Some(write_key) = &field.write_as else {
            continue;
        };
        let filled = payload.get(&field.key).map(is_filled).unwrap_or(false);
        if !filled {
            continue;
        }
        if let Some(value) = payload.remove(&field.key) {
            payload.insert(write_key.clone(), id_value(&value));
        }
    }
    payload
}

/// Replaces nested objects of foreign-key fields with their id string, so
/// the record holds what the picker would submit.
pub fn collapse_foreign_keys(fields: &[FieldConfig], record: &mut Map<String, Value>) {
    for field in fields.iter().filter(|f| f.kind == FieldKind::ForeignKey) {
        if let Some(value) = record.get_mut(&field.key) {
            if value.is_object() {
                *value = id_string(value).map(Value::String).unwrap_or(Value::Null);
            }
        }
    }
}
