use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, error};

use super::effects::Effects;
use super::field::{FieldConfig, build_payload, collapse_foreign_keys, id_string, id_value};
use super::filters::with_query;
use crate::api::ApiClient;
use crate::error::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct TabConfig {
    pub key: String,
    pub label: String,
    pub fields: Vec<String>,
}

impl TabConfig {
    pub fn new(key: &str, label: &str, fields: &[&str]) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// How a new child row points back at the record being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentLink {
    /// `{field: parent_id}`
    Field(String),
    /// `{field: [parent_id]}`
    List(String),
}

#[derive(Debug, Clone)]
pub struct InlineConfig {
    pub key: String,
    pub label: String,
    /// API path of the child resource.
    pub endpoint: String,
    pub fields: Vec<FieldConfig>,
    /// Query parameter selecting the children of one parent.
    pub foreign_key_field: String,
    pub parent_link: ParentLink,
    pub tab: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InlineRow {
    pub data: Map<String, Value>,
    pub is_new: bool,
    pub is_editing: bool,
    #[serde(skip)]
    original: Option<Map<String, Value>>,
}

impl InlineRow {
    pub fn id(&self) -> Option<String> {
        self.data.get("id").and_then(id_string)
    }
}

/// Child records edited in place under a parent form.
#[derive(Debug, Clone)]
pub struct InlineTable {
    pub config: InlineConfig,
    pub rows: Vec<InlineRow>,
}

impl InlineTable {
    pub fn new(config: InlineConfig) -> Self {
        Self {
            config,
            rows: Vec::new(),
        }
    }

    pub async fn load(&mut self, client: &ApiClient, parent_id: &str) -> Result<(), AppError> {
        let url = with_query(
            &format!("{}/", client.endpoint(&self.config.endpoint)),
            &[(self.config.foreign_key_field.clone(), parent_id.to_string())],
        )?;
        let items = client.list_values(&url).await?;
        debug!("loaded {} {} rows", items.len(), self.config.key);

        self.rows = items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(mut data) => {
                    collapse_foreign_keys(&self.config.fields, &mut data);
                    Some(InlineRow {
                        data,
                        ..Default::default()
                    })
                }
                _ => None,
            })
            .collect();
        Ok(())
    }

    /// Appends an empty row already in edit mode.
    pub fn add_row(&mut self) -> usize {
        let data = self
            .config
            .fields
            .iter()
            .map(|f| (f.key.clone(), f.seed_value()))
            .collect();
        self.rows.push(InlineRow {
            data,
            is_new: true,
            is_editing: true,
            original: None,
        });
        self.rows.len() - 1
    }

    pub fn edit_row(&mut self, index: usize) -> Result<(), AppError> {
        let row = self.row_mut(index)?;
        row.original = Some(row.data.clone());
        row.is_editing = true;
        Ok(())
    }

    /// New rows disappear; existing rows get their values back.
    pub fn cancel_row(&mut self, index: usize) -> Result<(), AppError> {
        if self.row_mut(index)?.is_new {
            self.rows.remove(index);
            return Ok(());
        }
        let row = self.row_mut(index)?;
        if let Some(original) = row.original.take() {
            row.data = original;
        }
        row.is_editing = false;
        Ok(())
    }

    pub fn set_value(&mut self, index: usize, key: &str, value: Value) -> Result<(), AppError> {
        self.row_mut(index)?.data.insert(key.to_string(), value);
        Ok(())
    }

    pub fn delete_prompt(&self) -> String {
        format!(
            "Are you sure you want to delete this {}?",
            self.config.label.to_lowercase()
        )
    }

    /// Body for a new child: write keys applied plus the link to the parent.
    pub fn create_payload(&self, data: &Map<String, Value>, parent_id: &str) -> Map<String, Value> {
        let mut payload = build_payload(&self.config.fields, data);
        payload.remove("id");
        let parent = id_value(&Value::String(parent_id.to_string()));
        match &self.config.parent_link {
            ParentLink::Field(key) => {
                payload.insert(key.clone(), parent);
            }
            ParentLink::List(key) => {
                payload.insert(key.clone(), Value::Array(vec![parent]));
            }
        }
        payload
    }

    pub fn update_payload(&self, data: &Map<String, Value>) -> Map<String, Value> {
        let mut payload = build_payload(&self.config.fields, data);
        payload.remove("id");
        payload
    }

    /// Only an expired session is returned as an error.
    pub async fn save_row(&mut self, index: usize, client: &ApiClient, parent_id: &str) -> Result<Effects, AppError> {
        let mut effects = Effects::new();
        let Some(row) = self.rows.get(index) else {
            effects.error(format!("No {} row at {}", self.config.label.to_lowercase(), index));
            return Ok(effects);
        };

        let endpoint = client.endpoint(&self.config.endpoint);
        let result = if row.is_new {
            let payload = self.create_payload(&row.data, parent_id);
            client
                .post::<Value>(&format!("{}/", endpoint), &payload)
                .await
                .map(|saved| (saved, "added"))
        } else {
            let Some(id) = row.id() else {
                effects.error(format!("Failed to save {}: missing id", self.config.label.to_lowercase()));
                return Ok(effects);
            };
            let payload = self.update_payload(&row.data);
            client
                .patch::<Value>(&format!("{}/{}/", endpoint, id), &payload)
                .await
                .map(|saved| (saved, "updated"))
        };

        match result {
            Ok((saved, verb)) => {
                let row = &mut self.rows[index];
                if let Value::Object(mut data) = saved {
                    collapse_foreign_keys(&self.config.fields, &mut data);
                    row.data = data;
                }
                row.is_new = false;
                row.is_editing = false;
                row.original = None;
                effects.success(format!("{} {} successfully", self.config.label, verb));
            }
            Err(AppError::AuthenticationRequired) => return Err(AppError::AuthenticationRequired),
            Err(e) => {
                error!("saving {} row failed: {}", self.config.key, e);
                effects.error(format!(
                    "Failed to save {}: {}",
                    self.config.label.to_lowercase(),
                    e
                ));
            }
        }
        Ok(effects)
    }

    /// Deletes an existing row. Unsaved rows are just dropped.
    pub async fn delete_row(&mut self, index: usize, client: &ApiClient) -> Result<Effects, AppError> {
        let mut effects = Effects::new();
        let Some(row) = self.rows.get(index) else {
            return Ok(effects);
        };
        let Some(id) = row.id().filter(|_| !row.is_new) else {
            self.rows.remove(index);
            return Ok(effects);
        };

        let url = format!("{}/{}/", client.endpoint(&self.config.endpoint), id);
        match client.delete::<Value>(&url).await {
            Ok(_) => {
                self.rows.remove(index);
                effects.success(format!("{} deleted successfully", self.config.label));
            }
            Err(AppError::AuthenticationRequired) => return Err(AppError::AuthenticationRequired),
            Err(e) => {
                effects.error(format!(
                    "Failed to delete {}: {}",
                    self.config.label.to_lowercase(),
                    e
                ));
            }
        }
        Ok(effects)
    }

    /// Position of the saved row with backend id `id`.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.rows.iter().position(|r| r.id().as_deref() == Some(id))
    }

    pub fn columns(&self) -> Vec<&str> {
        self.config.fields.iter().map(|f| f.label.as_str()).collect()
    }

    fn row_mut(&mut self, index: usize) -> Result<&mut InlineRow, AppError> {
        let label = self.config.key.clone();
        self.rows
            .get_mut(index)
            .ok_or_else(|| AppError::BadRequest(format!("no {} row at index {}", label, index)))
    }
}
