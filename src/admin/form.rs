use std::collections::{BTreeMap, HashMap};

use futures::future::join_all;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{error, warn};

use super::autocomplete::{AutocompleteOption, build_options, filter_options};
use super::effects::Effects;
use super::field::{
    FieldConfig, FieldKind, SelectOption, build_payload, collapse_foreign_keys, id_string,
};
use super::tabbed::{InlineConfig, InlineRow, InlineTable, TabConfig};
use crate::api::ApiClient;
use crate::error::AppError;

/// Everything a resource form needs to render and submit.
#[derive(Debug, Clone)]
pub struct FormConfig {
    pub title: String,
    pub endpoint: String,
    pub fields: Vec<FieldConfig>,
    pub tabs: Vec<TabConfig>,
    pub inlines: Vec<InlineConfig>,
    pub back_path: String,
    pub entity_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(String),
}

/// Inline key (`None` for the form itself) and field key.
type OptionsKey = (Option<String>, String);

pub struct AdminForm {
    config: FormConfig,
    mode: FormMode,
    record: Map<String, Value>,
    fk_options: HashMap<OptionsKey, Vec<AutocompleteOption>>,
    inlines: Vec<InlineTable>,
    active_tab: Option<String>,
    saving: bool,
}

#[derive(Debug, Serialize)]
pub struct FieldView {
    pub key: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    pub readonly: bool,
    pub value: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<AutocompleteOption>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_summary: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InlineView {
    pub key: String,
    pub label: String,
    pub columns: Vec<String>,
    pub rows: Vec<InlineRow>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub choices: BTreeMap<String, Vec<AutocompleteOption>>,
}

#[derive(Debug, Serialize)]
pub struct TabView {
    pub key: String,
    pub label: String,
    pub fields: Vec<FieldView>,
    pub inlines: Vec<InlineView>,
}

#[derive(Debug, Serialize)]
pub struct FormView {
    pub heading: String,
    pub subtitle: String,
    pub back_path: String,
    pub submit_label: String,
    pub active_tab: Option<String>,
    pub tabs: Vec<TabView>,
}

impl AdminForm {
    pub fn new(config: FormConfig, mode: FormMode) -> Self {
        let inlines = match mode {
            FormMode::Edit(_) => config.inlines.iter().cloned().map(InlineTable::new).collect(),
            FormMode::Create => Vec::new(),
        };
        let active_tab = config.tabs.first().map(|t| t.key.clone());
        let mut form = Self {
            config,
            mode,
            record: Map::new(),
            fk_options: HashMap::new(),
            inlines,
            active_tab,
            saving: false,
        };
        if form.mode == FormMode::Create {
            form.seed_defaults();
        }
        form
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn record(&self) -> &Map<String, Value> {
        &self.record
    }

    pub fn inline_mut(&mut self, key: &str) -> Option<&mut InlineTable> {
        self.inlines.iter_mut().find(|i| i.config.key == key)
    }

    pub fn record_id(&self) -> Option<&str> {
        match &self.mode {
            FormMode::Edit(id) => Some(id),
            FormMode::Create => None,
        }
    }

    fn seed_defaults(&mut self) {
        for field in &self.config.fields {
            if field.default_value.is_some() {
                self.record.insert(field.key.clone(), field.seed_value());
            }
        }
    }

    /// Loads the record (edit mode), the inline rows and every
    /// foreign-key option list. A failed record load sends the user back;
    /// an expired session is returned as an error.
    pub async fn load(&mut self, client: &ApiClient) -> Result<Effects, AppError> {
        let mut effects = Effects::new();

        if let FormMode::Edit(id) = &self.mode {
            let url = format!("{}/{}/", client.endpoint(&self.config.endpoint), id);
            match client.get::<Value>(&url).await {
                Ok(Value::Object(mut record)) => {
                    collapse_foreign_keys(&self.config.fields, &mut record);
                    self.record = record;
                }
                Ok(_) => {
                    self.record = Map::new();
                }
                Err(AppError::AuthenticationRequired) => return Err(AppError::AuthenticationRequired),
                Err(e) => {
                    error!("loading {} {} failed: {}", self.config.entity_name, id, e);
                    effects
                        .error(format!(
                            "Failed to load {}: {}",
                            self.config.entity_name.to_lowercase(),
                            e
                        ))
                        .navigate(self.config.back_path.clone());
                    return Ok(effects);
                }
            }

            let id = id.clone();
            for inline in &mut self.inlines {
                match inline.load(client, &id).await {
                    Ok(()) => {}
                    Err(AppError::AuthenticationRequired) => return Err(AppError::AuthenticationRequired),
                    Err(e) => warn!("failed to load {} rows: {}", inline.config.key, e),
                }
            }
        }

        self.load_options(client).await?;
        Ok(effects)
    }

    /// One request per foreign-key field, run concurrently. Failures leave
    /// that field without options.
    pub async fn load_options(&mut self, client: &ApiClient) -> Result<(), AppError> {
        let fields: Vec<(Option<String>, FieldConfig)> = self
            .config
            .fields
            .iter()
            .map(|f| (None, f.clone()))
            .chain(self.config.inlines.iter().flat_map(|inline| {
                inline
                    .fields
                    .iter()
                    .map(move |f| (Some(inline.key.clone()), f.clone()))
            }))
            .filter(|(_, f)| f.kind == FieldKind::ForeignKey)
            .collect();

        let loads = fields.iter().filter_map(|(inline, field)| {
            let fk = field.foreign_key.as_ref()?;
            let url = format!("{}/", client.endpoint(&fk.endpoint));
            Some(async move {
                let result = client.list_values(&url).await;
                ((inline.clone(), field.key.clone()), fk.endpoint.clone(), result)
            })
        });

        let mut expired = false;
        for (key, endpoint, result) in join_all(loads).await {
            match result {
                Ok(objects) => {
                    self.fk_options.insert(key, build_options(&endpoint, &objects));
                }
                Err(AppError::AuthenticationRequired) => expired = true,
                Err(e) => warn!("Failed to load options for {}: {}", key.1, e),
            }
        }
        if expired {
            return Err(AppError::AuthenticationRequired);
        }
        Ok(())
    }

    pub fn options(&self, key: &str) -> &[AutocompleteOption] {
        self.fk_options
            .get(&(None, key.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn inline_options(&self, inline: &str, key: &str) -> &[AutocompleteOption] {
        self.fk_options
            .get(&(Some(inline.to_string()), key.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Creates a child row when `row_id` is `None`, otherwise updates the
    /// saved row with that backend id.
    pub async fn save_inline(
        &mut self,
        client: &ApiClient,
        inline: &str,
        row_id: Option<&str>,
        values: Map<String, Value>,
    ) -> Result<Effects, AppError> {
        let parent_id = self
            .record_id()
            .map(str::to_string)
            .ok_or_else(|| AppError::BadRequest("inline rows need a saved record".to_string()))?;
        let table = self.inline_mut(inline).ok_or(AppError::NotFound)?;
        let index = match row_id {
            Some(id) => {
                let index = table.position(id).ok_or(AppError::NotFound)?;
                table.edit_row(index)?;
                index
            }
            None => table.add_row(),
        };
        for (key, value) in values {
            table.set_value(index, &key, value)?;
        }
        table.save_row(index, client, &parent_id).await
    }

    pub async fn delete_inline(&mut self, client: &ApiClient, inline: &str, row_id: &str) -> Result<Effects, AppError> {
        let table = self.inline_mut(inline).ok_or(AppError::NotFound)?;
        let index = table.position(row_id).ok_or(AppError::NotFound)?;
        table.delete_row(index, client).await
    }

    pub fn search_options(&self, key: &str, query: &str) -> Vec<&AutocompleteOption> {
        filter_options(self.options(key), query)
    }

    pub fn set_field(&mut self, key: &str, value: Value) -> Result<(), AppError> {
        if !self.config.fields.iter().any(|f| f.key == key) {
            return Err(AppError::BadRequest(format!("unknown field {}", key)));
        }
        self.record.insert(key.to_string(), value);
        Ok(())
    }

    /// Merges submitted values over the loaded record.
    pub fn apply(&mut self, values: Map<String, Value>) {
        self.record.extend(values);
    }

    pub fn select_tab(&mut self, key: &str) -> Result<(), AppError> {
        if !self.config.tabs.iter().any(|t| t.key == key) {
            return Err(AppError::BadRequest(format!("unknown tab {}", key)));
        }
        self.active_tab = Some(key.to_string());
        Ok(())
    }

    pub fn payload(&self) -> Map<String, Value> {
        build_payload(&self.config.fields, &self.record)
    }

    pub fn first_missing_required(&self) -> Option<&FieldConfig> {
        self.config.fields.iter().find(|f| {
            let blank = self.record.get(&f.key).map(is_blank).unwrap_or(true);
            f.required && !f.readonly && f.kind != FieldKind::Boolean && blank
        })
    }

    /// `/{resource}/{id}/edit` for a filled foreign-key field.
    pub fn view_link(&self, key: &str) -> Option<String> {
        let field = self.config.fields.iter().find(|f| f.key == key)?;
        let fk = field.foreign_key.as_ref()?;
        let id = self.record.get(key).and_then(id_string)?;
        let resource = fk.endpoint.trim_matches('/').rsplit('/').next()?;
        Some(format!("/{}/{}/edit", resource, id))
    }

    /// Only an expired session is returned as an error.
    pub async fn submit(&mut self, client: &ApiClient) -> Result<Effects, AppError> {
        let mut effects = Effects::new();
        let entity = self.config.entity_name.clone();
        let (verb, past) = match self.mode {
            FormMode::Edit(_) => ("update", "updated"),
            FormMode::Create => ("create", "created"),
        };

        if let Some(missing) = self.first_missing_required() {
            effects.error(format!("Please fill in required field: {}", missing.label));
            return Ok(effects);
        }

        self.saving = true;
        let payload = self.payload();
        let endpoint = client.endpoint(&self.config.endpoint);
        let result = match &self.mode {
            FormMode::Edit(id) => client.patch::<Value>(&format!("{}/{}/", endpoint, id), &payload).await,
            FormMode::Create => client.post::<Value>(&format!("{}/", endpoint), &payload).await,
        };
        self.saving = false;

        match result {
            Ok(_) => {
                effects
                    .success(format!("{} {} successfully", entity, past))
                    .navigate(self.config.back_path.clone());
            }
            Err(AppError::AuthenticationRequired) => return Err(AppError::AuthenticationRequired),
            Err(e) => {
                error!("{} {} failed: {}", verb, entity, e);
                effects.error(format!("Failed to {} {}: {}", verb, entity.to_lowercase(), e));
            }
        }
        Ok(effects)
    }

    fn field_view(&self, field: &FieldConfig) -> FieldView {
        let value = self
            .record
            .get(&field.key)
            .cloned()
            .unwrap_or_else(|| field.seed_value());

        let choices = (field.kind == FieldKind::ForeignKey).then(|| self.options(&field.key).to_vec());

        let selected_summary = (field.kind == FieldKind::MultiSelect)
            .then(|| {
                let picked: Vec<&str> = value
                    .as_array()
                    .map(|vals| {
                        vals.iter()
                            .filter_map(Value::as_str)
                            .filter_map(|v| field.options.iter().find(|o| o.value == v))
                            .map(|o| o.label.as_str())
                            .collect()
                    })
                    .unwrap_or_default();
                (!picked.is_empty()).then(|| format!("Selected: {}", picked.join(", ")))
            })
            .flatten();

        FieldView {
            key: field.key.clone(),
            label: field.label.clone(),
            kind: field.kind,
            required: field.required,
            readonly: field.readonly,
            options: field.options.clone(),
            choices,
            view_link: self.view_link(&field.key),
            selected_summary,
            value,
        }
    }

    pub fn render(&self) -> FormView {
        let entity = &self.config.entity_name;
        let (heading, subtitle) = match self.mode {
            FormMode::Edit(_) => (
                format!("Edit {}", entity),
                format!("Edit {}", entity.to_lowercase()),
            ),
            FormMode::Create => (
                format!("Add {}", entity),
                format!("Create a new {}", entity.to_lowercase()),
            ),
        };
        let submit_label = match (self.saving, &self.mode) {
            (true, _) => "Saving...",
            (false, FormMode::Edit(_)) => "Update",
            (false, FormMode::Create) => "Create",
        };

        let tabs = if self.config.tabs.is_empty() {
            vec![TabView {
                key: "main".to_string(),
                label: self.config.title.clone(),
                fields: self.config.fields.iter().map(|f| self.field_view(f)).collect(),
                inlines: Vec::new(),
            }]
        } else {
            self.config
                .tabs
                .iter()
                .map(|tab| TabView {
                    key: tab.key.clone(),
                    label: tab.label.clone(),
                    fields: self
                        .config
                        .fields
                        .iter()
                        .filter(|f| {
                            tab.fields.contains(&f.key) || f.tab.as_deref() == Some(tab.key.as_str())
                        })
                        .map(|f| self.field_view(f))
                        .collect(),
                    inlines: self
                        .inlines
                        .iter()
                        .filter(|i| i.config.tab == tab.key)
                        .map(|i| InlineView {
                            key: i.config.key.clone(),
                            label: i.config.label.clone(),
                            columns: i.columns().into_iter().map(str::to_string).collect(),
                            rows: i.rows.clone(),
                            choices: i
                                .config
                                .fields
                                .iter()
                                .filter(|f| f.kind == FieldKind::ForeignKey)
                                .map(|f| (f.key.clone(), self.inline_options(&i.config.key, &f.key).to_vec()))
                                .collect(),
                        })
                        .collect(),
                })
                .collect()
        };

        FormView {
            heading,
            subtitle,
            back_path: self.config.back_path.clone(),
            submit_label: submit_label.to_string(),
            active_tab: self.active_tab.clone(),
            tabs,
        }
    }
}

/// Zero and `false` count as answers here, unlike in payload building.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
