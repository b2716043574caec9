use std::collections::BTreeSet;

use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use super::effects::Effects;
use super::field::id_string;
use crate::api::ApiClient;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellFormat {
    Plain,
    /// `{name} {last_name}` of the value (or of the row for an empty accessor).
    FullName,
    YesNo,
    Date,
    /// Names of an array of objects, comma separated.
    List,
    /// `name` of a nested object.
    Name,
}

#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub accessor: String,
    pub header: String,
    pub format: CellFormat,
}

impl ColumnDef {
    pub fn new(accessor: &str, header: &str, format: CellFormat) -> Self {
        Self {
            accessor: accessor.to_string(),
            header: header.to_string(),
            format,
        }
    }

    pub fn plain(accessor: &str, header: &str) -> Self {
        Self::new(accessor, header, CellFormat::Plain)
    }

    pub fn render(&self, row: &Value) -> String {
        let value = lookup(row, &self.accessor).unwrap_or(&Value::Null);
        match self.format {
            CellFormat::Plain => plain(value),
            CellFormat::FullName => full_name(value),
            CellFormat::YesNo => match value {
                Value::Bool(true) => "Yes".to_string(),
                Value::Null => String::new(),
                _ => "No".to_string(),
            },
            CellFormat::Date => value
                .as_str()
                .map(|s| s.get(..10).unwrap_or(s).to_string())
                .unwrap_or_default(),
            CellFormat::List => value
                .as_array()
                .map(|items| {
                    items
                        .iter()
                        .map(|item| match item.get("name") {
                            Some(name) => plain(name),
                            None => plain(item),
                        })
                        .filter(|s| !s.is_empty())
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default(),
            CellFormat::Name => value.get("name").map(plain).unwrap_or_else(|| plain(value)),
        }
    }
}

/// Dotted path lookup (`course.credits`). An empty path is the row itself.
pub fn lookup<'a>(row: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(row);
    }
    path.split('.').try_fold(row, |current, key| current.get(key))
}

fn plain(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn full_name(value: &Value) -> String {
    let name = value.get("name").and_then(Value::as_str).unwrap_or("");
    let last = value.get("last_name").and_then(Value::as_str).unwrap_or("");
    format!("{} {}", name, last).trim().to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    /// Ctrl or Meta.
    pub ctrl: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKey {
    /// Ctrl+A
    SelectAll,
    Delete,
    Escape,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletePrompt {
    pub ids: Vec<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableAction {
    None,
    Navigate(String),
    ConfirmDelete(DeletePrompt),
}

/// Rows of one list page plus the user's selection over them.
#[derive(Debug, Clone, Default)]
pub struct TableState {
    pub entity_name: String,
    pub base_path: String,
    pub rows: Vec<Value>,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub loading: bool,
    selected: BTreeSet<usize>,
    last_selected: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RowView {
    pub id: Option<String>,
    pub selected: bool,
    pub cells: Vec<String>,
    pub edit_path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TableView {
    pub headers: Vec<String>,
    pub rows: Vec<RowView>,
    pub selected_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection_tip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_message: Option<String>,
    pub add_path: String,
    pub add_label: String,
    pub has_next: bool,
    pub has_previous: bool,
}

impl TableState {
    pub fn new(entity_name: &str, base_path: &str) -> Self {
        Self {
            entity_name: entity_name.to_string(),
            base_path: base_path.to_string(),
            ..Default::default()
        }
    }

    /// New data resets the selection.
    pub fn set_rows(&mut self, rows: Vec<Value>, next: Option<String>, previous: Option<String>) {
        self.rows = rows;
        self.next = next;
        self.previous = previous;
        self.clear_selection();
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    pub fn select_all(&mut self) {
        self.selected = (0..self.rows.len()).collect();
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
        self.last_selected = None;
    }

    /// Header checkbox.
    pub fn toggle_all(&mut self, checked: bool) {
        if checked {
            self.select_all();
        } else {
            self.selected.clear();
        }
    }

    /// Row checkbox. With shift, every row between the anchor and `index`
    /// takes the new state; the anchor stays put.
    pub fn check_row(&mut self, index: usize, checked: bool, modifiers: Modifiers) {
        if index >= self.rows.len() {
            return;
        }
        match self.last_selected {
            Some(anchor) if modifiers.shift => {
                for i in anchor.min(index)..=anchor.max(index) {
                    self.set_selected(i, checked);
                }
            }
            _ => {
                self.set_selected(index, checked);
                self.last_selected = Some(index);
            }
        }
    }

    /// Cell click: shift extends, ctrl toggles, a plain click opens the row.
    pub fn click_cell(&mut self, index: usize, modifiers: Modifiers) -> TableAction {
        if index >= self.rows.len() {
            return TableAction::None;
        }
        if !(modifiers.shift || modifiers.ctrl) {
            return self
                .edit_path(index)
                .map(TableAction::Navigate)
                .unwrap_or(TableAction::None);
        }
        match self.last_selected {
            Some(anchor) if modifiers.shift => {
                for i in anchor.min(index)..=anchor.max(index) {
                    self.selected.insert(i);
                }
            }
            _ => {
                let now = !self.is_selected(index);
                self.set_selected(index, now);
                self.last_selected = Some(index);
            }
        }
        TableAction::None
    }

    pub fn handle_key(&mut self, key: TableKey) -> TableAction {
        match key {
            TableKey::SelectAll => {
                self.select_all();
                TableAction::None
            }
            TableKey::Escape => {
                self.clear_selection();
                TableAction::None
            }
            TableKey::Delete => self
                .delete_prompt()
                .map(TableAction::ConfirmDelete)
                .unwrap_or(TableAction::None),
        }
    }

    pub fn selected_ids(&self) -> Vec<String> {
        self.selected
            .iter()
            .filter_map(|i| self.rows.get(*i))
            .filter_map(|row| row.get("id").and_then(id_string))
            .collect()
    }

    pub fn delete_prompt(&self) -> Option<DeletePrompt> {
        let ids = self.selected_ids();
        if ids.is_empty() {
            return None;
        }
        let message = format!(
            "Are you sure you want to delete {} {}(s)?",
            ids.len(),
            self.entity_name.to_lowercase()
        );
        Some(DeletePrompt { ids, message })
    }

    /// The user said yes: the selection is handed over and cleared.
    pub fn confirm_delete(&mut self) -> Vec<String> {
        let ids = self.selected_ids();
        self.clear_selection();
        ids
    }

    pub fn add_path(&self) -> String {
        format!("{}/add", self.base_path)
    }

    pub fn edit_path(&self, index: usize) -> Option<String> {
        let id = self.rows.get(index)?.get("id").and_then(id_string)?;
        Some(format!("{}/{}/edit", self.base_path, id))
    }

    pub fn render(&self, columns: &[ColumnDef]) -> TableView {
        let rows = self
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| RowView {
                id: row.get("id").and_then(id_string),
                selected: self.is_selected(index),
                cells: columns.iter().map(|c| c.render(row)).collect(),
                edit_path: self.edit_path(index),
            })
            .collect();

        let empty_message = self.rows.is_empty().then(|| {
            if self.loading {
                "Loading...".to_string()
            } else {
                "No results.".to_string()
            }
        });

        TableView {
            headers: columns.iter().map(|c| c.header.clone()).collect(),
            rows,
            selected_count: self.selected_count(),
            selection_tip: (self.selected_count() > 0)
                .then(|| "Tip: Shift+click to select range, Ctrl+click to select multiple".to_string()),
            empty_message,
            add_path: self.add_path(),
            add_label: format!("Add {}", self.entity_name),
            has_next: self.next.is_some(),
            has_previous: self.previous.is_some(),
        }
    }

    fn set_selected(&mut self, index: usize, on: bool) {
        if on {
            self.selected.insert(index);
        } else {
            self.selected.remove(&index);
        }
    }
}

#[derive(Debug, Default)]
pub struct BulkDeleteReport {
    pub requested: usize,
    pub deleted: usize,
    pub failed: usize,
    pub effects: Effects,
}

/// Issues one DELETE per id concurrently. A single failure turns the
/// outcome into one aggregate error toast; an expired session is returned
/// as an error instead.
pub async fn bulk_delete(
    client: &ApiClient,
    endpoint: &str,
    ids: &[String],
    entity_name: &str,
    plural: &str,
) -> Result<BulkDeleteReport, AppError> {
    let base = client.endpoint(endpoint);
    let deletes = ids.iter().map(|id| {
        let url = format!("{}/{}/", base, id);
        async move { client.delete::<Value>(&url).await }
    });
    let results = join_all(deletes).await;

    let mut report = BulkDeleteReport {
        requested: ids.len(),
        ..Default::default()
    };
    let mut first_error = None;
    let mut expired = false;
    for result in results {
        match result {
            Ok(_) => report.deleted += 1,
            Err(AppError::AuthenticationRequired) => expired = true,
            Err(e) => {
                report.failed += 1;
                first_error.get_or_insert(e);
            }
        }
    }

    if expired {
        return Err(AppError::AuthenticationRequired);
    }

    let entity = entity_name.to_lowercase();
    match first_error {
        None => {
            info!("deleted {} {}(s)", report.deleted, entity);
            report
                .effects
                .success(format!("Successfully deleted {} {}(s)", ids.len(), entity));
        }
        Some(e) => {
            warn!(
                "bulk delete of {}: {} of {} failed",
                entity, report.failed, report.requested
            );
            report
                .effects
                .error(format!("Failed to delete {}: {}", plural.to_lowercase(), e));
        }
    }
    Ok(report)
}
