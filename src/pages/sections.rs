use std::cmp::Ordering;

use serde::Serialize;
use serde_json::Value;

use crate::admin::{ColumnDef, TableState, TableView};
use crate::models::Section;

#[derive(Debug, Serialize)]
pub struct SectionPartitions {
    pub active: TableView,
    pub inactive: TableView,
}

fn sort_key(row: &Value) -> (String, u32) {
    let section: Section = serde_json::from_value(row.clone()).unwrap_or_default();
    (section.program_name().to_string(), section.course_year.unwrap_or(0))
}

fn by_program_then_year(a: &(Value, (String, u32)), b: &(Value, (String, u32))) -> Ordering {
    a.1.0.to_lowercase()
        .cmp(&b.1.0.to_lowercase())
        .then(a.1.1.cmp(&b.1.1))
}

/// Splits rows on whether their term is active; each side is ordered by
/// program name then course year.
pub fn partition_by_term(rows: &[Value]) -> (Vec<Value>, Vec<Value>) {
    let (mut active, mut inactive): (Vec<_>, Vec<_>) = rows
        .iter()
        .map(|row| (row.clone(), sort_key(row)))
        .partition(|(row, _)| {
            serde_json::from_value::<Section>(row.clone())
                .map(|s| s.has_active_term())
                .unwrap_or(false)
        });
    active.sort_by(by_program_then_year);
    inactive.sort_by(by_program_then_year);

    (
        active.into_iter().map(|(row, _)| row).collect(),
        inactive.into_iter().map(|(row, _)| row).collect(),
    )
}

pub fn partition_view(table: &TableState, columns: &[ColumnDef]) -> SectionPartitions {
    let (active, inactive) = partition_by_term(&table.rows);
    let render = |rows: Vec<Value>| {
        let mut part = TableState::new(&table.entity_name, &table.base_path);
        part.loading = table.loading;
        part.set_rows(rows, None, None);
        part.render(columns)
    };
    SectionPartitions {
        active: render(active),
        inactive: render(inactive),
    }
}
