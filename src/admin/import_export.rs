use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::effects::Effects;
use crate::api::ApiClient;
use crate::error::AppError;

const IMPORT_BATCH_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json => "application/json",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportFile {
    pub filename: String,
    pub content_type: &'static str,
    pub content: String,
}

/// Every cell is quoted. Nested values are written as JSON.
pub fn to_csv(rows: &[Value], fields: &[String]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(fields.join(","));
    for row in rows {
        let cells: Vec<String> = fields
            .iter()
            .map(|field| csv_quote(&cell_text(row.get(field).unwrap_or(&Value::Null))))
            .collect();
        lines.push(cells.join(","));
    }
    lines.join("\n")
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Object(_) | Value::Array(_) => value.to_string(),
        other => other.to_string(),
    }
}

fn csv_quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

pub fn to_json(rows: &[Value]) -> Result<String, AppError> {
    Ok(serde_json::to_string_pretty(rows)?)
}

/// Fetches every page of `endpoint` and renders it.
pub async fn export_records(
    client: &ApiClient,
    endpoint: &str,
    entity_name: &str,
    fields: &[String],
    format: ExportFormat,
) -> Result<ExportFile, AppError> {
    let rows = client.fetch_all(&format!("{}/", client.endpoint(endpoint))).await?;
    if rows.is_empty() {
        return Err(AppError::Validation("No data to export".to_string()));
    }
    info!("exporting {} {} rows as {}", rows.len(), entity_name, format.extension());

    let content = match format {
        ExportFormat::Csv => to_csv(&rows, fields),
        ExportFormat::Json => to_json(&rows)?,
    };

    Ok(ExportFile {
        filename: format!("{}_export.{}", entity_name.to_lowercase(), format.extension()),
        content_type: format.content_type(),
        content,
    })
}

fn parse_csv_record(line: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut buf = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                buf.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => out.push(std::mem::take(&mut buf)),
            _ => buf.push(ch),
        }
    }
    out.push(buf);
    out
}

/// Header line plus one object per data line. Cells that look like JSON
/// objects or arrays are parsed when valid; all others stay strings.
pub fn parse_csv(content: &str) -> Result<Vec<Value>, AppError> {
    let lines: Vec<&str> = content
        .split('\n')
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty())
        .collect();
    if lines.len() < 2 {
        return Err(AppError::Validation(
            "CSV file must have at least a header row and one data row".to_string(),
        ));
    }

    let headers: Vec<String> = parse_csv_record(lines[0])
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();

    let rows = lines[1..]
        .iter()
        .map(|line| {
            let cells = parse_csv_record(line);
            let item: Map<String, Value> = headers
                .iter()
                .enumerate()
                .map(|(i, header)| {
                    let cell = cells.get(i).map(|c| c.trim()).unwrap_or("");
                    (header.clone(), cell_value(cell))
                })
                .collect();
            Value::Object(item)
        })
        .collect();
    Ok(rows)
}

fn cell_value(cell: &str) -> Value {
    if cell.starts_with('{') || cell.starts_with('[') {
        if let Ok(parsed) = serde_json::from_str(cell) {
            return parsed;
        }
    }
    Value::String(cell.to_string())
}

/// Picks the parser by extension and insists on a non-empty array.
pub fn parse_import(filename: &str, content: &str) -> Result<Vec<Value>, AppError> {
    let lower = filename.to_ascii_lowercase();
    let data = if lower.ends_with(".json") {
        serde_json::from_str::<Value>(content)
            .map_err(|e| AppError::Validation(e.to_string()))?
    } else if lower.ends_with(".csv") {
        Value::Array(parse_csv(content)?)
    } else {
        return Err(AppError::Validation(
            "Unsupported file format. Please use CSV or JSON files.".to_string(),
        ));
    };

    match data {
        Value::Array(items) if !items.is_empty() => Ok(items),
        _ => Err(AppError::Validation(
            "File must contain an array of objects".to_string(),
        )),
    }
}

#[derive(Debug, Default)]
pub struct ImportReport {
    pub imported: usize,
    pub failed: usize,
    pub effects: Effects,
}

/// POSTs each parsed row without its `id`, ten at a time, one after the
/// other. An expired session stops the import and is returned as an error.
pub async fn import_records(
    client: &ApiClient,
    endpoint: &str,
    entity_name: &str,
    filename: &str,
    content: &str,
) -> Result<ImportReport, AppError> {
    let mut report = ImportReport::default();
    let items = match parse_import(filename, content) {
        Ok(items) => items,
        Err(e) => {
            report.effects.error(format!("Import failed: {}", e));
            return Ok(report);
        }
    };

    let url = format!("{}/", client.endpoint(endpoint));
    for batch in items.chunks(IMPORT_BATCH_SIZE) {
        for item in batch {
            let mut body = item.clone();
            if let Value::Object(map) = &mut body {
                map.remove("id");
            }
            match client.post::<Value>(&url, &body).await {
                Ok(_) => report.imported += 1,
                Err(AppError::AuthenticationRequired) => {
                    warn!("session expired after importing {} records", report.imported);
                    return Err(AppError::AuthenticationRequired);
                }
                Err(e) => {
                    warn!("Failed to import item: {}", e);
                    report.failed += 1;
                }
            }
        }
    }

    if report.imported > 0 {
        report.effects.success(format!(
            "Successfully imported {} {} records",
            report.imported,
            entity_name.to_lowercase()
        ));
    }
    if report.failed > 0 {
        report.effects.error(format!(
            "Failed to import {} records. Check console for details.",
            report.failed
        ));
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn csv_quotes_every_cell_and_stringifies_nested_values() {
        let rows = vec![json!({
            "code": "FIN-1",
            "credits": 6,
            "active": false,
            "area": {"name": "Finance"},
            "note": "say \"hi\"",
            "missing": null
        })];
        let fields: Vec<String> = ["code", "credits", "active", "area", "note", "missing"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let csv = to_csv(&rows, &fields);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("code,credits,active,area,note,missing"));
        assert_eq!(
            lines.next(),
            Some(r#""FIN-1","6","false","{""name"":""Finance""}","say ""hi""","""#)
        );
    }

    #[test]
    fn csv_import_parses_json_cells_and_quoted_commas() {
        let content = "name,tags,notes\r\n\"Smith, Ana\",\"[1,2]\",{broken\n\n";
        let rows = parse_csv(content).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], json!("Smith, Ana"));
        assert_eq!(rows[0]["tags"], json!([1, 2]));
        assert_eq!(rows[0]["notes"], json!("{broken"));
    }

    #[test]
    fn import_rejects_unknown_extensions_and_empty_arrays() {
        let err = parse_import("data.xlsx", "").unwrap_err();
        assert_eq!(err.to_string(), "Unsupported file format. Please use CSV or JSON files.");
        let err = parse_import("data.json", "[]").unwrap_err();
        assert_eq!(err.to_string(), "File must contain an array of objects");
        let err = parse_import("data.csv", "name\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "CSV file must have at least a header row and one data row"
        );
    }
}
