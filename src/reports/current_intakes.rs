use std::collections::BTreeMap;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{format_date, program_link};
use crate::api::ApiClient;
use crate::error::AppError;

pub const COMPLETE_PREFIX: &str = "Complete Intake: ";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MissingProgram {
    #[serde(rename = "sections__intake__id")]
    pub intake_id: Option<i64>,
    #[serde(rename = "course__programs__name")]
    pub program_name: Option<String>,
    pub missing_count: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IntakeSummary {
    pub id: i64,
    pub name: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub semester: Option<String>,
    pub semester_display: Option<String>,
    pub missing_professors: u64,
    pub missing_programs: Vec<MissingProgram>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CurrentIntakesResponse {
    pub selected_date: String,
    pub intakes: Vec<IntakeSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramCard {
    pub intake_id: i64,
    pub intake_name: String,
    pub program_name: String,
    pub missing_count: u64,
    pub semester: Option<String>,
    pub date_range: Option<String>,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompleteCard {
    pub intake_id: i64,
    pub label: String,
    pub link: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrentIntakesView {
    pub selected_date: String,
    pub total_missing: u64,
    pub missing: Vec<ProgramCard>,
    pub complete: Vec<CompleteCard>,
}

pub async fn fetch(client: &ApiClient, date: Option<NaiveDate>) -> Result<CurrentIntakesResponse, AppError> {
    let date = date.unwrap_or_else(|| Local::now().date_naive());
    let url = format!(
        "{}/?date={}",
        client.endpoint("current-intakes"),
        date.format("%Y-%m-%d")
    );
    client.get(&url).await
}

fn usable_program(name: &str) -> bool {
    !name.trim().is_empty() && name != "null"
}

/// One card per (intake, program) with missing professors, plus one
/// card per intake that has none.
pub fn build(response: &CurrentIntakesResponse) -> CurrentIntakesView {
    let mut missing = Vec::new();
    let mut complete = Vec::new();

    for intake in &response.intakes {
        if intake.missing_professors == 0 {
            complete.push(CompleteCard {
                intake_id: intake.id,
                label: format!("{}{}", COMPLETE_PREFIX, intake.name),
                link: format!("/current-intakes/sections/{}", intake.id),
            });
            continue;
        }

        let mut per_program: BTreeMap<&str, u64> = BTreeMap::new();
        let mut order: Vec<&str> = Vec::new();
        for item in &intake.missing_programs {
            let Some(name) = item.program_name.as_deref().filter(|n| usable_program(n)) else {
                continue;
            };
            if !per_program.contains_key(name) {
                order.push(name);
            }
            *per_program.entry(name).or_default() += item.missing_count;
        }

        let date_range = match (&intake.start_time, &intake.end_time) {
            (Some(start), Some(end)) => Some(format!("{} - {}", format_date(start), format_date(end))),
            _ => None,
        };

        for name in order {
            missing.push(ProgramCard {
                intake_id: intake.id,
                intake_name: intake.name.clone(),
                program_name: name.to_string(),
                missing_count: per_program.get(name).copied().unwrap_or(0),
                semester: intake.semester_display.clone(),
                date_range: date_range.clone(),
                link: program_link(intake.id, name),
            });
        }
    }

    let total_missing = response
        .intakes
        .iter()
        .filter(|i| i.missing_professors > 0)
        .map(|i| i.missing_professors)
        .sum();

    CurrentIntakesView {
        selected_date: response.selected_date.clone(),
        total_missing,
        missing,
        complete,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn groups_missing_counts_by_program_and_lists_complete_intakes() {
        let response: CurrentIntakesResponse = serde_json::from_value(json!({
            "selected_date": "2024-10-01",
            "intakes": [
                {
                    "id": 1, "name": "Fall 2024", "start_time": "2024-09-01", "end_time": "2024-12-20",
                    "semester_display": "Fall", "missing_professors": 5,
                    "missing_programs": [
                        {"sections__intake__id": 1, "course__programs__name": "BBA", "missing_count": 2},
                        {"sections__intake__id": 1, "course__programs__name": "null", "missing_count": 1},
                        {"sections__intake__id": 1, "course__programs__name": "Law", "missing_count": 1},
                        {"sections__intake__id": 1, "course__programs__name": "BBA", "missing_count": 1}
                    ]
                },
                {"id": 2, "name": "Spring 2025", "missing_professors": 0, "missing_programs": []}
            ]
        }))
        .unwrap();

        let view = build(&response);
        assert_eq!(view.total_missing, 5);
        assert_eq!(view.missing.len(), 2);
        assert_eq!(view.missing[0].program_name, "BBA");
        assert_eq!(view.missing[0].missing_count, 3);
        assert_eq!(view.missing[0].link, "/current-intakes/sections/1?program=BBA");
        assert_eq!(view.missing[0].date_range.as_deref(), Some("Sep 1, 2024 - Dec 20, 2024"));
        assert_eq!(view.complete[0].label, "Complete Intake: Spring 2025");
    }
}
