use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::format_date;
use crate::api::ApiClient;
use crate::error::AppError;
use crate::models::{CourseDelivery, Program, Term};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ProgramSection {
    pub id: i64,
    pub name: String,
    pub campus: Option<String>,
    pub campus_display: Option<String>,
    pub course_year: Option<u32>,
    pub course_deliveries: Vec<CourseDelivery>,
}

impl ProgramSection {
    pub fn missing(&self) -> usize {
        self.course_deliveries
            .iter()
            .filter(|d| d.professor.is_none())
            .count()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProgramDelivery {
    pub program: Program,
    pub intake: Term,
    pub sections: Vec<ProgramSection>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgramYear {
    pub year: u32,
    pub missing: usize,
    pub sections: Vec<ProgramSection>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgramDeliveryView {
    pub program_id: i64,
    pub program_name: String,
    pub intake_id: i64,
    pub intake_name: String,
    pub date_range: Option<String>,
    pub total_missing: usize,
    pub years: Vec<ProgramYear>,
}

/// Resolves the program by exact name through the search endpoint, then
/// loads its delivery breakdown for `intake_id`.
pub async fn fetch(client: &ApiClient, program_name: &str, intake_id: &str) -> Result<ProgramDelivery, AppError> {
    let search = crate::admin::filters::with_query(
        &format!("{}/", client.endpoint("programs")),
        &[("search".to_string(), program_name.to_string())],
    )?;
    let program = client
        .list_values(&search)
        .await?
        .into_iter()
        .filter_map(|row| serde_json::from_value::<Program>(row).ok())
        .find(|p| p.name == program_name)
        .ok_or_else(|| AppError::Validation("Program not found".to_string()))?;

    let url = format!(
        "{}/{}/{}/",
        client.endpoint("program-delivery"),
        program.id,
        intake_id
    );
    client.get(&url).await
}

impl ProgramDelivery {
    pub fn build(&self) -> ProgramDeliveryView {
        let mut by_year: BTreeMap<u32, Vec<ProgramSection>> = BTreeMap::new();
        for section in &self.sections {
            by_year
                .entry(section.course_year.unwrap_or(0))
                .or_default()
                .push(section.clone());
        }

        let years: Vec<ProgramYear> = by_year
            .into_iter()
            .map(|(year, sections)| ProgramYear {
                year,
                missing: sections.iter().map(ProgramSection::missing).sum(),
                sections,
            })
            .collect();

        let date_range = match (&self.intake.start_time, &self.intake.end_time) {
            (Some(start), Some(end)) => Some(format!("{} - {}", format_date(start), format_date(end))),
            _ => None,
        };

        ProgramDeliveryView {
            program_id: self.program.id,
            program_name: self.program.name.clone(),
            intake_id: self.intake.id,
            intake_name: self.intake.name.clone(),
            date_range,
            total_missing: years.iter().map(|y| y.missing).sum(),
            years,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sections_group_by_year_with_missing_counts() {
        let data: ProgramDelivery = serde_json::from_value(json!({
            "program": {"id": 3, "name": "BBA"},
            "intake": {"id": 1, "name": "Fall 2024"},
            "sections": [
                {"id": 2, "name": "B", "course_year": 2, "course_deliveries": [{"id": 5, "professor": null}]},
                {"id": 1, "name": "A", "course_year": 1, "course_deliveries": [
                    {"id": 3, "professor": {"id": 9, "name": "Ana", "last_name": "Ruiz"}},
                    {"id": 4, "professor": null}
                ]}
            ]
        }))
        .unwrap();

        let view = data.build();
        assert_eq!(view.total_missing, 2);
        assert_eq!(view.years[0].year, 1);
        assert_eq!(view.years[0].missing, 1);
        assert_eq!(view.years[1].sections[0].name, "B");
    }
}
