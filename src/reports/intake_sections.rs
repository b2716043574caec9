use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use super::current_intakes::COMPLETE_PREFIX;
use super::format_date;
use crate::admin::filters::with_query;
use crate::api::ApiClient;
use crate::error::AppError;
use crate::models::{Course, CourseDelivery, Section, Term};

const MADRID_PLACEHOLDER: &str = "Madrid Campus";
const SEGOVIA_PLACEHOLDER: &str = "Segovia Campus";
const UNKNOWN_CAMPUS: &str = "Unknown Campus";

/// Sections of one term (optionally one program) with their deliveries.
#[derive(Debug, Clone, Default)]
pub struct IntakeSections {
    pub intake: Option<Term>,
    pub sections: Vec<Section>,
    pub deliveries: Vec<CourseDelivery>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CampusCell {
    Assigned { delivery_id: i64, professor: String },
    Unassigned { delivery_id: i64 },
    NotOffered,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseRow {
    pub code: String,
    pub name: String,
    pub course_type: Option<String>,
    pub credits: Option<f64>,
    pub sessions: Option<i64>,
    pub cells: Vec<CampusCell>,
}

#[derive(Debug, Clone, Serialize)]
pub struct YearBlock {
    pub year: u32,
    pub missing: usize,
    pub campuses: Vec<String>,
    pub courses: Vec<CourseRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntakeSectionsView {
    pub intake_name: Option<String>,
    pub date_range: Option<String>,
    pub section_count: usize,
    pub total_missing: usize,
    pub years: Vec<YearBlock>,
}

/// Cards for complete intakes carry a label instead of a program name;
/// those show every program.
fn program_filter(program: Option<&str>) -> Option<&str> {
    program.filter(|p| !p.trim().is_empty() && !p.starts_with(COMPLETE_PREFIX))
}

pub async fn fetch(client: &ApiClient, intake_id: &str, program: Option<&str>) -> Result<IntakeSections, AppError> {
    let url = with_query(
        &format!("{}/", client.endpoint("sections")),
        &[("intake".to_string(), intake_id.to_string())],
    )?;
    let mut sections: Vec<Section> = client
        .list_values(&url)
        .await?
        .into_iter()
        .filter_map(|row| serde_json::from_value(row).ok())
        .collect();

    if let Some(program) = program_filter(program) {
        sections.retain(|s| s.program_name() == program);
    }
    debug!("{} sections for intake {}", sections.len(), intake_id);

    let intake = sections.first().and_then(|s| s.intake.clone());

    let deliveries = if sections.is_empty() {
        Vec::new()
    } else {
        let ids: Vec<String> = sections.iter().map(|s| s.id.to_string()).collect();
        let url = with_query(
            &format!("{}/", client.endpoint("course-deliveries")),
            &[("sections__in".to_string(), ids.join(","))],
        )?;
        client
            .list_values(&url)
            .await?
            .into_iter()
            .filter_map(|row| serde_json::from_value(row).ok())
            .collect()
    };

    Ok(IntakeSections {
        intake,
        sections,
        deliveries,
    })
}

fn campus_of(section: &Section) -> String {
    section
        .campus_display
        .clone()
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| UNKNOWN_CAMPUS.to_string())
}

impl IntakeSections {
    fn deliveries_for(&self, section_id: i64) -> impl Iterator<Item = &CourseDelivery> {
        self.deliveries.iter().filter(move |d| d.serves_section(section_id))
    }

    fn missing_in(&self, sections: &[&Section]) -> usize {
        sections
            .iter()
            .map(|s| self.deliveries_for(s.id).filter(|d| d.professor.is_none()).count())
            .sum()
    }

    /// Year blocks in ascending order. Each is a course-by-campus grid with
    /// a Madrid and a Segovia column even when one has no deliveries.
    pub fn build(&self) -> IntakeSectionsView {
        let mut by_year: BTreeMap<u32, Vec<&Section>> = BTreeMap::new();
        for section in &self.sections {
            by_year
                .entry(section.course_year.unwrap_or(0))
                .or_default()
                .push(section);
        }

        let years: Vec<YearBlock> = by_year
            .iter()
            .map(|(year, sections)| self.year_block(*year, sections))
            .collect();

        let total_missing = {
            let all: Vec<&Section> = self.sections.iter().collect();
            self.missing_in(&all)
        };

        let date_range = self.intake.as_ref().and_then(|i| match (&i.start_time, &i.end_time) {
            (Some(start), Some(end)) => Some(format!("{} - {}", format_date(start), format_date(end))),
            _ => None,
        });

        IntakeSectionsView {
            intake_name: self.intake.as_ref().map(|i| i.name.clone()),
            date_range,
            section_count: self.sections.len(),
            total_missing,
            years,
        }
    }

    fn year_block(&self, year: u32, sections: &[&Section]) -> YearBlock {
        let pairs: Vec<(String, &CourseDelivery)> = sections
            .iter()
            .flat_map(|s| {
                let campus = campus_of(s);
                self.deliveries_for(s.id).map(move |d| (campus.clone(), d))
            })
            .collect();

        let mut seen: Vec<&str> = Vec::new();
        for (campus, _) in &pairs {
            if !seen.contains(&campus.as_str()) {
                seen.push(campus);
            }
        }
        let pick = |needle: &str, placeholder: &str| {
            seen.iter()
                .find(|name| name.to_lowercase().contains(needle))
                .map(|name| name.to_string())
                .unwrap_or_else(|| placeholder.to_string())
        };
        let campuses = vec![
            pick("madrid", MADRID_PLACEHOLDER),
            pick("segovia", SEGOVIA_PLACEHOLDER),
        ];

        let mut codes: Vec<&str> = pairs
            .iter()
            .filter_map(|(_, d)| d.course.as_ref().map(|c| c.code.as_str()))
            .filter(|code| !code.is_empty())
            .collect();
        codes.sort();
        codes.dedup();

        let courses = codes
            .into_iter()
            .map(|code| {
                let course: Option<&Course> = pairs
                    .iter()
                    .filter_map(|(_, d)| d.course.as_ref())
                    .find(|c| c.code == code);
                let cells = campuses
                    .iter()
                    .map(|campus| {
                        let found = pairs.iter().find(|(c, d)| {
                            c == campus && d.course.as_ref().map(|x| x.code == code).unwrap_or(false)
                        });
                        match found {
                            Some((_, d)) => match &d.professor {
                                Some(p) => CampusCell::Assigned {
                                    delivery_id: d.id,
                                    professor: p.full_name(),
                                },
                                None => CampusCell::Unassigned { delivery_id: d.id },
                            },
                            None => CampusCell::NotOffered,
                        }
                    })
                    .collect();
                CourseRow {
                    code: code.to_string(),
                    name: course.map(|c| c.name.clone()).unwrap_or_default(),
                    course_type: course.and_then(|c| c.type_label().map(str::to_string)),
                    credits: course.and_then(|c| c.credits),
                    sessions: course.and_then(|c| c.sessions),
                    cells,
                }
            })
            .collect();

        YearBlock {
            year,
            missing: self.missing_in(sections),
            campuses,
            courses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report() -> IntakeSections {
        let sections: Vec<Section> = serde_json::from_value(json!([
            {"id": 10, "name": "A", "campus_display": "Madrid IE Tower", "course_year": 1},
            {"id": 11, "name": "B", "campus_display": "Madrid IE Tower", "course_year": 2}
        ]))
        .unwrap();
        let deliveries: Vec<CourseDelivery> = serde_json::from_value(json!([
            {"id": 1, "course": {"id": 7, "code": "FIN", "name": "Finance"}, "professor": {"id": 4, "name": "Ana", "last_name": "Ruiz"}, "sections": [{"id": 10}]},
            {"id": 2, "course": {"id": 8, "code": "ACC", "name": "Accounting"}, "professor": null, "sections": [{"id": 10}]},
            {"id": 3, "course": {"id": 9, "code": "LAW", "name": "Law"}, "professor": null, "sections": [{"id": 11}]}
        ]))
        .unwrap();
        IntakeSections {
            intake: None,
            sections,
            deliveries,
        }
    }

    #[test]
    fn years_have_both_campus_columns_and_missing_counts() {
        let view = report().build();
        assert_eq!(view.total_missing, 2);
        assert_eq!(view.years.len(), 2);

        let first = &view.years[0];
        assert_eq!(first.campuses, vec!["Madrid IE Tower", "Segovia Campus"]);
        assert_eq!(first.missing, 1);
        assert_eq!(first.courses[0].code, "ACC");
        assert_eq!(first.courses[0].cells[0], CampusCell::Unassigned { delivery_id: 2 });
        assert_eq!(
            first.courses[1].cells[0],
            CampusCell::Assigned {
                delivery_id: 1,
                professor: "Ana Ruiz".to_string()
            }
        );
        assert_eq!(first.courses[1].cells[1], CampusCell::NotOffered);
    }

    #[test]
    fn complete_intake_label_does_not_filter_programs() {
        assert_eq!(program_filter(Some("Complete Intake: Fall 2024")), None);
        assert_eq!(program_filter(Some("BBA")), Some("BBA"));
    }
}
