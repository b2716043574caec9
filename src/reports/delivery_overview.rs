use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, error, warn};

use crate::admin::Effects;
use crate::admin::filters::with_query;
use crate::api::ApiClient;
use crate::error::AppError;
use crate::models::{Course, CourseDelivery, Professor, Program, Section, Term};

pub const ALL_INTAKES: &str = "all";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfessorInfo {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub section_name: Option<String>,
    pub delivery_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotAssignments {
    pub morning: Vec<ProfessorInfo>,
    pub afternoon: Vec<ProfessorInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OverviewCourse {
    pub course: Course,
    /// Keyed by campus code.
    pub assignments: BTreeMap<String, SlotAssignments>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionInfo {
    pub name: String,
    pub campus: Option<String>,
    pub campus_display: Option<String>,
    pub intake: Option<Term>,
    pub program: Option<Program>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OverviewSection {
    pub section_info: SectionInfo,
    pub courses: Vec<OverviewCourse>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OverviewYear {
    pub year: u32,
    pub sections: Vec<OverviewSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Choice {
    pub value: String,
    pub display: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OverviewFilters {
    pub programs: Vec<Program>,
    pub intakes: Vec<Term>,
    pub semesters: Vec<Choice>,
    pub campuses: Vec<Choice>,
    pub time_slots: Vec<Choice>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OverviewResponse {
    pub years: BTreeMap<String, OverviewYear>,
    pub filters: OverviewFilters,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionColumn {
    pub section_id: i64,
    pub name: String,
    pub year: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Assignment {
    pub delivery_id: i64,
    pub professor: Professor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MatrixCell {
    Assigned { professor_name: String, delivery_id: i64 },
    Available,
    NotAvailable,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatrixRow {
    pub course_id: i64,
    pub code: String,
    pub name: String,
    pub kind: Option<String>,
    pub credits: Option<f64>,
    pub sessions: Option<i64>,
    pub area: String,
    pub cells: Vec<MatrixCell>,
}

#[derive(Debug, Clone, Serialize)]
pub struct YearMatrix {
    pub year: u32,
    pub columns: Vec<SectionColumn>,
    pub rows: Vec<MatrixRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgramTab {
    pub id: i64,
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeliveryOverviewView {
    pub programs: Vec<ProgramTab>,
    pub intakes: Vec<Term>,
    pub selected_intake: String,
    pub search: String,
    pub years: Vec<OverviewYear>,
    pub matrices: Vec<YearMatrix>,
    pub empty_message: Option<String>,
}

/// Program-by-year planning grid: which professor teaches each course to
/// each section of the currently active terms.
#[derive(Debug, Clone)]
pub struct DeliveryOverview {
    program: Option<String>,
    intake: String,
    search: String,
    data: Option<OverviewResponse>,
    columns: Vec<SectionColumn>,
    year_courses: BTreeMap<u32, BTreeMap<i64, Vec<Course>>>,
    assignments: HashMap<(i64, i64), Assignment>,
}

impl Default for DeliveryOverview {
    fn default() -> Self {
        Self {
            program: None,
            intake: ALL_INTAKES.to_string(),
            search: String::new(),
            data: None,
            columns: Vec::new(),
            year_courses: BTreeMap::new(),
            assignments: HashMap::new(),
        }
    }
}

impl DeliveryOverview {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn program(&self) -> Option<&str> {
        self.program.as_deref()
    }

    pub fn columns(&self) -> &[SectionColumn] {
        &self.columns
    }

    pub fn assignment(&self, course_id: i64, section_id: i64) -> Option<&Assignment> {
        self.assignments.get(&(course_id, section_id))
    }

    /// Selects a program without rebuilding the section columns.
    pub fn set_program(&mut self, program: Option<&str>) {
        self.program = program.filter(|p| !p.is_empty()).map(str::to_string);
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    pub fn set_intake(&mut self, intake: Option<&str>) {
        self.intake = intake
            .filter(|i| !i.is_empty())
            .unwrap_or(ALL_INTAKES)
            .to_string();
    }

    pub fn overview_url(&self, client: &ApiClient) -> Result<String, AppError> {
        let mut pairs = Vec::new();
        if let Some(program) = &self.program {
            pairs.push(("program".to_string(), program.clone()));
        }
        if self.intake != ALL_INTAKES {
            pairs.push(("intake".to_string(), self.intake.clone()));
        }
        with_query(&format!("{}/", client.endpoint("delivery-overview")), &pairs)
    }

    pub async fn fetch(&mut self, client: &ApiClient) -> Result<Effects, AppError> {
        let mut effects = Effects::new();
        let url = self.overview_url(client)?;
        match client.get::<OverviewResponse>(&url).await {
            Ok(data) => self.data = Some(data),
            Err(AppError::AuthenticationRequired) => return Err(AppError::AuthenticationRequired),
            Err(e) => {
                error!("delivery overview fetch failed: {}", e);
                effects.error(format!("Failed to fetch delivery overview: {}", e));
            }
        }
        Ok(effects)
    }

    /// Switches program, reloads the overview and rebuilds the section
    /// columns from that program's sections in active terms.
    pub async fn select_program(&mut self, client: &ApiClient, program_id: &str) -> Result<Effects, AppError> {
        self.program = Some(program_id.to_string());
        let effects = self.fetch(client).await?;
        self.populate_columns(client).await;
        Ok(effects)
    }

    /// Failures leave the grid empty; nothing is reported to the user.
    pub async fn populate_columns(&mut self, client: &ApiClient) {
        self.columns.clear();
        self.year_courses.clear();
        self.assignments.clear();

        let Some(program) = self.program.clone() else {
            return;
        };

        let active_url = format!("{}/?is_active=true", client.endpoint("intakes"));
        let active: BTreeSet<i64> = match client.list_values(&active_url).await {
            Ok(rows) => rows
                .into_iter()
                .filter_map(|r| serde_json::from_value::<Term>(r).ok())
                .map(|t| t.id)
                .collect(),
            Err(e) => {
                warn!("could not load active terms: {}", e);
                return;
            }
        };

        let sections_url = match with_query(
            &format!("{}/", client.endpoint("sections")),
            &[("program".to_string(), program)],
        ) {
            Ok(url) => url,
            Err(e) => {
                warn!("bad sections url: {}", e);
                return;
            }
        };
        let sections: Vec<Section> = match client.fetch_all(&sections_url).await {
            Ok(rows) => rows
                .into_iter()
                .filter_map(|r| serde_json::from_value(r).ok())
                .collect(),
            Err(e) => {
                warn!("could not load program sections: {}", e);
                return;
            }
        };

        let mut seen = BTreeSet::new();
        for section in sections {
            let in_active_term = section
                .intake
                .as_ref()
                .map(|t| active.contains(&t.id))
                .unwrap_or(false);
            if !in_active_term || !seen.insert(section.id) {
                continue;
            }
            let year = section.course_year.unwrap_or(1);
            self.columns.push(SectionColumn {
                section_id: section.id,
                name: format!("{} (Year {})", section.name, year),
                year,
            });

            let deliveries_url = match with_query(
                &format!("{}/", client.endpoint("course-deliveries")),
                &[("sections".to_string(), section.id.to_string())],
            ) {
                Ok(url) => url,
                Err(e) => {
                    warn!("bad deliveries url: {}", e);
                    continue;
                }
            };
            let deliveries: Vec<CourseDelivery> = match client.list_values(&deliveries_url).await {
                Ok(rows) => rows
                    .into_iter()
                    .filter_map(|r| serde_json::from_value(r).ok())
                    .collect(),
                Err(e) => {
                    warn!("could not load deliveries for section {}: {}", section.id, e);
                    continue;
                }
            };
            self.absorb_deliveries(year, section.id, deliveries);
        }
        debug!("delivery overview populated {} section columns", self.columns.len());
    }

    fn absorb_deliveries(&mut self, year: u32, section_id: i64, deliveries: Vec<CourseDelivery>) {
        let courses = self
            .year_courses
            .entry(year)
            .or_default()
            .entry(section_id)
            .or_default();
        for delivery in deliveries {
            let Some(course) = delivery.course else {
                continue;
            };
            if !courses.iter().any(|c| c.id == course.id) {
                courses.push(course.clone());
            }
            if let Some(professor) = delivery.professor {
                self.assignments.insert(
                    (course.id, section_id),
                    Assignment {
                        delivery_id: delivery.id,
                        professor,
                    },
                );
            }
        }
    }

    pub fn remove_column(&mut self, section_id: i64) -> bool {
        let before = self.columns.len();
        self.columns.retain(|c| c.section_id != section_id);
        before != self.columns.len()
    }

    pub fn rename_column(&mut self, section_id: i64, name: &str) -> Result<(), AppError> {
        let column = self
            .columns
            .iter_mut()
            .find(|c| c.section_id == section_id)
            .ok_or(AppError::NotFound)?;
        column.name = name.trim().to_string();
        Ok(())
    }

    /// Reuses the delivery for (course, section) when one exists, otherwise
    /// creates it with the professor already set.
    pub async fn assign(
        &mut self,
        client: &ApiClient,
        course_id: i64,
        section_id: i64,
        professor: &Professor,
    ) -> Result<Effects, AppError> {
        let mut effects = Effects::new();
        match self.write_assignment(client, course_id, section_id, professor).await {
            Ok((delivery_id, created)) => {
                if created {
                    effects.success("New course delivery created with professor assignment");
                } else {
                    effects.success("Professor assigned successfully");
                }
                self.assignments.insert(
                    (course_id, section_id),
                    Assignment {
                        delivery_id,
                        professor: professor.clone(),
                    },
                );
                effects.extend(self.fetch(client).await?);
            }
            Err(AppError::AuthenticationRequired) => return Err(AppError::AuthenticationRequired),
            Err(e) => {
                error!("assigning professor {} to course {} / section {} failed: {}", professor.id, course_id, section_id, e);
                effects.error(format!("Failed to assign professor: {}", e));
            }
        }
        Ok(effects)
    }

    async fn write_assignment(
        &self,
        client: &ApiClient,
        course_id: i64,
        section_id: i64,
        professor: &Professor,
    ) -> Result<(i64, bool), AppError> {
        let endpoint = client.endpoint("course-deliveries");
        let lookup = with_query(
            &format!("{}/", endpoint),
            &[
                ("sections".to_string(), section_id.to_string()),
                ("course".to_string(), course_id.to_string()),
            ],
        )?;
        let existing: Vec<CourseDelivery> = client
            .list_values(&lookup)
            .await?
            .into_iter()
            .filter_map(|r| serde_json::from_value(r).ok())
            .collect();

        if let Some(delivery) = existing.first() {
            let url = format!("{}/{}/", endpoint, delivery.id);
            client
                .patch::<Value>(&url, &json!({ "professor_id": professor.id }))
                .await?;
            return Ok((delivery.id, false));
        }

        let created: Value = client
            .post(
                &format!("{}/", endpoint),
                &json!({
                    "course": course_id,
                    "sections": [section_id],
                    "professor_id": professor.id,
                }),
            )
            .await?;
        let id = created.get("id").and_then(Value::as_i64).unwrap_or_default();
        Ok((id, true))
    }

    fn selected_program(&self) -> Option<&Program> {
        let data = self.data.as_ref()?;
        let id = self.program.as_deref()?;
        data.filters
            .programs
            .iter()
            .find(|p| p.id.to_string() == id)
    }

    pub fn year_numbers(&self) -> Vec<u32> {
        match self.selected_program() {
            Some(program) => (1..=program.year_count()).collect(),
            None => Vec::new(),
        }
    }

    fn matches_search(&self, course: &Course) -> bool {
        let needle = self.search.trim().to_lowercase();
        needle.is_empty()
            || course.code.to_lowercase().contains(&needle)
            || course.name.to_lowercase().contains(&needle)
    }

    /// Overview years narrowed to courses matching the search; sections
    /// and years left empty are dropped.
    pub fn filtered_years(&self) -> Vec<OverviewYear> {
        let Some(data) = &self.data else {
            return Vec::new();
        };
        let mut years: Vec<OverviewYear> = data
            .years
            .values()
            .filter_map(|year| {
                let sections: Vec<OverviewSection> = year
                    .sections
                    .iter()
                    .filter_map(|section| {
                        let courses: Vec<OverviewCourse> = section
                            .courses
                            .iter()
                            .filter(|c| self.matches_search(&c.course))
                            .cloned()
                            .collect();
                        (!courses.is_empty()).then(|| OverviewSection {
                            section_info: section.section_info.clone(),
                            courses,
                        })
                    })
                    .collect();
                (!sections.is_empty()).then(|| OverviewYear {
                    year: year.year,
                    sections,
                })
            })
            .collect();
        years.sort_by_key(|y| y.year);
        years
    }

    pub fn matrix(&self, year: u32) -> YearMatrix {
        let columns: Vec<SectionColumn> = self
            .columns
            .iter()
            .filter(|c| c.year == year)
            .cloned()
            .collect();
        let per_section = self.year_courses.get(&year);

        let mut by_code: BTreeMap<String, &Course> = BTreeMap::new();
        if let Some(per_section) = per_section {
            for course in per_section.values().flatten() {
                if self.matches_search(course) {
                    by_code.entry(course.code.clone()).or_insert(course);
                }
            }
        }

        let rows = by_code
            .into_values()
            .map(|course| {
                let cells = columns
                    .iter()
                    .map(|column| {
                        let offered = per_section
                            .and_then(|m| m.get(&column.section_id))
                            .map(|courses| courses.iter().any(|c| c.code == course.code))
                            .unwrap_or(false);
                        if !offered {
                            return MatrixCell::NotAvailable;
                        }
                        match self.assignment(course.id, column.section_id) {
                            Some(a) => MatrixCell::Assigned {
                                professor_name: a.professor.full_name(),
                                delivery_id: a.delivery_id,
                            },
                            None => MatrixCell::Available,
                        }
                    })
                    .collect();
                MatrixRow {
                    course_id: course.id,
                    code: course.code.clone(),
                    name: course.name.clone(),
                    kind: course.type_label().map(str::to_string),
                    credits: course.credits,
                    sessions: course.sessions,
                    area: course.area_display(),
                    cells,
                }
            })
            .collect();

        YearMatrix { year, columns, rows }
    }

    pub fn view(&self) -> DeliveryOverviewView {
        let filters = self.data.as_ref().map(|d| &d.filters);
        let programs = filters
            .map(|f| {
                f.programs
                    .iter()
                    .map(|p| ProgramTab {
                        id: p.id,
                        label: program_label(p),
                        selected: self.program.as_deref() == Some(p.id.to_string().as_str()),
                    })
                    .collect()
            })
            .unwrap_or_default();
        let intakes = filters.map(|f| f.intakes.clone()).unwrap_or_default();

        let empty_message = self
            .program
            .is_none()
            .then(|| "Select a program to view its delivery overview".to_string());

        DeliveryOverviewView {
            programs,
            intakes,
            selected_intake: self.intake.clone(),
            search: self.search.clone(),
            years: self.filtered_years(),
            matrices: self.year_numbers().into_iter().map(|y| self.matrix(y)).collect(),
            empty_message,
        }
    }
}

/// Program tab text: code plus the first three words of the name.
fn program_label(program: &Program) -> String {
    let words: Vec<&str> = program.name.split_whitespace().collect();
    let short = if words.len() > 3 {
        format!("{}...", words[..3].join(" "))
    } else {
        words.join(" ")
    };
    match program.code.as_deref().filter(|c| !c.is_empty()) {
        Some(code) => format!("{} {}", code, short),
        None => short,
    }
}
