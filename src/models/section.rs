use serde::{Deserialize, Serialize};

use super::{AcademicYear, Program, Term};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Section {
    pub id: i64,
    pub name: String,
    pub campus: Option<String>,
    pub campus_display: Option<String>,
    pub course_year: Option<u32>,
    pub intake: Option<Term>,
    pub program: Option<Program>,
    pub joined_academic_year: Option<AcademicYear>,
}

impl Section {
    pub fn program_name(&self) -> &str {
        self.program.as_ref().map(|p| p.name.as_str()).unwrap_or("")
    }

    pub fn has_active_term(&self) -> bool {
        self.intake.as_ref().map(Term::is_active).unwrap_or(false)
    }
}
