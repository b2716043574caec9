use serde::{Deserialize, Serialize};

/// Backend `intakes` resource; labelled "Term" in navigation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Term {
    pub id: i64,
    pub name: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub semester: Option<String>,
    pub semester_display: Option<String>,
    pub active: Option<bool>,
}

impl Term {
    pub fn is_active(&self) -> bool {
        self.active.unwrap_or(false)
    }
}

/// Backend `joined-academic-years` resource; labelled "Intake" in forms.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AcademicYear {
    pub id: i64,
    pub name: String,
    pub start_date: Option<String>,
}
