use serde::{Deserialize, Serialize};

use super::{Course, Professor, Section};

/// One course taught by (optionally) one professor to a set of sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseDelivery {
    pub id: i64,
    pub course: Option<Course>,
    pub professor: Option<Professor>,
    pub sections: Vec<Section>,
}

impl CourseDelivery {
    pub fn serves_section(&self, section_id: i64) -> bool {
        self.sections.iter().any(|s| s.id == section_id)
    }
}
