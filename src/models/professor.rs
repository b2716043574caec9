use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Professor {
    pub id: i64,
    pub name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub corporate_email: Option<String>,
    pub professor_type: Option<String>,
    pub professor_type_display: Option<String>,
    pub campuses: Vec<String>,
    pub availabilities: Vec<String>,
}

impl Professor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.last_name).trim().to_string()
    }
}
