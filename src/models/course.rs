use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Course {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub course_type: Option<String>,
    pub course_type_display: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub type_display: Option<String>,
    pub credits: Option<f64>,
    pub sessions: Option<i64>,
    pub area: Option<AreaField>,
}

/// The overview endpoint sends the area as a bare name, the CRUD
/// endpoints as a nested object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AreaField {
    Name(String),
    Detail {
        #[serde(default)]
        id: Option<i64>,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        name_en: Option<String>,
    },
}

impl AreaField {
    pub fn display(&self) -> String {
        match self {
            AreaField::Name(name) => name.clone(),
            AreaField::Detail { name, name_en, .. } => name
                .clone()
                .or_else(|| name_en.clone())
                .unwrap_or_else(|| "Unknown Area".to_string()),
        }
    }
}

impl Course {
    pub fn area_display(&self) -> String {
        self.area
            .as_ref()
            .map(AreaField::display)
            .unwrap_or_else(|| "Unknown Area".to_string())
    }

    pub fn type_label(&self) -> Option<&str> {
        self.course_type_display
            .as_deref()
            .or(self.type_display.as_deref())
            .or(self.kind.as_deref())
    }
}
