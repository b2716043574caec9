use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Program {
    pub id: i64,
    pub name: String,
    pub code: Option<String>,
    pub school: Option<String>,
    pub school_display: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub years: Option<u32>,
}

impl Program {
    /// Bachelor programmes without an explicit duration run four years.
    pub fn year_count(&self) -> u32 {
        self.years.filter(|y| *y > 0).unwrap_or(4)
    }
}
