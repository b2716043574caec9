use serde::Serialize;
use serde_json::{Value, json};
use tracing::error;

use crate::admin::Effects;
use crate::api::ApiClient;
use crate::error::AppError;
use crate::models::Professor;

/// The professor list behind the "assign professor" dialogs.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfessorPicker {
    pub professors: Vec<Professor>,
}

impl ProfessorPicker {
    pub async fn load(client: &ApiClient) -> Result<Self, AppError> {
        let url = format!("{}/?page_size=1000", client.endpoint("professors"));
        let rows = client.list_values(&url).await?;
        let professors = rows
            .into_iter()
            .filter_map(|row| serde_json::from_value(row).ok())
            .collect();
        Ok(Self { professors })
    }

    /// Matches first name, last name, full name or corporate email.
    pub fn filter(&self, query: &str) -> Vec<&Professor> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.professors.iter().collect();
        }
        self.professors
            .iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.last_name.to_lowercase().contains(&needle)
                    || p.full_name().to_lowercase().contains(&needle)
                    || p.corporate_email
                        .as_deref()
                        .map(|e| e.to_lowercase().contains(&needle))
                        .unwrap_or(false)
            })
            .collect()
    }

    pub fn find(&self, id: i64) -> Option<&Professor> {
        self.professors.iter().find(|p| p.id == id)
    }
}

/// PATCHes the delivery's professor. Only an expired session is
/// returned as an error.
pub async fn assign_to_delivery(
    client: &ApiClient,
    delivery_id: i64,
    professor: Option<&Professor>,
) -> Result<Effects, AppError> {
    let mut effects = Effects::new();
    let Some(professor) = professor else {
        effects.error("Please select a professor");
        return Ok(effects);
    };

    let url = format!("{}/{}/", client.endpoint("course-deliveries"), delivery_id);
    match client
        .patch::<Value>(&url, &json!({ "professor_id": professor.id }))
        .await
    {
        Ok(_) => {
            effects.success(format!("Successfully assigned {}", professor.full_name()));
        }
        Err(AppError::AuthenticationRequired) => return Err(AppError::AuthenticationRequired),
        Err(e) => {
            error!("assigning professor {} to delivery {} failed: {}", professor.id, delivery_id, e);
            effects.error(format!("Failed to assign professor: {}", e));
        }
    }
    Ok(effects)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn professor(id: i64, name: &str, last: &str, email: &str) -> Professor {
        Professor {
            id,
            name: name.to_string(),
            last_name: last.to_string(),
            corporate_email: Some(email.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn filter_matches_full_name_and_email() {
        let picker = ProfessorPicker {
            professors: vec![
                professor(1, "Ana", "Ruiz", "aruiz@ie.edu"),
                professor(2, "Luis", "Gomez", "lgomez@ie.edu"),
            ],
        };
        assert_eq!(picker.filter("ana ruiz").len(), 1);
        assert_eq!(picker.filter("LGOMEZ")[0].id, 2);
        assert_eq!(picker.filter("").len(), 2);
    }
}
