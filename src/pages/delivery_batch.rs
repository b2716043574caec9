use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};
use uuid::Uuid;

use crate::admin::{AutocompleteOption, Effects, build_options};
use crate::api::ApiClient;
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseSelection {
    pub key: Uuid,
    pub course_id: Option<String>,
}

impl CourseSelection {
    fn empty() -> Self {
        Self {
            key: Uuid::new_v4(),
            course_id: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct NewDelivery {
    course_id: i64,
    professor_id: i64,
    sections_ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct BatchOptions {
    pub professors: Vec<AutocompleteOption>,
    pub courses: Vec<AutocompleteOption>,
}

/// Assigns one professor to several courses at once, one delivery per
/// course and no sections yet.
#[derive(Debug, Clone, Serialize)]
pub struct CourseDeliveryBatch {
    pub professor_id: Option<String>,
    pub selections: Vec<CourseSelection>,
    pub submitting: bool,
}

impl Default for CourseDeliveryBatch {
    fn default() -> Self {
        Self::new()
    }
}

impl CourseDeliveryBatch {
    pub fn new() -> Self {
        Self {
            professor_id: None,
            selections: vec![CourseSelection::empty()],
            submitting: false,
        }
    }

    /// A batch already filled in, one selection row per course.
    pub fn prefilled(professor_id: Option<String>, course_ids: Vec<String>) -> Self {
        let mut batch = Self::new();
        batch.set_professor(professor_id);
        for (index, course_id) in course_ids.into_iter().enumerate() {
            let key = match index {
                0 => batch.selections[0].key,
                _ => batch.add_selection(),
            };
            batch.update_selection(key, Some(course_id));
        }
        batch
    }

    pub async fn load_options(client: &ApiClient) -> Result<BatchOptions, AppError> {
        let professors = client
            .list_values(&format!("{}/", client.endpoint("professors")))
            .await?;
        let courses = client
            .list_values(&format!("{}/", client.endpoint("courses")))
            .await?;
        Ok(BatchOptions {
            professors: build_options("professors", &professors),
            courses: build_options("courses", &courses),
        })
    }

    pub fn set_professor(&mut self, professor_id: Option<String>) {
        self.professor_id = professor_id.filter(|p| !p.is_empty());
    }

    pub fn add_selection(&mut self) -> Uuid {
        let selection = CourseSelection::empty();
        let key = selection.key;
        self.selections.push(selection);
        key
    }

    /// The last remaining row cannot be removed.
    pub fn remove_selection(&mut self, key: Uuid) -> bool {
        if self.selections.len() <= 1 {
            return false;
        }
        let before = self.selections.len();
        self.selections.retain(|s| s.key != key);
        self.selections.len() != before
    }

    pub fn update_selection(&mut self, key: Uuid, course_id: Option<String>) -> bool {
        match self.selections.iter_mut().find(|s| s.key == key) {
            Some(selection) => {
                selection.course_id = course_id.filter(|c| !c.is_empty());
                true
            }
            None => false,
        }
    }

    pub fn selected_courses(&self) -> Vec<&str> {
        self.selections
            .iter()
            .filter_map(|s| s.course_id.as_deref())
            .collect()
    }

    pub fn submit_label(&self) -> String {
        if self.submitting {
            return "Creating...".to_string();
        }
        format!("Create {} Assignment(s)", self.selected_courses().len())
    }

    fn validate(&self) -> Result<(i64, Vec<i64>), AppError> {
        let professor = self
            .professor_id
            .as_deref()
            .ok_or_else(|| AppError::Validation("Please select a professor".to_string()))?;
        let courses = self.selected_courses();
        if courses.is_empty() {
            return Err(AppError::Validation(
                "Please select at least one course".to_string(),
            ));
        }

        let professor_id = parse_id(professor)?;
        let course_ids = courses
            .into_iter()
            .map(parse_id)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((professor_id, course_ids))
    }

    /// Only an expired session is returned as an error.
    pub async fn submit(&mut self, client: &ApiClient) -> Result<Effects, AppError> {
        let mut effects = Effects::new();
        let (professor_id, course_ids) = match self.validate() {
            Ok(ids) => ids,
            Err(e) => {
                effects.error(e.to_string());
                return Ok(effects);
            }
        };

        self.submitting = true;
        let url = format!("{}/", client.endpoint("course-deliveries"));
        let posts = course_ids.iter().map(|course_id| {
            let body = NewDelivery {
                course_id: *course_id,
                professor_id,
                sections_ids: Vec::new(),
            };
            let url = url.clone();
            async move { client.post::<Value>(&url, &body).await }
        });
        let results = join_all(posts).await;
        self.submitting = false;

        if results
            .iter()
            .any(|r| matches!(r, Err(AppError::AuthenticationRequired)))
        {
            return Err(AppError::AuthenticationRequired);
        }
        match results.into_iter().find_map(Result::err) {
            None => {
                info!(
                    "created {} course deliveries for professor {}",
                    course_ids.len(),
                    professor_id
                );
                effects
                    .success(format!(
                        "Successfully created {} course delivery assignment(s)",
                        course_ids.len()
                    ))
                    .navigate("/course-deliveries");
            }
            Some(e) => {
                error!("Error creating course deliveries: {}", e);
                effects.error(format!("Failed to create course deliveries: {}", e));
            }
        }
        Ok(effects)
    }
}

fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| AppError::Validation(format!("Invalid id: {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_selection_cannot_be_removed() {
        let mut batch = CourseDeliveryBatch::new();
        let first = batch.selections[0].key;
        assert!(!batch.remove_selection(first));

        let second = batch.add_selection();
        assert!(batch.update_selection(second, Some("9".to_string())));
        assert!(batch.remove_selection(first));
        assert_eq!(batch.selected_courses(), vec!["9"]);
        assert_eq!(batch.submit_label(), "Create 1 Assignment(s)");
    }

    #[test]
    fn validation_messages() {
        let mut batch = CourseDeliveryBatch::new();
        assert_eq!(batch.validate().unwrap_err().to_string(), "Please select a professor");
        batch.set_professor(Some("42".to_string()));
        assert_eq!(
            batch.validate().unwrap_err().to_string(),
            "Please select at least one course"
        );
    }
}
