use serde::Serialize;
use serde_json::Value;

use super::field::id_string;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutocompleteOption {
    pub value: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip)]
    pub search_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OptionStyle {
    Professor,
    Course,
    Degree,
    Generic,
}

impl OptionStyle {
    fn for_endpoint(endpoint: &str) -> Self {
        match endpoint.trim_matches('/').rsplit('/').next().unwrap_or("") {
            "professors" => OptionStyle::Professor,
            "courses" => OptionStyle::Course,
            "degrees" => OptionStyle::Degree,
            _ => OptionStyle::Generic,
        }
    }
}

fn text<'a>(obj: &'a Value, key: &str) -> &'a str {
    obj.get(key).and_then(Value::as_str).unwrap_or("")
}

fn nested_name(obj: &Value, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(|v| v.get("name"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

/// Turns API objects into picker options. Professors, courses and degrees
/// get richer labels; everything else uses its name.
pub fn build_options(endpoint: &str, objects: &[Value]) -> Vec<AutocompleteOption> {
    let style = OptionStyle::for_endpoint(endpoint);
    objects
        .iter()
        .map(|obj| {
            let value = obj.get("id").and_then(id_string).unwrap_or_default();
            match style {
                OptionStyle::Professor => professor_option(value, obj),
                OptionStyle::Course => course_option(value, obj),
                OptionStyle::Degree => degree_option(value, obj),
                OptionStyle::Generic => generic_option(value, obj),
            }
        })
        .collect()
}

fn professor_option(value: String, obj: &Value) -> AutocompleteOption {
    let full_name = format!("{} {}", text(obj, "name"), text(obj, "last_name"))
        .trim()
        .to_string();
    let label = non_empty(&full_name)
        .or_else(|| non_empty(text(obj, "name")))
        .unwrap_or_else(|| "Unknown Professor".to_string());
    let subtitle = non_empty(text(obj, "corporate_email")).or_else(|| non_empty(text(obj, "email")));
    let search_text = format!(
        "{} {} {} {}",
        full_name,
        text(obj, "email"),
        text(obj, "corporate_email"),
        text(obj, "professor_type")
    )
    .to_lowercase();

    AutocompleteOption {
        value,
        label,
        subtitle,
        search_text,
    }
}

fn course_option(value: String, obj: &Value) -> AutocompleteOption {
    let raw = format!("{} - {}", text(obj, "code"), text(obj, "name"));
    let label = raw.strip_prefix("- ").unwrap_or(&raw).to_string();
    let area = nested_name(obj, "area");
    let subtitle = area
        .clone()
        .or_else(|| non_empty(text(obj, "course_type_display")));
    let search_text = format!(
        "{} {} {}",
        text(obj, "code"),
        text(obj, "name"),
        area.as_deref().unwrap_or("")
    )
    .to_lowercase();

    AutocompleteOption {
        value,
        label,
        subtitle,
        search_text,
    }
}

fn degree_option(value: String, obj: &Value) -> AutocompleteOption {
    let university = nested_name(obj, "university");
    let search_text = format!(
        "{} {} {}",
        text(obj, "name"),
        university.as_deref().unwrap_or(""),
        text(obj, "degree_type_display")
    )
    .to_lowercase();

    AutocompleteOption {
        value,
        label: non_empty(text(obj, "name")).unwrap_or_else(|| "Unknown Degree".to_string()),
        subtitle: Some(university.unwrap_or_else(|| "Unknown University".to_string())),
        search_text,
    }
}

fn generic_option(value: String, obj: &Value) -> AutocompleteOption {
    let label = ["name", "title", "label"]
        .iter()
        .find_map(|key| non_empty(text(obj, key)))
        .unwrap_or_else(|| "Unknown".to_string());
    let search_text = obj
        .as_object()
        .map(|map| {
            map.values()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
        .to_lowercase();

    AutocompleteOption {
        value,
        label,
        subtitle: None,
        search_text,
    }
}

/// Case-insensitive substring match on label, subtitle or search text.
pub fn filter_options<'a>(options: &'a [AutocompleteOption], query: &str) -> Vec<&'a AutocompleteOption> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return options.iter().collect();
    }
    options
        .iter()
        .filter(|o| {
            o.label.to_lowercase().contains(&needle)
                || o.subtitle
                    .as_deref()
                    .map(|s| s.to_lowercase().contains(&needle))
                    .unwrap_or(false)
                || o.search_text.contains(&needle)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn professor_options_use_full_name_and_corporate_email() {
        let options = build_options(
            "professors",
            &[json!({"id": 4, "name": "Ana", "last_name": "Ruiz", "email": "a@x.com", "corporate_email": "ana@ie.edu"})],
        );
        assert_eq!(options[0].value, "4");
        assert_eq!(options[0].label, "Ana Ruiz");
        assert_eq!(options[0].subtitle.as_deref(), Some("ana@ie.edu"));
    }

    #[test]
    fn course_label_drops_leading_separator_without_code() {
        let options = build_options("courses", &[json!({"id": 1, "name": "Finance", "area": {"name": "Business"}})]);
        assert_eq!(options[0].label, "Finance");
        assert_eq!(options[0].subtitle.as_deref(), Some("Business"));
    }

    #[test]
    fn professor_degrees_are_not_styled_as_degrees() {
        let options = build_options("professor-degrees", &[json!({"id": 2, "title": "PhD"})]);
        assert_eq!(options[0].label, "PhD");
        assert_eq!(options[0].subtitle, None);
    }

    #[test]
    fn filtering_matches_any_searchable_text() {
        let options = build_options(
            "degrees",
            &[
                json!({"id": 1, "name": "MBA", "university": {"name": "IE University"}}),
                json!({"id": 2, "name": "PhD", "university": {"name": "UCM"}}),
            ],
        );
        let hits = filter_options(&options, "ie u");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].value, "1");
    }
}
