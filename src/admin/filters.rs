use std::collections::BTreeMap;

use reqwest::Url;
use serde::Serialize;

use crate::error::AppError;

/// Value that stands for "no related record" in a filter.
pub const NULL_SENTINEL: &str = "null";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

impl FilterOption {
    pub fn new(value: &str, label: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
            count: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterConfig {
    pub key: String,
    pub label: String,
    pub options: Vec<FilterOption>,
    pub multi_select: bool,
    /// Query parameter sent as `=true` when the null sentinel is picked.
    #[serde(skip)]
    pub null_param: Option<String>,
}

impl FilterConfig {
    pub fn single(key: &str, label: &str, options: &[(&str, &str)]) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            options: options.iter().map(|(v, l)| FilterOption::new(v, l)).collect(),
            multi_select: false,
            null_param: None,
        }
    }

    pub fn multi(key: &str, label: &str, options: &[(&str, &str)]) -> Self {
        Self {
            multi_select: true,
            ..Self::single(key, label, options)
        }
    }

    pub fn null_param(mut self, param: &str) -> Self {
        self.null_param = Some(param.to_string());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterView {
    pub key: String,
    pub label: String,
    pub multi_select: bool,
    pub options: Vec<FilterOption>,
    pub selected: Vec<String>,
}

/// Search text plus filter selections, turned into list query strings.
#[derive(Debug, Clone, Default)]
pub struct FilterComposer {
    filters: Vec<FilterConfig>,
    search: String,
    values: BTreeMap<String, Vec<String>>,
}

impl FilterComposer {
    pub fn new(filters: Vec<FilterConfig>) -> Self {
        Self {
            filters,
            ..Default::default()
        }
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Returns whether anything changed.
    pub fn set_search(&mut self, query: &str) -> bool {
        if self.search == query {
            return false;
        }
        self.search = query.to_string();
        true
    }

    pub fn filters(&self) -> &[FilterConfig] {
        &self.filters
    }

    pub fn set_options(&mut self, key: &str, options: Vec<FilterOption>) {
        if let Some(filter) = self.filters.iter_mut().find(|f| f.key == key) {
            filter.options = options;
        }
    }

    pub fn values(&self, key: &str) -> &[String] {
        self.values.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Single-select filters replace their value (or clear it when
    /// unchecked); multi-select filters toggle membership.
    pub fn toggle(&mut self, key: &str, value: &str, checked: bool) -> Result<bool, AppError> {
        let filter = self
            .filters
            .iter()
            .find(|f| f.key == key)
            .ok_or_else(|| AppError::BadRequest(format!("unknown filter {}", key)))?;
        let current = self.values.entry(key.to_string()).or_default();
        let before = current.clone();

        if filter.multi_select {
            let present = current.iter().any(|v| v == value);
            if checked && !present {
                current.push(value.to_string());
            } else if !checked && present {
                current.retain(|v| v != value);
            }
        } else if checked {
            *current = vec![value.to_string()];
        } else {
            current.retain(|v| v != value);
        }

        let changed = *current != before;
        if current.is_empty() {
            self.values.remove(key);
        }
        Ok(changed)
    }

    /// Replaces a filter's whole selection. Unknown keys are ignored.
    pub fn set_values(&mut self, key: &str, values: Vec<String>) -> bool {
        let Some(filter) = self.filters.iter().find(|f| f.key == key) else {
            return false;
        };
        let mut values: Vec<String> = values.into_iter().filter(|v| !v.is_empty()).collect();
        if !filter.multi_select {
            values.truncate(1);
        }
        if self.values(key) == values.as_slice() {
            return false;
        }
        if values.is_empty() {
            self.values.remove(key);
        } else {
            self.values.insert(key.to_string(), values);
        }
        true
    }

    pub fn clear_all(&mut self) -> bool {
        let changed = !self.search.is_empty() || !self.values.is_empty();
        self.search.clear();
        self.values.clear();
        changed
    }

    /// Number of filters with at least one value; search not included.
    pub fn active_count(&self) -> usize {
        self.values.values().filter(|v| !v.is_empty()).count()
    }

    pub fn has_active(&self) -> bool {
        !self.search.is_empty() || self.active_count() > 0
    }

    pub fn summary(&self) -> Vec<String> {
        let mut parts = Vec::new();
        if !self.search.is_empty() {
            parts.push(format!("Search: \"{}\"", self.search));
        }
        for filter in &self.filters {
            let picked = self.values(&filter.key);
            match picked.len() {
                0 => {}
                1 => {
                    let label = filter
                        .options
                        .iter()
                        .find(|o| o.value == picked[0])
                        .map(|o| o.label.as_str())
                        .unwrap_or(picked[0].as_str());
                    parts.push(format!("{}: {}", filter.label, label));
                }
                n => parts.push(format!("{}: {} selected", filter.label, n)),
            }
        }
        parts
    }

    /// `search`, then filters in definition order, then `ordering`.
    pub fn query_pairs(&self, ordering: Option<&str>) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        let search = self.search.trim();
        if !search.is_empty() {
            pairs.push(("search".to_string(), search.to_string()));
        }
        for filter in &self.filters {
            for value in self.values(&filter.key) {
                match &filter.null_param {
                    Some(param) if value == NULL_SENTINEL => {
                        pairs.push((param.clone(), "true".to_string()));
                    }
                    _ => pairs.push((filter.key.clone(), value.clone())),
                }
            }
        }
        if let Some(ordering) = ordering {
            pairs.push(("ordering".to_string(), ordering.to_string()));
        }
        pairs
    }

    pub fn apply(&self, base_url: &str, ordering: Option<&str>) -> Result<String, AppError> {
        with_query(base_url, &self.query_pairs(ordering))
    }

    pub fn views(&self) -> Vec<FilterView> {
        self.filters
            .iter()
            .map(|f| FilterView {
                key: f.key.clone(),
                label: f.label.clone(),
                multi_select: f.multi_select,
                options: f.options.clone(),
                selected: self.values(&f.key).to_vec(),
            })
            .collect()
    }
}

/// Appends form-encoded pairs; no `?` is added for an empty list.
pub fn with_query(base_url: &str, pairs: &[(String, String)]) -> Result<String, AppError> {
    let mut url = Url::parse(base_url).map_err(|e| AppError::BadRequest(format!("invalid url {}: {}", base_url, e)))?;
    if !pairs.is_empty() {
        url.query_pairs_mut().extend_pairs(pairs.iter());
    }
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn composer() -> FilterComposer {
        FilterComposer::new(vec![
            FilterConfig::multi("campus", "Campus", &[("Madrid", "Madrid"), ("Segovia", "Segovia")]),
            FilterConfig::single("professor", "Professor", &[("null", "Unassigned")]).null_param("professor__isnull"),
        ])
    }

    #[test]
    fn query_order_is_search_filters_ordering() {
        let mut c = composer();
        c.set_search("abc");
        c.toggle("campus", "Segovia", true).unwrap();
        let url = c.apply("http://backend/api/sections/", Some("-created_at")).unwrap();
        assert_eq!(
            url,
            "http://backend/api/sections/?search=abc&campus=Segovia&ordering=-created_at"
        );
    }

    #[test]
    fn null_sentinel_becomes_isnull_param() {
        let mut c = composer();
        c.toggle("professor", "null", true).unwrap();
        assert_eq!(
            c.query_pairs(None),
            vec![("professor__isnull".to_string(), "true".to_string())]
        );
    }

    #[test]
    fn multi_select_toggles_and_clear_resets() {
        let mut c = composer();
        assert!(c.toggle("campus", "Madrid", true).unwrap());
        assert!(c.toggle("campus", "Segovia", true).unwrap());
        assert!(!c.toggle("campus", "Segovia", true).unwrap());
        assert_eq!(c.active_count(), 1);
        assert_eq!(c.summary(), vec!["Campus: 2 selected"]);
        assert!(c.clear_all());
        assert!(!c.has_active());
        assert_eq!(c.apply("http://backend/api/sections/", None).unwrap(), "http://backend/api/sections/");
    }
}
