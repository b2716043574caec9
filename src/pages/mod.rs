//! Per-resource list pages and the course-delivery batch form.

pub mod catalog;
pub mod delivery_batch;
pub mod sections;

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::admin::filters::FilterView;
use crate::admin::table::bulk_delete;
use crate::admin::{Effects, FilterComposer, FilterOption, TableState, TableView, build_options};
use crate::api::{ApiClient, Page};
use crate::error::AppError;
use crate::i18n;
use crate::session::Language;

pub use catalog::{Resource, ResourceDef};
pub use delivery_batch::CourseDeliveryBatch;
pub use sections::{SectionPartitions, partition_by_term};

/// Proof that a fetch was started. Only the most recent ticket may write
/// its response into the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ListView {
    pub resource: &'static str,
    pub title: String,
    pub search: String,
    pub filters: Vec<FilterView>,
    pub active_filter_count: usize,
    pub filter_summary: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub table: TableView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partitions: Option<SectionPartitions>,
}

/// State of one resource list: query inputs, the current page of rows and
/// the selection over them.
pub struct ListPage {
    def: ResourceDef,
    composer: FilterComposer,
    table: TableState,
    generation: u64,
    error: Option<String>,
}

impl ListPage {
    pub fn new(resource: Resource) -> Self {
        let def = resource.definition();
        let composer = FilterComposer::new(def.filters.clone());
        let table = TableState::new(def.entity_name, def.base_path);
        Self {
            def,
            composer,
            table,
            generation: 0,
            error: None,
        }
    }

    pub fn definition(&self) -> &ResourceDef {
        &self.def
    }

    pub fn composer_mut(&mut self) -> &mut FilterComposer {
        &mut self.composer
    }

    pub fn table(&self) -> &TableState {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut TableState {
        &mut self.table
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// First page for the current search, filters and default ordering.
    pub fn first_page_url(&self, client: &ApiClient) -> Result<String, AppError> {
        let base = format!("{}/", client.endpoint(self.def.endpoint));
        self.composer.apply(&base, self.def.ordering)
    }

    pub fn begin_fetch(&mut self, url: String) -> FetchTicket {
        self.generation += 1;
        self.table.loading = true;
        self.error = None;
        FetchTicket {
            generation: self.generation,
            url,
        }
    }

    /// Returns false when a newer fetch has started since `ticket`.
    pub fn complete_fetch(&mut self, ticket: FetchTicket, result: Result<Page<Value>, AppError>) -> bool {
        if ticket.generation != self.generation {
            debug!("discarding stale response for {}", ticket.url);
            return false;
        }
        self.table.loading = false;
        match result {
            Ok(page) => self.table.set_rows(page.results, page.next, page.previous),
            Err(e) => {
                warn!("fetching {} failed: {}", self.def.endpoint, e);
                self.error = Some(e.to_string());
                self.table.set_rows(Vec::new(), None, None);
            }
        }
        true
    }

    /// Loads `url` or, without one, the first page. Only an expired
    /// session is returned as an error; other failures land in `error`.
    pub async fn fetch(&mut self, client: &ApiClient, url: Option<String>) -> Result<(), AppError> {
        let url = match url {
            Some(url) => url,
            None => self.first_page_url(client)?,
        };
        let ticket = self.begin_fetch(url);
        let result = client.fetch_page(&ticket.url).await;
        let expired = matches!(result, Err(AppError::AuthenticationRequired));
        self.complete_fetch(ticket, result);
        if expired {
            return Err(AppError::AuthenticationRequired);
        }
        Ok(())
    }

    pub async fn set_search(&mut self, client: &ApiClient, query: &str) -> Result<bool, AppError> {
        if !self.composer.set_search(query) {
            return Ok(false);
        }
        self.fetch(client, None).await?;
        Ok(true)
    }

    pub async fn toggle_filter(
        &mut self,
        client: &ApiClient,
        key: &str,
        value: &str,
        checked: bool,
    ) -> Result<bool, AppError> {
        if !self.composer.toggle(key, value, checked)? {
            return Ok(false);
        }
        self.fetch(client, None).await?;
        Ok(true)
    }

    pub async fn clear_filters(&mut self, client: &ApiClient) -> Result<bool, AppError> {
        if !self.composer.clear_all() {
            return Ok(false);
        }
        self.fetch(client, None).await?;
        Ok(true)
    }

    /// Applies search and filter values without fetching.
    pub fn apply_query(&mut self, search: &str, values: BTreeMap<String, Vec<String>>) {
        self.composer.set_search(search);
        for (key, selected) in values {
            self.composer.set_values(&key, selected);
        }
    }

    pub async fn next_page(&mut self, client: &ApiClient) -> Result<bool, AppError> {
        let Some(url) = self.table.next.clone() else {
            return Ok(false);
        };
        self.fetch(client, Some(url)).await?;
        Ok(true)
    }

    pub async fn previous_page(&mut self, client: &ApiClient) -> Result<bool, AppError> {
        let Some(url) = self.table.previous.clone() else {
            return Ok(false);
        };
        self.fetch(client, Some(url)).await?;
        Ok(true)
    }

    /// Course and professor filters of the delivery list take their
    /// options from the API.
    pub async fn load_filter_options(&mut self, client: &ApiClient) {
        if self.def.resource != Resource::CourseDeliveries {
            return;
        }
        match client.list_values(&format!("{}/", client.endpoint("courses"))).await {
            Ok(courses) => {
                let options = build_options("courses", &courses)
                    .into_iter()
                    .map(|o| FilterOption::new(&o.value, &o.label))
                    .collect();
                self.composer.set_options("course", options);
            }
            Err(e) => warn!("Failed to load course filter options: {}", e),
        }
        match client.list_values(&format!("{}/", client.endpoint("professors"))).await {
            Ok(professors) => {
                let mut options = vec![FilterOption::new("null", "Unassigned")];
                options.extend(
                    build_options("professors", &professors)
                        .into_iter()
                        .map(|o| FilterOption::new(&o.value, &o.label)),
                );
                self.composer.set_options("professor", options);
            }
            Err(e) => warn!("Failed to load professor filter options: {}", e),
        }
    }

    /// Deletes `ids`, then reloads the first page whatever the outcome.
    pub async fn bulk_delete(&mut self, client: &ApiClient, ids: &[String]) -> Result<Effects, AppError> {
        let report = bulk_delete(client, self.def.endpoint, ids, self.def.entity_name, self.def.plural).await?;
        self.table.clear_selection();
        self.fetch(client, None).await?;
        Ok(report.effects)
    }

    /// [`view`](Self::view) with the page title in `language`.
    pub fn localized_view(&self, language: Language) -> ListView {
        let key = format!("{}.title", self.def.resource.slug().replace('-', "_"));
        let mut view = self.view();
        let title = i18n::t(language, &key);
        if title != key {
            view.title = title;
        }
        view
    }

    pub fn view(&self) -> ListView {
        let partitions = (self.def.resource == Resource::Sections)
            .then(|| sections::partition_view(&self.table, &self.def.columns));
        ListView {
            resource: self.def.resource.slug(),
            title: self.def.title.to_string(),
            search: self.composer.search().to_string(),
            filters: self.composer.views(),
            active_filter_count: self.composer.active_count(),
            filter_summary: self.composer.summary(),
            error: self.error.clone(),
            table: self.table.render(&self.def.columns),
            partitions,
        }
    }
}
