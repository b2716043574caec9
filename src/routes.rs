use std::collections::BTreeMap;

use axum::Json;
use axum::body::Body;
use axum::extract::{Path, Query, RawQuery};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{patch, post};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use chrono::NaiveDate;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{info, warn};

use crate::admin::field::id_string;
use crate::admin::import_export::{export_records, import_records};
use crate::admin::{AdminForm, Effects, ExportFormat, FormMode};
use crate::error::AppError;
use crate::pages::{CourseDeliveryBatch, ListPage, Resource};
use crate::reports::professor_picker::{ProfessorPicker, assign_to_delivery};
use crate::reports::{DeliveryOverview, current_intakes, intake_sections, program_delivery};
use crate::session::Language;
use crate::state::AppState;

/// What the console gets back from every action: the data to render
/// and the notifications or navigation that follow.
#[derive(Debug, Serialize)]
pub struct ActionResponse<T> {
    pub data: T,
    pub effects: Effects,
}

impl<T> ActionResponse<T> {
    fn new(data: T, effects: Effects) -> Json<Self> {
        Json(Self { data, effects })
    }
}

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Deserialize, Serialize)]
struct LanguageBody {
    language: Language,
}

#[derive(Deserialize)]
struct FormParams {
    id: Option<String>,
}

#[derive(Deserialize)]
struct BulkDeleteRequest {
    ids: Vec<Value>,
}

#[derive(Deserialize)]
struct ExportParams {
    format: Option<String>,
}

#[derive(Deserialize)]
struct ImportParams {
    filename: String,
}

#[derive(Deserialize)]
struct BatchRequest {
    professor_id: Option<Value>,
    #[serde(default)]
    course_ids: Vec<Value>,
}

#[derive(Deserialize)]
struct CurrentIntakesParams {
    date: Option<NaiveDate>,
}

#[derive(Deserialize)]
struct ProgramParams {
    program: Option<String>,
}

#[derive(Deserialize)]
struct OverviewParams {
    program: Option<String>,
    intake: Option<String>,
    search: Option<String>,
}

/// Either a cell of the delivery overview or an existing delivery.
#[derive(Deserialize)]
#[serde(untagged)]
enum AssignRequest {
    Cell {
        course_id: i64,
        section_id: i64,
        professor_id: Option<i64>,
        #[serde(default)]
        program: Option<String>,
    },
    Delivery {
        delivery_id: i64,
        professor_id: Option<i64>,
    },
}

#[derive(Serialize)]
struct ImportSummary {
    imported: usize,
    failed: usize,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/language", get(get_language).put(set_language))
        .route("/resources/{resource}", get(list_resource).post(create_record))
        .route("/resources/{resource}/form", get(record_form))
        .route("/resources/{resource}/bulk-delete", post(bulk_delete))
        .route("/resources/{resource}/export", get(export))
        .route("/resources/{resource}/import", post(import))
        .route("/resources/{resource}/{id}", patch(update_record))
        .route("/resources/{resource}/{id}/inlines/{inline}", post(create_inline_row))
        .route(
            "/resources/{resource}/{id}/inlines/{inline}/{row_id}",
            patch(update_inline_row).delete(delete_inline_row),
        )
        .route("/course-deliveries/batch", post(create_delivery_batch))
        .route("/reports/current-intakes", get(current_intakes_report))
        .route("/reports/intakes/{intake_id}/sections", get(intake_sections_report))
        .route(
            "/reports/programs/{program_name}/intakes/{intake_id}",
            get(program_delivery_report),
        )
        .route("/reports/delivery-overview", get(delivery_overview_report))
        .route("/reports/assign", post(assign))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ActionResponse<Value>>, AppError> {
    let mut effects = Effects::new();
    match state.api.login(&req.username, &req.password).await {
        Ok(()) => {
            effects.navigate("/");
        }
        Err(AppError::Http { message, .. }) => {
            warn!("login rejected for {}: {}", req.username, message);
            effects.error(format!("Login failed: {}", message));
        }
        Err(e) => return Err(e),
    }
    Ok(ActionResponse::new(Value::Null, effects))
}

async fn logout(State(state): State<AppState>) -> Result<Json<ActionResponse<Value>>, AppError> {
    state.api.logout().await?;
    let mut effects = Effects::new();
    effects.navigate("/login");
    Ok(ActionResponse::new(Value::Null, effects))
}

async fn get_language(State(state): State<AppState>) -> Result<Json<LanguageBody>, AppError> {
    let language = state.api.session().language().await?;
    Ok(Json(LanguageBody { language }))
}

async fn set_language(
    State(state): State<AppState>,
    Json(body): Json<LanguageBody>,
) -> Result<Json<LanguageBody>, AppError> {
    state.api.session().set_language(body.language).await?;
    Ok(Json(body))
}

/// Splits a raw query string into `search`, `cursor` and repeated filter
/// values.
fn list_query(raw: Option<&str>) -> Result<(String, Option<String>, BTreeMap<String, Vec<String>>), AppError> {
    let mut search = String::new();
    let mut cursor = None;
    let mut filters: BTreeMap<String, Vec<String>> = BTreeMap::new();

    let Some(raw) = raw.filter(|q| !q.is_empty()) else {
        return Ok((search, cursor, filters));
    };
    let url = Url::parse(&format!("http://console/?{}", raw))
        .map_err(|e| AppError::BadRequest(format!("invalid query: {}", e)))?;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "search" => search = value.into_owned(),
            "cursor" => cursor = Some(value.into_owned()),
            _ => filters.entry(key.into_owned()).or_default().push(value.into_owned()),
        }
    }
    Ok((search, cursor, filters))
}

async fn list_resource(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    RawQuery(raw): RawQuery,
) -> Result<Json<crate::pages::ListView>, AppError> {
    let resource = Resource::from_slug(&resource)?;
    let (search, cursor, filters) = list_query(raw.as_deref())?;

    if let Some(cursor) = &cursor {
        if !cursor.starts_with(state.api.base()) {
            return Err(AppError::BadRequest("cursor does not point at the backend".to_string()));
        }
    }

    let mut page = ListPage::new(resource);
    page.load_filter_options(&state.api).await;
    page.apply_query(&search, filters);
    page.fetch(&state.api, cursor).await?;
    let language = state.api.session().language().await?;
    Ok(Json(page.localized_view(language)))
}

async fn record_form(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Query(params): Query<FormParams>,
) -> Result<Json<ActionResponse<crate::admin::FormView>>, AppError> {
    let resource = Resource::from_slug(&resource)?;
    let mode = match params.id.filter(|id| !id.is_empty()) {
        Some(id) => FormMode::Edit(id),
        None => FormMode::Create,
    };
    let mut form = AdminForm::new(resource.form_config(&mode), mode);
    let effects = form.load(&state.api).await?;
    Ok(ActionResponse::new(form.render(), effects))
}

async fn create_record(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Json(values): Json<Map<String, Value>>,
) -> Result<Json<ActionResponse<Value>>, AppError> {
    let resource = Resource::from_slug(&resource)?;
    let mode = FormMode::Create;
    let mut form = AdminForm::new(resource.form_config(&mode), mode);
    form.apply(values);
    let effects = form.submit(&state.api).await?;
    Ok(ActionResponse::new(Value::Object(form.record().clone()), effects))
}

/// Loads the stored record first so the submitted values are merged over
/// it before the PATCH.
async fn update_record(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
    Json(values): Json<Map<String, Value>>,
) -> Result<Json<ActionResponse<Value>>, AppError> {
    let resource = Resource::from_slug(&resource)?;
    let mode = FormMode::Edit(id);
    let mut form = AdminForm::new(resource.form_config(&mode), mode);
    let loaded = form.load(&state.api).await?;
    if !loaded.errors().is_empty() {
        return Ok(ActionResponse::new(Value::Null, loaded));
    }
    form.apply(values);
    let effects = form.submit(&state.api).await?;
    Ok(ActionResponse::new(Value::Object(form.record().clone()), effects))
}

/// The parent record's edit form with its inline rows loaded.
async fn edit_form_with_inlines(
    state: &AppState,
    resource: &str,
    id: String,
) -> Result<(AdminForm, Effects), AppError> {
    let resource = Resource::from_slug(resource)?;
    let mode = FormMode::Edit(id);
    let mut form = AdminForm::new(resource.form_config(&mode), mode);
    let loaded = form.load(&state.api).await?;
    Ok((form, loaded))
}

async fn create_inline_row(
    State(state): State<AppState>,
    Path((resource, id, inline)): Path<(String, String, String)>,
    Json(values): Json<Map<String, Value>>,
) -> Result<Json<ActionResponse<crate::admin::FormView>>, AppError> {
    let (mut form, loaded) = edit_form_with_inlines(&state, &resource, id).await?;
    if !loaded.errors().is_empty() {
        return Ok(ActionResponse::new(form.render(), loaded));
    }
    let effects = form.save_inline(&state.api, &inline, None, values).await?;
    Ok(ActionResponse::new(form.render(), effects))
}

async fn update_inline_row(
    State(state): State<AppState>,
    Path((resource, id, inline, row_id)): Path<(String, String, String, String)>,
    Json(values): Json<Map<String, Value>>,
) -> Result<Json<ActionResponse<crate::admin::FormView>>, AppError> {
    let (mut form, loaded) = edit_form_with_inlines(&state, &resource, id).await?;
    if !loaded.errors().is_empty() {
        return Ok(ActionResponse::new(form.render(), loaded));
    }
    let effects = form.save_inline(&state.api, &inline, Some(&row_id), values).await?;
    Ok(ActionResponse::new(form.render(), effects))
}

async fn delete_inline_row(
    State(state): State<AppState>,
    Path((resource, id, inline, row_id)): Path<(String, String, String, String)>,
) -> Result<Json<ActionResponse<crate::admin::FormView>>, AppError> {
    let (mut form, loaded) = edit_form_with_inlines(&state, &resource, id).await?;
    if !loaded.errors().is_empty() {
        return Ok(ActionResponse::new(form.render(), loaded));
    }
    let effects = form.delete_inline(&state.api, &inline, &row_id).await?;
    Ok(ActionResponse::new(form.render(), effects))
}

async fn bulk_delete(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Json(req): Json<BulkDeleteRequest>,
) -> Result<Json<ActionResponse<crate::pages::ListView>>, AppError> {
    let resource = Resource::from_slug(&resource)?;
    let ids: Vec<String> = req.ids.iter().filter_map(id_string).collect();
    if ids.is_empty() {
        return Err(AppError::BadRequest("no ids to delete".to_string()));
    }
    let mut page = ListPage::new(resource);
    let effects = page.bulk_delete(&state.api, &ids).await?;
    Ok(ActionResponse::new(page.view(), effects))
}

async fn export(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Query(params): Query<ExportParams>,
) -> Result<Response, AppError> {
    let def = Resource::from_slug(&resource)?.definition();
    let format = match params.format.as_deref() {
        None => ExportFormat::Csv,
        Some(name) => ExportFormat::parse(name)
            .ok_or_else(|| AppError::BadRequest(format!("unsupported export format {}", name)))?,
    };

    let file = export_records(&state.api, def.endpoint, def.entity_name, &def.export_fields, format).await?;
    let disposition = format!("attachment; filename=\"{}\"", file.filename);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from(file.content),
    )
        .into_response())
}

async fn import(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Query(params): Query<ImportParams>,
    body: String,
) -> Result<Json<ActionResponse<ImportSummary>>, AppError> {
    let def = Resource::from_slug(&resource)?.definition();
    let report = import_records(&state.api, def.endpoint, def.entity_name, &params.filename, &body).await?;
    info!("import into {}: {} ok, {} failed", def.endpoint, report.imported, report.failed);
    Ok(ActionResponse::new(
        ImportSummary {
            imported: report.imported,
            failed: report.failed,
        },
        report.effects,
    ))
}

async fn create_delivery_batch(
    State(state): State<AppState>,
    Json(req): Json<BatchRequest>,
) -> Result<Json<ActionResponse<CourseDeliveryBatch>>, AppError> {
    let professor_id = req.professor_id.as_ref().and_then(id_string);
    let course_ids = req.course_ids.iter().filter_map(id_string).collect();
    let mut batch = CourseDeliveryBatch::prefilled(professor_id, course_ids);
    let effects = batch.submit(&state.api).await?;
    Ok(ActionResponse::new(batch, effects))
}

async fn current_intakes_report(
    State(state): State<AppState>,
    Query(params): Query<CurrentIntakesParams>,
) -> Result<Json<current_intakes::CurrentIntakesView>, AppError> {
    let response = current_intakes::fetch(&state.api, params.date).await?;
    Ok(Json(current_intakes::build(&response)))
}

async fn intake_sections_report(
    State(state): State<AppState>,
    Path(intake_id): Path<String>,
    Query(params): Query<ProgramParams>,
) -> Result<Json<intake_sections::IntakeSectionsView>, AppError> {
    let detail = intake_sections::fetch(&state.api, &intake_id, params.program.as_deref()).await?;
    Ok(Json(detail.build()))
}

async fn program_delivery_report(
    State(state): State<AppState>,
    Path((program_name, intake_id)): Path<(String, String)>,
) -> Result<Json<program_delivery::ProgramDeliveryView>, AppError> {
    let detail = program_delivery::fetch(&state.api, &program_name, &intake_id).await?;
    Ok(Json(detail.build()))
}

async fn delivery_overview_report(
    State(state): State<AppState>,
    Query(params): Query<OverviewParams>,
) -> Result<Json<ActionResponse<crate::reports::delivery_overview::DeliveryOverviewView>>, AppError> {
    let mut overview = DeliveryOverview::new();
    overview.set_intake(params.intake.as_deref());
    overview.set_search(params.search.unwrap_or_default());

    let effects = match params.program.filter(|p| !p.is_empty()) {
        Some(program) => overview.select_program(&state.api, &program).await?,
        None => overview.fetch(&state.api).await?,
    };
    Ok(ActionResponse::new(overview.view(), effects))
}

async fn assign(
    State(state): State<AppState>,
    Json(req): Json<AssignRequest>,
) -> Result<Json<ActionResponse<Value>>, AppError> {
    let picker = ProfessorPicker::load(&state.api).await?;

    let effects = match req {
        AssignRequest::Delivery {
            delivery_id,
            professor_id,
        } => {
            let professor = professor_id.and_then(|id| picker.find(id));
            assign_to_delivery(&state.api, delivery_id, professor).await?
        }
        AssignRequest::Cell {
            course_id,
            section_id,
            professor_id,
            program,
        } => match professor_id.and_then(|id| picker.find(id)) {
            Some(professor) => {
                let mut overview = DeliveryOverview::new();
                overview.set_program(program.as_deref());
                overview
                    .assign(&state.api, course_id, section_id, professor)
                    .await?
            }
            None => {
                let mut effects = Effects::new();
                effects.error("Please select a professor");
                effects
            }
        },
    };
    Ok(ActionResponse::new(json!({ "ok": effects.errors().is_empty() }), effects))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_collects_repeated_filters() {
        let (search, cursor, filters) =
            list_query(Some("search=fin&campus=MAD&campus=SEG&cursor=http%3A%2F%2Fb%2Fapi%2Fx%2F%3Fpage%3D2")).unwrap();
        assert_eq!(search, "fin");
        assert_eq!(cursor.as_deref(), Some("http://b/api/x/?page=2"));
        assert_eq!(filters["campus"], vec!["MAD", "SEG"]);
    }
}
