mod common;

use common::{ScriptedTransport, logged_in_client, url};
use faculty_admin::admin::import_export::{export_records, import_records, parse_import, to_csv};
use faculty_admin::admin::{
    AdminForm, Effect, ExportFormat, FieldConfig, FormConfig, FormMode, InlineConfig, ParentLink, ToastLevel,
};
use faculty_admin::api::Method;
use faculty_admin::error::AppError;
use faculty_admin::pages::{CourseDeliveryBatch, ListPage, Resource};
use serde_json::json;

#[tokio::test]
async fn test_bulk_delete_issues_one_delete_per_id_then_refetches() {
    let transport = ScriptedTransport::new();
    let client = logged_in_client(transport.clone()).await;
    let mut page = ListPage::new(Resource::Professors);
    let ids: Vec<String> = vec!["1".into(), "2".into(), "3".into()];

    let effects = page.bulk_delete(&client, &ids).await.unwrap();

    let deletes = transport.requests_to(Method::Delete, &url("professors"));
    assert_eq!(deletes.len(), 3);
    assert!(deletes.iter().any(|r| r.url == format!("{}/2/", url("professors"))));

    let toasts = effects.toasts();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].level, ToastLevel::Success);
    assert_eq!(toasts[0].message, "Successfully deleted 3 professor(s)");
    assert_eq!(transport.requests_to(Method::Get, &url("professors")).len(), 1);
}

#[tokio::test]
async fn test_bulk_delete_failure_reports_first_error_and_still_refetches() {
    let transport = ScriptedTransport::new();
    transport.on(Method::Delete, &format!("{}/2/", url("courses")), 500, json!({"detail": "boom"}));
    let client = logged_in_client(transport.clone()).await;
    let mut page = ListPage::new(Resource::Courses);

    let effects = page
        .bulk_delete(&client, &["1".to_string(), "2".to_string()])
        .await
        .unwrap();

    assert_eq!(effects.errors(), vec!["Failed to delete courses: boom"]);
    assert_eq!(transport.requests_to(Method::Get, &url("courses")).len(), 1);
    assert_eq!(page.table().selected_count(), 0);
}

#[tokio::test]
async fn test_search_change_fetches_first_page_with_query() {
    let transport = ScriptedTransport::new();
    let client = logged_in_client(transport.clone()).await;
    let mut page = ListPage::new(Resource::Sections);

    assert!(page.set_search(&client, "abc").await.unwrap());
    assert!(page.toggle_filter(&client, "campus", "Segovia", true).await.unwrap());
    assert!(!page.set_search(&client, "abc").await.unwrap());

    let gets = transport.requests_to(Method::Get, &url("sections"));
    assert_eq!(gets.len(), 2);
    assert_eq!(
        gets[1].url,
        "http://backend/api/sections/?search=abc&campus=Segovia&ordering=-created_at"
    );
}

#[tokio::test]
async fn test_paging_uses_backend_links() {
    let transport = ScriptedTransport::new();
    let next = format!("{}/?cursor=xyz", url("programs"));
    transport.on(
        Method::Get,
        &format!("{}/", url("programs")),
        200,
        json!({"results": [{"id": 1, "name": "BBA"}], "next": next, "previous": null}),
    );
    let client = logged_in_client(transport.clone()).await;
    let mut page = ListPage::new(Resource::Programs);

    page.fetch(&client, None).await.unwrap();
    assert!(page.view().table.has_next);
    assert!(page.next_page(&client).await.unwrap());
    assert!(!page.previous_page(&client).await.unwrap());

    assert_eq!(transport.requests().last().map(|r| r.url.clone()), Some(next));
}

#[tokio::test]
async fn test_stale_fetch_is_discarded() {
    let transport = ScriptedTransport::new();
    let client = logged_in_client(transport).await;
    let mut page = ListPage::new(Resource::Terms);

    let first = page.begin_fetch(page.first_page_url(&client).unwrap());
    let second = page.begin_fetch(page.first_page_url(&client).unwrap());

    let fresh = faculty_admin::api::Page {
        results: vec![json!({"id": 2, "name": "Spring"})],
        ..Default::default()
    };
    let stale = faculty_admin::api::Page {
        results: vec![json!({"id": 1, "name": "Fall"})],
        ..Default::default()
    };
    assert!(page.complete_fetch(second, Ok(fresh)));
    assert!(!page.complete_fetch(first, Ok(stale)));

    assert_eq!(page.table().rows.len(), 1);
    assert_eq!(page.table().rows[0]["name"], "Spring");
}

#[tokio::test]
async fn test_list_fetch_failure_is_shown_not_raised() {
    let transport = ScriptedTransport::new();
    transport.on(Method::Get, &format!("{}/", url("professors")), 500, json!({"detail": "down"}));
    let client = logged_in_client(transport).await;
    let mut page = ListPage::new(Resource::Professors);

    page.fetch(&client, None).await.unwrap();

    assert_eq!(page.error(), Some("down"));
    assert!(page.table().rows.is_empty());
}

#[tokio::test]
async fn test_section_without_program_gets_program_id_on_update() {
    let transport = ScriptedTransport::new();
    let record = format!("{}/5/", url("sections"));
    transport.on(
        Method::Get,
        &record,
        200,
        json!({
            "id": 5, "name": "A", "campus": "Segovia", "course_year": 2,
            "program": null, "intake": {"id": 4, "name": "Fall"}
        }),
    );
    transport.on(Method::Patch, &record, 200, json!({"id": 5}));
    let client = logged_in_client(transport.clone()).await;

    let mode = FormMode::Edit("5".to_string());
    let mut form = AdminForm::new(Resource::Sections.form_config(&mode), mode);
    assert!(form.load(&client).await.unwrap().is_empty());
    assert_eq!(form.record()["program"], json!(null));
    form.set_field("program", json!("3")).unwrap();
    let effects = form.submit(&client).await.unwrap();

    let patches = transport.requests_to(Method::Patch, &record);
    assert_eq!(patches.len(), 1);
    let body = patches[0].body.clone().unwrap();
    assert_eq!(body["program_id"], 3);
    assert_eq!(body["intake_id"], 4);
    assert!(body.get("program").is_none());
    assert!(body.get("intake").is_none());

    assert_eq!(effects.toasts()[0].message, "Section updated successfully");
    assert_eq!(effects.navigation(), Some("/sections"));
}

#[tokio::test]
async fn test_create_requires_required_fields() {
    let transport = ScriptedTransport::new();
    let client = logged_in_client(transport.clone()).await;
    let mode = FormMode::Create;
    let mut form = AdminForm::new(Resource::Professors.form_config(&mode), mode);
    form.set_field("name", json!("Ana")).unwrap();

    let effects = form.submit(&client).await.unwrap();

    assert_eq!(effects.errors(), vec!["Please fill in required field: Last Name"]);
    assert!(transport.requests_to(Method::Post, &url("professors")).is_empty());
}

#[tokio::test]
async fn test_failed_record_load_returns_to_list() {
    let transport = ScriptedTransport::new();
    transport.on(Method::Get, &format!("{}/8/", url("courses")), 404, json!({"detail": "Not found."}));
    let client = logged_in_client(transport).await;
    let mode = FormMode::Edit("8".to_string());
    let mut form = AdminForm::new(Resource::Courses.form_config(&mode), mode);

    let effects = form.load(&client).await.unwrap();

    assert_eq!(effects.errors(), vec!["Failed to load course: Not found."]);
    assert_eq!(effects.navigation(), Some("/courses"));
}

#[tokio::test]
async fn test_delivery_batch_posts_one_delivery_per_course() {
    let transport = ScriptedTransport::new();
    let client = logged_in_client(transport.clone()).await;
    let mut batch = CourseDeliveryBatch::prefilled(Some("42".to_string()), vec!["7".to_string(), "9".to_string()]);
    assert_eq!(batch.submit_label(), "Create 2 Assignment(s)");

    let effects = batch.submit(&client).await.unwrap();

    let posts = transport.requests_to(Method::Post, &url("course-deliveries"));
    assert_eq!(posts.len(), 2);
    let bodies: Vec<_> = posts.iter().filter_map(|r| r.body.clone()).collect();
    assert!(bodies.contains(&json!({"course_id": 7, "professor_id": 42, "sections_ids": []})));
    assert!(bodies.contains(&json!({"course_id": 9, "professor_id": 42, "sections_ids": []})));

    let toasts = effects.toasts();
    assert!(toasts[0].message.contains('2'));
    assert!(effects.iter().any(|e| *e == Effect::Navigate { to: "/course-deliveries".to_string() }));
}

#[tokio::test]
async fn test_delivery_batch_without_professor_sends_nothing() {
    let transport = ScriptedTransport::new();
    let client = logged_in_client(transport.clone()).await;
    let mut batch = CourseDeliveryBatch::prefilled(None, vec!["7".to_string()]);

    let effects = batch.submit(&client).await.unwrap();

    assert_eq!(effects.errors(), vec!["Please select a professor"]);
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_csv_export_stringifies_numbers() {
    let transport = ScriptedTransport::new();
    transport.on(
        Method::Get,
        &format!("{}/", url("courses")),
        200,
        json!({"results": [{"name": "Finance", "code": "FIN", "credits": 6, "area": {"id": 1, "name": "Business"}}]}),
    );
    let client = logged_in_client(transport).await;
    let def = Resource::Courses.definition();

    let file = export_records(&client, def.endpoint, def.entity_name, &def.export_fields, ExportFormat::Csv)
        .await
        .unwrap();

    assert_eq!(file.filename, "course_export.csv");
    let mut lines = file.content.lines();
    assert_eq!(lines.next(), Some("name,code,area,course_type,credits,sessions"));
    let row = lines.next().unwrap();
    assert!(row.contains("\"6\""));
    assert!(row.starts_with("\"Finance\",\"FIN\","));
}

#[tokio::test]
async fn test_export_of_empty_list_is_rejected() {
    let transport = ScriptedTransport::new();
    let client = logged_in_client(transport).await;
    let def = Resource::Programs.definition();

    let result = export_records(&client, def.endpoint, def.entity_name, &def.export_fields, ExportFormat::Json).await;

    assert!(matches!(result, Err(AppError::Validation(msg)) if msg == "No data to export"));
}

#[tokio::test]
async fn test_import_posts_rows_without_ids() {
    let transport = ScriptedTransport::new();
    let client = logged_in_client(transport.clone()).await;
    let csv = "id,name,code\n1,Finance,FIN\n2,\"Law, Intro\",LAW";

    let report = import_records(&client, "courses", "Course", "courses.csv", csv).await.unwrap();

    assert_eq!(report.imported, 2);
    let posts = transport.requests_to(Method::Post, &url("courses"));
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[1].body, Some(json!({"name": "Law, Intro", "code": "LAW"})));
    assert_eq!(report.effects.toasts()[0].message, "Successfully imported 2 course records");
}

#[tokio::test]
async fn test_import_rejects_unknown_format() {
    let transport = ScriptedTransport::new();
    let client = logged_in_client(transport.clone()).await;

    let report = import_records(&client, "courses", "Course", "courses.xlsx", "whatever")
        .await
        .unwrap();

    assert_eq!(
        report.effects.errors(),
        vec!["Import failed: Unsupported file format. Please use CSV or JSON files."]
    );
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_exported_csv_imports_back_as_strings() {
    let transport = ScriptedTransport::new();
    let client = logged_in_client(transport.clone()).await;
    let exported = vec![json!({"id": 12, "code": "FIN", "credits": 6, "active": true})];
    let fields: Vec<String> = ["id", "code", "credits", "active"].iter().map(|f| f.to_string()).collect();

    let csv = to_csv(&exported, &fields);
    let parsed = parse_import("courses.csv", &csv).unwrap();
    assert_eq!(parsed[0]["credits"], json!("6"));
    assert_eq!(parsed[0]["active"], json!("true"));

    let report = import_records(&client, "courses", "Course", "courses.csv", &csv).await.unwrap();

    assert_eq!(report.imported, 1);
    let posts = transport.requests_to(Method::Post, &url("courses"));
    let body = posts[0].body.clone().unwrap();
    assert_eq!(body, json!({"code": "FIN", "credits": "6", "active": "true"}));
    assert!(body.get("id").is_none());
}

#[tokio::test]
async fn test_inline_field_options_do_not_replace_form_options() {
    let transport = ScriptedTransport::new();
    transport.on(Method::Get, &format!("{}/", url("courses")), 200, json!([{"id": 1, "name": "Finance", "code": "FIN"}]));
    transport.on(Method::Get, &format!("{}/", url("areas")), 200, json!([{"id": 8, "name": "Business"}]));
    let client = logged_in_client(transport).await;

    let config = FormConfig {
        title: "Program".to_string(),
        endpoint: "programs".to_string(),
        fields: vec![FieldConfig::foreign_key("course", "Flagship Course", "courses", "name")],
        tabs: Vec::new(),
        inlines: vec![InlineConfig {
            key: "areas".to_string(),
            label: "Areas".to_string(),
            endpoint: "program-areas".to_string(),
            fields: vec![FieldConfig::foreign_key("course", "Area", "areas", "name")],
            foreign_key_field: "program".to_string(),
            parent_link: ParentLink::Field("program_id".to_string()),
            tab: "main".to_string(),
        }],
        back_path: "/programs".to_string(),
        entity_name: "Program".to_string(),
    };
    let mut form = AdminForm::new(config, FormMode::Create);

    form.load_options(&client).await.unwrap();

    assert_eq!(form.options("course")[0].value, "1");
    assert_eq!(form.inline_options("areas", "course")[0].value, "8");
}

#[tokio::test]
async fn test_inline_row_is_created_under_parent() {
    let transport = ScriptedTransport::new();
    transport.on(Method::Get, &format!("{}/1/", url("professors")), 200, json!({"id": 1, "name": "Ana"}));
    let client = logged_in_client(transport.clone()).await;
    let mode = FormMode::Edit("1".to_string());
    let mut form = AdminForm::new(Resource::Professors.form_config(&mode), mode);
    form.load(&client).await.unwrap();

    let mut values = serde_json::Map::new();
    values.insert("degree".to_string(), json!("2"));
    let effects = form.save_inline(&client, "degrees", None, values).await.unwrap();

    let posts = transport.requests_to(Method::Post, &url("professor-degrees"));
    assert_eq!(posts[0].body, Some(json!({"degree_id": 2, "professor_id": 1})));
    assert_eq!(effects.toasts()[0].message, "Degrees added successfully");
}
