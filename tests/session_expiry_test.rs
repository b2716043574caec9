mod common;

use common::{ScriptedTransport, logged_in_client, url};
use faculty_admin::admin::import_export::import_records;
use faculty_admin::admin::{AdminForm, FormMode, InlineTable};
use faculty_admin::api::{ApiClient, Method};
use faculty_admin::error::AppError;
use faculty_admin::models::Professor;
use faculty_admin::pages::{CourseDeliveryBatch, ListPage, Resource};
use faculty_admin::reports::professor_picker::assign_to_delivery;
use serde_json::json;

const ALL: [Method; 4] = [Method::Get, Method::Post, Method::Patch, Method::Delete];

async fn assert_logged_out(client: &ApiClient) {
    assert_eq!(client.session().access_token().await.unwrap(), None);
    assert_eq!(client.session().refresh_token().await.unwrap(), None);
}

fn degrees_table() -> InlineTable {
    let config = Resource::Professors.form_config(&FormMode::Edit("1".to_string()));
    let degrees = config
        .inlines
        .into_iter()
        .find(|i| i.key == "degrees")
        .unwrap();
    InlineTable::new(degrees)
}

#[tokio::test]
async fn test_form_submit_with_expired_session_asks_for_login() {
    let transport = ScriptedTransport::new();
    transport.expire_session(&ALL);
    let client = logged_in_client(transport.clone()).await;
    let mode = FormMode::Create;
    let mut form = AdminForm::new(Resource::Professors.form_config(&mode), mode);
    form.set_field("name", json!("Ana")).unwrap();
    form.set_field("last_name", json!("Ruiz")).unwrap();
    form.set_field("email", json!("ana@example.com")).unwrap();

    let result = form.submit(&client).await;

    assert!(matches!(result, Err(AppError::AuthenticationRequired)));
    assert_eq!(transport.requests_to(Method::Post, &url("professors")).len(), 1);
    assert_logged_out(&client).await;
}

#[tokio::test]
async fn test_form_load_with_expired_session_does_not_go_back_to_list() {
    let transport = ScriptedTransport::new();
    transport.expire_session(&ALL);
    let client = logged_in_client(transport).await;
    let mode = FormMode::Edit("5".to_string());
    let mut form = AdminForm::new(Resource::Sections.form_config(&mode), mode);

    let result = form.load(&client).await;

    assert!(matches!(result, Err(AppError::AuthenticationRequired)));
    assert_logged_out(&client).await;
}

#[tokio::test]
async fn test_inline_save_with_expired_session_asks_for_login() {
    let transport = ScriptedTransport::new();
    transport.expire_session(&[Method::Post]);
    let client = logged_in_client(transport).await;
    let mut degrees = degrees_table();
    let index = degrees.add_row();
    degrees.set_value(index, "degree", json!("2")).unwrap();

    let result = degrees.save_row(index, &client, "1").await;

    assert!(matches!(result, Err(AppError::AuthenticationRequired)));
    assert!(degrees.rows[index].is_new);
}

#[tokio::test]
async fn test_inline_delete_with_expired_session_keeps_row() {
    let transport = ScriptedTransport::new();
    transport.on(
        Method::Get,
        &format!("{}/?professor=1", url("professor-degrees")),
        200,
        json!([{"id": 9, "degree": {"id": 2, "name": "PhD"}}]),
    );
    transport.expire_session(&[Method::Delete]);
    let client = logged_in_client(transport).await;
    let mut degrees = degrees_table();
    degrees.load(&client, "1").await.unwrap();

    let result = degrees.delete_row(0, &client).await;

    assert!(matches!(result, Err(AppError::AuthenticationRequired)));
    assert_eq!(degrees.rows.len(), 1);
}

#[tokio::test]
async fn test_batch_submit_with_expired_session_asks_for_login() {
    let transport = ScriptedTransport::new();
    transport.expire_session(&ALL);
    let client = logged_in_client(transport).await;
    let mut batch = CourseDeliveryBatch::prefilled(Some("42".to_string()), vec!["7".to_string(), "9".to_string()]);

    let result = batch.submit(&client).await;

    assert!(matches!(result, Err(AppError::AuthenticationRequired)));
    assert!(!batch.submitting);
}

#[tokio::test]
async fn test_import_stops_when_session_expires() {
    let transport = ScriptedTransport::new();
    transport.expire_session(&ALL);
    let client = logged_in_client(transport.clone()).await;
    let csv = "name,code\nFinance,FIN\nLaw,LAW\nTax,TAX";

    let result = import_records(&client, "courses", "Course", "courses.csv", csv).await;

    assert!(matches!(result, Err(AppError::AuthenticationRequired)));
    assert!(transport.requests_to(Method::Post, &url("courses")).len() < 3);
    assert_logged_out(&client).await;
}

#[tokio::test]
async fn test_professor_assignment_with_expired_session_asks_for_login() {
    let transport = ScriptedTransport::new();
    transport.expire_session(&ALL);
    let client = logged_in_client(transport).await;
    let ana = Professor {
        id: 7,
        name: "Ana".to_string(),
        last_name: "Ruiz".to_string(),
        ..Default::default()
    };

    let result = assign_to_delivery(&client, 100, Some(&ana)).await;

    assert!(matches!(result, Err(AppError::AuthenticationRequired)));
}

#[tokio::test]
async fn test_bulk_delete_with_expired_session_asks_for_login() {
    let transport = ScriptedTransport::new();
    transport.expire_session(&ALL);
    let client = logged_in_client(transport).await;
    let mut page = ListPage::new(Resource::Professors);

    let result = page.bulk_delete(&client, &["1".to_string(), "2".to_string()]).await;

    assert!(matches!(result, Err(AppError::AuthenticationRequired)));
    assert_logged_out(&client).await;
}
