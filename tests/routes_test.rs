mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use common::{BASE, ScriptedTransport, logged_in_client, url};
use faculty_admin::api::{ApiClient, Method};
use faculty_admin::routes::router;
use faculty_admin::session::Session;
use faculty_admin::state::AppState;
use serde_json::{Value, json};
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

async fn state_with(api: ApiClient) -> AppState {
    let db = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create database");
    AppState { db, api: Arc::new(api) }
}

async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Value) {
    let response = router(state).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_checks_database() {
    let transport = ScriptedTransport::new();
    let state = state_with(logged_in_client(transport).await).await;

    let (status, _) = send(state, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_expired_session_answers_401_with_login_redirect() {
    let transport = ScriptedTransport::new();
    transport.on(Method::Get, &format!("{}/", url("professors")), 401, json!({"detail": "expired"}));
    let api = ApiClient::new(BASE, transport, Session::in_memory());
    let state = state_with(api).await;

    let (status, body) = send(state, get("/resources/professors")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["redirect"], "/login");
}

#[tokio::test]
async fn test_unknown_resource_is_404() {
    let transport = ScriptedTransport::new();
    let state = state_with(logged_in_client(transport).await).await;

    let (status, _) = send(state, get("/resources/widgets")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_route_forwards_search_and_filters() {
    let transport = ScriptedTransport::new();
    let state = state_with(logged_in_client(transport.clone()).await).await;

    let (status, body) = send(state, get("/resources/sections?search=abc&campus=Segovia")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resource"], "sections");
    assert_eq!(body["search"], "abc");
    let gets = transport.requests_to(Method::Get, &url("sections"));
    assert_eq!(
        gets[0].url,
        "http://backend/api/sections/?search=abc&campus=Segovia&ordering=-created_at"
    );
}

#[tokio::test]
async fn test_foreign_cursor_is_rejected() {
    let transport = ScriptedTransport::new();
    let state = state_with(logged_in_client(transport.clone()).await).await;

    let (status, _) = send(state, get("/resources/courses?cursor=http%3A%2F%2Felsewhere%2F")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_language_round_trip() {
    let transport = ScriptedTransport::new();
    let state = state_with(logged_in_client(transport).await).await;

    let (status, _) = send(state.clone(), json_request("PUT", "/language", json!({"language": "es"}))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(state, get("/language")).await;
    assert_eq!(body["language"], "es");
}

#[tokio::test]
async fn test_batch_route_creates_deliveries() {
    let transport = ScriptedTransport::new();
    let state = state_with(logged_in_client(transport.clone()).await).await;

    let (status, body) = send(
        state,
        json_request("POST", "/course-deliveries/batch", json!({"professor_id": 42, "course_ids": [7, 9]})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(transport.requests_to(Method::Post, &url("course-deliveries")).len(), 2);
    let effects = body["effects"].as_array().unwrap();
    assert_eq!(effects[0]["type"], "toast");
    assert_eq!(effects[0]["level"], "success");
    assert_eq!(effects[1], json!({"type": "navigate", "to": "/course-deliveries"}));
}

#[tokio::test]
async fn test_export_route_returns_attachment() {
    let transport = ScriptedTransport::new();
    transport.on(
        Method::Get,
        &format!("{}/", url("programs")),
        200,
        json!([{"name": "BBA", "code": "BBA", "years": 4}]),
    );
    let state = state_with(logged_in_client(transport).await).await;

    let response = router(state)
        .oneshot(get("/resources/programs/export?format=csv"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"program_export.csv\""
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.starts_with("name,code,school,type,years,academic_director\n"));
}

#[tokio::test]
async fn test_assign_route_for_existing_delivery() {
    let transport = ScriptedTransport::new();
    transport.on(
        Method::Get,
        &format!("{}/?page_size=1000", url("professors")),
        200,
        json!([{"id": 7, "name": "Ana", "last_name": "Ruiz"}]),
    );
    let state = state_with(logged_in_client(transport.clone()).await).await;

    let (status, body) = send(
        state,
        json_request("POST", "/reports/assign", json!({"delivery_id": 100, "professor_id": 7})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["ok"], true);
    assert_eq!(transport.requests_to(Method::Patch, &url("course-deliveries")).len(), 1);
}

#[tokio::test]
async fn test_list_title_follows_language() {
    let transport = ScriptedTransport::new();
    let state = state_with(logged_in_client(transport).await).await;
    state.api.session().set_language(faculty_admin::session::Language::Es).await.unwrap();

    let (_, body) = send(state, get("/resources/course-deliveries")).await;

    assert_eq!(body["title"], "Entregas de Cursos");
}

#[tokio::test]
async fn test_write_routes_answer_401_when_session_expired() {
    let writes = [
        ("POST", "/resources/professors", json!({"name": "Ana", "last_name": "Ruiz", "email": "a@x.com"})),
        ("PATCH", "/resources/sections/5", json!({"program": "3"})),
        ("POST", "/course-deliveries/batch", json!({"professor_id": 42, "course_ids": [7]})),
        ("POST", "/resources/professors/1/inlines/degrees", json!({"degree": "2"})),
    ];
    for (method, uri, body) in writes {
        let transport = ScriptedTransport::new();
        transport.expire_session(&[Method::Get, Method::Post, Method::Patch, Method::Delete]);
        let state = state_with(logged_in_client(transport).await).await;

        let (status, response) = send(state, json_request(method, uri, body)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        assert_eq!(response["redirect"], "/login", "{} {}", method, uri);
    }
}

#[tokio::test]
async fn test_inline_row_update_route_patches_child() {
    let transport = ScriptedTransport::new();
    transport.on(Method::Get, &format!("{}/1/", url("professors")), 200, json!({"id": 1, "name": "Ana"}));
    transport.on(
        Method::Get,
        &format!("{}/?professor=1", url("professor-degrees")),
        200,
        json!([{"id": 9, "degree": {"id": 2, "name": "PhD"}}]),
    );
    let state = state_with(logged_in_client(transport.clone()).await).await;

    let (status, body) = send(
        state,
        json_request("PATCH", "/resources/professors/1/inlines/degrees/9", json!({"degree": "3"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let patches = transport.requests_to(Method::Patch, &url("professor-degrees"));
    assert_eq!(patches[0].url, format!("{}/9/", url("professor-degrees")));
    assert_eq!(patches[0].body, Some(json!({"degree_id": 3})));
    assert_eq!(body["effects"][0]["message"], "Degrees updated successfully");
}

#[tokio::test]
async fn test_unknown_inline_row_is_404() {
    let transport = ScriptedTransport::new();
    let state = state_with(logged_in_client(transport).await).await;

    let request = Request::builder()
        .method("DELETE")
        .uri("/resources/professors/1/inlines/degrees/404")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(state, request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
