//! Time entry endpoint tests.

mod common;

use axum::http::{header::AUTHORIZATION, StatusCode};
use axum_test::TestServer;
use common::{bearer_auth, build_test_app, create_project, register};
use serde_json::{json, Value};

async fn create_entry(server: &TestServer, token: &str, body: Value) -> Value {
    let response = server
        .post("/api/time-entries")
        .add_header(AUTHORIZATION, bearer_auth(token))
        .json(&body)
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

fn entry_body(project_id: &str, start: &str, end: &str, duration: i64) -> Value {
    json!({
        "projectId": project_id,
        "startTime": start,
        "endTime": end,
        "duration": duration,
        "description": "  Deep work  ",
    })
}

#[tokio::test]
async fn test_create_entry_embeds_project() {
    let (server, _pool) = build_test_app().await;
    let token = register(&server, "ada").await;
    let project = create_project(&server, &token, "Alpha").await;
    let project_id = project["id"].as_str().unwrap();

    let entry = create_entry(
        &server,
        &token,
        entry_body(project_id, "2024-03-04T09:00:00Z", "2024-03-04T10:00:00Z", 3600),
    )
    .await;

    assert_eq!(entry["projectId"], project_id);
    assert_eq!(entry["project"]["name"], "Alpha");
    assert_eq!(entry["project"]["color"], "#3b82f6");
    assert_eq!(entry["duration"], 3600);
    assert_eq!(entry["pausedDuration"], 0);
    assert_eq!(entry["description"], "Deep work");
}

#[tokio::test]
async fn test_create_entry_validation() {
    let (server, _pool) = build_test_app().await;
    let token = register(&server, "ada").await;
    let project = create_project(&server, &token, "Alpha").await;
    let project_id = project["id"].as_str().unwrap();

    let backwards = entry_body(project_id, "2024-03-04T10:00:00Z", "2024-03-04T09:00:00Z", 0);
    let negative = entry_body(project_id, "2024-03-04T09:00:00Z", "2024-03-04T10:00:00Z", -5);
    let missing = json!({ "projectId": project_id });

    for body in [backwards, negative, missing] {
        server
            .post("/api/time-entries")
            .add_header(AUTHORIZATION, bearer_auth(&token))
            .json(&body)
            .await
            .assert_status_bad_request();
    }
}

#[tokio::test]
async fn test_create_entry_for_foreign_project_is_not_found() {
    let (server, _pool) = build_test_app().await;
    let alice = register(&server, "alice").await;
    let bob = register(&server, "bob").await;
    let project = create_project(&server, &alice, "Alpha").await;
    let project_id = project["id"].as_str().unwrap();

    let response = server
        .post("/api/time-entries")
        .add_header(AUTHORIZATION, bearer_auth(&bob))
        .json(&entry_body(project_id, "2024-03-04T09:00:00Z", "2024-03-04T10:00:00Z", 3600))
        .await;

    response.assert_status_not_found();
    let body: Value = response.json();
    assert_eq!(body["message"], "Project not found");
}

#[tokio::test]
async fn test_list_filters_and_order() {
    let (server, _pool) = build_test_app().await;
    let token = register(&server, "ada").await;
    let alpha = create_project(&server, &token, "Alpha").await;
    let beta = create_project(&server, &token, "Beta").await;
    let alpha_id = alpha["id"].as_str().unwrap();
    let beta_id = beta["id"].as_str().unwrap();

    create_entry(&server, &token, entry_body(alpha_id, "2024-03-01T09:00:00Z", "2024-03-01T10:00:00Z", 3600)).await;
    create_entry(&server, &token, entry_body(beta_id, "2024-03-02T09:00:00Z", "2024-03-02T09:30:00Z", 1800)).await;
    create_entry(&server, &token, entry_body(alpha_id, "2024-03-03T09:00:00Z", "2024-03-03T09:10:00Z", 600)).await;

    let all: Value = server
        .get("/api/time-entries")
        .add_header(AUTHORIZATION, bearer_auth(&token))
        .await
        .json();
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0]["duration"], 600);
    assert_eq!(all[2]["duration"], 3600);

    let alpha_only: Value = server
        .get("/api/time-entries")
        .add_query_param("projectId", alpha_id)
        .add_header(AUTHORIZATION, bearer_auth(&token))
        .await
        .json();
    assert_eq!(alpha_only.as_array().unwrap().len(), 2);

    let window: Value = server
        .get("/api/time-entries")
        .add_query_param("startDate", "2024-03-02")
        .add_query_param("endDate", "2024-03-02")
        .add_header(AUTHORIZATION, bearer_auth(&token))
        .await
        .json();
    let window = window.as_array().unwrap();
    assert_eq!(window.len(), 1);
    assert_eq!(window[0]["project"]["name"], "Beta");

    server
        .get("/api/time-entries")
        .add_query_param("startDate", "last tuesday")
        .add_header(AUTHORIZATION, bearer_auth(&token))
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn test_update_entry_revalidates_merged_record() {
    let (server, _pool) = build_test_app().await;
    let token = register(&server, "ada").await;
    let project = create_project(&server, &token, "Alpha").await;
    let project_id = project["id"].as_str().unwrap();
    let entry = create_entry(
        &server,
        &token,
        entry_body(project_id, "2024-03-04T09:00:00Z", "2024-03-04T10:00:00Z", 3600),
    )
    .await;
    let id = entry["id"].as_str().unwrap();

    let response = server
        .put(&format!("/api/time-entries/{id}"))
        .add_header(AUTHORIZATION, bearer_auth(&token))
        .json(&json!({ "endTime": "2024-03-04T08:00:00Z" }))
        .await;
    response.assert_status_bad_request();

    let response = server
        .put(&format!("/api/time-entries/{id}"))
        .add_header(AUTHORIZATION, bearer_auth(&token))
        .json(&json!({ "duration": 1800, "description": "Review" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["duration"], 1800);
    assert_eq!(body["description"], "Review");
    assert_eq!(body["startTime"], entry["startTime"]);
    assert_eq!(body["project"]["name"], "Alpha");
}

#[tokio::test]
async fn test_delete_missing_entry_is_not_found() {
    let (server, _pool) = build_test_app().await;
    let token = register(&server, "ada").await;

    let response = server
        .delete("/api/time-entries/does-not-exist")
        .add_header(AUTHORIZATION, bearer_auth(&token))
        .await;

    response.assert_status_not_found();
    let body: Value = response.json();
    assert_eq!(body["message"], "Time entry not found");
}

#[tokio::test]
async fn test_delete_entry_and_other_users_cannot_see_it() {
    let (server, _pool) = build_test_app().await;
    let alice = register(&server, "alice").await;
    let bob = register(&server, "bob").await;
    let project = create_project(&server, &alice, "Alpha").await;
    let entry = create_entry(
        &server,
        &alice,
        entry_body(project["id"].as_str().unwrap(), "2024-03-04T09:00:00Z", "2024-03-04T10:00:00Z", 3600),
    )
    .await;
    let id = entry["id"].as_str().unwrap();

    server
        .delete(&format!("/api/time-entries/{id}"))
        .add_header(AUTHORIZATION, bearer_auth(&bob))
        .await
        .assert_status_not_found();

    let response = server
        .delete(&format!("/api/time-entries/{id}"))
        .add_header(AUTHORIZATION, bearer_auth(&alice))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["id"], id);
}

#[tokio::test]
async fn test_entries_survive_project_deletion() {
    let (server, _pool) = build_test_app().await;
    let token = register(&server, "ada").await;
    let project = create_project(&server, &token, "Alpha").await;
    let project_id = project["id"].as_str().unwrap();
    create_entry(
        &server,
        &token,
        entry_body(project_id, "2024-03-04T09:00:00Z", "2024-03-04T10:00:00Z", 3600),
    )
    .await;

    server
        .delete(&format!("/api/projects/{project_id}"))
        .add_header(AUTHORIZATION, bearer_auth(&token))
        .await
        .assert_status_ok();

    let entries: Value = server
        .get("/api/time-entries")
        .add_header(AUTHORIZATION, bearer_auth(&token))
        .await
        .json();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["projectId"], project_id);
    assert!(entries[0]["project"].is_null());
}
