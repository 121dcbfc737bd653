mod common;

use axum::http::StatusCode;
use common::{TestApp, create_test_app};
use serde_json::{Value, json};

async fn submit(app: &TestApp, token: Option<&str>, title: &str) -> Value {
    let (status, json) = app
        .post(
            "/api/submit-project-request",
            token,
            json!({
                "email": "client@x.com",
                "title": title,
                "description": "A landing page",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "submit failed: {json}");
    json
}

#[tokio::test]
async fn test_submit_sets_owner_and_defaults() {
    let app = create_test_app().await;
    let (user_id, token) = app.user("alice@x.com").await;

    let project = submit(&app, Some(&token), "Website").await;
    assert_eq!(project["user_id"], user_id);
    assert_eq!(project["status"], "Pending");
    assert_eq!(project["payment_status"], "Pending");

    let (status, json) = app.get("/api/projects", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["title"], "Website");
}

#[tokio::test]
async fn test_submit_validation() {
    let app = create_test_app().await;

    let (status, json) = app
        .post(
            "/api/submit-project-request",
            None,
            json!({ "email": "bad", "title": "x".repeat(101) }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Validation failed");
    assert!(json["fields"]["email"].as_str().is_some());
    assert!(json["fields"]["title"].as_str().is_some());
}

#[tokio::test]
async fn test_owner_reads_and_updates() {
    let app = create_test_app().await;
    let (_, token) = app.user("alice@x.com").await;
    let id = submit(&app, Some(&token), "Website").await["id"].clone();

    let (status, json) = app.get(&format!("/api/projects/{id}"), Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["title"], "Website");

    let (status, json) = app
        .patch(
            &format!("/api/projects/{id}"),
            Some(&token),
            json!({ "title": "Web shop" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["title"], "Web shop");
    assert_eq!(json["description"], "A landing page");
}

#[tokio::test]
async fn test_other_user_forbidden_missing_not_found() {
    let app = create_test_app().await;
    let (_, owner) = app.user("alice@x.com").await;
    let (_, other) = app.user("bob@x.com").await;
    let id = submit(&app, Some(&owner), "Website").await["id"].clone();

    let (status, _) = app.get(&format!("/api/projects/{id}"), Some(&other)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .patch(
            &format!("/api/projects/{id}"),
            Some(&other),
            json!({ "title": "Mine now" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.delete(&format!("/api/projects/{id}"), Some(&other)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.get("/api/projects/9999", Some(&other)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_anonymous_submission_visible_to_staff_only() {
    let app = create_test_app().await;
    let project = submit(&app, None, "Anonymous brief").await;
    assert!(project["user_id"].is_null());
    let id = &project["id"];

    let (status, _) = app.get(&format!("/api/projects/{id}"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, user) = app.user("alice@x.com").await;
    let (status, _) = app.get(&format!("/api/projects/{id}"), Some(&user)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, staff) = app.staff("staff@x.com").await;
    let (status, json) = app.get(&format!("/api/projects/{id}"), Some(&staff)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["title"], "Anonymous brief");
}

#[tokio::test]
async fn test_only_staff_review() {
    let app = create_test_app().await;
    let (_, owner) = app.user("alice@x.com").await;
    let (_, staff) = app.staff("staff@x.com").await;
    let id = submit(&app, Some(&owner), "Website").await["id"].clone();

    let (status, _) = app
        .patch(
            &format!("/api/projects/{id}"),
            Some(&owner),
            json!({ "status": "Completed" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) = app
        .patch(
            &format!("/api/projects/{id}"),
            Some(&staff),
            json!({
                "status": "Processing",
                "payment_status": "Paid",
                "expected_completion_date": "2026-12-01",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "Processing");
    assert_eq!(json["payment_status"], "Paid");
    assert_eq!(json["expected_completion_date"], "2026-12-01");

    let (status, json) = app
        .patch(
            &format!("/api/projects/{id}"),
            Some(&staff),
            json!({ "status": "Shipped" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["fields"]["status"].as_str().is_some());
}

#[tokio::test]
async fn test_staff_clear_completion_date() {
    let app = create_test_app().await;
    let (_, owner) = app.user("alice@x.com").await;
    let (_, staff) = app.staff("staff@x.com").await;
    let id = submit(&app, Some(&owner), "Website").await["id"].clone();
    let uri = format!("/api/projects/{id}");

    let (status, json) = app
        .patch(
            &uri,
            Some(&staff),
            json!({ "status": "Processing", "expected_completion_date": "2026-12-01" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["expected_completion_date"], "2026-12-01");

    let (status, json) = app
        .patch(&uri, Some(&staff), json!({ "expected_completion_date": "" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["expected_completion_date"].is_null());
    assert_eq!(json["status"], "Processing");
    assert_eq!(json["title"], "Website");

    // Clearing is still a review action.
    let (status, _) = app
        .patch(&uri, Some(&owner), json!({ "expected_completion_date": "" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_invalid_review_leaves_project_unchanged() {
    let app = create_test_app().await;
    let (_, owner) = app.user("alice@x.com").await;
    let (_, staff) = app.staff("staff@x.com").await;
    let id = submit(&app, Some(&owner), "Website").await["id"].clone();
    let uri = format!("/api/projects/{id}");

    let (status, _) = app
        .patch(
            &uri,
            Some(&staff),
            json!({ "title": "Renamed", "expected_completion_date": "01/12/2026" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, json) = app.get(&uri, Some(&owner)).await;
    assert_eq!(json["title"], "Website");
    assert!(json["expected_completion_date"].is_null());
}

#[tokio::test]
async fn test_owner_deletes() {
    let app = create_test_app().await;
    let (_, owner) = app.user("alice@x.com").await;
    let id = submit(&app, Some(&owner), "Website").await["id"].clone();

    let (status, _) = app.delete(&format!("/api/projects/{id}"), Some(&owner)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&format!("/api/projects/{id}"), Some(&owner)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_staff_list_all_projects() {
    let app = create_test_app().await;
    let (_, owner) = app.user("alice@x.com").await;
    submit(&app, Some(&owner), "Website").await;
    submit(&app, None, "Anonymous brief").await;

    let (status, _) = app.get("/api/admin/projects", Some(&owner)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, staff) = app.staff("staff@x.com").await;
    let (status, json) = app.get("/api/admin/projects", Some(&staff)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 2);
}
