mod common;

use axum::http::StatusCode;
use common::create_test_app;
use serde_json::json;

#[tokio::test]
async fn test_user_listing_requires_staff() {
    let app = create_test_app().await;
    let (_, user) = app.user("alice@x.com").await;
    let (_, staff) = app.staff("staff@x.com").await;

    let (status, _) = app.get("/api/admin/users", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/api/admin/users", Some(&user)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) = app.get("/api/admin/users", Some(&staff)).await;
    assert_eq!(status, StatusCode::OK);
    let users = json.as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.get("password_hash").is_none()));
}

#[tokio::test]
async fn test_staff_cannot_manage_users() {
    let app = create_test_app().await;
    let (user_id, _) = app.user("alice@x.com").await;
    let (_, staff) = app.staff("staff@x.com").await;

    let (status, _) = app
        .patch(
            &format!("/api/admin/users/{user_id}"),
            Some(&staff),
            json!({ "role": "admin" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_changes_role() {
    let app = create_test_app().await;
    let (user_id, user) = app.user("alice@x.com").await;
    let (_, admin) = app.admin("root@x.com").await;

    let (status, _) = app.get("/api/admin/projects", Some(&user)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) = app
        .patch(
            &format!("/api/admin/users/{user_id}"),
            Some(&admin),
            json!({ "role": "staff" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["role"], "staff");
    assert_eq!(json["is_staff"], true);

    let (status, _) = app.get("/api/admin/projects", Some(&user)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .patch(
            &format!("/api/admin/users/{user_id}"),
            Some(&admin),
            json!({ "role": "owner" }),
        )
        .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_deactivation_revokes_sessions() {
    let app = create_test_app().await;
    let (user_id, _) = app.user("alice@x.com").await;
    let (_, refresh) = app.login("alice@x.com", "password123").await;
    let (_, admin) = app.admin("root@x.com").await;

    let (status, json) = app
        .patch(
            &format!("/api/admin/users/{user_id}"),
            Some(&admin),
            json!({ "is_active": false }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["is_active"], false);

    let (status, _) = app
        .post("/api/token/refresh", None, json!({ "refresh": refresh }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post(
            "/api/token",
            None,
            json!({ "email": "alice@x.com", "password": "password123" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .patch(
            &format!("/api/admin/users/{user_id}"),
            Some(&admin),
            json!({ "is_active": true }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    app.login("alice@x.com", "password123").await;
}

#[tokio::test]
async fn test_admin_cannot_lock_themselves_out() {
    let app = create_test_app().await;
    let (admin_id, admin) = app.admin("root@x.com").await;
    let uri = format!("/api/admin/users/{admin_id}");

    let (status, json) = app
        .patch(&uri, Some(&admin), json!({ "is_active": false }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["fields"]["is_active"].as_str().is_some());

    let (status, json) = app.patch(&uri, Some(&admin), json!({ "role": "user" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["fields"]["role"].as_str().is_some());

    let (status, _) = app.get("/api/admin/users", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_intern_linkage() {
    let app = create_test_app().await;
    let (user_id, _) = app.user("alice@x.com").await;
    let (_, admin) = app.admin("root@x.com").await;
    let uri = format!("/api/admin/users/{user_id}");

    let (status, json) = app
        .patch(&uri, Some(&admin), json!({ "internship_id": "X".repeat(13) }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["fields"]["internship_id"].as_str().is_some());

    let (status, json) = app
        .patch(
            &uri,
            Some(&admin),
            json!({ "is_intern": true, "internship_id": "INT-01" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["is_intern"], true);
    assert_eq!(json["internship_id"], "INT-01");

    let (status, json) = app
        .patch(&uri, Some(&admin), json!({ "internship_id": "" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["is_intern"], true);
    assert!(json["internship_id"].is_null());

    let (status, _) = app
        .patch("/api/admin/users/999", Some(&admin), json!({ "is_intern": true }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_applications_and_contact_inbox() {
    let app = create_test_app().await;
    let (user_id, user) = app.user("alice@x.com").await;
    let (_, staff) = app.staff("staff@x.com").await;

    let (status, application) = app
        .post(
            "/api/submit-initial-application",
            Some(&user),
            json!({ "email": "Alice@X.com", "mode": "Bootcamp" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(application["user_id"], user_id);
    assert_eq!(application["mode"], "bootcamp");
    assert_eq!(application["email"], "alice@x.com");

    let (status, json) = app
        .post(
            "/api/submit-initial-application",
            None,
            json!({ "email": "guest@x.com", "mode": "onsite" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["fields"]["mode"].as_str().is_some());

    let id = &application["id"];
    let (status, _) = app.get(&format!("/api/applications/{id}"), Some(&user)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(
            "/api/contact",
            None,
            json!({ "full_name": "Guest", "email": "guest@x.com", "message": "Hello" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = app
        .post("/api/contact", None, json!({ "full_name": "Guest" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["fields"]["message"].as_str().is_some());

    let (status, _) = app.get("/api/admin/contact", Some(&user)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) = app.get("/api/admin/contact", Some(&staff)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["message"], "Hello");

    let (status, json) = app.get("/api/admin/applications", Some(&staff)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_profile_roundtrip() {
    let app = create_test_app().await;
    let (_, user) = app.user("alice@x.com").await;

    let (status, json) = app
        .patch("/api/profile", Some(&user), json!({ "first_name": "  Alice " }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["first_name"], "Alice");

    let (status, json) = app.get("/api/profile", Some(&user)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["first_name"], "Alice");
    assert_eq!(json["role"], "user");
    assert!(json["internships"].as_array().unwrap().is_empty());
    assert!(json["projects"].as_array().unwrap().is_empty());
}
