
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use listkeeper::security::token::TokenService;
use listkeeper::{SharedData, build_router, persistence};
use serde_json::{Value, json};
use sqlx::PgPool;
use std::sync::Arc;
use tower::ServiceExt;

fn app(db: PgPool) -> Router {
    build_router(Arc::new(SharedData {
        ext_cxn: persistence::ExternalConnectivity::new(db),
        tokens: TokenService::new("integration-test-secret"),
    }))
}

/// Fires a request at the router and returns the response status plus the decoded
/// JSON body (or [Value::Null] for empty bodies).
async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request_builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request_builder =
            request_builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(payload) => request_builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string())),
        None => request_builder.body(Body::empty()),
    }
    .expect("request should build");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("request should produce a response");
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body should be readable");
    let body_json = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).expect("response body should be JSON")
    };

    (status, body_json)
}

/// Registers an account and exchanges its credentials for a bearer token.
async fn register_and_log_in(app: &Router, email: &str, username: &str) -> String {
    let (status, _) = send(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "email": email,
            "username": username,
            "password": "hunter2hunter2",
            "password_confirmation": "hunter2hunter2",
        })),
    )
    .await;
    assert_eq!(StatusCode::CREATED, status);

    let (status, token_body) = send(
        app,
        "POST",
        "/auth/token",
        None,
        Some(json!({
            "email": email,
            "password": "hunter2hunter2",
        })),
    )
    .await;
    assert_eq!(StatusCode::OK, status);

    token_body["access_token"]
        .as_str()
        .expect("token response should contain an access token")
        .to_owned()
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn rejects_requests_without_a_token() {
    test_util::prepare_db_and_test(|db| async move {
        let app = app(db);

        let (status, _) = send(&app, "GET", "/tasks", None, None).await;

        assert_eq!(StatusCode::UNAUTHORIZED, status);
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn manages_tasks_across_lists_and_groups() {
    test_util::prepare_db_and_test(|db| async move {
        let app = app(db);
        let token = register_and_log_in(&app, "jdoe@example.com", "jdoe").await;
        let token = Some(token.as_str());

        let (status, group) = send(
            &app,
            "POST",
            "/groups",
            token,
            Some(json!({ "title": "Household" })),
        )
        .await;
        assert_eq!(StatusCode::CREATED, status);
        let group_id = group["id"].as_i64().expect("group should have an id");

        let (status, list) = send(
            &app,
            "POST",
            "/lists",
            token,
            Some(json!({ "title": "Weekend chores", "group_id": group_id })),
        )
        .await;
        assert_eq!(StatusCode::CREATED, status);
        let list_id = list["id"].as_i64().expect("list should have an id");

        let (status, task) = send(
            &app,
            "POST",
            "/tasks",
            token,
            Some(json!({
                "title": "Buy groceries",
                "note": "Milk and eggs",
                "due_date": "2026-09-01",
                "list_id": list_id,
            })),
        )
        .await;
        assert_eq!(StatusCode::CREATED, status);
        let task_id = task["id"].as_i64().expect("task should have an id");
        assert_eq!(json!("2026-09-01"), task["due_date"]);
        assert_eq!(json!(list_id), task["list"]["id"]);

        // The list payload embeds its tasks and group reference
        let (status, fetched_list) =
            send(&app, "GET", &format!("/lists/{list_id}"), token, None).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(json!("Buy groceries"), fetched_list["tasks"][0]["title"]);
        assert_eq!(json!(group_id), fetched_list["group"]["id"]);

        // The group payload embeds its lists, shallowly
        let (status, fetched_group) =
            send(&app, "GET", &format!("/groups/{group_id}"), token, None).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(json!(list_id), fetched_group["task_lists"][0]["id"]);
        assert_eq!(Value::Null, fetched_group["task_lists"][0]["tasks"]);

        // Completing a task and clearing its due date via explicit null
        let (status, patched_task) = send(
            &app,
            "PATCH",
            &format!("/tasks/{task_id}"),
            token,
            Some(json!({ "completed": true, "due_date": null })),
        )
        .await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(json!(true), patched_task["completed"]);
        assert_eq!(Value::Null, patched_task["due_date"]);
        assert_eq!(json!("Buy groceries"), patched_task["title"]);

        // Deleting the list takes its tasks with it
        let (status, _) = send(&app, "DELETE", &format!("/lists/{list_id}"), token, None).await;
        assert_eq!(StatusCode::NO_CONTENT, status);
        let (status, tasks) = send(&app, "GET", "/tasks", token, None).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(json!({ "tasks": [] }), tasks);
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn deleting_a_group_detaches_its_lists() {
    test_util::prepare_db_and_test(|db| async move {
        let app = app(db);
        let token = register_and_log_in(&app, "lsmith@example.com", "lsmith").await;
        let token = Some(token.as_str());

        let (_, group) = send(
            &app,
            "POST",
            "/groups",
            token,
            Some(json!({ "title": "Projects" })),
        )
        .await;
        let group_id = group["id"].as_i64().expect("group should have an id");
        let (_, list) = send(
            &app,
            "POST",
            "/lists",
            token,
            Some(json!({ "title": "Garden overhaul", "group_id": group_id })),
        )
        .await;
        let list_id = list["id"].as_i64().expect("list should have an id");

        let (status, _) = send(&app, "DELETE", &format!("/groups/{group_id}"), token, None).await;
        assert_eq!(StatusCode::NO_CONTENT, status);

        let (status, orphaned_list) =
            send(&app, "GET", &format!("/lists/{list_id}"), token, None).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(json!("Garden overhaul"), orphaned_list["title"]);
        assert_eq!(Value::Null, orphaned_list["group"]);
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn users_cannot_see_each_others_data() {
    test_util::prepare_db_and_test(|db| async move {
        let app = app(db);
        let first_token = register_and_log_in(&app, "first@example.com", "first-user").await;
        let second_token = register_and_log_in(&app, "second@example.com", "second-user").await;

        let (status, task) = send(
            &app,
            "POST",
            "/tasks",
            Some(&first_token),
            Some(json!({ "title": "Private errand" })),
        )
        .await;
        assert_eq!(StatusCode::CREATED, status);
        let task_id = task["id"].as_i64().expect("task should have an id");

        let (status, _) = send(
            &app,
            "GET",
            &format!("/tasks/{task_id}"),
            Some(&second_token),
            None,
        )
        .await;
        assert_eq!(StatusCode::NOT_FOUND, status);

        // Attaching a task to a foreign list reads as a bad reference
        let (_, list) = send(
            &app,
            "POST",
            "/lists",
            Some(&first_token),
            Some(json!({ "title": "First user's list" })),
        )
        .await;
        let foreign_list_id = list["id"].as_i64().expect("list should have an id");
        let (status, error_body) = send(
            &app,
            "POST",
            "/tasks",
            Some(&second_token),
            Some(json!({ "title": "Sneaky task", "list_id": foreign_list_id })),
        )
        .await;
        assert_eq!(StatusCode::UNPROCESSABLE_ENTITY, status);
        assert_eq!(json!("invalid_reference"), error_body["error_code"]);
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn deleting_an_account_removes_everything_it_owns() {
    test_util::prepare_db_and_test(|db| async move {
        let app = app(db);
        let token = register_and_log_in(&app, "leaving@example.com", "leaving-user").await;

        let (status, _) = send(
            &app,
            "POST",
            "/tasks",
            Some(&token),
            Some(json!({ "title": "Soon to be gone" })),
        )
        .await;
        assert_eq!(StatusCode::CREATED, status);

        let (status, _) = send(&app, "DELETE", "/users/me", Some(&token), None).await;
        assert_eq!(StatusCode::NO_CONTENT, status);

        // Credentials no longer work once the account is gone
        let (status, _) = send(
            &app,
            "POST",
            "/auth/token",
            None,
            Some(json!({
                "email": "leaving@example.com",
                "password": "hunter2hunter2",
            })),
        )
        .await;
        assert_eq!(StatusCode::UNAUTHORIZED, status);
    });
}
