//! 审计记录集成测试

use account_service::{
    error::AppError,
    models::audit::{AuditEntry, AuditEntryView},
    repository::{AuditRepository, MemoryStore, Store},
};
use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

mod common;
use common::{create_test_app_state_with, registration, TestApp};

/// 新增的审计条目（相对于 `before`）
async fn new_entries(app: &TestApp, before: usize) -> Vec<(Option<Uuid>, String)> {
    app.audit_actions().await.split_off(before)
}

#[tokio::test]
async fn test_each_operation_records_exactly_one_entry() {
    let app = TestApp::new();
    let (admin_id, admin) = app.signed_in("root@x.com", "0100000001", "admin").await;
    let admin_id: Uuid = admin_id.parse().unwrap();

    let before = app.audit_actions().await.len();
    let body = app.register("u@x.com", "0100000002", "user", "pw1").await;
    let user_id: Uuid = body["id"].as_str().unwrap().parse().unwrap();
    assert_eq!(
        new_entries(&app, before).await,
        vec![(Some(user_id), "Register".to_string())]
    );

    let (user_token, refresh) = app.login("u@x.com", "pw1").await;

    // (操作, 期望的操作者, 期望的动作标签)
    let cases: Vec<(&str, Uuid, &str)> = vec![
        ("refresh", user_id, "Refresh Token"),
        ("me", user_id, "Fetch User Details"),
        ("update", user_id, "Update User Info"),
        ("password", user_id, "Change User Password"),
        ("add", admin_id, "Add User"),
        ("all", admin_id, "Fetch Users"),
        ("by_id", admin_id, "Admin Fetch User Details"),
        ("role", admin_id, "Update User Role"),
        ("admin_update", admin_id, "Admin Update User"),
        ("admin_password", admin_id, "Admin Change Password"),
        ("logs", admin_id, "Fetch Logs"),
    ];

    for (op, actor, action) in cases {
        let before = app.audit_actions().await.len();

        let (status, body) = match op {
            "refresh" => {
                app.post("/users/refresh", None, json!({ "refresh_token": refresh }))
                    .await
            }
            "me" => app.get("/users/me", Some(&user_token)).await,
            "update" => {
                app.post(
                    "/users/update",
                    Some(&user_token),
                    json!({
                        "first_name": "Una",
                        "last_name": "User",
                        "email": "u@x.com",
                        "phone": "0100000002"
                    }),
                )
                .await
            }
            "password" => {
                app.post(
                    "/users/update/password",
                    Some(&user_token),
                    json!({ "old_password": "pw1", "new_password": "pw1" }),
                )
                .await
            }
            "add" => {
                app.post(
                    "/users/add",
                    Some(&admin),
                    registration("n@x.com", "0100000003", "user", "pw1"),
                )
                .await
            }
            "all" => app.get("/users/all", Some(&admin)).await,
            "by_id" => app.get(&format!("/users/{}", user_id), Some(&admin)).await,
            "role" => {
                app.post(
                    "/users/update/role",
                    Some(&admin),
                    json!({ "user_id": user_id, "role_name": "user" }),
                )
                .await
            }
            "admin_update" => {
                app.post(
                    "/users/admin/update",
                    Some(&admin),
                    json!({
                        "user_id": user_id,
                        "first_name": "Una",
                        "last_name": "Updated",
                        "email": "u@x.com",
                        "phone": "0100000002"
                    }),
                )
                .await
            }
            "admin_password" => {
                app.post(
                    "/users/admin/update/password",
                    Some(&admin),
                    json!({ "user_id": user_id, "new_password": "pw1" }),
                )
                .await
            }
            "logs" => app.get("/users/logs", Some(&admin)).await,
            _ => unreachable!(),
        };
        assert!(status.is_success(), "{} failed: {} {}", op, status, body);

        assert_eq!(
            new_entries(&app, before).await,
            vec![(Some(actor), action.to_string())],
            "{}",
            op
        );
    }
}

#[tokio::test]
async fn test_rejected_operations_record_nothing() {
    let app = TestApp::new();
    let (_, user_token) = app.signed_in("u@x.com", "0100000001", "user").await;
    let before = app.audit_actions().await.len();

    app.post("/users/login", None, json!({ "email": "u@x.com", "password": "bad" }))
        .await;
    app.get("/users/all", Some(&user_token)).await;
    app.post("/users/register", None, registration("u@x.com", "0100000009", "user", "pw1"))
        .await;
    app.get("/users/roles", Some(&user_token)).await;

    assert_eq!(app.audit_actions().await.len(), before);
}

/// 所有写入均失败的审计存储
struct FailingAudit;

#[async_trait]
impl AuditRepository for FailingAudit {
    async fn insert(&self, _entry: &AuditEntry) -> Result<(), AppError> {
        Err(AppError::Internal("audit store unavailable".to_string()))
    }

    async fn list_with_actor(&self) -> Result<Vec<AuditEntryView>, AppError> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_audit_failure_does_not_fail_primary_operation() {
    let memory = Arc::new(MemoryStore::new());
    let store = Store::new(memory.clone(), memory.clone(), Arc::new(FailingAudit), memory);
    let app = TestApp::with_state(create_test_app_state_with(store));

    let (status, body) = app
        .post("/users/register", None, registration("a@x.com", "0100000001", "user", "pw1"))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);

    // 主操作已提交
    app.login("a@x.com", "pw1").await;
}
