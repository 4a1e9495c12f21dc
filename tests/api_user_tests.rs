//! 账户管理与角色门禁 API 集成测试

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

mod common;
use common::{registration, TestApp};

#[tokio::test]
async fn test_admin_routes_reject_non_admin() {
    let app = TestApp::new();
    let (user_id, token) = app.signed_in("u@x.com", "0100000001", "user").await;

    let by_id = format!("/users/{}", user_id);
    for uri in ["/users/all", "/users/logs", by_id.as_str()] {
        let (status, body) = app.get(uri, Some(&token)).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", uri);
        assert_eq!(body["error"]["kind"], "forbidden");
    }

    let (status, _) = app
        .post("/users/add", Some(&token), registration("n@x.com", "0100000009", "user", "pw1"))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .post(
            "/users/update/role",
            Some(&token),
            json!({ "user_id": user_id, "role_name": "admin" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_demotion_takes_effect_before_token_expiry() {
    let app = TestApp::new();
    let (_, admin_token) = app.signed_in("root@x.com", "0100000001", "admin").await;
    let (other_id, other_token) = app.signed_in("b@x.com", "0100000002", "admin").await;

    let (status, _) = app.get("/users/all", Some(&other_token)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post(
            "/users/update/role",
            Some(&admin_token),
            json!({ "user_id": other_id, "role_name": "user" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["roles"], json!(["user"]));

    // 令牌仍声明 admin，但门禁按存储中的当前角色判断
    let (status, _) = app.get("/users/all", Some(&other_token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // 认证本身仍然有效
    let (status, _) = app.get("/users/me", Some(&other_token)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_promotion_takes_effect_and_refresh_picks_up_role() {
    let app = TestApp::new();
    let (_, admin_token) = app.signed_in("root@x.com", "0100000001", "admin").await;
    let body = app.register("b@x.com", "0100000002", "user", "pw1").await;
    let (user_token, refresh) = app.login("b@x.com", "pw1").await;

    app.post(
        "/users/update/role",
        Some(&admin_token),
        json!({ "user_id": body["id"], "role_name": "admin" }),
    )
    .await;

    let (status, _) = app.get("/users/all", Some(&user_token)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post("/users/refresh", None, json!({ "refresh_token": refresh }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let claims = app
        .state
        .jwt_service
        .verify(body["access_token"].as_str().unwrap())
        .unwrap();
    assert_eq!(claims.role.as_deref(), Some("admin"));
}

#[tokio::test]
async fn test_admin_account_management() {
    let app = TestApp::new();
    let (_, admin) = app.signed_in("root@x.com", "0100000001", "admin").await;

    let (status, created) = app
        .post("/users/add", Some(&admin), registration("n@x.com", "0100000002", "user", "pw1"))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let new_id = created["id"].as_str().unwrap().to_string();

    let (status, list) = app.get("/users/all", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 2);
    assert!(list
        .as_array()
        .unwrap()
        .iter()
        .all(|a| a.get("password_hash").is_none()));

    let (status, fetched) = app.get(&format!("/users/{}", new_id), Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["email"], "n@x.com");

    let (status, _) = app
        .get(&format!("/users/{}", Uuid::new_v4()), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, updated) = app
        .post(
            "/users/admin/update",
            Some(&admin),
            json!({
                "user_id": new_id,
                "first_name": "Grace",
                "last_name": "Hopper",
                "email": "grace@x.com",
                "phone": "0100000003"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["first_name"], "Grace");
    assert_eq!(updated["data"]["email"], "grace@x.com");

    let (status, _) = app
        .post(
            "/users/admin/update/password",
            Some(&admin),
            json!({ "user_id": new_id, "new_password": "pw9" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    app.login("grace@x.com", "pw9").await;

    let (status, _) = app
        .post(
            "/users/update/role",
            Some(&admin),
            json!({ "user_id": Uuid::new_v4(), "role_name": "user" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_own_profile() {
    let app = TestApp::new();
    app.register("a@x.com", "0100000001", "user", "pw1").await;
    let (_, token) = app.signed_in("b@x.com", "0100000002", "user").await;

    let profile = |email: &str| {
        json!({
            "first_name": "Barbara",
            "last_name": "Liskov",
            "email": email,
            "phone": "0100000002"
        })
    };

    let (status, body) = app
        .post("/users/update", Some(&token), profile("a@x.com"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "conflict");

    let (status, body) = app
        .post("/users/update", Some(&token), profile("barbara@x.com"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["data"]["first_name"], "Barbara");
}

#[tokio::test]
async fn test_list_roles_for_any_authenticated_user() {
    let app = TestApp::new();
    app.register("root@x.com", "0100000001", "admin", "pw1").await;
    let (_, token) = app.signed_in("u@x.com", "0100000002", "user").await;

    let (status, roles) = app.get("/users/roles", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);

    let mut names: Vec<&str> = roles
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    names.sort();
    assert_eq!(names, vec!["admin", "user"]);
}

#[tokio::test]
async fn test_audit_log_listing() {
    let app = TestApp::new();
    let (admin_id, admin) = app.signed_in("root@x.com", "0100000001", "admin").await;

    let (status, logs) = app.get("/users/logs", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);

    let logs = logs.as_array().unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0]["action"], "Register");
    assert_eq!(logs[1]["action"], "Login");
    assert_eq!(logs[1]["user_id"], admin_id.as_str());
    assert_eq!(logs[1]["first_name"], "Ada");
    assert_eq!(logs[1]["role"], "admin");
    assert_eq!(logs[1]["ip_address"], common::CLIENT_IP);
    assert!(logs[1]["log_id"].is_string());
    assert!(logs[1]["created_at"].is_string());
}
