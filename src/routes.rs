//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{handlers, middleware::AppState};

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    // 公开端点（健康检查）
    let public_routes = Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health_check));

    // 无需认证的账户路由
    let open_routes = Router::new()
        .route("/users/register", post(handlers::auth::register))
        .route("/users/login", post(handlers::auth::login))
        .route("/users/refresh", post(handlers::auth::refresh_token))
        .route("/users/forgot/password", post(handlers::auth::forgot_password))
        .route("/users/reset/password", post(handlers::auth::reset_password));

    // 需要认证的路由；管理员门禁在各 handler 内完成
    let authenticated_routes = Router::new()
        .route("/users/add", post(handlers::auth::add_user))
        .route("/users/all", get(handlers::user::list_users))
        .route("/users/me", get(handlers::user::get_current_user))
        .route("/users/roles", get(handlers::user::list_roles))
        .route("/users/logs", get(handlers::audit::list_audit_logs))
        .route("/users/{id}", get(handlers::user::get_user))
        .route("/users/update", post(handlers::user::update_profile))
        .route("/users/update/role", post(handlers::user::update_role))
        .route("/users/update/password", post(handlers::auth::change_password))
        .route("/users/admin/update", post(handlers::user::admin_update_profile))
        .route(
            "/users/admin/update/password",
            post(handlers::auth::admin_change_password),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.auth_service.clone(),
            crate::auth::middleware::bearer_auth_middleware,
        ));

    // 组合所有路由
    Router::new()
        .merge(public_routes)
        .merge(open_routes)
        .merge(authenticated_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(axum::middleware::from_fn(crate::middleware::request_tracking_middleware))
        .with_state(state)
}
