//! 认证相关的 HTTP 处理器
//! 注册、登录、令牌刷新、密码管理

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    handlers::extract::JsonBody,
    middleware::{AppState, ClientIp},
    models::{account::*, auth::*, role::ADMIN_ROLE},
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

/// 自助注册
pub async fn register(
    State(state): State<Arc<AppState>>,
    ClientIp(client_ip): ClientIp,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let account = state.auth_service.register(req, &client_ip).await?;

    Ok((StatusCode::CREATED, Json(AccountResponse::from(account))))
}

/// 管理员添加用户
pub async fn add_user(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ClientIp(client_ip): ClientIp,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let admin = state
        .access_service
        .authorize(&[ADMIN_ROLE], &auth_context)
        .await?;

    req.validate()?;

    let account = state
        .auth_service
        .admin_create(&admin, req, &client_ip)
        .await?;

    Ok((StatusCode::CREATED, Json(AccountResponse::from(account))))
}

/// 用户登录
pub async fn login(
    State(state): State<Arc<AppState>>,
    ClientIp(client_ip): ClientIp,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let tokens = state.auth_service.login(req, &client_ip).await?;

    Ok(Json(tokens))
}

/// 刷新访问令牌
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    ClientIp(client_ip): ClientIp,
    JsonBody(req): JsonBody<RefreshTokenRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state
        .auth_service
        .refresh(&req.refresh_token, &client_ip)
        .await?;

    Ok(Json(response))
}

/// 修改本人密码
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ClientIp(client_ip): ClientIp,
    JsonBody(req): JsonBody<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let account = state
        .auth_service
        .change_password(&auth_context, req, &client_ip)
        .await?;

    Ok(Json(json!({
        "status": "ok",
        "data": AccountResponse::from(account)
    })))
}

/// 管理员修改用户密码
pub async fn admin_change_password(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ClientIp(client_ip): ClientIp,
    JsonBody(req): JsonBody<AdminChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let admin = state
        .access_service
        .authorize(&[ADMIN_ROLE], &auth_context)
        .await?;

    req.validate()?;

    let account = state
        .auth_service
        .admin_change_password(&admin, req, &client_ip)
        .await?;

    Ok(Json(json!({
        "status": "ok",
        "data": AccountResponse::from(account)
    })))
}

/// 申请密码重置
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let ticket = state.auth_service.forgot_password(req).await?;

    Ok(Json(ticket))
}

/// 使用重置码设置新密码
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    state.auth_service.reset_password(req).await?;

    Ok(Json(json!({
        "status": "ok",
        "message": "successful"
    })))
}
