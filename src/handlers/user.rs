//! 用户管理的 HTTP 处理器

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    handlers::extract::{JsonBody, PathParam},
    middleware::{AppState, ClientIp},
    models::{account::*, role::ADMIN_ROLE},
};
use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// 列出用户
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ClientIp(client_ip): ClientIp,
) -> Result<impl IntoResponse, AppError> {
    let admin = state
        .access_service
        .authorize(&[ADMIN_ROLE], &auth_context)
        .await?;

    let accounts = state
        .account_service
        .list_accounts(&admin, &client_ip)
        .await?;

    let responses: Vec<AccountResponse> = accounts.into_iter().map(Into::into).collect();

    Ok(Json(responses))
}

/// 当前用户信息
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ClientIp(client_ip): ClientIp,
) -> Result<impl IntoResponse, AppError> {
    let account = state
        .account_service
        .get_self(&auth_context, &client_ip)
        .await?;

    Ok(Json(AccountResponse::from(account)))
}

/// 获取用户详情
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ClientIp(client_ip): ClientIp,
    PathParam(id): PathParam<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let admin = state
        .access_service
        .authorize(&[ADMIN_ROLE], &auth_context)
        .await?;

    let account = state
        .account_service
        .get_by_id(&admin, id, &client_ip)
        .await?;

    Ok(Json(AccountResponse::from(account)))
}

/// 修改用户角色
pub async fn update_role(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ClientIp(client_ip): ClientIp,
    JsonBody(req): JsonBody<UpdateRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let admin = state
        .access_service
        .authorize(&[ADMIN_ROLE], &auth_context)
        .await?;

    req.validate()?;

    let account = state
        .account_service
        .update_role(&admin, req, &client_ip)
        .await?;

    Ok(Json(json!({
        "status": "ok",
        "data": AccountResponse::from(account)
    })))
}

/// 更新本人资料
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ClientIp(client_ip): ClientIp,
    JsonBody(req): JsonBody<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let account = state
        .account_service
        .update_own_profile(&auth_context, req, &client_ip)
        .await?;

    Ok(Json(json!({
        "status": "ok",
        "data": AccountResponse::from(account)
    })))
}

/// 管理员更新用户资料
pub async fn admin_update_profile(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ClientIp(client_ip): ClientIp,
    JsonBody(req): JsonBody<AdminUpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let admin = state
        .access_service
        .authorize(&[ADMIN_ROLE], &auth_context)
        .await?;

    req.validate()?;

    let account = state
        .account_service
        .admin_update_profile(&admin, req, &client_ip)
        .await?;

    Ok(Json(json!({
        "status": "ok",
        "data": AccountResponse::from(account)
    })))
}

/// 列出角色（任意已认证用户）
pub async fn list_roles(
    State(state): State<Arc<AppState>>,
    _auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    let roles = state.account_service.list_roles().await?;

    Ok(Json(roles))
}
