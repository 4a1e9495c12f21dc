//! 审计日志的 HTTP 处理器

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    middleware::{AppState, ClientIp},
    models::role::ADMIN_ROLE,
};
use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;

/// 查询审计日志（仅管理员）
pub async fn list_audit_logs(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ClientIp(client_ip): ClientIp,
) -> Result<impl IntoResponse, AppError> {
    let admin = state
        .access_service
        .authorize(&[ADMIN_ROLE], &auth_context)
        .await?;

    let entries = state.audit_service.list_logs(&admin, &client_ip).await?;

    Ok(Json(entries))
}
