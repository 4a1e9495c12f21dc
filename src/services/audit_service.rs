//! 审计日志服务

use crate::{
    error::AppError,
    models::{
        account::Account,
        audit::{AuditEntry, AuditEntryView},
    },
    repository::AuditRepository,
};
use std::sync::Arc;
use uuid::Uuid;

/// 审计操作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    // 账户
    Register,
    AddUser,
    FetchUsers,
    FetchUserDetails,
    AdminFetchUserDetails,
    UpdateUserRole,
    UpdateUserInfo,
    AdminUpdateUser,

    // 认证
    Login,
    RefreshToken,
    ChangeUserPassword,
    AdminChangePassword,

    // 审计
    FetchLogs,
}

impl AuditAction {
    /// 动作标签（写入 `audit_logs.action`）
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Register => "Register",
            AuditAction::AddUser => "Add User",
            AuditAction::FetchUsers => "Fetch Users",
            AuditAction::FetchUserDetails => "Fetch User Details",
            AuditAction::AdminFetchUserDetails => "Admin Fetch User Details",
            AuditAction::UpdateUserRole => "Update User Role",
            AuditAction::UpdateUserInfo => "Update User Info",
            AuditAction::AdminUpdateUser => "Admin Update User",

            AuditAction::Login => "Login",
            AuditAction::RefreshToken => "Refresh Token",
            AuditAction::ChangeUserPassword => "Change User Password",
            AuditAction::AdminChangePassword => "Admin Change Password",

            AuditAction::FetchLogs => "Fetch Logs",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AuditAction::Register => "Register a new account",
            AuditAction::AddUser => "Admin added a new user",
            AuditAction::FetchUsers => "Admin fetched all users",
            AuditAction::FetchUserDetails => "User retrieved user details",
            AuditAction::AdminFetchUserDetails => "Admin retrieved user details",
            AuditAction::UpdateUserRole => "Admin updated user role",
            AuditAction::UpdateUserInfo => "User updated profile details",
            AuditAction::AdminUpdateUser => "Admin updated user details",

            AuditAction::Login => "User attempted login",
            AuditAction::RefreshToken => "User generated new access token",
            AuditAction::ChangeUserPassword => "User changed password",
            AuditAction::AdminChangePassword => "Admin updated user password",

            AuditAction::FetchLogs => "Admin retrieved access logs",
        }
    }
}

pub struct AuditService {
    repo: Arc<dyn AuditRepository>,
}

impl AuditService {
    pub fn new(repo: Arc<dyn AuditRepository>) -> Self {
        Self { repo }
    }

    /// 写入一条审计记录，失败时返回错误
    pub async fn try_record(
        &self,
        actor_id: Uuid,
        actor_role: Option<&str>,
        action: AuditAction,
        ip_address: &str,
    ) -> Result<(), AppError> {
        let entry = AuditEntry {
            id: Uuid::new_v4(),
            user_id: Some(actor_id),
            role: actor_role.map(|r| r.to_string()),
            action: action.as_str().to_string(),
            description: action.description().to_string(),
            ip_address: ip_address.to_string(),
            created_at: chrono::Utc::now(),
        };

        self.repo.insert(&entry).await
    }

    /// 在主操作提交之后写入审计记录
    ///
    /// 写入失败不影响主操作的结果，只记录到运维日志并计数。
    pub async fn record(
        &self,
        actor_id: Uuid,
        actor_role: Option<&str>,
        action: AuditAction,
        ip_address: &str,
    ) {
        if let Err(e) = self
            .try_record(actor_id, actor_role, action, ip_address)
            .await
        {
            metrics::counter!("audit_write_failures_total", "action" => action.as_str())
                .increment(1);
            tracing::error!(
                target: "audit",
                actor_id = %actor_id,
                action = action.as_str(),
                error = %e,
                "Failed to write audit entry"
            );
        }
    }

    /// 查询全部审计记录（含操作者名称）
    pub async fn list_all(&self) -> Result<Vec<AuditEntryView>, AppError> {
        self.repo.list_with_actor().await
    }

    /// 管理员查看审计日志，本次查看同样记入审计
    pub async fn list_logs(
        &self,
        admin: &Account,
        client_ip: &str,
    ) -> Result<Vec<AuditEntryView>, AppError> {
        let entries = self.list_all().await?;

        self.record(admin.id, admin.primary_role_name(), AuditAction::FetchLogs, client_ip)
            .await;

        Ok(entries)
    }
}
