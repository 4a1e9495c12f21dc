//! 账户服务：资料查询与更新

use crate::{
    auth::AuthContext,
    error::AppError,
    models::{account::*, role::Role},
    repository::AccountRepository,
    services::{
        audit_service::{AuditAction, AuditService},
        role_service::RoleService,
    },
};
use std::sync::Arc;
use uuid::Uuid;

pub struct AccountService {
    accounts: Arc<dyn AccountRepository>,
    roles: Arc<RoleService>,
    audit: Arc<AuditService>,
}

impl AccountService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        roles: Arc<RoleService>,
        audit: Arc<AuditService>,
    ) -> Self {
        Self {
            accounts,
            roles,
            audit,
        }
    }

    /// 列出全部账户（管理员）
    pub async fn list_accounts(&self, admin: &Account, client_ip: &str) -> Result<Vec<Account>, AppError> {
        let accounts = self.accounts.list().await?;

        self.audit
            .record(admin.id, admin.primary_role_name(), AuditAction::FetchUsers, client_ip)
            .await;

        Ok(accounts)
    }

    /// 查询本人资料
    pub async fn get_self(&self, ctx: &AuthContext, client_ip: &str) -> Result<Account, AppError> {
        let account = self.load(ctx.user_id).await?;

        self.audit
            .record(
                account.id,
                account.primary_role_name(),
                AuditAction::FetchUserDetails,
                client_ip,
            )
            .await;

        Ok(account)
    }

    /// 按 ID 查询账户（管理员）
    pub async fn get_by_id(&self, admin: &Account, id: Uuid, client_ip: &str) -> Result<Account, AppError> {
        let account = self.load(id).await?;

        self.audit
            .record(
                admin.id,
                admin.primary_role_name(),
                AuditAction::AdminFetchUserDetails,
                client_ip,
            )
            .await;

        Ok(account)
    }

    /// 替换账户角色（管理员）
    pub async fn update_role(
        &self,
        admin: &Account,
        req: UpdateRoleRequest,
        client_ip: &str,
    ) -> Result<Account, AppError> {
        let target = self.load(req.user_id).await?;
        let role: Role = self.roles.get_or_create(&req.role_name).await?;

        if !self.accounts.set_role(target.id, &role).await? {
            return Err(AppError::not_found("User not found"));
        }

        tracing::info!(
            admin_id = %admin.id,
            user_id = %target.id,
            role = %role.name,
            "Account role replaced"
        );

        self.audit
            .record(
                admin.id,
                admin.primary_role_name(),
                AuditAction::UpdateUserRole,
                client_ip,
            )
            .await;

        self.load(target.id).await
    }

    /// 更新本人资料
    pub async fn update_own_profile(
        &self,
        ctx: &AuthContext,
        req: UpdateProfileRequest,
        client_ip: &str,
    ) -> Result<Account, AppError> {
        let account = self
            .accounts
            .update_profile(ctx.user_id, &req)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        self.audit
            .record(
                account.id,
                account.primary_role_name(),
                AuditAction::UpdateUserInfo,
                client_ip,
            )
            .await;

        Ok(account)
    }

    /// 更新指定账户资料（管理员）
    pub async fn admin_update_profile(
        &self,
        admin: &Account,
        req: AdminUpdateProfileRequest,
        client_ip: &str,
    ) -> Result<Account, AppError> {
        let account = self
            .accounts
            .update_profile(req.user_id, &req.profile)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        self.audit
            .record(
                admin.id,
                admin.primary_role_name(),
                AuditAction::AdminUpdateUser,
                client_ip,
            )
            .await;

        Ok(account)
    }

    pub async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        self.roles.list_all().await
    }

    async fn load(&self, id: Uuid) -> Result<Account, AppError> {
        self.accounts
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }
}
