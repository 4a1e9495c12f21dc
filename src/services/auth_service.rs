//! 认证服务：注册、登录、令牌刷新、密码管理

use crate::{
    auth::{
        jwt::{JwtService, TokenPair, TokenSubject, TokenType},
        password::PasswordHasher,
        reset_code::ResetCode,
        AuthContext,
    },
    error::AppError,
    models::{account::*, auth::*},
    repository::{AccountRepository, ResetRepository},
    services::{
        audit_service::{AuditAction, AuditService},
        role_service::RoleService,
    },
};
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

pub struct AuthService {
    accounts: Arc<dyn AccountRepository>,
    resets: Arc<dyn ResetRepository>,
    roles: Arc<RoleService>,
    audit: Arc<AuditService>,
    jwt_service: Arc<JwtService>,
    hasher: Arc<PasswordHasher>,
    reset_token_exp_secs: u64,
}

impl AuthService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        resets: Arc<dyn ResetRepository>,
        roles: Arc<RoleService>,
        audit: Arc<AuditService>,
        jwt_service: Arc<JwtService>,
        hasher: Arc<PasswordHasher>,
        reset_token_exp_secs: u64,
    ) -> Self {
        Self {
            accounts,
            resets,
            roles,
            audit,
            jwt_service,
            hasher,
            reset_token_exp_secs,
        }
    }

    /// 自助注册
    pub async fn register(&self, req: RegisterRequest, client_ip: &str) -> Result<Account, AppError> {
        let account = self.create_account(req).await?;

        self.audit
            .record(
                account.id,
                account.primary_role_name(),
                AuditAction::Register,
                client_ip,
            )
            .await;

        Ok(account)
    }

    /// 管理员创建账户；审计操作者为管理员本人
    pub async fn admin_create(
        &self,
        admin: &Account,
        req: RegisterRequest,
        client_ip: &str,
    ) -> Result<Account, AppError> {
        let account = self.create_account(req).await?;

        tracing::info!(admin_id = %admin.id, user_id = %account.id, "Account created by admin");

        self.audit
            .record(admin.id, admin.primary_role_name(), AuditAction::AddUser, client_ip)
            .await;

        Ok(account)
    }

    async fn create_account(&self, req: RegisterRequest) -> Result<Account, AppError> {
        if self.accounts.find_by_email(&req.email).await?.is_some() {
            return Err(AppError::Conflict("User already exists".to_string()));
        }

        let role = self.roles.get_or_create(&req.role).await?;
        let password_hash = self.hasher.hash(&req.password)?;

        // 预检查之后的并发重复插入由唯一约束兜底，同样返回 Conflict
        self.accounts
            .create(&req.into_new_account(password_hash), &role)
            .await
    }

    /// 用户登录
    pub async fn login(&self, req: LoginRequest, client_ip: &str) -> Result<TokenPair, AppError> {
        let account = self
            .accounts
            .find_by_email(&req.email)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        if !self.hasher.verify(&req.password, &account.password_hash) {
            tracing::info!(user_id = %account.id, "Login rejected: invalid password");
            return Err(AppError::unauthorized("Invalid password"));
        }

        let subject = TokenSubject::from_account(&account)?;
        let tokens = self.jwt_service.issue_pair(&subject)?;

        self.audit
            .record(account.id, Some(subject.role.as_str()), AuditAction::Login, client_ip)
            .await;

        Ok(tokens)
    }

    /// 用刷新令牌换取新的访问令牌
    ///
    /// 声明从账户当前状态重新构建，角色变更立即生效。
    pub async fn refresh(
        &self,
        refresh_token: &str,
        client_ip: &str,
    ) -> Result<AccessTokenResponse, AppError> {
        let claims = self
            .jwt_service
            .verify(refresh_token)
            .filter(|claims| claims.token_type == Some(TokenType::Refresh))
            .ok_or_else(|| AppError::unauthorized("Invalid refresh token"))?;

        let email = claims.sub.ok_or(AppError::InvalidToken)?;

        let account = self
            .accounts
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        let subject = TokenSubject::from_account(&account)?;
        let access_token = self.jwt_service.issue_access(&subject)?;

        self.audit
            .record(account.id, Some(subject.role.as_str()), AuditAction::RefreshToken, client_ip)
            .await;

        Ok(AccessTokenResponse {
            access_token,
            token_type: "bearer",
        })
    }

    /// 校验 Bearer 令牌并提取身份
    ///
    /// 刷新令牌不能用作访问令牌；未携带 `type` 的令牌按访问令牌处理。
    pub fn authenticate(&self, token: &str) -> Result<AuthContext, AppError> {
        let claims = self
            .jwt_service
            .verify(token)
            .ok_or_else(|| AppError::unauthorized("Could not validate credentials"))?;

        if claims.token_type == Some(TokenType::Refresh) {
            return Err(AppError::unauthorized("Could not validate credentials"));
        }

        match (claims.sub, claims.user_id) {
            (Some(email), Some(user_id)) => Ok(AuthContext {
                user_id,
                email,
                role: claims.role,
            }),
            _ => Err(AppError::InvalidToken),
        }
    }

    /// 修改本人密码
    pub async fn change_password(
        &self,
        ctx: &AuthContext,
        req: ChangePasswordRequest,
        client_ip: &str,
    ) -> Result<Account, AppError> {
        let account = self.load(ctx.user_id).await?;

        if !self.hasher.verify(&req.old_password, &account.password_hash) {
            return Err(AppError::unauthorized("Invalid old password"));
        }

        let account = self.set_password(account, &req.new_password).await?;

        self.audit
            .record(
                account.id,
                account.primary_role_name(),
                AuditAction::ChangeUserPassword,
                client_ip,
            )
            .await;

        Ok(account)
    }

    /// 管理员重置指定账户的密码
    pub async fn admin_change_password(
        &self,
        admin: &Account,
        req: AdminChangePasswordRequest,
        client_ip: &str,
    ) -> Result<Account, AppError> {
        let target = self.load(req.user_id).await?;
        let target = self.set_password(target, &req.new_password).await?;

        self.audit
            .record(
                admin.id,
                admin.primary_role_name(),
                AuditAction::AdminChangePassword,
                client_ip,
            )
            .await;

        Ok(target)
    }

    /// 发起密码重置，直接返回重置码
    pub async fn forgot_password(&self, req: ForgotPasswordRequest) -> Result<ResetTicket, AppError> {
        if self.accounts.find_by_email(&req.email).await?.is_none() {
            return Err(AppError::not_found("User not found"));
        }

        let code = ResetCode::generate();
        let now = Utc::now();
        let expires_at = now + Duration::seconds(self.reset_token_exp_secs as i64);

        self.resets
            .insert(&PasswordReset {
                id: Uuid::new_v4(),
                email: req.email,
                code_hash: ResetCode::hash(&code),
                expires_at,
                created_at: now,
            })
            .await?;

        Ok(ResetTicket {
            status: "ok",
            reset_token: code,
            expires_in: humanize_ttl(self.reset_token_exp_secs),
            expires_at,
        })
    }

    /// 使用重置码设置新密码
    ///
    /// 重置码在过期前可重复使用。
    pub async fn reset_password(&self, req: ResetPasswordRequest) -> Result<(), AppError> {
        let reset = self
            .resets
            .find_by_code_hash(&ResetCode::hash(&req.reset_token))
            .await?
            .filter(|reset| !reset.is_expired_at(Utc::now()) && reset.email == req.email)
            .ok_or_else(|| AppError::unauthorized("Invalid or expired reset token"))?;

        let account = self
            .accounts
            .find_by_email(&reset.email)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        self.set_password(account, &req.new_password).await?;

        Ok(())
    }

    async fn load(&self, id: Uuid) -> Result<Account, AppError> {
        self.accounts
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    async fn set_password(&self, account: Account, password: &str) -> Result<Account, AppError> {
        let password_hash = self.hasher.hash(password)?;

        if !self.accounts.update_password(account.id, &password_hash).await? {
            return Err(AppError::not_found("User not found"));
        }

        Ok(Account {
            password_hash,
            ..account
        })
    }
}

/// 7200 -> "2 hours"
fn humanize_ttl(secs: u64) -> String {
    let plural = |n: u64, unit: &str| {
        if n == 1 {
            format!("1 {}", unit)
        } else {
            format!("{} {}s", n, unit)
        }
    };

    if secs % 3600 == 0 {
        plural(secs / 3600, "hour")
    } else if secs % 60 == 0 {
        plural(secs / 60, "minute")
    } else {
        plural(secs, "second")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humanize_ttl() {
        assert_eq!(humanize_ttl(7200), "2 hours");
        assert_eq!(humanize_ttl(3600), "1 hour");
        assert_eq!(humanize_ttl(900), "15 minutes");
        assert_eq!(humanize_ttl(61), "61 seconds");
    }
}
