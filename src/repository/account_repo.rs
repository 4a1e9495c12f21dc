//! Account repository (账户数据访问)

use crate::{
    error::AppError,
    models::{
        account::{Account, NewAccount, UpdateProfileRequest},
        role::Role,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

/// 账户存储。返回的账户均已加载角色（按分配时间排序）。
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError>;

    async fn list(&self) -> Result<Vec<Account>, AppError>;

    /// 创建账户并绑定角色；邮箱或手机号重复时返回 `Conflict`
    async fn create(&self, new: &NewAccount, role: &Role) -> Result<Account, AppError>;

    /// 覆盖资料字段；账户不存在时返回 `None`
    async fn update_profile(
        &self,
        id: Uuid,
        update: &UpdateProfileRequest,
    ) -> Result<Option<Account>, AppError>;

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, AppError>;

    /// 用单一角色替换账户的全部角色
    async fn set_role(&self, id: Uuid, role: &Role) -> Result<bool, AppError>;
}

pub struct PgAccountRepository {
    db: PgPool,
}

impl PgAccountRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn roles_of(&self, user_id: Uuid) -> Result<Vec<Role>, AppError> {
        let roles = sqlx::query_as::<_, Role>(
            r#"
            SELECT r.id, r.name, r.created_at
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            WHERE ur.user_id = $1
            ORDER BY ur.assigned_at, r.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(roles)
    }

    async fn with_roles(&self, account: Option<Account>) -> Result<Option<Account>, AppError> {
        match account {
            Some(mut account) => {
                account.roles = self.roles_of(account.id).await?;
                Ok(Some(account))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        self.with_roles(account).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.db)
            .await?;

        self.with_roles(account).await
    }

    async fn list(&self) -> Result<Vec<Account>, AppError> {
        let mut accounts = sqlx::query_as::<_, Account>("SELECT * FROM users ORDER BY created_at")
            .fetch_all(&self.db)
            .await?;

        let bindings = sqlx::query_as::<_, (Uuid, Uuid, String, DateTime<Utc>)>(
            r#"
            SELECT ur.user_id, r.id, r.name, r.created_at
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            ORDER BY ur.assigned_at, r.name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let mut by_user: HashMap<Uuid, Vec<Role>> = HashMap::new();
        for (user_id, id, name, created_at) in bindings {
            by_user
                .entry(user_id)
                .or_default()
                .push(Role { id, name, created_at });
        }

        for account in &mut accounts {
            account.roles = by_user.remove(&account.id).unwrap_or_default();
        }

        Ok(accounts)
    }

    async fn create(&self, new: &NewAccount, role: &Role) -> Result<Account, AppError> {
        let mut tx = self.db.begin().await?;

        let mut account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO users (id, first_name, last_name, email, phone, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(&new.password_hash)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)")
            .bind(account.id)
            .bind(role.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        account.roles = vec![role.clone()];
        Ok(account)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: &UpdateProfileRequest,
    ) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            UPDATE users
            SET
                first_name = $2,
                last_name = $3,
                email = $4,
                phone = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(&update.email)
        .bind(&update.phone)
        .fetch_optional(&self.db)
        .await?;

        self.with_roles(account).await
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_role(&self, id: Uuid, role: &Role) -> Result<bool, AppError> {
        let mut tx = self.db.begin().await?;

        let touched = sqlx::query("UPDATE users SET updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if touched.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)")
            .bind(id)
            .bind(role.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}
