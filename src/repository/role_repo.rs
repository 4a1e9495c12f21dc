//! Role repository (角色数据访问)

use crate::{error::AppError, models::role::Role};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// 按名称精确查找角色
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, AppError>;

    /// 创建角色；名称已存在时返回 `Conflict`
    async fn create(&self, name: &str) -> Result<Role, AppError>;

    async fn list(&self) -> Result<Vec<Role>, AppError>;
}

pub struct PgRoleRepository {
    db: PgPool,
}

impl PgRoleRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RoleRepository for PgRoleRepository {
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, AppError> {
        let role = sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.db)
            .await?;

        Ok(role)
    }

    async fn create(&self, name: &str) -> Result<Role, AppError> {
        let role = sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (id, name)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(&self.db)
        .await?;

        Ok(role)
    }

    async fn list(&self) -> Result<Vec<Role>, AppError> {
        let roles = sqlx::query_as::<_, Role>("SELECT * FROM roles ORDER BY name")
            .fetch_all(&self.db)
            .await?;

        Ok(roles)
    }
}
