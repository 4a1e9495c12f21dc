//! Password reset repository

use crate::{error::AppError, models::auth::PasswordReset};
use async_trait::async_trait;
use sqlx::PgPool;

#[async_trait]
pub trait ResetRepository: Send + Sync {
    async fn insert(&self, reset: &PasswordReset) -> Result<(), AppError>;

    /// 按重置码摘要查找（最新的一条）
    async fn find_by_code_hash(&self, code_hash: &str) -> Result<Option<PasswordReset>, AppError>;
}

pub struct PgResetRepository {
    db: PgPool,
}

impl PgResetRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ResetRepository for PgResetRepository {
    async fn insert(&self, reset: &PasswordReset) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO password_resets (id, email, code_hash, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(reset.id)
        .bind(&reset.email)
        .bind(&reset.code_hash)
        .bind(reset.expires_at)
        .bind(reset.created_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn find_by_code_hash(&self, code_hash: &str) -> Result<Option<PasswordReset>, AppError> {
        let reset = sqlx::query_as::<_, PasswordReset>(
            "SELECT * FROM password_resets WHERE code_hash = $1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(code_hash)
        .fetch_optional(&self.db)
        .await?;

        Ok(reset)
    }
}
