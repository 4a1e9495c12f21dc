//! Audit repository (审计数据访问)

use crate::{
    error::AppError,
    models::audit::{AuditEntry, AuditEntryView},
};
use async_trait::async_trait;
use sqlx::PgPool;

/// 仅追加的审计存储：没有更新或删除操作
#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn insert(&self, entry: &AuditEntry) -> Result<(), AppError>;

    /// 按写入顺序列出，并关联操作者名称
    async fn list_with_actor(&self) -> Result<Vec<AuditEntryView>, AppError>;
}

pub struct PgAuditRepository {
    db: PgPool,
}

impl PgAuditRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuditRepository for PgAuditRepository {
    async fn insert(&self, entry: &AuditEntry) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (id, user_id, role, action, description, ip_address, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(&entry.role)
        .bind(&entry.action)
        .bind(&entry.description)
        .bind(&entry.ip_address)
        .bind(entry.created_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn list_with_actor(&self) -> Result<Vec<AuditEntryView>, AppError> {
        // LEFT JOIN：操作者账户不存在时 first_name 为 NULL
        let entries = sqlx::query_as::<_, AuditEntryView>(
            r#"
            SELECT
                a.id AS log_id,
                a.user_id,
                u.first_name,
                a.role,
                a.action,
                a.description,
                a.ip_address,
                a.created_at
            FROM audit_logs a
            LEFT JOIN users u ON u.id = a.user_id
            ORDER BY a.created_at, a.id
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(entries)
    }
}
