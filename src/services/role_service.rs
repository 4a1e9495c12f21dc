//! 角色服务：按名称获取或创建

use crate::{error::AppError, models::role::Role, repository::RoleRepository};
use std::sync::Arc;

pub struct RoleService {
    roles: Arc<dyn RoleRepository>,
}

impl RoleService {
    pub fn new(roles: Arc<dyn RoleRepository>) -> Self {
        Self { roles }
    }

    /// 按名称获取角色，不存在时创建
    ///
    /// 并发创建同名角色时，唯一约束冲突的一方重新读取已有记录。
    pub async fn get_or_create(&self, name: &str) -> Result<Role, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("Role name must not be empty".to_string()));
        }

        if let Some(role) = self.roles.find_by_name(name).await? {
            return Ok(role);
        }

        match self.roles.create(name).await {
            Ok(role) => {
                tracing::info!(role = %role.name, "Role created");
                Ok(role)
            }
            Err(AppError::Conflict(_)) => self
                .roles
                .find_by_name(name)
                .await?
                .ok_or_else(|| AppError::Internal(format!("role {} vanished after conflict", name))),
            Err(e) => Err(e),
        }
    }

    pub async fn list_all(&self) -> Result<Vec<Role>, AppError> {
        self.roles.list().await
    }
}
