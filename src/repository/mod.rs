//! Database repository layer

pub mod account_repo;
pub mod audit_repo;
pub mod memory;
pub mod reset_repo;
pub mod role_repo;

pub use account_repo::*;
pub use audit_repo::*;
pub use memory::MemoryStore;
pub use reset_repo::*;
pub use role_repo::*;

use sqlx::PgPool;
use std::sync::Arc;

/// 存储集合：各服务共享的仓储句柄
#[derive(Clone)]
pub struct Store {
    pub accounts: Arc<dyn AccountRepository>,
    pub roles: Arc<dyn RoleRepository>,
    pub audit: Arc<dyn AuditRepository>,
    pub resets: Arc<dyn ResetRepository>,
}

impl Store {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        roles: Arc<dyn RoleRepository>,
        audit: Arc<dyn AuditRepository>,
        resets: Arc<dyn ResetRepository>,
    ) -> Self {
        Self {
            accounts,
            roles,
            audit,
            resets,
        }
    }

    pub fn postgres(db: PgPool) -> Self {
        Self {
            accounts: Arc::new(PgAccountRepository::new(db.clone())),
            roles: Arc::new(PgRoleRepository::new(db.clone())),
            audit: Arc::new(PgAuditRepository::new(db.clone())),
            resets: Arc::new(PgResetRepository::new(db)),
        }
    }

    /// 所有仓储共享同一份内存状态
    pub fn in_memory() -> Self {
        let memory = Arc::new(MemoryStore::new());
        Self {
            accounts: memory.clone(),
            roles: memory.clone(),
            audit: memory.clone(),
            resets: memory,
        }
    }
}
