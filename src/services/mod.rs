//! Business logic services layer

pub mod access_service;
pub mod account_service;
pub mod audit_service;
pub mod auth_service;
pub mod role_service;

pub use access_service::AccessService;
pub use account_service::AccountService;
pub use audit_service::{AuditAction, AuditService};
pub use auth_service::AuthService;
pub use role_service::RoleService;
