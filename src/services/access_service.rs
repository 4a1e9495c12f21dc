//! 角色门禁服务

use crate::{
    auth::AuthContext, error::AppError, models::account::Account, repository::AccountRepository,
};
use std::sync::Arc;

pub struct AccessService {
    accounts: Arc<dyn AccountRepository>,
}

impl AccessService {
    pub fn new(accounts: Arc<dyn AccountRepository>) -> Self {
        Self { accounts }
    }

    /// 要求调用者当前角色属于 `required`
    ///
    /// 每次都从存储重新读取账户及角色，令牌中的角色声明不参与判断。
    /// 返回最新的账户，供调用方作为审计操作者使用。
    pub async fn authorize(&self, required: &[&str], ctx: &AuthContext) -> Result<Account, AppError> {
        let account = self
            .accounts
            .find_by_id(ctx.user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("Could not validate user"))?;

        let allowed = account
            .primary_role_name()
            .is_some_and(|role| required.contains(&role));

        if !allowed {
            tracing::warn!(
                user_id = %account.id,
                role = ?account.primary_role_name(),
                required = ?required,
                "Role gate denied"
            );
            return Err(AppError::Forbidden);
        }

        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{account::NewAccount, role::ADMIN_ROLE},
        repository::{MemoryStore, RoleRepository},
    };
    use uuid::Uuid;

    async fn seeded(role: &str) -> (Arc<MemoryStore>, Account) {
        let store = Arc::new(MemoryStore::new());
        let role = RoleRepository::create(store.as_ref(), role).await.unwrap();
        let account = AccountRepository::create(
            store.as_ref(),
            &NewAccount {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                phone: "0100000001".to_string(),
                password_hash: "hash".to_string(),
            },
            &role,
        )
        .await
        .unwrap();
        (store, account)
    }

    fn context(account: &Account, claimed_role: &str) -> AuthContext {
        AuthContext {
            user_id: account.id,
            email: account.email.clone(),
            role: Some(claimed_role.to_string()),
        }
    }

    #[tokio::test]
    async fn test_admin_passes_gate() {
        let (store, account) = seeded(ADMIN_ROLE).await;
        let service = AccessService::new(store);

        let authorized = service
            .authorize(&[ADMIN_ROLE], &context(&account, ADMIN_ROLE))
            .await
            .unwrap();
        assert_eq!(authorized.id, account.id);
    }

    #[tokio::test]
    async fn test_claimed_role_is_not_trusted() {
        let (store, account) = seeded("user").await;
        let service = AccessService::new(store);

        let err = service
            .authorize(&[ADMIN_ROLE], &context(&account, ADMIN_ROLE))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }

    #[tokio::test]
    async fn test_missing_account_is_unauthorized() {
        let (store, _) = seeded(ADMIN_ROLE).await;
        let service = AccessService::new(store);

        let ghost = AuthContext {
            user_id: Uuid::new_v4(),
            email: "ghost@example.com".to_string(),
            role: Some(ADMIN_ROLE.to_string()),
        };
        let err = service.authorize(&[ADMIN_ROLE], &ghost).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
