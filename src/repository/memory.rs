//! In-memory store
//!
//! Implements every repository trait over one shared state, with the same
//! unique constraints as the Postgres schema. Used by the test suite and for
//! running the service without a database.

use super::{AccountRepository, AuditRepository, ResetRepository, RoleRepository};
use crate::{
    error::AppError,
    models::{
        account::{Account, NewAccount, UpdateProfileRequest},
        audit::{AuditEntry, AuditEntryView},
        auth::PasswordReset,
        role::Role,
    },
};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Default)]
struct MemoryState {
    /// Stored without roles; see `bindings`
    accounts: Vec<Account>,
    roles: Vec<Role>,
    /// (user_id, role_id) in assignment order
    bindings: Vec<(Uuid, Uuid)>,
    audit: Vec<AuditEntry>,
    resets: Vec<PasswordReset>,
}

impl MemoryState {
    fn hydrate(&self, account: &Account) -> Account {
        let mut account = account.clone();
        account.roles = self
            .bindings
            .iter()
            .filter(|(user_id, _)| *user_id == account.id)
            .filter_map(|(_, role_id)| self.roles.iter().find(|r| r.id == *role_id).cloned())
            .collect();
        account
    }

    fn unique_taken(&self, email: &str, phone: &str, except: Option<Uuid>) -> bool {
        self.accounts
            .iter()
            .filter(|a| Some(a.id) != except)
            .any(|a| a.email == email || a.phone == phone)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>, AppError> {
        self.state
            .lock()
            .map_err(|_| AppError::Internal("memory store lock poisoned".to_string()))
    }
}

fn duplicate() -> AppError {
    AppError::Conflict("Duplicate value for a unique field".to_string())
}

#[async_trait]
impl AccountRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        let state = self.state()?;
        Ok(state
            .accounts
            .iter()
            .find(|a| a.id == id)
            .map(|a| state.hydrate(a)))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let state = self.state()?;
        Ok(state
            .accounts
            .iter()
            .find(|a| a.email == email)
            .map(|a| state.hydrate(a)))
    }

    async fn list(&self) -> Result<Vec<Account>, AppError> {
        let state = self.state()?;
        Ok(state.accounts.iter().map(|a| state.hydrate(a)).collect())
    }

    async fn create(&self, new: &NewAccount, role: &Role) -> Result<Account, AppError> {
        let mut state = self.state()?;

        if state.unique_taken(&new.email, &new.phone, None) {
            return Err(duplicate());
        }
        if !state.roles.iter().any(|r| r.id == role.id) {
            return Err(AppError::Internal(format!("role {} does not exist", role.id)));
        }

        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            email: new.email.clone(),
            phone: new.phone.clone(),
            password_hash: new.password_hash.clone(),
            profile_picture: None,
            created_at: now,
            updated_at: now,
            roles: Vec::new(),
        };

        state.bindings.push((account.id, role.id));
        state.accounts.push(account.clone());

        Ok(Account {
            roles: vec![role.clone()],
            ..account
        })
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: &UpdateProfileRequest,
    ) -> Result<Option<Account>, AppError> {
        let mut state = self.state()?;

        if !state.accounts.iter().any(|a| a.id == id) {
            return Ok(None);
        }
        if state.unique_taken(&update.email, &update.phone, Some(id)) {
            return Err(duplicate());
        }

        let index = state
            .accounts
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| AppError::Internal("account vanished under lock".to_string()))?;

        let account = &mut state.accounts[index];
        account.first_name = update.first_name.clone();
        account.last_name = update.last_name.clone();
        account.email = update.email.clone();
        account.phone = update.phone.clone();
        account.updated_at = Utc::now();

        let updated = state.accounts[index].clone();
        Ok(Some(state.hydrate(&updated)))
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, AppError> {
        let mut state = self.state()?;
        match state.accounts.iter_mut().find(|a| a.id == id) {
            Some(account) => {
                account.password_hash = password_hash.to_string();
                account.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_role(&self, id: Uuid, role: &Role) -> Result<bool, AppError> {
        let mut state = self.state()?;

        match state.accounts.iter_mut().find(|a| a.id == id) {
            Some(account) => account.updated_at = Utc::now(),
            None => return Ok(false),
        }

        state.bindings.retain(|(user_id, _)| *user_id != id);
        state.bindings.push((id, role.id));
        Ok(true)
    }
}

#[async_trait]
impl RoleRepository for MemoryStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, AppError> {
        let state = self.state()?;
        Ok(state.roles.iter().find(|r| r.name == name).cloned())
    }

    async fn create(&self, name: &str) -> Result<Role, AppError> {
        let mut state = self.state()?;

        if state.roles.iter().any(|r| r.name == name) {
            return Err(duplicate());
        }

        let role = Role::new(name);
        state.roles.push(role.clone());
        Ok(role)
    }

    async fn list(&self) -> Result<Vec<Role>, AppError> {
        let state = self.state()?;
        let mut roles = state.roles.clone();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }
}

#[async_trait]
impl AuditRepository for MemoryStore {
    async fn insert(&self, entry: &AuditEntry) -> Result<(), AppError> {
        self.state()?.audit.push(entry.clone());
        Ok(())
    }

    async fn list_with_actor(&self) -> Result<Vec<AuditEntryView>, AppError> {
        let state = self.state()?;

        Ok(state
            .audit
            .iter()
            .map(|entry| AuditEntryView {
                log_id: entry.id,
                user_id: entry.user_id,
                first_name: entry.user_id.and_then(|id| {
                    state
                        .accounts
                        .iter()
                        .find(|a| a.id == id)
                        .map(|a| a.first_name.clone())
                }),
                role: entry.role.clone(),
                action: entry.action.clone(),
                description: entry.description.clone(),
                ip_address: entry.ip_address.clone(),
                created_at: entry.created_at,
            })
            .collect())
    }
}

#[async_trait]
impl ResetRepository for MemoryStore {
    async fn insert(&self, reset: &PasswordReset) -> Result<(), AppError> {
        self.state()?.resets.push(reset.clone());
        Ok(())
    }

    async fn find_by_code_hash(&self, code_hash: &str) -> Result<Option<PasswordReset>, AppError> {
        let state = self.state()?;
        Ok(state
            .resets
            .iter()
            .rev()
            .find(|r| r.code_hash == code_hash)
            .cloned())
    }
}
