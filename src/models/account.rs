//! Account domain models

use super::role::Role;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

static PHONE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 \-]{5,19}$").expect("phone regex is valid"));

/// User account
///
/// Deliberately not `Serialize`: responses go through [`AccountResponse`],
/// which has no password hash field.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Account {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub profile_picture: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Assigned roles, oldest assignment first.
    #[sqlx(skip)]
    pub roles: Vec<Role>,
}

impl Account {
    /// The role used for token claims and role gates.
    ///
    /// Accounts carry a role set, but every call site works with a single
    /// role: the earliest assignment wins.
    pub fn primary_role(&self) -> Option<&Role> {
        self.roles.first()
    }

    pub fn primary_role_name(&self) -> Option<&str> {
        self.primary_role().map(|r| r.name.as_str())
    }
}

/// Fields needed to insert a new account
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
}

/// Register / admin-create request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(regex(path = *PHONE_REGEX))]
    pub phone: String,
    #[validate(length(min = 1, max = 50))]
    pub role: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

impl RegisterRequest {
    pub fn into_new_account(self, password_hash: String) -> NewAccount {
        NewAccount {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            password_hash,
        }
    }
}

/// Profile update (self or admin)
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(regex(path = *PHONE_REGEX))]
    pub phone: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AdminUpdateProfileRequest {
    pub user_id: Uuid,
    #[serde(flatten)]
    #[validate(nested)]
    pub profile: UpdateProfileRequest,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateRoleRequest {
    pub user_id: Uuid,
    #[validate(length(min = 1, max = 50))]
    pub role_name: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    #[validate(length(min = 1, max = 128))]
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AdminChangePasswordRequest {
    pub user_id: Uuid,
    #[validate(length(min = 1, max = 128))]
    pub new_password: String,
}

/// Account response (without sensitive data)
#[derive(Debug, Clone, Serialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub profile_picture: Option<String>,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            first_name: account.first_name,
            last_name: account.last_name,
            email: account.email,
            phone: account.phone,
            profile_picture: account.profile_picture,
            roles: account.roles.into_iter().map(|r| r.name).collect(),
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}
