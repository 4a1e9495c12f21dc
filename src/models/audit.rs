//! Audit domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Audit log entry. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditEntry {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    /// Actor role at the time of the action
    pub role: Option<String>,
    pub action: String,
    pub description: String,
    pub ip_address: String,
    pub created_at: DateTime<Utc>,
}

/// Audit entry with the actor's display name resolved
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AuditEntryView {
    pub log_id: Uuid,
    pub user_id: Option<Uuid>,
    /// `None` when the actor account no longer resolves
    pub first_name: Option<String>,
    pub role: Option<String>,
    pub action: String,
    pub description: String,
    pub ip_address: String,
    pub created_at: DateTime<Utc>,
}
