pub mod service;
pub mod store;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tenant metadata, written exactly once at registration and never
/// updated by this service.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TenantRecord {
    pub tenant_id: Uuid,
    pub tenant_name: String,
    pub tenant_tier: String,
    pub fullname: String,
}
