pub mod error;
pub mod memory;
pub mod pg;

pub use error::{Result, StoreError};
pub use memory::MemoryGrantStore;
pub use pg::PgGrantStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A row from the grants table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredGrant {
    pub id: Uuid,
    pub fingerprint: String,
    pub name: String,
    pub provider: String,
    pub provider_type: String,
    pub amount_min: Option<f64>,
    pub amount_max: Option<f64>,
    pub deadline: Option<String>,
    pub description: String,
    pub sectors: serde_json::Value,
    pub stages: serde_json::Value,
    pub eligibility: serde_json::Value,
    pub url: String,
    pub contact_email: Option<String>,
    pub is_active: bool,
    pub source_url: String,
    pub source_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The write shape for a grant. The reconciler builds one of these per
/// record, with every optional field already resolved to an explicit
/// neutral value — the store never sees "absent".
#[derive(Debug, Clone)]
pub struct UpsertGrant {
    pub fingerprint: String,
    pub name: String,
    pub provider: String,
    pub provider_type: String,
    pub amount_min: Option<f64>,
    pub amount_max: Option<f64>,
    pub deadline: Option<String>,
    pub description: String,
    pub sectors: serde_json::Value,
    pub stages: serde_json::Value,
    pub eligibility: serde_json::Value,
    pub url: String,
    pub contact_email: Option<String>,
    pub is_active: bool,
    pub source_url: String,
    pub source_name: String,
}

/// Table-like grant persistence: point lookup by fingerprint, insert, and
/// update-by-fingerprint. The reconciler drives this one record at a time;
/// implementations own their own isolation.
#[async_trait]
pub trait GrantStore: Send + Sync {
    async fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<StoredGrant>>;

    /// Insert a new grant. Sets created_at and updated_at to now.
    async fn insert(&self, grant: &UpsertGrant) -> Result<()>;

    /// Overwrite all mutable fields of an existing grant and bump
    /// updated_at. created_at is preserved.
    async fn update(&self, grant: &UpsertGrant) -> Result<()>;
}
