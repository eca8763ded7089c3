// In-memory GrantStore used by tests and local dry runs.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::{GrantStore, StoredGrant, UpsertGrant};

#[derive(Default)]
pub struct MemoryGrantStore {
    grants: Mutex<HashMap<String, StoredGrant>>,
    // Fingerprints whose writes should fail, for partial-failure tests.
    fail_on: HashSet<String>,
}

impl MemoryGrantStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write for `fingerprint` return an error.
    pub fn with_failure_on(mut self, fingerprint: &str) -> Self {
        self.fail_on.insert(fingerprint.to_string());
        self
    }

    pub fn len(&self) -> usize {
        self.grants.lock().expect("store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_failure(&self, fingerprint: &str) -> Result<()> {
        if self.fail_on.contains(fingerprint) {
            return Err(StoreError::Other(format!(
                "injected failure for {fingerprint}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl GrantStore for MemoryGrantStore {
    async fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<StoredGrant>> {
        let grants = self.grants.lock().expect("store lock poisoned");
        Ok(grants.get(fingerprint).cloned())
    }

    async fn insert(&self, grant: &UpsertGrant) -> Result<()> {
        self.check_failure(&grant.fingerprint)?;
        let now = Utc::now();
        let row = StoredGrant {
            id: Uuid::new_v4(),
            fingerprint: grant.fingerprint.clone(),
            name: grant.name.clone(),
            provider: grant.provider.clone(),
            provider_type: grant.provider_type.clone(),
            amount_min: grant.amount_min,
            amount_max: grant.amount_max,
            deadline: grant.deadline.clone(),
            description: grant.description.clone(),
            sectors: grant.sectors.clone(),
            stages: grant.stages.clone(),
            eligibility: grant.eligibility.clone(),
            url: grant.url.clone(),
            contact_email: grant.contact_email.clone(),
            is_active: grant.is_active,
            source_url: grant.source_url.clone(),
            source_name: grant.source_name.clone(),
            created_at: now,
            updated_at: now,
        };
        self.grants
            .lock()
            .expect("store lock poisoned")
            .insert(grant.fingerprint.clone(), row);
        Ok(())
    }

    async fn update(&self, grant: &UpsertGrant) -> Result<()> {
        self.check_failure(&grant.fingerprint)?;
        let mut grants = self.grants.lock().expect("store lock poisoned");
        let existing = grants
            .get_mut(&grant.fingerprint)
            .ok_or_else(|| StoreError::Other(format!("no grant for {}", grant.fingerprint)))?;

        existing.name = grant.name.clone();
        existing.provider = grant.provider.clone();
        existing.provider_type = grant.provider_type.clone();
        existing.amount_min = grant.amount_min;
        existing.amount_max = grant.amount_max;
        existing.deadline = grant.deadline.clone();
        existing.description = grant.description.clone();
        existing.sectors = grant.sectors.clone();
        existing.stages = grant.stages.clone();
        existing.eligibility = grant.eligibility.clone();
        existing.url = grant.url.clone();
        existing.contact_email = grant.contact_email.clone();
        existing.is_active = grant.is_active;
        existing.source_url = grant.source_url.clone();
        existing.source_name = grant.source_name.clone();
        existing.updated_at = Utc::now();
        Ok(())
    }
}
