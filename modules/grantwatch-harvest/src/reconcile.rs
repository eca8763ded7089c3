//! Upsert of pipeline output into the grant store.
//!
//! Each record is an independent operation, not part of a transaction: a
//! storage error on one grant is logged and counted, and the rest of the
//! batch proceeds. Lookup and write both key on the fingerprint.

use serde::Serialize;
use tracing::{info, warn};

use grantwatch_common::GrantRecord;
use grantwatch_store::{GrantStore, UpsertGrant};

#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct ReconcileStats {
    pub created: u32,
    pub updated: u32,
    pub errors: u32,
}

/// Merge live, validated, deduplicated records into the store.
pub async fn reconcile(records: &[GrantRecord], store: &dyn GrantStore) -> ReconcileStats {
    let mut stats = ReconcileStats::default();

    for record in records {
        let row = to_row(record);

        let outcome = match store.find_by_fingerprint(&record.fingerprint).await {
            Ok(Some(_)) => store.update(&row).await.map(|_| &mut stats.updated),
            Ok(None) => store.insert(&row).await.map(|_| &mut stats.created),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(counter) => *counter += 1,
            Err(e) => {
                warn!(name = record.name.as_str(), error = %e, "Failed to upsert grant");
                stats.errors += 1;
            }
        }
    }

    info!(
        created = stats.created,
        updated = stats.updated,
        errors = stats.errors,
        "Reconciliation complete"
    );
    stats
}

/// Resolve a pipeline record into the write shape. Missing optional
/// fields become explicit neutral values here, so downstream consumers
/// never distinguish "absent" from "not yet extracted".
fn to_row(record: &GrantRecord) -> UpsertGrant {
    let description = if record.description.trim().is_empty() {
        "No description available".to_string()
    } else {
        record.description.clone()
    };

    let url = record.effective_url().unwrap_or_default().to_string();

    UpsertGrant {
        fingerprint: record.fingerprint.clone(),
        name: record.name.clone(),
        provider: record.provider.clone(),
        provider_type: record.source_kind.provider_type().to_string(),
        amount_min: record.amount_min,
        amount_max: record.amount_max,
        deadline: record.deadline.clone(),
        description,
        sectors: serde_json::json!(record.sectors),
        stages: serde_json::json!(record.stages),
        eligibility: serde_json::to_value(&record.eligibility)
            .unwrap_or_else(|_| serde_json::json!({})),
        url,
        contact_email: record.contact_email.clone(),
        is_active: record.is_active,
        source_url: record.source_url.clone(),
        source_name: record.source_name.clone(),
    }
}
