//! Fingerprint deduplication across the flattened per-source results.
//!
//! First occurrence wins, deliberately: sources are processed in their
//! configured order and a later duplicate sighting within the same run
//! carries no new information, so it is discarded before storage.

use std::collections::HashSet;

use tracing::debug;

use grantwatch_common::GrantRecord;

/// Single pass over arrival order; retains a record only if its
/// fingerprint has not been seen earlier in this run. Relative order of
/// first occurrences is preserved.
pub fn dedupe(records: Vec<GrantRecord>) -> Vec<GrantRecord> {
    let mut seen: HashSet<String> = HashSet::with_capacity(records.len());
    let mut unique = Vec::with_capacity(records.len());

    for record in records {
        if seen.insert(record.fingerprint.clone()) {
            unique.push(record);
        } else {
            debug!(
                name = record.name.as_str(),
                provider = record.provider.as_str(),
                source = record.source_name.as_str(),
                "Duplicate fingerprint discarded"
            );
        }
    }

    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::record;

    #[test]
    fn first_occurrence_wins() {
        let mut a = record("Seed Grant", "Agency X");
        a.description = "from source one".into();
        let mut b = record("Seed Grant", "Agency X");
        b.description = "from source two".into();

        let unique = dedupe(vec![a, b]);
        assert_eq!(unique.len(), 1);
        assert_eq!(unique[0].description, "from source one");
    }

    #[test]
    fn preserves_order_of_first_occurrences() {
        let records = vec![
            record("A", "P"),
            record("B", "P"),
            record("A", "P"),
            record("C", "P"),
            record("B", "P"),
        ];
        let names: Vec<_> = dedupe(records).into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn idempotent() {
        let records = vec![record("A", "P"), record("B", "P"), record("A", "P")];
        let once = dedupe(records);
        let names_once: Vec<_> = once.iter().map(|r| r.name.clone()).collect();
        let twice = dedupe(once);
        let names_twice: Vec<_> = twice.iter().map(|r| r.name.clone()).collect();
        assert_eq!(names_once, names_twice);
    }

    #[test]
    fn case_variants_collide() {
        let unique = dedupe(vec![record("Seed Grant", "Agency X"), record("SEED GRANT", "agency x")]);
        assert_eq!(unique.len(), 1);
    }

    #[test]
    fn empty_input() {
        assert!(dedupe(Vec::new()).is_empty());
    }
}
