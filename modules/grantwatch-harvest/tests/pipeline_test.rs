//! Full-run test: scrape → extract → dedupe → liveness → reconcile, with
//! every collaborator faked. Only the first two configured sources get
//! pages; the rest fail to fetch and must degrade to per-source errors.

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use grantwatch_harvest::extractor::CompletionModel;
use grantwatch_harvest::harvester::{Harvester, SourceStatus};
use grantwatch_harvest::liveness::Verdict;
use grantwatch_harvest::sources::grant_sources;
use grantwatch_harvest::testing::{FixedProber, StaticScraper};
use grantwatch_store::MemoryGrantStore;

/// Model keyed on page-content markers, so responses match their source
/// regardless of which concurrent extraction reaches the model first.
struct KeyedModel {
    responses: Vec<(&'static str, &'static str)>,
}

#[async_trait]
impl CompletionModel for KeyedModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.responses
            .iter()
            .find(|(marker, _)| prompt.contains(marker))
            .map(|(_, response)| response.to_string())
            .ok_or_else(|| anyhow!("no scripted response for prompt"))
    }
}

fn page(marker: &str) -> String {
    format!("{marker} — grant scheme listings follow. {}", "Scheme details. ".repeat(20))
}

const PAGE_ONE_RESPONSE: &str = r#"[
  {"name": "Seed Grant", "provider": "Agency X",
   "description": "first sighting",
   "application_url": "https://apply.example.com/seed"},
  {"name": "Defunct Grant", "provider": "Agency Y",
   "description": "page removed long ago",
   "application_url": "https://apply.example.com/defunct"}
]"#;

// Fenced, as models often reply despite instructions; the recovery layer
// must strip it on the way through.
const PAGE_TWO_RESPONSE: &str = "```json\n[\n  {\"name\": \"Seed Grant\", \"provider\": \"Agency X\",\n   \"description\": \"second sighting\"}\n]\n```";

#[tokio::test]
async fn full_run_dedupes_filters_and_reconciles() {
    let sources = grant_sources();

    let scraper = StaticScraper::new()
        .with_page(sources[0].url, &page("PAGE_ONE"))
        .with_page(sources[1].url, &page("PAGE_TWO"));

    let model = KeyedModel {
        responses: vec![("PAGE_ONE", PAGE_ONE_RESPONSE), ("PAGE_TWO", PAGE_TWO_RESPONSE)],
    };

    let prober = FixedProber::new().with_verdict("https://apply.example.com/defunct", Verdict::Dead);

    let harvester = Harvester::new(
        Box::new(scraper),
        Box::new(model),
        Box::new(prober),
        Box::new(MemoryGrantStore::new()),
    );

    let summary = harvester.run().await.expect("run should complete");

    // Per-source outcomes stay in configured order.
    assert_eq!(summary.sources.len(), sources.len());
    assert_eq!(summary.sources[0].status, SourceStatus::Success);
    assert_eq!(summary.sources[0].grants_found, 2);
    assert_eq!(summary.sources[1].status, SourceStatus::Success);
    assert_eq!(summary.sources[1].grants_found, 1);
    for outcome in &summary.sources[2..] {
        assert_eq!(outcome.status, SourceStatus::Error);
        assert!(outcome.error.as_deref().unwrap().contains("fetch failed"));
        assert_eq!(outcome.grants_found, 0);
    }

    // Seed Grant was sighted twice; dedup keeps the first occurrence.
    assert_eq!(summary.total_grants_found, 2);

    // Defunct Grant's application link is a confirmed 404.
    assert_eq!(summary.live_grants, 1);
    assert_eq!(summary.dead_links.len(), 1);
    assert_eq!(summary.dead_links[0].name, "Defunct Grant");
    assert_eq!(summary.dead_links[0].reason, "not found");

    // Only the surviving record reaches storage.
    assert_eq!(summary.reconcile.created, 1);
    assert_eq!(summary.reconcile.updated, 0);
    assert_eq!(summary.reconcile.errors, 0);

    // The summary is what the HTTP trigger returns; it must serialize.
    let json = serde_json::to_value(&summary).expect("summary serializes");
    assert_eq!(json["sources"][2]["status"], "error");
    assert_eq!(json["total_grants_found"], 2);
}

#[tokio::test]
async fn expired_deadline_reports_every_source_and_still_reconciles() {
    // A deadline already in the past: no source may start, each must be
    // recorded as an error, and the run must still complete through
    // dedup/liveness/reconcile on the empty record set.
    let harvester = Harvester::new(
        Box::new(StaticScraper::new()),
        Box::new(KeyedModel { responses: vec![] }),
        Box::new(FixedProber::new()),
        Box::new(MemoryGrantStore::new()),
    )
    .with_run_deadline(Duration::ZERO);

    let summary = harvester.run().await.expect("run should complete");

    assert_eq!(summary.sources.len(), grant_sources().len());
    for outcome in &summary.sources {
        assert_eq!(outcome.status, SourceStatus::Error);
        assert_eq!(outcome.error.as_deref(), Some("run deadline exceeded"));
        assert_eq!(outcome.grants_found, 0);
    }

    assert_eq!(summary.total_grants_found, 0);
    assert_eq!(summary.live_grants, 0);
    assert!(summary.dead_links.is_empty());
    assert_eq!(summary.reconcile.created, 0);
    assert_eq!(summary.reconcile.updated, 0);
    assert_eq!(summary.reconcile.errors, 0);
}
