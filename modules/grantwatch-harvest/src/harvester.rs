use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, warn};

use grantwatch_common::{DeadLink, GrantRecord};
use grantwatch_store::GrantStore;

use crate::dedup;
use crate::extractor::{CompletionModel, Extractor};
use crate::liveness::{self, LinkProber};
use crate::reconcile::{self, ReconcileStats};
use crate::scraper::PageScraper;
use crate::sources::{grant_sources, GrantSource};

/// Sources render + extract concurrently up to this bound; results are
/// still assembled in configured source order so dedup stays
/// deterministic.
const MAX_CONCURRENT_SOURCES: usize = 3;

/// Default overall run deadline. Sources not started when it passes are
/// recorded as errors; work already completed still flows to
/// reconciliation.
const RUN_DEADLINE: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    Success,
    Error,
}

/// Per-source outcome for the run summary.
#[derive(Debug, Clone, Serialize)]
pub struct SourceOutcome {
    pub source: String,
    pub grants_found: u32,
    pub rejected: u32,
    pub status: SourceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceOutcome {
    fn failed(source: &GrantSource, error: String) -> Self {
        Self {
            source: source.name.to_string(),
            grants_found: 0,
            rejected: 0,
            status: SourceStatus::Error,
            error: Some(error),
        }
    }
}

/// Summary of one harvest run. Serialized as JSON by the HTTP trigger and
/// Display-formatted by the CLI.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    /// Unique grants across all sources after deduplication.
    pub total_grants_found: u32,
    /// Grants surviving the liveness filter, i.e. what reached storage.
    pub live_grants: u32,
    pub dead_links: Vec<DeadLink>,
    pub sources: Vec<SourceOutcome>,
    pub reconcile: ReconcileStats,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Harvest Run Complete ===")?;
        writeln!(f, "Unique grants found: {}", self.total_grants_found)?;
        writeln!(f, "Live grants:         {}", self.live_grants)?;
        writeln!(f, "Dead links:          {}", self.dead_links.len())?;
        writeln!(f, "Created:             {}", self.reconcile.created)?;
        writeln!(f, "Updated:             {}", self.reconcile.updated)?;
        writeln!(f, "Store errors:        {}", self.reconcile.errors)?;
        writeln!(f, "\nBy source:")?;
        for outcome in &self.sources {
            match outcome.status {
                SourceStatus::Success => {
                    writeln!(f, "  {}: {} grants", outcome.source, outcome.grants_found)?
                }
                SourceStatus::Error => writeln!(
                    f,
                    "  {}: error ({})",
                    outcome.source,
                    outcome.error.as_deref().unwrap_or("unknown")
                )?,
            }
        }
        for link in &self.dead_links {
            writeln!(f, "  dead: {} [{}] {}", link.name, link.provider, link.url)?;
        }
        Ok(())
    }
}

/// Sequences one harvest run: per-source extract → flatten → dedupe →
/// liveness filter → reconcile → summary. Every collaborator comes in
/// through a seam so the whole run is testable without a network.
pub struct Harvester {
    scraper: Box<dyn PageScraper>,
    extractor: Extractor,
    prober: Box<dyn LinkProber>,
    store: Box<dyn GrantStore>,
    run_deadline: Duration,
}

impl Harvester {
    pub fn new(
        scraper: Box<dyn PageScraper>,
        model: Box<dyn CompletionModel>,
        prober: Box<dyn LinkProber>,
        store: Box<dyn GrantStore>,
    ) -> Self {
        Self {
            scraper,
            extractor: Extractor::new(model),
            prober,
            store,
            run_deadline: RUN_DEADLINE,
        }
    }

    /// Override the default run deadline.
    pub fn with_run_deadline(mut self, deadline: Duration) -> Self {
        self.run_deadline = deadline;
        self
    }

    /// Run a full harvest across all configured sources.
    ///
    /// Component failures are contained and reported in the summary; Err
    /// here means the orchestrator itself could not proceed, which is the
    /// only fatal condition an invocation surfaces.
    pub async fn run(&self) -> Result<RunSummary> {
        let started_at = Utc::now();
        let deadline = Instant::now() + self.run_deadline;
        let sources = grant_sources();

        info!(sources = sources.len(), "Starting harvest run");

        // `buffered` (not buffer_unordered) keeps results in configured
        // source order — first-occurrence-wins dedup depends on it.
        // Collected into a Vec before streaming to work around
        // rust-lang/rust#102211 (spurious "not general enough" errors
        // when the stream is polled from a spawned task).
        let source_futures: Vec<_> = sources
            .iter()
            .map(|source| self.harvest_source(source, deadline))
            .collect();
        let per_source: Vec<(SourceOutcome, Vec<GrantRecord>)> = stream::iter(source_futures)
            .buffered(MAX_CONCURRENT_SOURCES)
            .collect()
            .await;

        let mut outcomes = Vec::with_capacity(per_source.len());
        let mut all_records = Vec::new();
        for (outcome, records) in per_source {
            outcomes.push(outcome);
            all_records.extend(records);
        }

        let unique = dedup::dedupe(all_records);
        let total_grants_found = unique.len() as u32;
        info!(total = total_grants_found, "Unique grants after dedup");

        let (live, dead_links) = liveness::filter_live(unique, self.prober.as_ref()).await;
        info!(
            live = live.len(),
            dead = dead_links.len(),
            "Liveness filtering complete"
        );

        let stats = reconcile::reconcile(&live, self.store.as_ref()).await;

        Ok(RunSummary {
            started_at,
            total_grants_found,
            live_grants: live.len() as u32,
            dead_links,
            sources: outcomes,
            reconcile: stats,
        })
    }

    async fn harvest_source(
        &self,
        source: &GrantSource,
        deadline: Instant,
    ) -> (SourceOutcome, Vec<GrantRecord>) {
        if Instant::now() >= deadline {
            warn!(source = source.name, "Run deadline exceeded, skipping source");
            return (
                SourceOutcome::failed(source, "run deadline exceeded".to_string()),
                Vec::new(),
            );
        }

        let content = match self.scraper.scrape(source.url).await {
            Ok(c) => c,
            Err(e) => {
                warn!(source = source.name, error = %e, "Fetch failed");
                return (
                    SourceOutcome::failed(source, format!("fetch failed: {e:#}")),
                    Vec::new(),
                );
            }
        };

        let result = self.extractor.extract(source, &content).await;

        let outcome = SourceOutcome {
            source: source.name.to_string(),
            grants_found: result.grants.len() as u32,
            rejected: result.rejected.len() as u32,
            status: match result.error {
                None => SourceStatus::Success,
                Some(_) => SourceStatus::Error,
            },
            error: result.error,
        };
        (outcome, result.grants)
    }
}
