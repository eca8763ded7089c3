//! Fake collaborators for pipeline tests. Compiled only for tests and the
//! `test-support` feature.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use grantwatch_common::{fingerprint, Eligibility, GrantRecord, SourceKind};

use crate::extractor::CompletionModel;
use crate::liveness::{LinkProber, Verdict};
use crate::scraper::PageScraper;

/// Build a minimal valid pipeline record for a name/provider pair.
pub fn record(name: &str, provider: &str) -> GrantRecord {
    GrantRecord {
        name: name.to_string(),
        provider: provider.to_string(),
        amount_min: None,
        amount_max: None,
        deadline: None,
        description: String::new(),
        sectors: Vec::new(),
        stages: Vec::new(),
        eligibility: Eligibility::default(),
        application_url: None,
        contact_email: None,
        is_active: true,
        source_url: "https://source.example.com".to_string(),
        source_name: "Test Source".to_string(),
        source_kind: SourceKind::Government,
        fingerprint: fingerprint(name, provider),
    }
}

/// Completion model that replays a queue of canned responses.
pub struct ScriptedModel {
    responses: Mutex<Vec<String>>,
    failure: Option<String>,
}

impl ScriptedModel {
    pub fn new(mut responses: Vec<String>) -> Self {
        // Pop from the back; store reversed so responses replay in order.
        responses.reverse();
        Self {
            responses: Mutex::new(responses),
            failure: None,
        }
    }

    /// A model whose every call fails with the given message.
    pub fn failing(message: &str) -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            failure: Some(message.to_string()),
        }
    }
}

#[async_trait]
impl CompletionModel for ScriptedModel {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        if let Some(ref message) = self.failure {
            return Err(anyhow!("{message}"));
        }
        self.responses
            .lock()
            .expect("scripted model lock poisoned")
            .pop()
            .ok_or_else(|| anyhow!("ScriptedModel ran out of responses"))
    }
}

/// Scraper that serves fixed content per URL. Unknown URLs error like a
/// failed fetch.
#[derive(Default)]
pub struct StaticScraper {
    pages: HashMap<String, String>,
}

impl StaticScraper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, content: &str) -> Self {
        self.pages.insert(url.to_string(), content.to_string());
        self
    }
}

#[async_trait]
impl PageScraper for StaticScraper {
    async fn scrape(&self, url: &str) -> Result<String> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("fetch failed for {url}"))
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Prober with fixed verdicts per URL; unknown URLs default to Live.
#[derive(Default)]
pub struct FixedProber {
    verdicts: HashMap<String, Verdict>,
}

impl FixedProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verdict(mut self, url: &str, verdict: Verdict) -> Self {
        self.verdicts.insert(url.to_string(), verdict);
        self
    }
}

#[async_trait]
impl LinkProber for FixedProber {
    async fn probe(&self, url: &str) -> Verdict {
        self.verdicts.get(url).copied().unwrap_or(Verdict::Live)
    }
}
