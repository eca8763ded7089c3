//! Dead-link filtering for harvested grants.
//!
//! The filter exists to catch definitively dead application links, not to
//! penalize slow servers or flaky DNS. Only a resolved 404 excludes a
//! record; every ambiguous outcome keeps it.

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::StatusCode;
use tracing::{info, warn};

use grantwatch_common::{DeadLink, GrantRecord};

/// Outcome of probing one URL. Only `Dead` carries consequences;
/// `Indeterminate` (timeout, DNS failure, connection refused, odd status)
/// behaves exactly like `Live`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Live,
    Dead,
    Indeterminate,
}

#[async_trait]
pub trait LinkProber: Send + Sync {
    async fn probe(&self, url: &str) -> Verdict;
}

/// Per-probe timeout. A single slow host must not stall the run.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
/// Probes are independent; this just bounds open connections.
const MAX_CONCURRENT_PROBES: usize = 8;

/// HEAD-first prober. If HEAD itself fails at the protocol level (some
/// portals reject it outright), retries once with a full GET. Redirects
/// are followed to their final status before judgment.
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(PROBE_TIMEOUT)
            .user_agent("Mozilla/5.0 (compatible; Grantwatch/1.0)")
            .build()
            .expect("Failed to build HTTP client");
        Self { client }
    }

    fn judge(status: StatusCode) -> Verdict {
        if status == StatusCode::NOT_FOUND {
            Verdict::Dead
        } else if status.is_success() || status.is_redirection() {
            Verdict::Live
        } else {
            // 403s, 500s, rate limits — ambiguous, never fatal.
            Verdict::Indeterminate
        }
    }
}

impl Default for HttpProber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LinkProber for HttpProber {
    async fn probe(&self, url: &str) -> Verdict {
        match self.client.head(url).send().await {
            Ok(resp) => Self::judge(resp.status()),
            Err(e) if e.is_timeout() => {
                warn!(url, "Probe timed out, keeping record");
                Verdict::Indeterminate
            }
            Err(head_err) => {
                // HEAD rejected at the protocol level — retry once with GET.
                warn!(url, error = %head_err, "HEAD probe failed, retrying with GET");
                match self.client.get(url).send().await {
                    Ok(resp) => Self::judge(resp.status()),
                    Err(get_err) => {
                        warn!(url, error = %get_err, "GET probe failed, keeping record");
                        Verdict::Indeterminate
                    }
                }
            }
        }
    }
}

/// Probe every record's effective URL and split the batch into kept
/// records and confirmed dead links. Probes run concurrently but share no
/// mutable state; input order of kept records is preserved.
pub async fn filter_live(
    records: Vec<GrantRecord>,
    prober: &dyn LinkProber,
) -> (Vec<GrantRecord>, Vec<DeadLink>) {
    let probed: Vec<(usize, GrantRecord, Verdict)> =
        stream::iter(records.into_iter().enumerate().map(|(i, record)| async move {
            let verdict = match record.effective_url() {
                // No URL to check — cannot be invalidated.
                None => Verdict::Live,
                Some(url) => prober.probe(url).await,
            };
            (i, record, verdict)
        }))
        .buffer_unordered(MAX_CONCURRENT_PROBES)
        .collect()
        .await;

    let mut ordered = probed;
    ordered.sort_by_key(|(i, _, _)| *i);

    let mut live = Vec::with_capacity(ordered.len());
    let mut dead = Vec::new();

    for (_, record, verdict) in ordered {
        match verdict {
            Verdict::Dead => {
                let url = record.effective_url().unwrap_or_default().to_string();
                info!(
                    name = record.name.as_str(),
                    url = url.as_str(),
                    "Filtering out grant with dead link"
                );
                dead.push(DeadLink {
                    name: record.name,
                    provider: record.provider,
                    url,
                    reason: "not found".to_string(),
                });
            }
            Verdict::Live | Verdict::Indeterminate => live.push(record),
        }
    }

    (live, dead)
}
