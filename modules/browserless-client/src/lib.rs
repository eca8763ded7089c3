pub mod error;

pub use error::{BrowserlessError, Result};

use std::time::Duration;

/// How long the browser should wait before considering a page rendered.
/// Grant portals are JS-heavy, so the default waits for the network to
/// go quiet rather than just the load event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUntil {
    Load,
    DomContentLoaded,
    NetworkIdle,
}

impl WaitUntil {
    fn as_goto_option(self) -> &'static str {
        match self {
            WaitUntil::Load => "load",
            WaitUntil::DomContentLoaded => "domcontentloaded",
            WaitUntil::NetworkIdle => "networkidle2",
        }
    }
}

/// In-page render timeout passed to the browser, separate from the outer
/// HTTP timeout on the request itself.
const PAGE_TIMEOUT_MS: u64 = 60_000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(75);

pub struct BrowserlessClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    wait_until: WaitUntil,
}

impl BrowserlessClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
            wait_until: WaitUntil::NetworkIdle,
        }
    }

    pub fn with_wait_until(mut self, wait_until: WaitUntil) -> Self {
        self.wait_until = wait_until;
        self
    }

    /// Fetch fully-rendered HTML for a URL via the Browserless /content
    /// endpoint, applying the configured render-wait policy.
    pub async fn content(&self, url: &str) -> Result<String> {
        let mut endpoint = format!("{}/content", self.base_url);
        if let Some(ref token) = self.token {
            endpoint.push_str(&format!("?token={token}"));
        }

        let body = serde_json::json!({
            "url": url,
            "gotoOptions": {
                "waitUntil": self.wait_until.as_goto_option(),
                "timeout": PAGE_TIMEOUT_MS,
            },
        });

        let resp = self
            .client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(BrowserlessError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.text().await?)
    }
}
