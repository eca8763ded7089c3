use anyhow::{Context, Result};
use async_trait::async_trait;
use spider_transformations::transformation::content::{
    transform_content_input, ReturnFormat, TransformConfig, TransformInput,
};
use tracing::{info, warn};

use ai_client::util::truncate_to_char_boundary;

/// Rendered-page fetch seam. Returns best-effort text content — markdown
/// when Readability extraction produced something usable, raw markup
/// otherwise, and an empty string when the page gave nothing.
#[async_trait]
pub trait PageScraper: Send + Sync {
    async fn scrape(&self, url: &str) -> Result<String>;
    fn name(&self) -> &str;
}

/// Below this, Readability output is considered junk and we fall back to
/// the raw HTML.
const MIN_MARKDOWN_LEN: usize = 100;
/// Cap on raw-HTML fallback content handed downstream.
const MAX_HTML_FALLBACK_LEN: usize = 50_000;

/// Scraper that renders via Browserless, then runs Readability extraction
/// for clean markdown. Grant portals are JS-heavy; a plain GET returns
/// skeleton pages.
pub struct BrowserlessScraper {
    client: browserless_client::BrowserlessClient,
}

impl BrowserlessScraper {
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        info!(base_url, "Using BrowserlessScraper");
        Self {
            client: browserless_client::BrowserlessClient::new(base_url, token),
        }
    }
}

#[async_trait]
impl PageScraper for BrowserlessScraper {
    async fn scrape(&self, url: &str) -> Result<String> {
        info!(url, scraper = "browserless", "Scraping URL");

        let html = self
            .client
            .content(url)
            .await
            .context("Browserless content request failed")?;

        if html.is_empty() {
            warn!(url, scraper = "browserless", "Empty HTML response");
            return Ok(String::new());
        }

        let parsed_url = url::Url::parse(url).ok();
        let config = TransformConfig {
            readability: true,
            main_content: true,
            return_format: ReturnFormat::Markdown,
            filter_images: true,
            filter_svg: true,
            clean_html: true,
        };
        let input = TransformInput {
            url: parsed_url.as_ref(),
            content: html.as_bytes(),
            screenshot_bytes: None,
            encoding: None,
            selector_config: None,
            ignore_tags: None,
        };

        let markdown = transform_content_input(input, &config);

        if markdown.trim().len() >= MIN_MARKDOWN_LEN {
            info!(
                url,
                scraper = "browserless",
                bytes = markdown.len(),
                "Scraped successfully"
            );
            return Ok(markdown);
        }

        // Readability stripped too much — hand the model raw markup instead.
        warn!(
            url,
            scraper = "browserless",
            markdown_bytes = markdown.trim().len(),
            "Thin markdown, falling back to raw HTML"
        );
        Ok(truncate_to_char_boundary(&html, MAX_HTML_FALLBACK_LEN).to_string())
    }

    fn name(&self) -> &str {
        "browserless"
    }
}
