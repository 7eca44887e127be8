//! Fan-out fetch over public CORS proxies.
//!
//! Proxies are tried one at a time in a per-call shuffled order. Each attempt
//! is bounded by its own timeout, and a response is only accepted when it
//! looks like a real product page rather than a block or captcha page.

use std::time::Duration;

use rand::seq::SliceRandom;
use reqwest::Client;

use crate::error::ScraperError;
use crate::provider::{proxy_request_url, ProviderPayload};

/// Bodies shorter than this are never a full product page.
pub const MIN_PLAUSIBLE_HTML_LEN: usize = 500;

/// Lower-cased fragments found on bot-check and block pages.
const BLOCK_PAGE_MARKERS: [&str; 6] = [
    "captcha",
    "unusual traffic",
    "robot check",
    "not a robot",
    "are you a robot",
    "/errors/validatecaptcha",
];

/// Fetches pages through an unordered set of public proxy URL templates.
pub struct ProxyFanout {
    client: Client,
    templates: Vec<String>,
    attempt_timeout: Duration,
}

impl ProxyFanout {
    /// Creates a fan-out over `templates` (see [`proxy_request_url`]).
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Configuration`]: `templates` is empty.
    /// - [`ScraperError::Http`]: the `reqwest::Client` cannot be built.
    pub fn new(
        templates: Vec<String>,
        attempt_timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, ScraperError> {
        if templates.is_empty() {
            return Err(ScraperError::Configuration(
                "no proxy endpoints configured (AFFLINK_PROXY_ENDPOINTS)".to_owned(),
            ));
        }
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            templates,
            attempt_timeout,
        })
    }

    /// Number of configured proxies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Fetches `target_url` through the first proxy that returns a plausible page.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::AllProxiesFailed`] after every proxy failed,
    /// timed out, or returned an implausible body.
    pub async fn fetch(&self, target_url: &str) -> Result<String, ScraperError> {
        let mut order: Vec<&str> = self.templates.iter().map(String::as_str).collect();
        order.shuffle(&mut rand::rng());

        let mut attempts = 0usize;
        let mut last = String::from("no proxy attempted");

        for template in order {
            attempts += 1;
            let url = proxy_request_url(template, target_url);

            match tokio::time::timeout(self.attempt_timeout, self.attempt(&url)).await {
                Ok(Ok(html)) => {
                    tracing::info!(proxy = template, attempts, target_url, "proxy fetch succeeded");
                    return Ok(html);
                }
                Ok(Err(reason)) => {
                    tracing::debug!(proxy = template, reason = %reason, "proxy attempt rejected");
                    last = format!("{template}: {reason}");
                }
                Err(_) => {
                    tracing::debug!(
                        proxy = template,
                        timeout_secs = self.attempt_timeout.as_secs(),
                        "proxy attempt timed out"
                    );
                    last = format!(
                        "{template}: timed out after {}s",
                        self.attempt_timeout.as_secs()
                    );
                }
            }
        }

        tracing::warn!(attempts, target_url, "all proxies failed");
        Err(ScraperError::AllProxiesFailed { attempts, last })
    }

    async fn attempt(&self, url: &str) -> Result<String, String> {
        let response = self
            .client
            .get(url)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/json;q=0.9,*/*;q=0.8",
            )
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {}", status.as_u16()));
        }

        let body = response.text().await.map_err(|e| e.to_string())?;
        let html = ProviderPayload::decode(body).into_html();
        check_plausible(&html)?;
        Ok(html)
    }
}

/// Rejects empty, implausibly short and block-page bodies.
pub(crate) fn check_plausible(html: &str) -> Result<(), String> {
    let trimmed = html.trim();
    if trimmed.len() < MIN_PLAUSIBLE_HTML_LEN {
        return Err(format!("body too short ({} bytes)", trimmed.len()));
    }
    let lowered = trimmed.to_lowercase();
    if let Some(marker) = BLOCK_PAGE_MARKERS.iter().find(|m| lowered.contains(*m)) {
        return Err(format!("block page detected (\"{marker}\")"));
    }
    Ok(())
}
