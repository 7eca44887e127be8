//! End-to-end product scraping: link resolution, fetch path selection and
//! extraction.

use std::time::Duration;

use afflink_core::{AppConfig, FetchPath, ProductLink, ScrapedProduct};

use crate::credentials::{CredentialPool, RotationState};
use crate::error::ScraperError;
use crate::extract::extract_product;
use crate::provider::UpstreamEndpoint;
use crate::proxy::ProxyFanout;
use crate::rotation::{NetworkErrorPolicy, RotatingFetcher};

/// Fetches and extracts product pages.
///
/// The scraping service is the primary fetch path; the proxy fan-out is used
/// when no credentials are configured or after every credential was
/// rejected for quota or auth reasons. Hard upstream failures are surfaced
/// without falling back.
pub struct ProductScraper {
    scraping_service: Option<(RotatingFetcher, CredentialPool)>,
    proxies: Option<ProxyFanout>,
    marketplace_domain: String,
    affiliate_tag: Option<String>,
}

impl ProductScraper {
    #[must_use]
    pub fn new(
        scraping_service: Option<(RotatingFetcher, CredentialPool)>,
        proxies: Option<ProxyFanout>,
        marketplace_domain: impl Into<String>,
        affiliate_tag: Option<String>,
    ) -> Self {
        Self {
            scraping_service,
            proxies,
            marketplace_domain: marketplace_domain.into(),
            affiliate_tag,
        }
    }

    /// Builds the fetch paths described by `config`. Either path may be
    /// absent; [`ProductScraper::scrape`] reports a configuration error when
    /// both are.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Configuration`]: the scraping service endpoint is
    ///   not a valid URL.
    /// - [`ScraperError::Http`]: an HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, ScraperError> {
        let scraping_service = if config.scraper_api_keys.is_empty() {
            None
        } else {
            let endpoint = UpstreamEndpoint::new(
                &config.scraper_endpoint,
                &config.scraper_key_param,
                &config.scraper_url_param,
            )?;
            let policy = if config.rotate_on_network_error {
                NetworkErrorPolicy::Rotate
            } else {
                NetworkErrorPolicy::Abort
            };
            let fetcher = RotatingFetcher::new(
                endpoint,
                config.scraper_request_timeout_secs,
                &config.scraper_user_agent,
                policy,
            )?;
            let pool = CredentialPool::new(config.scraper_api_keys.iter().cloned())?;
            Some((fetcher, pool))
        };

        let proxies = if config.proxy_endpoints.is_empty() {
            None
        } else {
            Some(ProxyFanout::new(
                config.proxy_endpoints.clone(),
                Duration::from_secs(config.proxy_attempt_timeout_secs),
                &config.scraper_user_agent,
            )?)
        };

        tracing::info!(
            credentials = scraping_service.as_ref().map_or(0, |(_, pool)| pool.len()),
            proxies = proxies.as_ref().map_or(0, ProxyFanout::len),
            marketplace = %config.marketplace_domain,
            "product scraper configured"
        );

        Ok(Self::new(
            scraping_service,
            proxies,
            config.marketplace_domain.clone(),
            config.affiliate_tag.clone(),
        ))
    }

    /// Returns `true` when at least one fetch path is configured.
    #[must_use]
    pub fn has_fetch_path(&self) -> bool {
        self.scraping_service.is_some() || self.proxies.is_some()
    }

    #[must_use]
    pub fn marketplace_domain(&self) -> &str {
        &self.marketplace_domain
    }

    #[must_use]
    pub fn affiliate_tag(&self) -> Option<&str> {
        self.affiliate_tag.as_deref()
    }

    /// Resolves a product URL or bare ASIN against the configured marketplace.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidProductUrl`] when `input` is neither.
    pub fn resolve_link(&self, input: &str) -> Result<ProductLink, ScraperError> {
        Ok(ProductLink::resolve(input, &self.marketplace_domain)?)
    }

    /// Fetches the raw HTML of `target_url` and reports which path served it.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Configuration`]: no fetch path is configured.
    /// - [`ScraperError::UpstreamHard`]: the scraping service failed for a
    ///   non-quota reason.
    /// - [`ScraperError::AllCredentialsExhausted`]: every credential was
    ///   rejected and no proxies are configured.
    /// - [`ScraperError::AllProxiesFailed`]: the proxy fan-out found no
    ///   usable page.
    pub async fn fetch_page(
        &self,
        target_url: &str,
        state: &RotationState,
    ) -> Result<(String, FetchPath), ScraperError> {
        if let Some((fetcher, pool)) = &self.scraping_service {
            match fetcher.fetch(target_url, pool, state).await {
                Ok(html) => return Ok((html, FetchPath::ScraperApi)),
                Err(err @ ScraperError::AllCredentialsExhausted { .. }) => {
                    let Some(proxies) = &self.proxies else {
                        return Err(err);
                    };
                    tracing::warn!(error = %err, target_url, "falling back to proxy fan-out");
                    let html = proxies.fetch(target_url).await?;
                    return Ok((html, FetchPath::Proxy));
                }
                Err(err) => return Err(err),
            }
        }

        match &self.proxies {
            Some(proxies) => {
                let html = proxies.fetch(target_url).await?;
                Ok((html, FetchPath::Proxy))
            }
            None => Err(ScraperError::Configuration(
                "no fetch path configured: set AFFLINK_SCRAPER_API_KEYS or AFFLINK_PROXY_ENDPOINTS"
                    .to_owned(),
            )),
        }
    }

    /// Scrapes one product given its URL or ASIN.
    ///
    /// # Errors
    ///
    /// [`ScraperError::InvalidProductUrl`] for unusable input, otherwise any
    /// error of [`ProductScraper::fetch_page`]. Extraction itself never fails.
    pub async fn scrape(
        &self,
        input: &str,
        state: &RotationState,
    ) -> Result<ScrapedProduct, ScraperError> {
        let link = self.resolve_link(input)?;
        let source_url = link.canonical_url();

        let (html, fetched_via) = self.fetch_page(&source_url, state).await?;
        let product = extract_product(&html, Some(link.asin()));

        let affiliate_url = self.affiliate_tag.as_deref().and_then(|tag| {
            link.affiliate_url(tag)
                .map_err(|e| tracing::warn!(error = %e, "configured affiliate tag rejected"))
                .ok()
        });

        tracing::info!(
            asin = link.asin(),
            fetched_via = %fetched_via,
            has_title = product.title.is_some(),
            has_price = product.price.is_some(),
            recommendations = product.recommendations.len(),
            "product scraped"
        );

        Ok(ScrapedProduct {
            asin: link.asin().to_owned(),
            source_url,
            affiliate_url,
            product,
            fetched_via,
            scraped_at: chrono::Utc::now(),
        })
    }
}
