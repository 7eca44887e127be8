//! Command handlers. Results go to stdout; logs go to stderr.

use std::path::Path;

use afflink_core::{AppConfig, ProductLink};
use afflink_scraper::{extract::extract_product, ProductScraper, RotationState};

/// Prints the affiliate link for `url` (a product URL or bare ASIN).
///
/// # Errors
///
/// Returns an error if no tag is available or the input is not a product link.
pub(crate) fn run_link(config: &AppConfig, url: &str, tag: Option<&str>) -> anyhow::Result<()> {
    let tag = tag
        .or(config.affiliate_tag.as_deref())
        .ok_or_else(|| anyhow::anyhow!("no affiliate tag: pass --tag or set AFFLINK_AFFILIATE_TAG"))?;
    let link = ProductLink::resolve(url, &config.marketplace_domain)?;
    println!("{}", link.affiliate_url(tag)?);
    Ok(())
}

/// Scrapes one product and prints it as pretty JSON.
///
/// # Errors
///
/// Returns an error if the scraper cannot be configured or the fetch fails.
pub(crate) async fn run_scrape(config: &AppConfig, url: &str) -> anyhow::Result<()> {
    let scraper = ProductScraper::from_config(config)?;
    let state = RotationState::default();

    let result = scraper.scrape(url, &state).await.map_err(|e| {
        if e.is_upstream() {
            tracing::error!(error = %e, "scrape failed");
            anyhow::Error::new(e).context("product page temporarily unavailable, try again later")
        } else {
            anyhow::Error::new(e)
        }
    })?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Extracts title, price and recommendations from a saved HTML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub(crate) fn run_extract(file: &Path, asin: Option<&str>) -> anyhow::Result<()> {
    let html = std::fs::read_to_string(file)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", file.display()))?;
    let product = extract_product(&html, asin);
    if product.is_empty() {
        tracing::warn!(file = %file.display(), "nothing could be extracted");
    }
    println!("{}", serde_json::to_string_pretty(&product)?);
    Ok(())
}
