use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A related product found on a product page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub asin: String,
    pub title: String,
}

/// Best-effort product data recovered from one product page.
///
/// Every field is optional: an absent value means no extraction strategy
/// produced a plausible candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedProduct {
    pub title: Option<String>,
    /// Display price, e.g. `"1.234,56 €"`.
    pub price: Option<String>,
    /// Numeric value behind `price`, rounded to two decimal places.
    pub price_amount: Option<Decimal>,
    /// Related products in page order, unique by ASIN.
    pub recommendations: Vec<Recommendation>,
}

impl ExtractedProduct {
    /// Returns `true` when no field could be determined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.price.is_none() && self.recommendations.is_empty()
    }
}

/// Which fetch path delivered the page HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchPath {
    /// Scraping service, via the credential rotation.
    ScraperApi,
    /// Public proxy fan-out.
    Proxy,
}

impl std::fmt::Display for FetchPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchPath::ScraperApi => write!(f, "scraper_api"),
            FetchPath::Proxy => write!(f, "proxy"),
        }
    }
}

/// The result of scraping one product URL, ready to be handed to a history
/// or storage collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedProduct {
    pub asin: String,
    /// Canonical `https://<host>/dp/<ASIN>` URL that was fetched.
    pub source_url: String,
    pub affiliate_url: Option<String>,
    pub product: ExtractedProduct,
    pub fetched_via: FetchPath,
    pub scraped_at: DateTime<Utc>,
}
