//! Best-effort product data extraction from a product page.
//!
//! Title and price are each recovered through an ordered list of named
//! [`Strategy`] functions; the first one producing a plausible value wins.
//! Extraction never fails: anything no strategy can determine stays absent.

pub(crate) mod html;
pub mod price;
pub mod recommendations;
pub mod title;

use std::sync::LazyLock;

use afflink_core::{extract_asin, is_valid_asin, ExtractedProduct};
use regex::Regex;

pub use price::{extract_price, format_eur, normalize_price, parse_price_amount};
pub use recommendations::extract_recommendations;
pub use title::extract_title;

/// A named extraction step.
pub struct Strategy<T> {
    pub name: &'static str,
    pub run: fn(&str) -> Option<T>,
}

/// Runs `strategies` in order and returns the first hit with the name of the
/// strategy that produced it.
#[must_use]
pub fn first_match<T>(html: &str, strategies: &[Strategy<T>]) -> Option<(&'static str, T)> {
    strategies
        .iter()
        .find_map(|s| (s.run)(html).map(|value| (s.name, value)))
}

static ASIN_INPUT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<input\b[^>]*\b(?:id|name)\s*=\s*["']ASIN["'][^>]*\bvalue\s*=\s*["']([A-Z0-9]{10})["']"#)
        .expect("valid asin input regex")
});
static DP_CONTAINER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<div\b[^>]*\bid\s*=\s*["']dp["'][^>]*\bdata-asin\s*=\s*["']([A-Z0-9]{10})["']"#)
        .expect("valid dp container regex")
});
static CANONICAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<link\b[^>]*\brel\s*=\s*["']canonical["'][^>]*\bhref\s*=\s*["']([^"']+)["']"#)
        .expect("valid canonical link regex")
});

/// Identifier of the page's own product, read from the hidden `ASIN` input,
/// the `dp` container, or the canonical link.
#[must_use]
pub fn extract_page_asin(html: &str) -> Option<String> {
    let from_markup = [&*ASIN_INPUT_RE, &*DP_CONTAINER_RE]
        .into_iter()
        .find_map(|re| re.captures(html))
        .map(|cap| cap[1].to_ascii_uppercase())
        .filter(|a| is_valid_asin(a));

    from_markup.or_else(|| {
        CANONICAL_RE
            .captures(html)
            .and_then(|cap| extract_asin(&cap[1]))
    })
}

/// Extracts title, price and recommendations from a product page.
///
/// `main_asin` identifies the page's own product; it is excluded from the
/// recommendations and used for the placeholder title. When absent it is
/// read from the page.
#[must_use]
pub fn extract_product(html: &str, main_asin: Option<&str>) -> ExtractedProduct {
    let page_asin = main_asin
        .map(str::to_ascii_uppercase)
        .or_else(|| extract_page_asin(html));

    let title = extract_title(html, page_asin.as_deref());
    let price_amount = extract_price(html);
    let price = price_amount.map(format_eur);
    let recommendations = extract_recommendations(html, page_asin.as_deref());

    tracing::debug!(
        asin = page_asin.as_deref().unwrap_or("unknown"),
        has_title = title.is_some(),
        has_price = price.is_some(),
        recommendations = recommendations.len(),
        "product extraction finished"
    );

    ExtractedProduct {
        title,
        price,
        price_amount,
        recommendations,
    }
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
