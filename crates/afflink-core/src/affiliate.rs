//! Amazon product identifiers (ASINs) and affiliate-tagged links.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::LinkError;

/// Length of an Amazon Standard Identification Number.
pub const ASIN_LEN: usize = 10;

static PATH_ASIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)/(?:dp|gp/product|gp/aw/d|exec/obidos/asin|o/asin|product-reviews)/([a-z0-9]{10})(?:[/?#]|$)",
    )
    .expect("valid asin path regex")
});

const SHORT_LINK_HOSTS: [&str; 3] = ["amzn.to", "amzn.eu", "a.co"];

/// Returns `true` for a 10-character uppercase alphanumeric identifier.
#[must_use]
pub fn is_valid_asin(candidate: &str) -> bool {
    candidate.len() == ASIN_LEN
        && candidate
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

/// Extracts the ASIN from an Amazon product URL.
///
/// Recognizes `/dp/`, `/gp/product/`, `/gp/aw/d/`, `/exec/obidos/ASIN/`,
/// `/o/ASIN/`, `/product-reviews/` paths and an `asin` query parameter.
/// The identifier is returned upper-cased.
#[must_use]
pub fn extract_asin(url: &str) -> Option<String> {
    if let Some(cap) = PATH_ASIN_RE.captures(url) {
        return cap.get(1).map(|m| m.as_str().to_ascii_uppercase());
    }

    let parsed = Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(k, _)| k.eq_ignore_ascii_case("asin"))
        .map(|(_, v)| v.to_ascii_uppercase())
        .filter(|v| is_valid_asin(v))
}

/// A validated Amazon product URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductLink {
    host: String,
    asin: String,
}

impl ProductLink {
    /// Parses and validates a product URL.
    ///
    /// # Errors
    ///
    /// - [`LinkError::InvalidUrl`]: not an absolute http(s) URL.
    /// - [`LinkError::ShortLink`]: `amzn.to`-style links need expanding first.
    /// - [`LinkError::UnsupportedHost`]: host is not an Amazon marketplace.
    /// - [`LinkError::MissingAsin`]: no ASIN in the path or query.
    pub fn parse(raw: &str) -> Result<Self, LinkError> {
        let trimmed = raw.trim();
        let url = Url::parse(trimmed).map_err(|e| LinkError::InvalidUrl {
            url: trimmed.to_owned(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(LinkError::InvalidUrl {
                url: trimmed.to_owned(),
                reason: format!("unsupported scheme \"{}\"", url.scheme()),
            });
        }

        let host = url
            .host_str()
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| LinkError::InvalidUrl {
                url: trimmed.to_owned(),
                reason: "missing host".to_owned(),
            })?;

        if SHORT_LINK_HOSTS.contains(&host.as_str()) {
            return Err(LinkError::ShortLink {
                url: trimmed.to_owned(),
            });
        }

        if !is_amazon_host(&host) {
            return Err(LinkError::UnsupportedHost { host });
        }

        let asin = extract_asin(trimmed).ok_or_else(|| LinkError::MissingAsin {
            url: trimmed.to_owned(),
        })?;

        Ok(Self { host, asin })
    }

    /// Builds a link for `asin` on the given marketplace host.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::MissingAsin`] if `asin` is not a valid identifier.
    pub fn from_asin(host: &str, asin: &str) -> Result<Self, LinkError> {
        let asin = asin.trim().to_ascii_uppercase();
        if !is_valid_asin(&asin) {
            return Err(LinkError::MissingAsin { url: asin });
        }
        Ok(Self {
            host: host.trim().to_ascii_lowercase(),
            asin,
        })
    }

    /// Accepts either a product URL or a bare ASIN; bare identifiers are
    /// placed on `default_host`.
    ///
    /// # Errors
    ///
    /// Same as [`ProductLink::parse`] for anything that is not a bare ASIN.
    pub fn resolve(input: &str, default_host: &str) -> Result<Self, LinkError> {
        let trimmed = input.trim();
        if trimmed.len() == ASIN_LEN && is_valid_asin(&trimmed.to_ascii_uppercase()) {
            return Self::from_asin(default_host, trimmed);
        }
        Self::parse(trimmed)
    }

    #[must_use]
    pub fn asin(&self) -> &str {
        &self.asin
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// `https://<host>/dp/<ASIN>` with tracking parameters dropped.
    #[must_use]
    pub fn canonical_url(&self) -> String {
        format!("https://{}/dp/{}", self.host, self.asin)
    }

    /// Canonical URL with the affiliate `tag` query parameter.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::InvalidTag`] for empty tags or tags containing
    /// anything other than ASCII alphanumerics and `-`.
    pub fn affiliate_url(&self, tag: &str) -> Result<String, LinkError> {
        let tag = tag.trim();
        let valid = !tag.is_empty()
            && tag
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-');
        if !valid {
            return Err(LinkError::InvalidTag(tag.to_owned()));
        }
        Ok(format!("{}?tag={tag}", self.canonical_url()))
    }
}

/// `amazon.<tld>` / `www.amazon.<tld>` / `smile.amazon.<tld>`, including
/// two-part TLDs like `amazon.co.uk`.
fn is_amazon_host(host: &str) -> bool {
    let bare = host
        .strip_prefix("www.")
        .or_else(|| host.strip_prefix("smile."))
        .or_else(|| host.strip_prefix("m."))
        .unwrap_or(host);
    bare.strip_prefix("amazon.")
        .is_some_and(|tld| !tld.is_empty() && tld.split('.').all(|p| !p.is_empty()))
}

#[cfg(test)]
#[path = "affiliate_test.rs"]
mod tests;
