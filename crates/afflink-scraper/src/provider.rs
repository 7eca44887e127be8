//! Upstream request URLs and decoding of provider response shapes.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Deserialize;

use crate::error::ScraperError;

/// Characters left unescaped when a target URL is embedded in a query value.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Placeholder replaced by the encoded target URL in proxy templates.
pub const URL_PLACEHOLDER: &str = "{url}";

/// Percent-encodes `target` for use as a single query-parameter value.
#[must_use]
pub fn encode_target(target: &str) -> String {
    utf8_percent_encode(target, QUERY_VALUE).to_string()
}

/// Scraping-service endpoint: base URL plus the names of the query
/// parameters that carry the credential and the target URL.
#[derive(Debug, Clone)]
pub struct UpstreamEndpoint {
    base: reqwest::Url,
    key_param: String,
    url_param: String,
}

impl UpstreamEndpoint {
    /// # Errors
    ///
    /// Returns [`ScraperError::Configuration`] if `base` is not an absolute URL.
    pub fn new(base: &str, key_param: &str, url_param: &str) -> Result<Self, ScraperError> {
        let base = reqwest::Url::parse(base).map_err(|e| {
            ScraperError::Configuration(format!("invalid scraper endpoint \"{base}\": {e}"))
        })?;
        Ok(Self {
            base,
            key_param: key_param.to_owned(),
            url_param: url_param.to_owned(),
        })
    }

    /// Request URL for one attempt: existing base query pairs are kept, then
    /// the credential and the target are appended.
    pub(crate) fn request_url(&self, credential: &str, target: &str) -> reqwest::Url {
        let mut url = self.base.clone();
        url.query_pairs_mut()
            .append_pair(&self.key_param, credential)
            .append_pair(&self.url_param, target);
        url
    }
}

/// Builds a proxy request URL from a template.
///
/// `{url}` is replaced by the encoded target; templates without the
/// placeholder get the encoded target appended.
#[must_use]
pub fn proxy_request_url(template: &str, target: &str) -> String {
    let encoded = encode_target(target);
    if template.contains(URL_PLACEHOLDER) {
        template.replace(URL_PLACEHOLDER, &encoded)
    } else {
        format!("{template}{encoded}")
    }
}

/// JSON envelopes known to wrap the page HTML, tried in declaration order.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Envelope {
    Contents { contents: String },
    Html { html: String },
    Body { body: String },
    Data { data: String },
}

/// A decoded provider response.
#[derive(Debug)]
pub enum ProviderPayload {
    /// HTML unwrapped from a JSON envelope.
    Envelope(String),
    /// Anything else, taken as the page itself.
    Raw(String),
}

impl ProviderPayload {
    #[must_use]
    pub fn decode(body: String) -> Self {
        let trimmed = body.trim_start();
        if trimmed.starts_with('{') {
            if let Ok(envelope) = serde_json::from_str::<Envelope>(trimmed) {
                let html = match envelope {
                    Envelope::Contents { contents } => contents,
                    Envelope::Html { html } => html,
                    Envelope::Body { body } => body,
                    Envelope::Data { data } => data,
                };
                return ProviderPayload::Envelope(html);
            }
        }
        ProviderPayload::Raw(body)
    }

    #[must_use]
    pub fn into_html(self) -> String {
        match self {
            ProviderPayload::Envelope(html) | ProviderPayload::Raw(html) => html,
        }
    }
}
