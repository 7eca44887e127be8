use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// No credentials or proxies are available; never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The credential at `credential_index` is rate-limited, unauthorized or
    /// out of credit.
    #[error("credential #{credential_index} rejected ({}): {detail}", status_label(*.status))]
    QuotaOrAuth {
        credential_index: usize,
        status: Option<u16>,
        detail: String,
    },

    /// A non-quota upstream failure; aborts the rotation pass.
    #[error("upstream failure on credential #{credential_index} ({}): {detail}", status_label(*.status))]
    UpstreamHard {
        credential_index: usize,
        status: Option<u16>,
        detail: String,
    },

    /// Every credential was rejected; `last` is the final
    /// [`ScraperError::QuotaOrAuth`] of the pass.
    #[error("all {attempts} credentials exhausted; last error: {last}")]
    AllCredentialsExhausted {
        attempts: usize,
        #[source]
        last: Box<ScraperError>,
    },

    #[error("all {attempts} proxies failed; last error: {last}")]
    AllProxiesFailed { attempts: usize, last: String },

    #[error("invalid product URL: {0}")]
    InvalidProductUrl(#[from] afflink_core::LinkError),
}

impl ScraperError {
    /// Returns `true` for errors raised by an upstream fetch (as opposed to
    /// configuration or input problems).
    #[must_use]
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            ScraperError::Http(_)
                | ScraperError::QuotaOrAuth { .. }
                | ScraperError::UpstreamHard { .. }
                | ScraperError::AllCredentialsExhausted { .. }
                | ScraperError::AllProxiesFailed { .. }
        )
    }
}

fn status_label(status: Option<u16>) -> String {
    status.map_or_else(|| "no response".to_owned(), |s| format!("HTTP {s}"))
}
