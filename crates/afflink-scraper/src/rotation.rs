//! Credential-rotating fetch through a scraping service.
//!
//! Each pass walks the [`CredentialPool`] once, starting at the credential
//! that last succeeded. Quota and auth failures move on to the next
//! credential; any other failure ends the pass.

use std::time::Duration;

use reqwest::{Client, StatusCode};

use crate::attempt::{classify_failure, snippet, AttemptOutcome, FetchAttempt};
use crate::credentials::{CredentialPool, RotationState};
use crate::error::ScraperError;
use crate::provider::{ProviderPayload, UpstreamEndpoint};

/// What a network-level failure (no HTTP response) does to the pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetworkErrorPolicy {
    /// Surface the failure as [`ScraperError::UpstreamHard`].
    #[default]
    Abort,
    /// Record it like a quota error and try the next credential.
    Rotate,
}

/// Fetches pages through a scraping service, rotating API credentials.
pub struct RotatingFetcher {
    client: Client,
    endpoint: UpstreamEndpoint,
    network_errors: NetworkErrorPolicy,
}

impl RotatingFetcher {
    /// Creates a fetcher with the given request timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        endpoint: UpstreamEndpoint,
        timeout_secs: u64,
        user_agent: &str,
        network_errors: NetworkErrorPolicy,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            endpoint,
            network_errors,
        })
    }

    /// Fetches `target_url`, trying each credential of `pool` at most once.
    ///
    /// On success `state` is set to the index of the credential that worked.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::UpstreamHard`]: a non-quota failure; no further
    ///   credentials are tried.
    /// - [`ScraperError::AllCredentialsExhausted`]: every credential failed
    ///   with a quota/auth error; carries the last rejection as
    ///   [`ScraperError::QuotaOrAuth`].
    pub async fn fetch(
        &self,
        target_url: &str,
        pool: &CredentialPool,
        state: &RotationState,
    ) -> Result<String, ScraperError> {
        let start = state.cursor();
        let mut attempts = 0usize;
        let mut last: Option<FetchAttempt> = None;

        for index in pool.rotation_from(start) {
            let Some(credential) = pool.get(index) else {
                continue;
            };
            attempts += 1;

            match self.attempt(index, credential, target_url).await {
                Ok(html) => {
                    state.record_success(index);
                    tracing::info!(
                        credential_index = index,
                        attempts,
                        target_url,
                        "scraping service fetch succeeded"
                    );
                    return Ok(html);
                }
                Err(attempt) if attempt.outcome == AttemptOutcome::QuotaOrAuth => {
                    tracing::warn!(
                        credential_index = index,
                        status = attempt.http_status,
                        detail = attempt.error_detail.as_deref().unwrap_or_default(),
                        "credential rejected; rotating to next"
                    );
                    last = Some(attempt);
                }
                Err(attempt) => {
                    tracing::warn!(
                        credential_index = index,
                        status = attempt.http_status,
                        detail = attempt.error_detail.as_deref().unwrap_or_default(),
                        "upstream failure; aborting rotation"
                    );
                    return Err(attempt.into_error());
                }
            }
        }

        let last = last.unwrap_or_else(|| {
            FetchAttempt::failed(start, None, AttemptOutcome::QuotaOrAuth, "no attempt made")
        });
        Err(ScraperError::AllCredentialsExhausted {
            attempts,
            last: Box::new(last.into_error()),
        })
    }

    /// One upstream round-trip with a single credential.
    async fn attempt(
        &self,
        index: usize,
        credential: &str,
        target_url: &str,
    ) -> Result<String, FetchAttempt> {
        let url = self.endpoint.request_url(credential, target_url);
        tracing::debug!(credential_index = index, target_url, "requesting page via scraping service");

        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "text/html")
            .send()
            .await
            .map_err(|e| self.network_failure(index, credential, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.network_failure(index, credential, e))?;

        if !status.is_success() {
            let outcome = classify_failure(status.as_u16(), &body);
            return Err(FetchAttempt::failed(
                index,
                Some(status.as_u16()),
                outcome,
                redact(&failure_detail(status, &body), credential),
            ));
        }

        let html = ProviderPayload::decode(body).into_html();
        if html.trim().is_empty() {
            return Err(FetchAttempt::failed(
                index,
                Some(status.as_u16()),
                AttemptOutcome::Hard,
                "empty response body",
            ));
        }
        Ok(html)
    }

    fn network_failure(
        &self,
        index: usize,
        credential: &str,
        err: reqwest::Error,
    ) -> FetchAttempt {
        let outcome = match self.network_errors {
            NetworkErrorPolicy::Abort => AttemptOutcome::Hard,
            NetworkErrorPolicy::Rotate => AttemptOutcome::QuotaOrAuth,
        };
        FetchAttempt::failed(index, None, outcome, redact(&network_detail(err), credential))
    }
}

/// Error text of a request failure and its causes, without the request URL.
///
/// The request URL carries the credential as a query parameter.
fn network_detail(err: reqwest::Error) -> String {
    let err = err.without_url();
    let mut detail = err.to_string();
    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        let text = cause.to_string();
        if !detail.contains(&text) {
            detail.push_str(": ");
            detail.push_str(&text);
        }
        source = std::error::Error::source(cause);
    }
    detail
}

/// Masks every occurrence of `credential` in `detail`.
fn redact(detail: &str, credential: &str) -> String {
    if credential.is_empty() {
        return detail.to_owned();
    }
    detail.replace(credential, "[redacted]")
}

fn failure_detail(status: StatusCode, body: &str) -> String {
    let text = snippet(body);
    if text.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_owned()
    } else {
        text
    }
}
