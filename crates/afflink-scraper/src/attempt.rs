//! Per-attempt bookkeeping and upstream failure classification.

use crate::error::ScraperError;

/// Body fragments (matched case-insensitively) that mark a failed response as
/// a quota/credit/auth problem of the credential itself.
const QUOTA_TOKENS: [&str; 5] = ["credit", "quota", "exceeded", "limit", "no credits"];

/// Outcome class of one upstream attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The credential is unusable right now; rotation continues.
    QuotaOrAuth,
    /// Any other failure; rotation aborts.
    Hard,
}

impl std::fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptOutcome::QuotaOrAuth => write!(f, "quota_or_auth_error"),
            AttemptOutcome::Hard => write!(f, "hard_error"),
        }
    }
}

/// Record of a single credential attempt within one rotation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchAttempt {
    pub credential_index: usize,
    /// `None` when no HTTP response was received.
    pub http_status: Option<u16>,
    pub outcome: AttemptOutcome,
    pub error_detail: Option<String>,
}

impl FetchAttempt {
    pub(crate) fn failed(
        credential_index: usize,
        http_status: Option<u16>,
        outcome: AttemptOutcome,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            credential_index,
            http_status,
            outcome,
            error_detail: Some(detail.into()),
        }
    }

    /// Converts a failed attempt into the matching per-attempt error.
    pub(crate) fn into_error(self) -> ScraperError {
        let detail = self.error_detail.unwrap_or_default();
        match self.outcome {
            AttemptOutcome::QuotaOrAuth => ScraperError::QuotaOrAuth {
                credential_index: self.credential_index,
                status: self.http_status,
                detail,
            },
            AttemptOutcome::Hard => ScraperError::UpstreamHard {
                credential_index: self.credential_index,
                status: self.http_status,
                detail,
            },
        }
    }
}

impl std::fmt::Display for FetchAttempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "credential #{} {}", self.credential_index, self.outcome)?;
        if let Some(status) = self.http_status {
            write!(f, " (HTTP {status})")?;
        }
        if let Some(detail) = &self.error_detail {
            write!(f, ": {detail}")?;
        }
        Ok(())
    }
}

/// Classifies a non-2xx response.
///
/// 401, 403 and 429 are always quota/auth errors; any other status is one
/// only when the body carries a quota token.
pub(crate) fn classify_failure(status: u16, body: &str) -> AttemptOutcome {
    if matches!(status, 401 | 403 | 429) || mentions_quota(body) {
        AttemptOutcome::QuotaOrAuth
    } else {
        AttemptOutcome::Hard
    }
}

pub(crate) fn mentions_quota(body: &str) -> bool {
    let lowered = body.to_lowercase();
    QUOTA_TOKENS.iter().any(|t| lowered.contains(t))
}

/// Shortens a response body for error details.
pub(crate) fn snippet(body: &str) -> String {
    const MAX_CHARS: usize = 160;
    let collapsed = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= MAX_CHARS {
        collapsed
    } else {
        let cut: String = collapsed.chars().take(MAX_CHARS).collect();
        format!("{cut}…")
    }
}
