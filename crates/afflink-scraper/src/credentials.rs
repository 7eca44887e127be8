//! Credential pool and the shared rotation cursor.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::ScraperError;

/// Ordered, non-empty set of scraping-service API keys.
///
/// Immutable after construction. `Debug` never prints the keys.
#[derive(Clone)]
pub struct CredentialPool {
    keys: Vec<String>,
}

impl CredentialPool {
    /// Builds a pool from configured keys, dropping blank entries.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Configuration`] when no non-blank key remains.
    pub fn new<I, S>(keys: I) -> Result<Self, ScraperError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys
            .into_iter()
            .map(Into::into)
            .map(|k| k.trim().to_owned())
            .filter(|k| !k.is_empty())
            .collect();

        if keys.is_empty() {
            return Err(ScraperError::Configuration(
                "no scraping API credentials configured (AFFLINK_SCRAPER_API_KEYS)".to_owned(),
            ));
        }
        Ok(Self { keys })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub(crate) fn get(&self, index: usize) -> Option<&str> {
        self.keys.get(index).map(String::as_str)
    }

    /// Credential indices for one pass: `start`, `start + 1`, … wrapping
    /// around, each index exactly once.
    pub(crate) fn rotation_from(&self, start: usize) -> impl Iterator<Item = usize> {
        let len = self.keys.len();
        let start = if start < len { start } else { 0 };
        (0..len).map(move |offset| (start + offset) % len)
    }
}

impl std::fmt::Debug for CredentialPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialPool")
            .field("keys", &format_args!("[{} redacted]", self.keys.len()))
            .finish()
    }
}

/// Index of the last credential that succeeded.
///
/// Owned by the caller and shared by reference between rotation passes.
/// Reads and writes are plain loads and stores: two concurrent passes may
/// start from the same index and the last successful one wins. Wrap the
/// state in a mutex around whole passes if serialized access is needed.
#[derive(Debug, Default)]
pub struct RotationState {
    cursor: AtomicUsize,
}

impl RotationState {
    #[must_use]
    pub fn new(cursor: usize) -> Self {
        Self {
            cursor: AtomicUsize::new(cursor),
        }
    }

    /// Current cursor value. May be out of range for a given pool; the
    /// rotation treats an out-of-range cursor as 0.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Relaxed)
    }

    pub(crate) fn record_success(&self, index: usize) {
        self.cursor.store(index, Ordering::Relaxed);
    }
}
