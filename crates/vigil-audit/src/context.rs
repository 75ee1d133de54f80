//! Immutable per-run audit context.

use crate::fetcher::FetchResult;
use std::sync::Arc;
use vigil_core::RunId;

/// Snapshot of everything analyzers may read for one run.
///
/// Each pipeline step derives a new snapshot instead of mutating this one, so
/// nothing here is shared between runs.
#[derive(Debug, Clone)]
pub struct AuditContext {
    run_id: RunId,
    input_url: String,
    normalized_url: String,
    fetch: Option<Arc<FetchResult>>,
}

impl AuditContext {
    /// Start a context before anything has been fetched.
    #[must_use]
    pub fn new(run_id: RunId, input_url: impl Into<String>, normalized_url: impl Into<String>) -> Self {
        Self {
            run_id,
            input_url: input_url.into(),
            normalized_url: normalized_url.into(),
            fetch: None,
        }
    }

    /// Derive a context carrying the fetch outcome.
    #[must_use]
    pub fn with_fetch(self, fetch: FetchResult) -> Self {
        Self {
            fetch: Some(Arc::new(fetch)),
            ..self
        }
    }

    /// Run being processed.
    #[must_use]
    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// URL as submitted.
    #[must_use]
    pub fn input_url(&self) -> &str {
        &self.input_url
    }

    /// Canonical URL the fetch starts from.
    #[must_use]
    pub fn normalized_url(&self) -> &str {
        &self.normalized_url
    }

    /// Fetch outcome, absent before the fetch step.
    #[must_use]
    pub fn fetch(&self) -> Option<&FetchResult> {
        self.fetch.as_deref()
    }

    /// Non-blank response body.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.fetch()
            .and_then(|f| f.body.as_deref())
            .filter(|b| !b.trim().is_empty())
    }

    /// Final URL, falling back to the normalized URL.
    #[must_use]
    pub fn final_url(&self) -> &str {
        self.fetch()
            .map(|f| f.final_url.as_str())
            .filter(|u| !u.is_empty())
            .unwrap_or(&self.normalized_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_fetch_derives_new_snapshot() {
        let base = AuditContext::new(RunId::generate(), "example.com", "https://example.com/");
        assert!(base.fetch().is_none());
        assert_eq!(base.final_url(), "https://example.com/");

        let fetched = base.clone().with_fetch(FetchResult {
            final_url: "https://www.example.com/".to_string(),
            status_code: 200,
            body: Some("   ".to_string()),
            ..FetchResult::default()
        });

        assert!(base.fetch().is_none());
        assert_eq!(fetched.final_url(), "https://www.example.com/");
        assert_eq!(fetched.run_id(), base.run_id());
        assert!(fetched.body().is_none(), "blank body counts as missing");
    }
}
