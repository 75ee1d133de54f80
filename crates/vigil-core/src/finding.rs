//! The atomic unit produced by analyzers.

use crate::types::{FindingStatus, Severity};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One stably-keyed observation about the audited page.
///
/// Keys are namespaced by module (`http.security.hsts`, `html.title`, ...)
/// and must never be renamed once reports have been published, since the
/// scoring policy and stored reports refer to them.
///
/// `scorable`, `weight` and the policy part of `tags` are filled in by the
/// score enricher; analyzers leave them at their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    /// Stable, namespaced key
    pub key: String,
    /// Human-readable label
    pub title: String,
    /// Outcome of the check
    pub status: FindingStatus,
    /// Importance when not passing
    pub severity: Severity,
    /// Whether the finding counts towards the score
    pub scorable: bool,
    /// Weight in the score (0 when not scorable)
    pub weight: u32,
    /// Classification tags
    pub tags: Vec<String>,
    /// Primary measured value
    pub value: Value,
    /// Supporting data
    pub details: Value,
    /// Explanation of the outcome
    pub message: Option<String>,
    /// What to do about it
    pub recommendation: Option<String>,
}

impl Finding {
    /// Create an unscored finding with no value.
    #[must_use]
    pub fn new(
        key: impl Into<String>,
        title: impl Into<String>,
        status: FindingStatus,
        severity: Severity,
    ) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            status,
            severity,
            scorable: false,
            weight: 0,
            tags: Vec::new(),
            value: Value::Null,
            details: Value::Object(serde_json::Map::new()),
            message: None,
            recommendation: None,
        }
    }

    /// Set the measured value.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = value.into();
        self
    }

    /// Set the supporting details.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Set the explanation.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Set the recommendation, if any.
    #[must_use]
    pub fn with_recommendation<S: Into<String>>(mut self, recommendation: Option<S>) -> Self {
        self.recommendation = recommendation.map(Into::into);
        self
    }

    /// Whether `details` carries anything worth showing.
    #[must_use]
    pub fn has_details(&self) -> bool {
        match &self.details {
            Value::Null => false,
            Value::Object(map) => !map.is_empty(),
            Value::Array(items) => !items.is_empty(),
            _ => true,
        }
    }
}
