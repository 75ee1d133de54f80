//! Public report shape.
//!
//! Field names are part of the public contract and serialize in camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vigil_core::{Detection, NextJsDetection};

/// Redacted, business-facing view of an audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicReport {
    pub generated_at: DateTime<Utc>,
    pub domain: String,
    pub url: String,
    pub site: Site,
    pub scores: Scores,
    pub summary: Summary,
    pub issues: Vec<Issue>,
    pub tech: Option<TechSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub title: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scores {
    /// 0-100
    pub global: u32,
    pub by_category: Vec<CategoryScore>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryScore {
    pub key: String,
    pub label: String,
    /// 0-100
    pub score: u32,
    pub issues: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub one_liner: String,
    pub priorities: Vec<Priority>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Priority {
    pub severity: PrioritySeverity,
    pub title: String,
    pub impact: String,
    pub effort: Effort,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Finding key
    pub id: String,
    pub category_key: String,
    pub module: String,
    pub severity: IssueSeverity,
    pub title: String,
    pub impact: String,
    pub evidence: Option<String>,
    pub recommendation: String,
    pub effort: Effort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Critical,
    Important,
    Info,
}

impl IssueSeverity {
    /// Sort rank, most severe first.
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::Important => 1,
            Self::Info => 2,
        }
    }

    /// Rough effort to fix.
    #[must_use]
    pub fn effort(self) -> Effort {
        match self {
            Self::Critical => Effort::M,
            Self::Important => Effort::S,
            Self::Info => Effort::Xs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrioritySeverity {
    Critical,
    Important,
    Opportunity,
}

impl From<IssueSeverity> for PrioritySeverity {
    fn from(severity: IssueSeverity) -> Self {
        match severity {
            IssueSeverity::Critical => Self::Critical,
            IssueSeverity::Important => Self::Important,
            IssueSeverity::Info => Self::Opportunity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Effort {
    Xs,
    S,
    M,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechSummary {
    pub cms: Detection,
    pub frontend_framework: Detection,
    pub next_js: NextJsDetection,
}
