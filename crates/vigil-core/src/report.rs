//! The versioned report envelope stored as a run's result.

use crate::module::{HtmlData, ModuleResult, TechData};
use crate::types::FindingStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version of the report layout. Bump on any breaking field change.
pub const REPORT_SCHEMA_VERSION: u32 = 2;

/// Generator string stamped into report metadata.
pub const GENERATOR: &str = concat!("vigil/", env!("CARGO_PKG_VERSION"));

/// Score and maximum score for one aggregation scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreAggregate {
    /// Scope id (`global`, a module id, or a tag)
    pub id: String,
    /// Points earned
    pub score: f64,
    /// Points available
    pub max_score: f64,
    /// `score / max_score`, 0 when nothing is available
    pub ratio: f64,
}

impl ScoreAggregate {
    /// Build an aggregate, deriving the ratio.
    #[must_use]
    pub fn of(id: impl Into<String>, score: f64, max_score: f64) -> Self {
        let ratio = if max_score > 0.0 {
            (score / max_score).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            id: id.into(),
            score,
            max_score,
            ratio,
        }
    }
}

/// Per-finding scoring outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredCheck {
    /// Finding key
    pub key: String,
    /// Owning module
    pub module_id: String,
    /// Finding status
    pub status: FindingStatus,
    /// Whether it counted
    pub scorable: bool,
    /// Effective weight
    pub weight: u32,
    /// `weight * status ratio`
    pub score: f64,
    /// Tags after enrichment
    pub tags: Vec<String>,
}

/// Scores at global, module and tag granularity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSummary {
    /// Version of the policy that produced these numbers
    pub scoring_version: u32,
    /// All scorable findings
    pub global: ScoreAggregate,
    /// One entry per module, in module order
    pub by_module: Vec<ScoreAggregate>,
    /// One entry per tag, in first-seen order
    pub by_tag: Vec<ScoreAggregate>,
    /// Every finding with its contribution
    pub checks: Vec<ScoredCheck>,
}

/// Report metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMeta {
    /// Producing software
    pub generator: String,
    /// Same as [`Report::schema_version`]
    pub schema_version: u32,
    /// Scoring policy version
    pub scoring_version: u32,
    /// Run that produced the report
    pub run_id: String,
    /// Final HTTP status, when a response was received
    pub http_status_code: Option<u16>,
}

/// Durable audit artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Layout version
    pub schema_version: u32,
    /// URL as submitted
    pub input_url: String,
    /// Canonical URL
    pub normalized_url: String,
    /// Creation time
    pub generated_at: DateTime<Utc>,
    /// Metadata
    pub meta: ReportMeta,
    /// Module results in analyzer order
    pub modules: Vec<ModuleResult>,
    /// Scores
    pub score: ScoreSummary,
}

impl Report {
    /// Find a module by id.
    #[must_use]
    pub fn module(&self, id: &str) -> Option<&ModuleResult> {
        self.modules.iter().find(|m| m.id == id)
    }

    /// HTML module data, if present.
    #[must_use]
    pub fn html(&self) -> Option<&HtmlData> {
        self.modules.iter().find_map(ModuleResult::as_html)
    }

    /// Technology module data, if present.
    #[must_use]
    pub fn tech(&self) -> Option<&TechData> {
        self.modules.iter().find_map(ModuleResult::as_tech)
    }

    /// Serialize to the stored JSON form.
    ///
    /// # Errors
    /// Returns `VigilError::Serialization` if encoding fails.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
