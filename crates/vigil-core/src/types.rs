//! Shared types used across Vigil.
//!
//! Identifier newtypes and the small enums that travel between the run
//! store, the analyzers and the scoring layer.

use crate::error::VigilError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

fn uuid_regex() -> &'static Regex {
    static UUID_REGEX: OnceLock<Regex> = OnceLock::new();
    UUID_REGEX.get_or_init(|| {
        Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$")
            .expect("valid regex")
    })
}

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing identifier.
            ///
            /// # Errors
            /// Returns error if the ID is not a valid UUID v4.
            pub fn new(id: impl Into<String>) -> Result<Self, VigilError> {
                let id = id.into();
                if uuid_regex().is_match(&id) {
                    Ok(Self(id))
                } else {
                    Err(VigilError::Validation(format!(
                        concat!("invalid ", $label, " ID: must be a valid UUID v4, got '{}'"),
                        id
                    )))
                }
            }

            /// Create a new random identifier using UUID v4.
            #[must_use]
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// Get the inner string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

uuid_id!(
    /// Identifier of an audit run.
    RunId,
    "run"
);

uuid_id!(
    /// Identifier of a target (one per normalized URL).
    TargetId,
    "target"
);

/// Lifecycle of an audit run.
///
/// `Queued -> Running -> Completed | Failed`. The two terminal states are
/// never left once entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    /// Waiting for a worker to claim it
    Queued,
    /// Claimed by exactly one worker
    Running,
    /// Report persisted
    Completed,
    /// Aborted with a diagnostic message
    Failed,
}

impl RunStatus {
    /// Storage representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }

    /// Parse the storage representation.
    ///
    /// # Errors
    /// Returns `VigilError::Validation` for unknown values.
    pub fn parse(s: &str) -> Result<Self, VigilError> {
        match s {
            "QUEUED" => Ok(Self::Queued),
            "RUNNING" => Ok(Self::Running),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            other => Err(VigilError::Validation(format!("unknown run status '{other}'"))),
        }
    }

    /// Whether the run has reached a final state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FindingStatus {
    /// The page meets the rule
    Pass,
    /// Partially met or worth a look
    Warn,
    /// The rule is violated
    Fail,
    /// Observation only, never scored
    Info,
}

impl fmt::Display for FindingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pass => "PASS",
            Self::Warn => "WARN",
            Self::Fail => "FAIL",
            Self::Info => "INFO",
        };
        f.write_str(s)
    }
}

/// How much a non-passing finding matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Cosmetic or informational
    Low,
    /// Noticeable impact
    Medium,
    /// Blocks users or crawlers
    High,
}
