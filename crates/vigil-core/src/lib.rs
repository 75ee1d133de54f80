//! Vigil Core - Foundation crate for the Vigil audit worker.
//!
//! This crate provides the shared domain model, error handling, configuration
//! management and URL normalization that all other Vigil crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Identifier newtypes and status enums (`RunId`, `RunStatus`, `FindingStatus`)
//! - [`finding`] - The atomic, stably-keyed check result
//! - [`module`] - Per-analyzer results with typed data shapes
//! - [`report`] - The versioned report envelope and score aggregates
//! - [`normalizer`] - Deterministic URL canonicalization
//!
//! # Example
//!
//! ```rust
//! use vigil_core::{normalize_url, AppConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! assert_eq!(config.fetcher.max_redirects, 10);
//!
//! let url = normalize_url(" https://Example.com ")?;
//! assert_eq!(url, "https://example.com/");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod finding;
pub mod module;
pub mod normalizer;
pub mod report;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, DatabaseConfig, FetcherConfig, PublishConfig, WorkerConfig};
pub use error::{ConfigError, ConfigResult, Result, VigilError};
pub use finding::Finding;
pub use module::{
    Detection, HtmlData, HttpData, ModuleData, ModuleResult, NextJsDetection, NextRouter,
    NextVersion, TechData, HTML_MODULE_ID, HTTP_MODULE_ID, TECH_MODULE_ID,
};
pub use normalizer::{extract_hostname, normalize_url};
pub use report::{
    Report, ReportMeta, ScoreAggregate, ScoreSummary, ScoredCheck, GENERATOR,
    REPORT_SCHEMA_VERSION,
};
pub use types::{FindingStatus, RunId, RunStatus, Severity, TargetId};
