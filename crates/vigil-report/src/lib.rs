//! Vigil Report - public, token-addressed audit reports.
//!
//! A completed run's internal [`vigil_core::Report`] is reduced to a
//! business-facing [`PublicReport`]: only non-passing findings, 0-100 scores
//! and a short technology summary. The result is stored once per run behind
//! an opaque token of which only the SHA-256 is persisted.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod composer;
pub mod error;
pub mod publisher;
pub mod reader;
pub mod token;
#[allow(missing_docs)]
pub mod types;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use composer::compose;
pub use error::{ReportError, Result};
pub use publisher::{PublishOutcome, ReportPublisher};
pub use reader::ReportReader;
pub use token::{mask_token, RandomTokenIssuer, TokenIssuer};
pub use types::{
    CategoryScore, Effort, Issue, IssueSeverity, Priority, PrioritySeverity, PublicReport, Scores,
    Site, Summary, TechSummary,
};
