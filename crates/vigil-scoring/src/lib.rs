//! Vigil Scoring
//!
//! Turns analyzer findings into numbers in three steps:
//!
//! 1. [`ScorePolicy`] maps `(module id, finding key)` to a [`ScoreRule`]
//!    (scorable, weight, tags). The policy carries a version that is stamped
//!    into every report.
//! 2. [`enrich_modules`] applies the policy to every finding. `INFO` findings
//!    are never scored, whatever the policy says.
//! 3. [`aggregate`] computes per-finding scores and rolls them up globally,
//!    per module and per tag.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod aggregator;
pub mod enricher;
pub mod policy;

// Re-export commonly used types
pub use aggregator::{aggregate, status_ratio};
pub use enricher::{enrich_finding, enrich_modules};
pub use policy::{ScorePolicy, ScorePolicyV1, ScoreRule};
