//! Vigil Audit - single-URL audit pipeline.
//!
//! This crate fetches a page, runs the content analyzers over it, scores the
//! findings and stores a versioned report as the run's result.
//!
//! # Features
//!
//! - Bounded, explicit redirect following with per-hop recording
//! - HTTP, HTML and technology analyzers as pure functions over an immutable context
//! - Confidence-scored Next.js detection
//! - Every claimed run ends `COMPLETED` or `FAILED`, never stuck mid-pipeline
//! - Best-effort public report publication after completion
//!
//! # Example
//!
//! ```rust,ignore
//! use vigil_audit::{default_analyzers, AuditOrchestrator, AuditService, HttpFetcher};
//! use vigil_scoring::ScorePolicyV1;
//! use std::sync::Arc;
//!
//! let orchestrator = AuditOrchestrator::new(
//!     Arc::clone(&db),
//!     Arc::new(HttpFetcher::new(&config.fetcher)?),
//!     default_analyzers(),
//!     Arc::new(ScorePolicyV1::new()),
//! );
//! let service = AuditService::new(db, Arc::new(orchestrator));
//!
//! service.create_audit("https://example.com").await?;
//! service.process_next_queued_run().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod analyzers;
pub mod context;
#[allow(missing_docs)]
pub mod error;
pub mod fetcher;
pub mod orchestrator;
pub mod service;

// Re-export commonly used types
pub use analyzers::{default_analyzers, ContentAnalyzer, HtmlAnalyzer, HttpAnalyzer, TechAnalyzer};
pub use context::AuditContext;
pub use error::{AuditError, Result};
pub use fetcher::{FetchResult, HttpFetcher, PageFetcher};
pub use orchestrator::{AuditOrchestrator, RunOutcome};
pub use service::{AuditService, ProcessedRun, RunStatusView};
