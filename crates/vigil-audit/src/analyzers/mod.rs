//! Content analyzers.
//!
//! Analyzers are pure: they read an [`AuditContext`] and return one
//! [`ModuleResult`]. They never fail; missing input degrades to a WARN
//! finding so the other modules still run.

pub mod html;
pub mod http;
pub mod nextjs;
pub mod tech;

use crate::context::AuditContext;
use std::sync::Arc;
use std::time::Instant;
use vigil_core::ModuleResult;

pub use html::HtmlAnalyzer;
pub use http::HttpAnalyzer;
pub use tech::TechAnalyzer;

/// One pluggable audit module.
pub trait ContentAnalyzer: Send + Sync {
    /// Id of the module this analyzer produces.
    fn module_id(&self) -> &'static str;

    /// Analyze the context.
    fn analyze(&self, ctx: &AuditContext) -> ModuleResult;
}

/// The standard analyzer chain, in report order.
#[must_use]
pub fn default_analyzers() -> Vec<Arc<dyn ContentAnalyzer>> {
    vec![
        Arc::new(HttpAnalyzer),
        Arc::new(HtmlAnalyzer),
        Arc::new(TechAnalyzer),
    ]
}

pub(crate) fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
