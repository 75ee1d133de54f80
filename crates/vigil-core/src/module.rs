//! Module results and their typed data shapes.
//!
//! Each analyzer contributes one [`ModuleResult`]. The raw data it carries is
//! a closed set of shapes ([`ModuleData`]) so downstream consumers such as the
//! public report composer read fields through typed accessors.

use crate::finding::Finding;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Module id of the HTTP analyzer.
pub const HTTP_MODULE_ID: &str = "http";
/// Module id of the HTML analyzer.
pub const HTML_MODULE_ID: &str = "html";
/// Module id of the technology analyzer.
pub const TECH_MODULE_ID: &str = "tech";

/// One analyzer's output for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleResult {
    /// Module id (`http`, `html`, `tech`)
    pub id: String,
    /// Display title
    pub title: String,
    /// One-line `key=value` summary
    pub summary: String,
    /// Typed raw data
    pub data: ModuleData,
    /// Findings in emission order
    pub checks: Vec<Finding>,
}

impl ModuleResult {
    /// Build a result whose id and title follow from the data shape.
    #[must_use]
    pub fn new(data: ModuleData, summary: impl Into<String>, checks: Vec<Finding>) -> Self {
        Self {
            id: data.module_id().to_string(),
            title: data.title().to_string(),
            summary: summary.into(),
            data,
            checks,
        }
    }

    /// HTTP data, if this is the HTTP module.
    #[must_use]
    pub fn as_http(&self) -> Option<&HttpData> {
        match &self.data {
            ModuleData::Http(d) => Some(d),
            _ => None,
        }
    }

    /// HTML data, if this is the HTML module.
    #[must_use]
    pub fn as_html(&self) -> Option<&HtmlData> {
        match &self.data {
            ModuleData::Html(d) => Some(d),
            _ => None,
        }
    }

    /// Technology data, if this is the tech module.
    #[must_use]
    pub fn as_tech(&self) -> Option<&TechData> {
        match &self.data {
            ModuleData::Tech(d) => Some(d),
            _ => None,
        }
    }
}

/// Raw data attached to a module result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ModuleData {
    /// Fetch outcome
    Http(HttpData),
    /// Extracted document signals
    Html(HtmlData),
    /// Stack fingerprint
    Tech(TechData),
}

impl ModuleData {
    /// Module id matching this shape.
    #[must_use]
    pub fn module_id(&self) -> &'static str {
        match self {
            Self::Http(_) => HTTP_MODULE_ID,
            Self::Html(_) => HTML_MODULE_ID,
            Self::Tech(_) => TECH_MODULE_ID,
        }
    }

    /// Display title matching this shape.
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::Http(_) => "HTTP",
            Self::Html(_) => "HTML",
            Self::Tech(_) => "Technology",
        }
    }
}

/// What the fetcher observed, minus the body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpData {
    /// URL as submitted
    pub input_url: String,
    /// Canonical URL the fetch started from
    pub normalized_url: String,
    /// Last URL requested
    pub final_url: String,
    /// Status of the last response (0 when none was received)
    pub status_code: u16,
    /// Wall-clock time across the whole chain
    pub duration_ms: u64,
    /// Every URL requested, in order
    pub redirect_chain: Vec<String>,
    /// Lower-cased response headers of the last response
    pub headers: BTreeMap<String, String>,
    /// Protocol version of the last response
    pub http_version: Option<String>,
    /// Body size of the last response
    pub body_bytes: usize,
    /// Structured transport errors (`Type: message`)
    pub errors: Vec<String>,
}

impl HttpData {
    /// Number of redirects followed.
    #[must_use]
    pub fn redirect_count(&self) -> usize {
        self.redirect_chain.len().saturating_sub(1)
    }
}

/// Signals extracted from the HTML document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct HtmlData {
    /// Whether a non-empty body was analyzed
    pub available: bool,
    /// Trimmed `<title>` text
    pub title: Option<String>,
    /// `<html lang>` value
    pub lang: Option<String>,
    /// Meta description content
    pub meta_description: Option<String>,
    /// Canonical link href
    pub canonical: Option<String>,
    /// Whether a viewport meta tag exists
    pub has_viewport: bool,
    /// Meta robots content
    pub robots: Option<String>,
    /// Number of `<h1>` elements
    pub h1_count: usize,
    /// Text of the first `<h1>`
    pub first_h1: Option<String>,
    /// How many of og:title, og:description, og:image, twitter:card are set
    pub social_tag_count: usize,
    /// Number of `<img>` elements
    pub img_count: usize,
    /// Images without an `alt` attribute (`alt=""` counts as present)
    pub img_missing_alt: usize,
    /// Number of `<a>` elements
    pub anchor_count: usize,
    /// Anchors without an `href` attribute
    pub anchor_missing_href: usize,
    /// Number of `<script>` elements
    pub script_count: usize,
    /// Body size in bytes
    pub size_bytes: usize,
    /// Time spent parsing
    pub duration_ms: u64,
}

/// A named detection with a heuristic confidence in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    /// Detected product, or `unknown`
    pub name: String,
    /// Lower bound on certainty
    pub confidence: f64,
}

impl Detection {
    /// Nothing matched.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            name: "unknown".to_string(),
            confidence: 0.0,
        }
    }

    /// Whether a signature matched.
    #[must_use]
    pub fn is_known(&self) -> bool {
        self.name != "unknown"
    }
}

/// Which Next.js router the page appears to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NextRouter {
    /// `app/` router (React Server Components)
    App,
    /// Legacy `pages/` router
    Pages,
    /// Not determinable
    Unknown,
}

/// Inferred Next.js version range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextVersion {
    /// Exact version when exposed
    pub exact: Option<String>,
    /// Lowest compatible version
    pub min: Option<String>,
    /// Highest compatible version
    pub max: Option<String>,
    /// Human-readable guess
    pub guess: Option<String>,
    /// Confidence of the guess
    pub guess_confidence: f64,
    /// How the guess was made
    pub method: String,
}

/// Result of the confidence-scored Next.js detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextJsDetection {
    /// Confidence reached the detection threshold
    pub is_next: bool,
    /// Sum of evidence weights, capped at 1.0
    pub confidence: f64,
    /// Inferred router
    pub router: NextRouter,
    /// Build id from `__NEXT_DATA__`
    pub build_id: Option<String>,
    /// Version inference
    pub version: NextVersion,
    /// Matched evidence labels
    pub evidence: Vec<String>,
}

/// Technology fingerprint of the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechData {
    /// Whether an HTML body was available
    pub html_available: bool,
    /// Content management system
    pub cms: Detection,
    /// Frontend framework
    pub frontend_framework: Detection,
    /// Next.js specifics
    pub next_js: NextJsDetection,
    /// Backend runtime and server hints (may co-occur)
    pub backend_hints: Vec<String>,
    /// Served through Cloudflare
    pub cloudflare: bool,
    /// `Server` header value
    pub server_header: Option<String>,
    /// Time spent fingerprinting
    pub duration_ms: u64,
}
