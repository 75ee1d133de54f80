//! Confidence-scored Next.js detection.
//!
//! Independent evidence weights are summed and capped at 1.0. A page counts
//! as Next.js once the total reaches [`DETECTION_THRESHOLD`]. The result is a
//! lower bound: sites can hide every signal below.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use vigil_core::{NextJsDetection, NextRouter, NextVersion};

/// Minimum confidence for `is_next`.
pub const DETECTION_THRESHOLD: f64 = 0.60;

static NEXT_DATA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<script[^>]+id=["']__NEXT_DATA__["'][^>]*>"#).expect("valid regex")
});
static NEXT_STATIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)/_next/static/").expect("valid regex"));
static CHUNKS_APP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)/_next/static/chunks/app/").expect("valid regex"));
static CHUNKS_PAGES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)/_next/static/chunks/pages/").expect("valid regex"));
static BUILD_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""buildId"\s*:\s*"([^"]+)""#).expect("valid regex"));
static RSC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)react-server-dom-webpack|__next_f|__flight__").expect("valid regex")
});
static VERCEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)x-vercel-|server:\s*vercel").expect("valid regex"));

const NEXT_HEADERS: [&str; 3] = ["x-nextjs-cache", "x-nextjs-page", "x-nextjs-data"];

/// Detect Next.js from lower-cased response headers and the HTML body.
#[must_use]
pub fn detect(headers: &BTreeMap<String, String>, html: &str) -> NextJsDetection {
    let has_next_data = NEXT_DATA.is_match(html);
    let has_static = NEXT_STATIC.is_match(html);
    let has_rsc = RSC.is_match(html);

    let mut evidence = Vec::new();
    let mut score = 0.0_f64;

    if has_next_data {
        score += 0.65;
        evidence.push("html: __NEXT_DATA__ script present".to_string());
    }
    if has_static {
        score += 0.45;
        evidence.push("html: /_next/static/ present".to_string());
    }
    if has_rsc {
        score += 0.65;
        evidence.push("html: RSC/Flight markers present".to_string());
    }
    for name in NEXT_HEADERS {
        if headers.contains_key(name) {
            score += 0.25;
            evidence.push(format!("header: {name} present"));
        }
    }
    if VERCEL.is_match(&header_lines(headers)) {
        score += 0.15;
        evidence.push("headers: vercel markers present".to_string());
    }

    let confidence = score.min(1.0);

    let router = if CHUNKS_APP.is_match(html) || has_rsc {
        NextRouter::App
    } else if CHUNKS_PAGES.is_match(html) || has_next_data {
        NextRouter::Pages
    } else {
        NextRouter::Unknown
    };

    let build_id = BUILD_ID
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());

    NextJsDetection {
        is_next: confidence >= DETECTION_THRESHOLD,
        confidence,
        router,
        build_id,
        version: infer_version(router, has_rsc, has_next_data, has_static),
        evidence,
    }
}

/// Production builds rarely expose an exact version, so this yields a floor
/// and a low-confidence guess.
fn infer_version(router: NextRouter, has_rsc: bool, has_next_data: bool, has_static: bool) -> NextVersion {
    let (min, guess, guess_confidence) = if router == NextRouter::App || has_rsc {
        (Some("13.0.0"), Some("13.4.x+"), 0.55)
    } else if router == NextRouter::Pages && (has_next_data || has_static) {
        (Some("9.0.0"), Some("12.x–14.x (pages router)"), 0.35)
    } else if has_static {
        (Some("9.0.0"), Some("unknown (next detected via assets)"), 0.25)
    } else {
        (None, None, 0.0)
    };

    NextVersion {
        exact: None,
        min: min.map(ToString::to_string),
        max: None,
        guess: guess.map(ToString::to_string),
        guess_confidence,
        method: "heuristics".to_string(),
    }
}

/// `name: value` lines, as signature matchers see headers.
pub(crate) fn header_lines(headers: &BTreeMap<String, String>) -> String {
    headers
        .iter()
        .map(|(k, v)| format!("{k}: {v}\n"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_next_data_alone_is_detected_as_pages_router() {
        let html = r#"<script id="__NEXT_DATA__" type="application/json">{"buildId":"abc123"}</script>"#;
        let result = detect(&BTreeMap::new(), html);

        assert!(result.is_next);
        assert!((result.confidence - 0.65).abs() < 1e-9);
        assert_eq!(result.router, NextRouter::Pages);
        assert_eq!(result.build_id.as_deref(), Some("abc123"));
        assert_eq!(result.version.min.as_deref(), Some("9.0.0"));
        assert_eq!(result.version.method, "heuristics");
    }

    #[test]
    fn test_confidence_is_capped() {
        let html = r#"<script id="__NEXT_DATA__"></script>
            <script src="/_next/static/chunks/app/page.js"></script>
            <script>self.__next_f.push([1,""])</script>"#;
        let result = detect(
            &headers(&[("x-nextjs-cache", "HIT"), ("server", "Vercel")]),
            html,
        );

        assert!((result.confidence - 1.0).abs() < f64::EPSILON);
        assert_eq!(result.router, NextRouter::App);
        assert_eq!(result.version.guess.as_deref(), Some("13.4.x+"));
        assert_eq!(result.evidence.len(), 5);
    }

    #[test]
    fn test_assets_only_is_below_threshold() {
        let result = detect(&BTreeMap::new(), r#"<link href="/_next/static/css/a.css">"#);

        assert!(!result.is_next);
        assert_eq!(result.router, NextRouter::Unknown);
        assert_eq!(
            result.version.guess.as_deref(),
            Some("unknown (next detected via assets)")
        );
    }

    #[test]
    fn test_headers_can_carry_detection() {
        let result = detect(
            &headers(&[
                ("x-nextjs-cache", "HIT"),
                ("x-nextjs-page", "/"),
                ("x-vercel-id", "cdg1::abc"),
            ]),
            "",
        );
        assert!((result.confidence - 0.65).abs() < 1e-9);
        assert!(result.is_next);
        assert!(result.version.min.is_none());
    }

    #[test]
    fn test_plain_page() {
        let result = detect(&BTreeMap::new(), "<html><body>hello</body></html>");
        assert!(!result.is_next);
        assert!(result.confidence.abs() < f64::EPSILON);
        assert!(result.evidence.is_empty());
    }
}
