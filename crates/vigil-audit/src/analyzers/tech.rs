//! Tech module: CMS, frontend framework, backend and CDN fingerprinting.
//!
//! Signatures are tried in order and the first match per category wins. The
//! confidence attached to each signature is a heuristic lower bound.

use super::nextjs::{self, header_lines};
use super::{elapsed_ms, ContentAnalyzer};
use crate::context::AuditContext;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::info;
use vigil_core::{
    Detection, Finding, FindingStatus, ModuleData, ModuleResult, Severity, TechData, TECH_MODULE_ID,
};

/// Confidence at which a CMS or framework detection counts as a PASS.
const CONFIDENT: f64 = 0.7;

struct Signature {
    name: &'static str,
    confidence: f64,
    pattern: Regex,
}

fn signature(name: &'static str, confidence: f64, pattern: &str) -> Signature {
    Signature {
        name,
        confidence,
        pattern: Regex::new(pattern).expect("valid regex"),
    }
}

static CMS: Lazy<Vec<Signature>> = Lazy::new(|| {
    vec![
        signature(
            "WordPress",
            0.85,
            r#"(?is)wp-content|wp-includes|/wp-json/|<meta\b[^>]*name\s*=\s*['"]generator['"][^>]*content\s*=\s*['"][^'"]*wordpress"#,
        ),
        signature(
            "Shopify",
            0.85,
            r"(?i)cdn\.shopify\.com|shopify\.theme|x-shopify|shopify-section|/cart\.js",
        ),
        signature("Wix", 0.8, r"(?i)wix\.com|_wix|x-wix|wix-bolt|wixrenderer"),
        signature("Squarespace", 0.75, r"(?i)squarespace"),
        signature("Webflow", 0.8, r"(?i)webflow\.com|webflow\.js|data-wf-page|data-wf-site"),
        signature(
            "Ghost",
            0.8,
            r#"(?is)ghost\.io|/ghost/|data-ghost|<meta\b[^>]*name=['"]generator['"][^>]*ghost"#,
        ),
        signature("Drupal", 0.7, r"(?i)drupal-settings-json|/sites/default/|drupal\.settings"),
        signature("Joomla", 0.65, r"(?i)joomla!|/media/system/js/|/templates/"),
    ]
});

static FRONTEND: Lazy<Vec<Signature>> = Lazy::new(|| {
    vec![
        signature("Next.js", 0.85, r"(?i)__NEXT_DATA__|/_next/|next\.js"),
        signature("Nuxt", 0.85, r"(?i)__NUXT__|/_nuxt/"),
        signature("Gatsby", 0.75, r"(?i)gatsby|/page-data/"),
        signature("Angular", 0.75, r"(?i)ng-version|_ngcontent-|angular\.js"),
        signature("Vue", 0.7, r"(?i)__VUE__|data-v-|vue\.runtime|vue\.config"),
        signature("React", 0.65, r"(?i)data-reactroot|react-dom|__REACT_DEVTOOLS_GLOBAL_HOOK__"),
        signature("Svelte", 0.65, r"(?i)svelte"),
    ]
});

/// Backend hints, matched against headers only. Several may apply at once.
static BACKEND: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("PHP", r"(?i)php"),
        ("ASP.NET", r"(?i)asp\.net|x-aspnet|\.aspx"),
        ("Java", r"(?i)jsessionid|servlet|jetty|tomcat|\bjsp\b"),
        ("Node.js", r"(?i)x-powered-by:\s*express|\bnode(\.js)?\b"),
        ("Nginx", r"(?i)nginx"),
        ("Apache", r"(?i)apache"),
    ]
    .into_iter()
    .map(|(name, re)| (name, Regex::new(re).expect("valid regex")))
    .collect()
});

static CLOUDFLARE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)cloudflare|cf-ray|cf-cache-status").expect("valid regex"));

fn first_match(signatures: &[Signature], haystack: &str) -> Detection {
    signatures
        .iter()
        .find(|s| s.pattern.is_match(haystack))
        .map_or_else(Detection::unknown, |s| Detection {
            name: s.name.to_string(),
            confidence: s.confidence,
        })
}

/// Fingerprints the stack behind the page.
#[derive(Debug, Default, Clone, Copy)]
pub struct TechAnalyzer;

impl ContentAnalyzer for TechAnalyzer {
    fn module_id(&self) -> &'static str {
        TECH_MODULE_ID
    }

    fn analyze(&self, ctx: &AuditContext) -> ModuleResult {
        let start = Instant::now();
        let empty = BTreeMap::new();
        let headers = ctx.fetch().map_or(&empty, |f| &f.headers);
        let html = ctx.body();
        let body = html.unwrap_or_default();

        let header_text = header_lines(headers);
        let haystack = format!("{header_text}\n{body}");

        let mut data = TechData {
            html_available: html.is_some(),
            cms: first_match(&CMS, &haystack),
            frontend_framework: first_match(&FRONTEND, &haystack),
            next_js: nextjs::detect(headers, body),
            backend_hints: BACKEND
                .iter()
                .filter(|(_, re)| re.is_match(&header_text))
                .map(|(name, _)| (*name).to_string())
                .collect(),
            cloudflare: CLOUDFLARE.is_match(&header_text),
            server_header: headers.get("server").cloned(),
            duration_ms: 0,
        };
        data.duration_ms = elapsed_ms(start);

        let mut checks = vec![
            check_detection(
                "tech.cms",
                "CMS detection",
                &data.cms,
                "Detected CMS",
                "No CMS detected (heuristic).",
            ),
            check_detection(
                "tech.frontend.framework",
                "Frontend framework detection",
                &data.frontend_framework,
                "Detected frontend framework",
                "No frontend framework detected (heuristic).",
            ),
            check_nextjs(&data),
            Finding::new(
                "tech.backend.hints",
                "Backend hints (headers/cookies)",
                FindingStatus::Info,
                Severity::Low,
            )
            .with_value(data.backend_hints.clone())
            .with_details(json!({
                "server": headers.get("server"),
                "x-powered-by": headers.get("x-powered-by"),
            }))
            .with_message(if data.backend_hints.is_empty() {
                "No strong backend hint detected.".to_string()
            } else {
                format!("Backend hints detected: {}", data.backend_hints.join(", "))
            }),
            Finding::new(
                "tech.cdn.cloudflare",
                "Cloudflare detected",
                FindingStatus::Info,
                Severity::Low,
            )
            .with_value(data.cloudflare)
            .with_message(if data.cloudflare {
                "Cloudflare appears to be in front of the site."
            } else {
                "No Cloudflare signal detected."
            }),
            Finding::new(
                "tech.http.server_header",
                "Server header (raw)",
                FindingStatus::Info,
                Severity::Low,
            )
            .with_value(data.server_header.clone())
            .with_message(if data.server_header.is_some() {
                "Server header is present."
            } else {
                "Server header not present."
            }),
        ];

        if !data.html_available {
            checks.push(
                Finding::new(
                    "tech.html.available",
                    "HTML available for tech detection",
                    FindingStatus::Warn,
                    Severity::Medium,
                )
                .with_value(false)
                .with_details(json!({ "reason": "html not provided" }))
                .with_message("HTML not provided: tech detection is limited to HTTP headers.")
                .with_recommendation(Some(
                    "Make sure the page returns HTML so the stack can be identified.",
                )),
            );
        }

        checks.push(
            Finding::new(
                "tech.analysis.duration_ms",
                "Tech analysis duration",
                FindingStatus::Info,
                Severity::Low,
            )
            .with_value(data.duration_ms)
            .with_details(json!({ "durationMs": data.duration_ms }))
            .with_message(format!("Tech analysis completed in {} ms.", data.duration_ms)),
        );

        let summary = format!(
            "cms={} frontend={} cloudflare={} durationMs={}",
            data.cms.name, data.frontend_framework.name, data.cloudflare, data.duration_ms
        );

        info!(
            run_id = %ctx.run_id(),
            cms = %data.cms.name,
            frontend = %data.frontend_framework.name,
            next = data.next_js.is_next,
            backend_hints = data.backend_hints.len(),
            cloudflare = data.cloudflare,
            "TECH module done"
        );

        ModuleResult::new(ModuleData::Tech(data), summary, checks)
    }
}

fn check_detection(key: &str, title: &str, detection: &Detection, found: &str, missing: &str) -> Finding {
    let status = if detection.confidence >= CONFIDENT {
        FindingStatus::Pass
    } else {
        FindingStatus::Info
    };

    Finding::new(key, title, status, Severity::Low)
        .with_value(json!({ "name": detection.name, "confidence": detection.confidence }))
        .with_message(if detection.is_known() {
            format!("{found}: {}", detection.name)
        } else {
            missing.to_string()
        })
}

fn check_nextjs(data: &TechData) -> Finding {
    let next = &data.next_js;
    let value = serde_json::to_value(next)
        .map(|mut v| {
            if let Some(obj) = v.as_object_mut() {
                obj.remove("evidence");
            }
            v
        })
        .unwrap_or_default();

    let message = if next.is_next {
        let router = serde_json::to_value(next.router)
            .ok()
            .and_then(|v| v.as_str().map(ToString::to_string))
            .unwrap_or_default();
        format!(
            "Next.js detected (router={router}). Version guess: {}",
            next.version.guess.as_deref().unwrap_or("unknown")
        )
    } else {
        "Next.js not detected.".to_string()
    };

    Finding::new(
        "tech.frontend.nextjs",
        "Next.js detection & version (best-effort)",
        if next.is_next {
            FindingStatus::Pass
        } else {
            FindingStatus::Info
        },
        Severity::Low,
    )
    .with_value(value)
    .with_details(json!({ "evidence": next.evidence }))
    .with_message(message)
    .with_recommendation((next.is_next && next.version.exact.is_none()).then_some(
        "Exact Next.js version is rarely exposed in production. This is a best-effort guess based on public signals.",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::FetchResult;
    use vigil_core::RunId;

    fn analyze(headers: &[(&str, &str)], body: Option<&str>) -> ModuleResult {
        let ctx = AuditContext::new(RunId::generate(), "https://example.com", "https://example.com/")
            .with_fetch(FetchResult {
                final_url: "https://example.com/".to_string(),
                status_code: 200,
                headers: headers
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect(),
                body: body.map(ToString::to_string),
                ..FetchResult::default()
            });
        TechAnalyzer.analyze(&ctx)
    }

    fn find<'a>(result: &'a ModuleResult, key: &str) -> &'a Finding {
        result
            .checks
            .iter()
            .find(|f| f.key == key)
            .unwrap_or_else(|| panic!("missing finding {key}"))
    }

    #[test]
    fn test_next_data_script_detects_framework() {
        let result = analyze(
            &[],
            Some(r#"<html><body><script id="__NEXT_DATA__" type="application/json">{}</script></body></html>"#),
        );

        let framework = find(&result, "tech.frontend.framework");
        assert_eq!(framework.status, FindingStatus::Pass);
        assert_eq!(framework.value["name"], "Next.js");
        assert!(framework.value["confidence"].as_f64().unwrap_or_default() >= 0.65);

        let next = find(&result, "tech.frontend.nextjs");
        assert_eq!(next.status, FindingStatus::Pass);
        assert_eq!(next.value["router"], "pages");
        assert!(next.value.get("evidence").is_none());
    }

    #[test]
    fn test_cms_order_first_match_wins() {
        // Both WordPress and Joomla-style paths present
        let result = analyze(
            &[],
            Some(r#"<link href="/wp-content/themes/x/style.css"><script src="/templates/a.js"></script>"#),
        );
        let data = result.as_tech().expect("tech data");
        assert_eq!(data.cms.name, "WordPress");
        assert!((data.cms.confidence - 0.85).abs() < f64::EPSILON);
        assert_eq!(find(&result, "tech.cms").status, FindingStatus::Pass);
    }

    #[test]
    fn test_low_confidence_detection_is_info() {
        let result = analyze(&[], Some(r#"<div data-reactroot=""></div>"#));
        let framework = find(&result, "tech.frontend.framework");
        assert_eq!(framework.value["name"], "React");
        assert_eq!(framework.status, FindingStatus::Info);
    }

    #[test]
    fn test_header_hints_co_occur() {
        let result = analyze(
            &[
                ("server", "cloudflare"),
                ("cf-ray", "8a1b2c3d4e5f-CDG"),
                ("x-powered-by", "PHP/8.2"),
            ],
            Some("<html><body>plain</body></html>"),
        );
        let data = result.as_tech().expect("tech data");
        assert!(data.cloudflare);
        assert_eq!(data.backend_hints, vec!["PHP"]);
        assert_eq!(data.server_header.as_deref(), Some("cloudflare"));
        assert_eq!(data.cms.name, "unknown");
        assert_eq!(find(&result, "tech.cms").status, FindingStatus::Info);
    }

    #[test]
    fn test_missing_html_adds_warning_but_keeps_header_detection() {
        let result = analyze(&[("x-shopify-stage", "production")], None);
        assert_eq!(find(&result, "tech.html.available").status, FindingStatus::Warn);
        assert_eq!(result.as_tech().expect("tech data").cms.name, "Shopify");
    }

    #[test]
    fn test_html_present_has_no_availability_warning() {
        let result = analyze(&[], Some("<html></html>"));
        assert!(result.checks.iter().all(|f| f.key != "tech.html.available"));
        assert!(result.summary.starts_with("cms=unknown frontend=unknown cloudflare=false"));
    }
}
