//! HTML module: on-page SEO and accessibility signals.

use super::{elapsed_ms, ContentAnalyzer};
use crate::context::AuditContext;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde_json::json;
use std::time::Instant;
use tracing::{info, warn};
use vigil_core::{Finding, FindingStatus, HtmlData, ModuleData, ModuleResult, Severity, HTML_MODULE_ID};

static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").expect("valid selector"));
static HTML_ROOT: Lazy<Selector> = Lazy::new(|| Selector::parse("html").expect("valid selector"));
static META: Lazy<Selector> = Lazy::new(|| Selector::parse("meta").expect("valid selector"));
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("link").expect("valid selector"));
static H1: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").expect("valid selector"));
static IMG: Lazy<Selector> = Lazy::new(|| Selector::parse("img").expect("valid selector"));
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").expect("valid selector"));
static SCRIPT: Lazy<Selector> = Lazy::new(|| Selector::parse("script").expect("valid selector"));

const SOCIAL_TAGS: [&str; 4] = ["og:title", "og:description", "og:image", "twitter:card"];

/// Extracts document signals from the fetched body.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlAnalyzer;

impl ContentAnalyzer for HtmlAnalyzer {
    fn module_id(&self) -> &'static str {
        HTML_MODULE_ID
    }

    fn analyze(&self, ctx: &AuditContext) -> ModuleResult {
        let Some(body) = ctx.body() else {
            warn!(run_id = %ctx.run_id(), url = %ctx.final_url(), "HTML module: empty HTML input");
            return unavailable();
        };

        let start = Instant::now();
        let mut data = extract(body);
        data.duration_ms = elapsed_ms(start);

        let checks = vec![
            check_title(data.title.as_deref()),
            check_presence(
                "html.meta.description.present",
                "Meta description present",
                data.meta_description.is_some(),
                "Meta description",
                "Add a meta description to improve search snippets.",
            ),
            check_presence(
                "html.link.canonical.present",
                "Canonical link present",
                data.canonical.is_some(),
                "Canonical link",
                "Add a canonical link to reduce duplicate content issues.",
            ),
            check_h1(data.h1_count, data.first_h1.as_deref()),
            check_lang(data.lang.as_deref()),
            check_presence(
                "html.meta.viewport.present",
                "Viewport meta present",
                data.has_viewport,
                "Viewport meta",
                "Add <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\"> for mobile friendliness.",
            ),
            Finding::new(
                "html.meta.robots.present",
                "Meta robots present",
                FindingStatus::Info,
                Severity::Low,
            )
            .with_value(data.robots.is_some())
            .with_details(json!({ "present": data.robots.is_some(), "content": data.robots }))
            .with_message(if data.robots.is_some() {
                "Meta robots tag detected."
            } else {
                "No meta robots tag detected."
            }),
            check_social(data.social_tag_count),
            check_images_alt(data.img_count, data.img_missing_alt),
            check_anchors_href(data.anchor_count, data.anchor_missing_href),
            info_metric(
                "html.scripts.count",
                "Script tags count",
                data.script_count,
                json!({ "scriptCount": data.script_count }),
                format!("Found {} <script> tags.", data.script_count),
            ),
            info_metric(
                "html.size.bytes",
                "HTML size (bytes)",
                data.size_bytes,
                json!({ "bytes": data.size_bytes }),
                format!("HTML size is {} bytes.", data.size_bytes),
            ),
            info_metric(
                "html.analysis.duration_ms",
                "HTML analysis duration",
                data.duration_ms,
                json!({ "durationMs": data.duration_ms }),
                format!("HTML analysis completed in {} ms.", data.duration_ms),
            ),
        ];

        let summary = format!(
            "titlePresent={}, h1Count={}, metaDesc={}, canonical={}, durationMs={}",
            data.title.is_some(),
            data.h1_count,
            data.meta_description.is_some(),
            data.canonical.is_some(),
            data.duration_ms
        );

        info!(
            run_id = %ctx.run_id(),
            title_present = data.title.is_some(),
            h1_count = data.h1_count,
            duration_ms = data.duration_ms,
            "HTML module done"
        );

        ModuleResult::new(ModuleData::Html(data), summary, checks)
    }
}

/// Parse `body` and collect every signal the checks need.
///
/// The parsed document is dropped before returning.
#[must_use]
pub fn extract(body: &str) -> HtmlData {
    let doc = Html::parse_document(body);

    let mut data = HtmlData {
        available: true,
        title: doc.select(&TITLE).next().and_then(|el| clean_text(&el)),
        lang: doc
            .select(&HTML_ROOT)
            .next()
            .and_then(|el| non_blank(el.value().attr("lang"))),
        size_bytes: body.len(),
        ..HtmlData::default()
    };

    let mut social = [false; SOCIAL_TAGS.len()];
    for meta in doc.select(&META) {
        let attrs = meta.value();
        let name = attrs
            .attr("name")
            .or_else(|| attrs.attr("property"))
            .map(|n| n.trim().to_ascii_lowercase());
        let Some(name) = name else { continue };
        let content = non_blank(attrs.attr("content"));

        match name.as_str() {
            "description" if data.meta_description.is_none() => {
                data.meta_description = Some(content.unwrap_or_default());
            }
            "robots" if data.robots.is_none() => data.robots = Some(content.unwrap_or_default()),
            "viewport" => data.has_viewport = true,
            other => {
                if let Some(idx) = SOCIAL_TAGS.iter().position(|t| *t == other) {
                    social[idx] = true;
                }
            }
        }
    }
    data.social_tag_count = social.iter().filter(|present| **present).count();

    data.canonical = doc.select(&LINK).find_map(|link| {
        let attrs = link.value();
        let is_canonical = attrs
            .attr("rel")
            .is_some_and(|rel| rel.split_whitespace().any(|r| r.eq_ignore_ascii_case("canonical")));
        is_canonical.then(|| attrs.attr("href").unwrap_or_default().trim().to_string())
    });

    let mut h1s = doc.select(&H1);
    data.first_h1 = h1s.next().map(|el| clean_text(&el).unwrap_or_default());
    data.h1_count = usize::from(data.first_h1.is_some()) + h1s.count();

    for img in doc.select(&IMG) {
        data.img_count += 1;
        if img.value().attr("alt").is_none() {
            data.img_missing_alt += 1;
        }
    }

    for anchor in doc.select(&ANCHOR) {
        data.anchor_count += 1;
        if anchor.value().attr("href").is_none() {
            data.anchor_missing_href += 1;
        }
    }

    data.script_count = doc.select(&SCRIPT).count();
    data
}

fn clean_text(el: &ElementRef<'_>) -> Option<String> {
    let text = el.text().collect::<Vec<_>>().join(" ");
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

fn unavailable() -> ModuleResult {
    let reason = "HTML is empty or missing";
    let check = Finding::new("html.available", "HTML available", FindingStatus::Warn, Severity::Medium)
        .with_value(false)
        .with_details(json!({ "reason": reason }))
        .with_message("HTML analysis could not run.")
        .with_recommendation(Some(
            "Make sure the page returns an HTML document to crawlers.",
        ));

    ModuleResult::new(
        ModuleData::Html(HtmlData::default()),
        format!("HTML analysis not available: {reason}"),
        vec![check],
    )
}

fn check_title(title: Option<&str>) -> Finding {
    let len = title.map_or(0, |t| t.chars().count());

    let (status, severity, message, rec) = match title {
        None => (
            FindingStatus::Fail,
            Severity::High,
            "Missing <title> tag.".to_string(),
            Some("Add a meaningful <title> for SEO and usability."),
        ),
        Some(_) if len < 10 => (
            FindingStatus::Warn,
            Severity::Medium,
            format!("Title is present but very short ({len} chars)."),
            Some("Use a more descriptive title (often 30-60 chars is a good target)."),
        ),
        Some(_) if len > 80 => (
            FindingStatus::Warn,
            Severity::Low,
            format!("Title is long ({len} chars)."),
            Some("Consider shortening the title (often 30-60 chars is a good target)."),
        ),
        Some(_) => (
            FindingStatus::Pass,
            Severity::Low,
            format!("Title is present ({len} chars)."),
            None,
        ),
    };

    Finding::new("html.title", "Page title", status, severity)
        .with_value(title)
        .with_details(json!({ "length": len }))
        .with_message(message)
        .with_recommendation(rec)
}

fn check_presence(key: &str, title: &str, present: bool, label: &str, rec: &str) -> Finding {
    let (status, severity) = if present {
        (FindingStatus::Pass, Severity::Low)
    } else {
        (FindingStatus::Warn, Severity::Medium)
    };

    Finding::new(key, title, status, severity)
        .with_value(present)
        .with_details(json!({ "present": present }))
        .with_message(if present {
            format!("{label} is present.")
        } else {
            format!("{label} is missing.")
        })
        .with_recommendation((!present).then_some(rec))
}

fn check_h1(count: usize, first: Option<&str>) -> Finding {
    let (status, severity, message, rec) = match count {
        0 => (
            FindingStatus::Warn,
            Severity::Medium,
            "No <h1> found.".to_string(),
            Some("Add one H1 to describe the main topic of the page."),
        ),
        1 => (
            FindingStatus::Pass,
            Severity::Low,
            "Exactly one <h1> found.".to_string(),
            None,
        ),
        n => (
            FindingStatus::Warn,
            Severity::Low,
            format!("Multiple <h1> found ({n})."),
            Some("Prefer a single H1 for clarity (unless your page structure requires otherwise)."),
        ),
    };

    Finding::new("html.h1.count", "H1 heading count", status, severity)
        .with_value(json!({ "count": count, "firstH1": first }))
        .with_details(json!({ "h1Count": count }))
        .with_message(message)
        .with_recommendation(rec)
}

fn check_lang(lang: Option<&str>) -> Finding {
    let status = if lang.is_some() {
        FindingStatus::Pass
    } else {
        FindingStatus::Warn
    };

    Finding::new("html.lang", "HTML lang attribute", status, Severity::Low)
        .with_value(lang)
        .with_details(lang.map_or_else(|| json!({}), |l| json!({ "lang": l })))
        .with_message(lang.map_or_else(
            || "Missing lang attribute on <html>.".to_string(),
            |l| format!("HTML lang is set ({l})."),
        ))
        .with_recommendation(
            lang.is_none()
                .then_some("Set <html lang=\"...\"> for accessibility and SEO."),
        )
}

fn check_social(present: usize) -> Finding {
    let (status, message, rec) = match present {
        3.. => (FindingStatus::Pass, "Social meta tags are mostly present.", None),
        1..=2 => (
            FindingStatus::Warn,
            "Some social meta tags are missing.",
            Some("Consider adding OpenGraph (og:title, og:description, og:image) and Twitter card tags."),
        ),
        0 => (
            FindingStatus::Info,
            "No social meta tags detected.",
            Some("Add OpenGraph/Twitter tags to improve link previews on social platforms."),
        ),
    };

    Finding::new(
        "html.social.meta",
        "Social meta tags (OpenGraph/Twitter)",
        status,
        Severity::Low,
    )
    .with_value(present)
    .with_details(json!({ "present": present, "of": SOCIAL_TAGS.len() }))
    .with_message(message)
    .with_recommendation(rec)
}

/// Rounded percentage of `part` in `whole`.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percent(part: usize, whole: usize) -> u32 {
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

fn check_images_alt(count: usize, missing: usize) -> Finding {
    const KEY: &str = "html.images.alt_coverage";
    const TITLE: &str = "Image alt coverage";

    if count == 0 {
        return Finding::new(KEY, TITLE, FindingStatus::Info, Severity::Low)
            .with_value(json!({ "imgCount": 0, "missingAltCount": 0 }))
            .with_details(json!({ "imgCount": 0 }))
            .with_message("No images detected.");
    }

    let pct = percent(missing, count);
    let (status, severity, message, rec) = if missing == 0 {
        (
            FindingStatus::Pass,
            Severity::Low,
            "All images have an alt attribute.".to_string(),
            None,
        )
    } else if pct <= 20 {
        (
            FindingStatus::Warn,
            Severity::Low,
            format!("Some images are missing alt attributes ({pct}%)."),
            Some("Add alt attributes for accessibility and SEO."),
        )
    } else {
        (
            FindingStatus::Warn,
            Severity::Medium,
            format!("Many images are missing alt attributes ({pct}%)."),
            Some("Add meaningful alt attributes to improve accessibility."),
        )
    };

    Finding::new(KEY, TITLE, status, severity)
        .with_value(json!({ "imgCount": count, "missingAltCount": missing, "missingPct": pct }))
        .with_details(json!({ "imgCount": count, "imgAltMissingCount": missing }))
        .with_message(message)
        .with_recommendation(rec)
}

fn check_anchors_href(count: usize, missing: usize) -> Finding {
    const KEY: &str = "html.anchors.href_coverage";
    const TITLE: &str = "Anchor href coverage";

    if count == 0 {
        return Finding::new(KEY, TITLE, FindingStatus::Info, Severity::Low)
            .with_value(json!({ "anchorCount": 0, "noHrefCount": 0 }))
            .with_details(json!({ "anchorCount": 0 }))
            .with_message("No anchors detected.");
    }

    let pct = percent(missing, count);
    let (status, severity, message, rec) = if missing == 0 {
        (
            FindingStatus::Pass,
            Severity::Low,
            "All anchors have an href attribute.".to_string(),
            None,
        )
    } else if pct <= 10 {
        (
            FindingStatus::Warn,
            Severity::Low,
            format!("Some anchors are missing href ({pct}%)."),
            Some("Ensure <a> tags are valid links or use buttons for actions."),
        )
    } else {
        (
            FindingStatus::Warn,
            Severity::Medium,
            format!("Many anchors are missing href ({pct}%)."),
            Some("Replace non-link anchors with <button> or add proper href attributes."),
        )
    };

    Finding::new(KEY, TITLE, status, severity)
        .with_value(json!({ "anchorCount": count, "noHrefCount": missing, "missingPct": pct }))
        .with_details(json!({ "anchorCount": count, "noHrefCount": missing }))
        .with_message(message)
        .with_recommendation(rec)
}

fn info_metric(
    key: &str,
    title: &str,
    value: impl Into<serde_json::Value>,
    details: serde_json::Value,
    message: String,
) -> Finding {
    Finding::new(key, title, FindingStatus::Info, Severity::Low)
        .with_value(value)
        .with_details(details)
        .with_message(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::FetchResult;
    use vigil_core::RunId;

    fn analyze(body: &str) -> ModuleResult {
        let ctx = AuditContext::new(RunId::generate(), "https://example.com", "https://example.com/")
            .with_fetch(FetchResult {
                final_url: "https://example.com/".to_string(),
                status_code: 200,
                body: Some(body.to_string()),
                ..FetchResult::default()
            });
        HtmlAnalyzer.analyze(&ctx)
    }

    fn find<'a>(result: &'a ModuleResult, key: &str) -> &'a Finding {
        result
            .checks
            .iter()
            .find(|f| f.key == key)
            .unwrap_or_else(|| panic!("missing finding {key}"))
    }

    fn page_with_title(title: &str) -> String {
        format!("<html><head><title>{title}</title></head><body></body></html>")
    }

    #[test]
    fn test_title_buckets() {
        let empty = analyze(&page_with_title(""));
        assert_eq!(find(&empty, "html.title").status, FindingStatus::Fail);

        let short = analyze(&page_with_title("Hello"));
        let short = find(&short, "html.title");
        assert_eq!(short.status, FindingStatus::Warn);
        assert_eq!(short.severity, Severity::Medium);

        let good = analyze(&page_with_title(&"a".repeat(40)));
        assert_eq!(find(&good, "html.title").status, FindingStatus::Pass);

        let long = analyze(&page_with_title(&"a".repeat(90)));
        let long = find(&long, "html.title");
        assert_eq!(long.status, FindingStatus::Warn);
        assert_eq!(long.severity, Severity::Low);
    }

    #[test]
    fn test_image_alt_coverage() {
        let none = analyze("<html><body><p>text</p></body></html>");
        assert_eq!(find(&none, "html.images.alt_coverage").status, FindingStatus::Info);

        let mut imgs = String::from(r#"<img src="0.png">"#);
        for i in 1..10 {
            imgs.push_str(&format!(r#"<img src="{i}.png" alt="pic {i}">"#));
        }
        let one_missing = analyze(&format!("<html><body>{imgs}</body></html>"));
        let check = find(&one_missing, "html.images.alt_coverage");
        assert_eq!(check.status, FindingStatus::Warn);
        assert_eq!(check.severity, Severity::Low);
        assert_eq!(check.value["missingPct"], 10);

        let all: String = (0..10).map(|i| format!(r#"<img src="{i}.png" alt="">"#)).collect();
        let covered = analyze(&format!("<html><body>{all}</body></html>"));
        assert_eq!(find(&covered, "html.images.alt_coverage").status, FindingStatus::Pass);
    }

    #[test]
    fn test_anchor_threshold_is_ten_percent() {
        let mut anchors = String::from("<a>no link</a>");
        for i in 0..4 {
            anchors.push_str(&format!(r#"<a href="/p/{i}">p</a>"#));
        }
        let result = analyze(&format!("<html><body>{anchors}</body></html>"));
        let check = find(&result, "html.anchors.href_coverage");
        assert_eq!(check.status, FindingStatus::Warn);
        assert_eq!(check.severity, Severity::Medium);
        assert_eq!(check.value["missingPct"], 20);
    }

    #[test]
    fn test_h1_rule() {
        let zero = analyze("<html><body></body></html>");
        assert_eq!(find(&zero, "html.h1.count").status, FindingStatus::Warn);

        let one = analyze("<html><body><h1> Main   topic </h1></body></html>");
        let check = find(&one, "html.h1.count");
        assert_eq!(check.status, FindingStatus::Pass);
        assert_eq!(check.value["firstH1"], "Main topic");

        let two = analyze("<html><body><h1>A</h1><h1>B</h1></body></html>");
        let check = find(&two, "html.h1.count");
        assert_eq!(check.status, FindingStatus::Warn);
        assert_eq!(check.severity, Severity::Low);
        assert_eq!(check.value["count"], 2);
    }

    #[test]
    fn test_social_tags() {
        let three = analyze(
            r#"<html><head>
                <meta property="og:title" content="t">
                <meta property="og:description" content="d">
                <meta name="twitter:card" content="summary">
            </head></html>"#,
        );
        assert_eq!(find(&three, "html.social.meta").status, FindingStatus::Pass);

        let one = analyze(r#"<html><head><meta property="og:image" content="i.png"></head></html>"#);
        assert_eq!(find(&one, "html.social.meta").status, FindingStatus::Warn);

        let zero = analyze("<html><head></head></html>");
        assert_eq!(find(&zero, "html.social.meta").status, FindingStatus::Info);
    }

    #[test]
    fn test_full_document() {
        let result = analyze(
            r#"<!doctype html>
            <html lang="en">
              <head>
                <title>Example Domain for Audits</title>
                <meta name="description" content="An example page">
                <meta name="viewport" content="width=device-width, initial-scale=1">
                <meta name="robots" content="index,follow">
                <link rel="canonical" href="https://example.com/">
                <script src="/app.js"></script>
              </head>
              <body><h1>Example</h1><a href="/about">About</a></body>
            </html>"#,
        );

        for key in [
            "html.title",
            "html.meta.description.present",
            "html.link.canonical.present",
            "html.h1.count",
            "html.lang",
            "html.meta.viewport.present",
            "html.anchors.href_coverage",
        ] {
            assert_eq!(find(&result, key).status, FindingStatus::Pass, "{key}");
        }
        assert_eq!(find(&result, "html.meta.robots.present").value, json!(true));
        assert_eq!(find(&result, "html.scripts.count").value, json!(1));

        let data = result.as_html().expect("html data");
        assert_eq!(data.title.as_deref(), Some("Example Domain for Audits"));
        assert_eq!(data.lang.as_deref(), Some("en"));
        assert_eq!(data.canonical.as_deref(), Some("https://example.com/"));
        assert!(result.summary.starts_with("titlePresent=true, h1Count=1, metaDesc=true, canonical=true"));
    }

    #[test]
    fn test_missing_body_degrades_to_single_warning() {
        let ctx = AuditContext::new(RunId::generate(), "https://example.com", "https://example.com/")
            .with_fetch(FetchResult::default());
        let result = HtmlAnalyzer.analyze(&ctx);

        assert_eq!(result.checks.len(), 1);
        assert_eq!(result.checks[0].key, "html.available");
        assert_eq!(result.checks[0].status, FindingStatus::Warn);
        assert!(!result.as_html().expect("html data").available);
    }
}
