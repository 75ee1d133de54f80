//! Internal report → public report.
//!
//! Only non-passing findings become issues. Scores are re-expressed on a
//! 0-100 scale and the raw module data is reduced to the page title and the
//! technology summary.

use crate::types::{
    CategoryScore, Issue, IssueSeverity, Priority, PublicReport, Scores, Site, Summary, TechSummary,
};
use vigil_core::{Finding, FindingStatus, Report};

/// Number of issues promoted to the summary.
pub const MAX_PRIORITIES: usize = 6;

/// Tags that name a module rather than a business category.
const MODULE_TAGS: [&str; 3] = ["http", "html", "tech"];

const DEFAULT_IMPACT: &str = "Issue detected.";
const DEFAULT_RECOMMENDATION: &str = "Fix according to best practices.";

/// Build the public view of `report`.
#[must_use]
pub fn compose(report: &Report) -> PublicReport {
    let issues = collect_issues(report);
    let global = to_percent(report.score.global.ratio);

    let by_category = category_scores(report, &issues);

    let priorities = issues
        .iter()
        .take(MAX_PRIORITIES)
        .map(|issue| Priority {
            severity: issue.severity.into(),
            title: issue.title.clone(),
            impact: issue.impact.clone(),
            effort: issue.effort,
        })
        .collect();

    PublicReport {
        generated_at: report.generated_at,
        domain: domain_of(&report.normalized_url),
        url: report.normalized_url.clone(),
        site: Site {
            title: report.html().and_then(|html| html.title.clone()),
            logo_url: None,
        },
        scores: Scores {
            global,
            by_category,
        },
        summary: Summary {
            one_liner: one_liner(global).to_string(),
            priorities,
        },
        issues,
        tech: report.tech().map(|tech| TechSummary {
            cms: tech.cms.clone(),
            frontend_framework: tech.frontend_framework.clone(),
            next_js: tech.next_js.clone(),
        }),
    }
}

/// Headline for a 0-100 global score.
#[must_use]
pub fn one_liner(global: u32) -> &'static str {
    match global {
        85.. => "Solid site: a few optimizations can still improve impact.",
        65..=84 => "Good potential: a few targeted actions can improve performance and conversion.",
        40..=64 => "Several blocking issues: a short roadmap can quickly raise the score.",
        _ => "Big opportunities: fix the critical issues to improve trust and conversion.",
    }
}

fn collect_issues(report: &Report) -> Vec<Issue> {
    let mut issues: Vec<Issue> = report
        .modules
        .iter()
        .flat_map(|module| {
            module
                .checks
                .iter()
                .filter_map(move |finding| to_issue(&module.id, finding))
        })
        .collect();

    // Stable: findings of equal severity keep report order.
    issues.sort_by_key(|issue| issue.severity.rank());
    issues
}

fn to_issue(module_id: &str, finding: &Finding) -> Option<Issue> {
    let severity = match finding.status {
        FindingStatus::Fail => IssueSeverity::Critical,
        FindingStatus::Warn => IssueSeverity::Important,
        FindingStatus::Pass | FindingStatus::Info => return None,
    };

    let category_key = finding
        .tags
        .iter()
        .find(|tag| is_business_tag(tag))
        .cloned()
        .unwrap_or_else(|| module_id.to_string());

    Some(Issue {
        id: finding.key.clone(),
        category_key,
        module: module_id.to_string(),
        severity,
        title: finding.title.clone(),
        impact: non_blank(finding.message.as_deref()).unwrap_or(DEFAULT_IMPACT).to_string(),
        evidence: finding.has_details().then(|| finding.details.to_string()),
        recommendation: non_blank(finding.recommendation.as_deref())
            .unwrap_or(DEFAULT_RECOMMENDATION)
            .to_string(),
        effort: severity.effort(),
    })
}

fn category_scores(report: &Report, issues: &[Issue]) -> Vec<CategoryScore> {
    let mut categories: Vec<CategoryScore> = report
        .score
        .by_tag
        .iter()
        .filter(|agg| is_business_tag(&agg.id))
        .map(|agg| CategoryScore {
            key: agg.id.clone(),
            label: capitalize(&agg.id),
            score: to_percent(agg.ratio),
            issues: issues.iter().filter(|i| i.category_key == agg.id).count(),
        })
        .collect();

    categories.sort_by(|a, b| b.issues.cmp(&a.issues));
    categories
}

fn is_business_tag(tag: &str) -> bool {
    !MODULE_TAGS.contains(&tag)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_percent(ratio: f64) -> u32 {
    (ratio.clamp(0.0, 1.0) * 100.0).round() as u32
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

fn domain_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default()
}
