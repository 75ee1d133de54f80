//! Fixtures shared by the unit tests.

use chrono::Utc;
use vigil_core::{
    extract_hostname, normalize_url, Finding, FindingStatus, HtmlData, ModuleData, ModuleResult,
    Report, ReportMeta, RunId, ScoreAggregate, ScoreSummary, Severity, GENERATOR,
    REPORT_SCHEMA_VERSION,
};
use vigil_db::{runs, targets, Database, Target};

pub(crate) async fn seed_run(db: &Database) -> (Target, RunId) {
    let normalized = normalize_url("https://example.com").expect("normalize");
    let hostname = extract_hostname(&normalized).expect("hostname");
    let target = targets::find_or_create_target(db.pool(), "https://example.com", &normalized, &hostname)
        .await
        .expect("target");
    let run = runs::create_queued_run(db.pool(), &target.id)
        .await
        .expect("run");
    (target, run.id)
}

pub(crate) fn sample_report(run_id: &RunId) -> Report {
    let mut missing_title = Finding::new("html.title", "Title", FindingStatus::Fail, Severity::High)
        .with_message("The page has no <title>.");
    missing_title.tags = vec!["seo".to_string(), "html".to_string()];

    Report {
        schema_version: REPORT_SCHEMA_VERSION,
        input_url: "https://example.com".to_string(),
        normalized_url: "https://example.com/".to_string(),
        generated_at: Utc::now(),
        meta: ReportMeta {
            generator: GENERATOR.to_string(),
            schema_version: REPORT_SCHEMA_VERSION,
            scoring_version: 1,
            run_id: run_id.to_string(),
            http_status_code: Some(200),
        },
        modules: vec![ModuleResult::new(
            ModuleData::Html(HtmlData {
                available: true,
                ..HtmlData::default()
            }),
            "title=missing",
            vec![missing_title],
        )],
        score: ScoreSummary {
            scoring_version: 1,
            global: ScoreAggregate::of("global", 0.0, 8.0),
            by_module: vec![ScoreAggregate::of("html", 0.0, 8.0)],
            by_tag: vec![ScoreAggregate::of("seo", 0.0, 8.0)],
            checks: Vec::new(),
        },
    }
}
