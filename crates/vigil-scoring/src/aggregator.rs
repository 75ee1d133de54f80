//! Rolls enriched findings up into score aggregates.

use vigil_core::{FindingStatus, ModuleResult, ScoreAggregate, ScoreSummary, ScoredCheck};

/// Share of the weight a finding earns for its status.
#[must_use]
pub fn status_ratio(status: FindingStatus) -> f64 {
    match status {
        FindingStatus::Pass => 1.0,
        FindingStatus::Warn => 0.5,
        FindingStatus::Fail | FindingStatus::Info => 0.0,
    }
}

/// Running `(score, max)` totals keyed by id, in first-seen order.
#[derive(Default)]
struct Totals(Vec<(String, f64, f64)>);

impl Totals {
    fn touch(&mut self, id: &str) -> &mut (String, f64, f64) {
        let idx = match self.0.iter().position(|(k, _, _)| k == id) {
            Some(idx) => idx,
            None => {
                self.0.push((id.to_string(), 0.0, 0.0));
                self.0.len() - 1
            }
        };
        &mut self.0[idx]
    }

    fn add(&mut self, id: &str, score: f64, weight: f64) {
        let entry = self.touch(id);
        entry.1 += score;
        entry.2 += weight;
    }

    fn into_aggregates(self) -> Vec<ScoreAggregate> {
        self.0
            .into_iter()
            .map(|(id, score, max)| ScoreAggregate::of(id, score, max))
            .collect()
    }
}

/// Compute per-finding scores and the global, per-module and per-tag totals.
///
/// Only findings with a positive effective weight contribute to any
/// denominator. Every module gets an entry even if nothing in it scored. A
/// finding with several tags contributes its full score and weight to each
/// tag bucket.
#[must_use]
pub fn aggregate(scoring_version: u32, modules: &[ModuleResult]) -> ScoreSummary {
    let mut checks = Vec::new();
    let mut by_module = Totals::default();
    let mut by_tag = Totals::default();
    let mut global_score = 0.0;
    let mut global_max = 0.0;

    for module in modules {
        by_module.touch(&module.id);

        for finding in &module.checks {
            let weight = if finding.scorable { finding.weight } else { 0 };
            let weight_f = f64::from(weight);
            let score = weight_f * status_ratio(finding.status);
            let tags: Vec<String> = finding
                .tags
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .map(ToString::to_string)
                .collect();

            if weight > 0 {
                global_score += score;
                global_max += weight_f;
                by_module.add(&module.id, score, weight_f);
                for tag in &tags {
                    by_tag.add(tag, score, weight_f);
                }
            }

            checks.push(ScoredCheck {
                key: finding.key.clone(),
                module_id: module.id.clone(),
                status: finding.status,
                scorable: finding.scorable,
                weight,
                score,
                tags,
            });
        }
    }

    let global = ScoreAggregate::of("global", global_score, global_max);

    tracing::info!(
        scoring_version,
        score = global.score,
        max_score = global.max_score,
        ratio = global.ratio,
        "score computed"
    );

    ScoreSummary {
        scoring_version,
        global,
        by_module: by_module.into_aggregates(),
        by_tag: by_tag.into_aggregates(),
        checks,
    }
}
