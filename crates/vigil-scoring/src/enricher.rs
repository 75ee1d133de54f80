//! Applies the scoring policy to analyzer findings.

use crate::policy::ScorePolicy;
use vigil_core::{Finding, FindingStatus, ModuleResult};

/// Enrich every finding of every module, returning new module results.
#[must_use]
pub fn enrich_modules(policy: &dyn ScorePolicy, modules: &[ModuleResult]) -> Vec<ModuleResult> {
    modules
        .iter()
        .map(|module| ModuleResult {
            checks: module
                .checks
                .iter()
                .map(|finding| enrich_finding(policy, &module.id, finding))
                .collect(),
            ..module.clone()
        })
        .collect()
}

/// Apply the policy to one finding.
///
/// `INFO` findings are forced to `scorable = false, weight = 0` and only gain
/// the module tag. Every other finding takes the rule's scorability and
/// weight, and its tags become `finding ∪ rule ∪ {module}` with blanks
/// dropped, duplicates removed and first-seen order kept.
#[must_use]
pub fn enrich_finding(policy: &dyn ScorePolicy, module_id: &str, finding: &Finding) -> Finding {
    let mut enriched = finding.clone();
    let module_tag = [module_id.to_string()];

    if finding.status == FindingStatus::Info {
        enriched.scorable = false;
        enriched.weight = 0;
        enriched.tags = merge_tags(&[finding.tags.as_slice(), &module_tag]);
        return enriched;
    }

    let rule = policy.rule_for(module_id, &finding.key);
    enriched.scorable = rule.scorable && rule.weight > 0;
    enriched.weight = if enriched.scorable { rule.weight } else { 0 };
    enriched.tags = merge_tags(&[
        finding.tags.as_slice(),
        rule.tags.as_slice(),
        &module_tag,
    ]);
    enriched
}

fn merge_tags(groups: &[&[String]]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in groups.iter().flat_map(|g| g.iter()) {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{ScorePolicyV1, ScoreRule};
    use vigil_core::{HtmlData, ModuleData, Severity};

    /// Scores everything, to prove INFO is excluded regardless of the rule.
    struct GreedyPolicy;

    impl ScorePolicy for GreedyPolicy {
        fn version(&self) -> u32 {
            99
        }

        fn rule_for(&self, _module_id: &str, _finding_key: &str) -> ScoreRule {
            ScoreRule::scored(50, &["everything"])
        }
    }

    fn finding(key: &str, status: FindingStatus) -> Finding {
        Finding::new(key, key, status, Severity::Low)
    }

    #[test]
    fn test_info_never_scores() {
        for policy in [&GreedyPolicy as &dyn ScorePolicy, &ScorePolicyV1::new()] {
            let enriched = enrich_finding(policy, "html", &finding("html.title", FindingStatus::Info));
            assert!(!enriched.scorable);
            assert_eq!(enriched.weight, 0);
            assert_eq!(enriched.tags, vec!["html"]);
        }
    }

    #[test]
    fn test_rule_applied_to_scored_status() {
        let policy = ScorePolicyV1::new();
        let enriched = enrich_finding(&policy, "http", &finding("http.security.hsts", FindingStatus::Warn));
        assert!(enriched.scorable);
        assert_eq!(enriched.weight, 8);
        assert_eq!(enriched.tags, vec!["security", "http"]);
    }

    #[test]
    fn test_tags_merged_deduplicated_in_order() {
        let policy = ScorePolicyV1::new();
        let mut input = finding("html.lang", FindingStatus::Pass);
        input.tags = vec![" custom ".to_string(), "html".to_string(), String::new()];

        let enriched = enrich_finding(&policy, "html", &input);
        assert_eq!(enriched.tags, vec!["custom", "html", "a11y"]);
    }

    #[test]
    fn test_unscored_rule_zeroes_weight() {
        let policy = ScorePolicyV1::new();
        let enriched = enrich_finding(&policy, "tech", &finding("tech.cms", FindingStatus::Pass));
        assert!(!enriched.scorable);
        assert_eq!(enriched.weight, 0);
        assert_eq!(enriched.tags, vec!["tech"]);
    }

    #[test]
    fn test_enrich_modules_keeps_module_shape() {
        let policy = ScorePolicyV1::new();
        let module = ModuleResult::new(
            ModuleData::Html(HtmlData::default()),
            "titlePresent=true",
            vec![
                finding("html.title", FindingStatus::Pass),
                finding("html.scripts.count", FindingStatus::Info),
            ],
        );

        let enriched = enrich_modules(&policy, std::slice::from_ref(&module));
        assert_eq!(enriched.len(), 1);
        assert_eq!(enriched[0].summary, module.summary);
        assert_eq!(enriched[0].checks[0].weight, 4);
        assert_eq!(enriched[0].checks[1].weight, 0);
    }
}
