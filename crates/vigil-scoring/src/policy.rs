//! Scoring policy: a fixed-shape lookup table from finding keys to rules.

use std::collections::HashMap;

/// How one finding participates in the score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRule {
    /// Whether the finding counts at all
    pub scorable: bool,
    /// Points at stake (0 when not scorable)
    pub weight: u32,
    /// Tags merged into the finding
    pub tags: Vec<String>,
}

impl ScoreRule {
    /// A rule that counts with `weight` points.
    ///
    /// A zero weight yields an unscored rule, so `weight > 0` always implies
    /// `scorable`.
    #[must_use]
    pub fn scored(weight: u32, tags: &[&str]) -> Self {
        Self {
            scorable: weight > 0,
            weight,
            tags: tags.iter().map(ToString::to_string).collect(),
        }
    }

    /// A rule that never counts.
    #[must_use]
    pub fn unscored(tags: &[&str]) -> Self {
        Self {
            scorable: false,
            weight: 0,
            tags: tags.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Resolves the scoring rule for a finding.
pub trait ScorePolicy: Send + Sync {
    /// Version stamped into reports built with this policy.
    fn version(&self) -> u32;

    /// Rule for `finding_key` emitted by `module_id`.
    fn rule_for(&self, module_id: &str, finding_key: &str) -> ScoreRule;
}

/// First scoring policy.
///
/// Resolution order: exact key override, then the longest matching key
/// prefix, then unscored with the `misc` tag.
#[derive(Debug, Clone)]
pub struct ScorePolicyV1 {
    overrides: HashMap<&'static str, ScoreRule>,
    prefixes: Vec<(&'static str, ScoreRule)>,
}

impl ScorePolicyV1 {
    /// Policy version.
    pub const VERSION: u32 = 1;

    /// Build the rule tables.
    #[must_use]
    pub fn new() -> Self {
        let overrides = HashMap::from([
            // HTTP security headers
            ("http.security.hsts", ScoreRule::scored(8, &["security", "http"])),
            ("http.security.csp", ScoreRule::scored(10, &["security", "http"])),
            ("http.security.x_frame_options", ScoreRule::scored(6, &["security", "http"])),
            ("http.security.x_content_type_options", ScoreRule::scored(4, &["security", "http"])),
            ("http.security.referrer_policy", ScoreRule::scored(3, &["security", "http"])),
            // SEO
            ("html.title", ScoreRule::scored(4, &["seo", "html"])),
            ("html.meta.description.present", ScoreRule::scored(3, &["seo", "html"])),
            ("html.link.canonical.present", ScoreRule::scored(2, &["seo", "html"])),
            ("html.h1.count", ScoreRule::scored(3, &["seo", "html"])),
            // Accessibility
            ("html.images.alt_coverage", ScoreRule::scored(4, &["a11y", "html"])),
            ("html.anchors.href_coverage", ScoreRule::scored(2, &["a11y", "html"])),
            ("html.lang", ScoreRule::scored(2, &["a11y", "html"])),
            // Stack fingerprint is informational
            ("tech.cms", ScoreRule::unscored(&["tech"])),
            ("tech.frontend.framework", ScoreRule::unscored(&["tech"])),
            ("tech.backend.hints", ScoreRule::unscored(&["tech"])),
            ("tech.cdn.cloudflare", ScoreRule::unscored(&["tech"])),
        ]);

        let prefixes = vec![
            ("http.security.", ScoreRule::scored(6, &["security", "http"])),
            ("http.", ScoreRule::scored(2, &["http"])),
            ("html.meta.", ScoreRule::scored(2, &["seo", "html"])),
            ("html.link.canonical", ScoreRule::scored(2, &["seo", "html"])),
            ("html.images.", ScoreRule::scored(2, &["a11y", "html"])),
            ("html.anchors.", ScoreRule::scored(2, &["a11y", "html"])),
            ("html.lang", ScoreRule::scored(2, &["a11y", "html"])),
            ("html.", ScoreRule::scored(1, &["html"])),
            ("tech.", ScoreRule::unscored(&["tech"])),
        ];

        tracing::debug!(
            overrides = overrides.len(),
            prefixes = prefixes.len(),
            "score policy v1 initialized"
        );

        Self {
            overrides,
            prefixes,
        }
    }
}

impl Default for ScorePolicyV1 {
    fn default() -> Self {
        Self::new()
    }
}

impl ScorePolicy for ScorePolicyV1 {
    fn version(&self) -> u32 {
        Self::VERSION
    }

    fn rule_for(&self, _module_id: &str, finding_key: &str) -> ScoreRule {
        if let Some(exact) = self.overrides.get(finding_key) {
            return exact.clone();
        }

        self.prefixes
            .iter()
            .filter(|(prefix, _)| finding_key.starts_with(prefix))
            .max_by_key(|(prefix, _)| prefix.len())
            .map_or_else(|| ScoreRule::unscored(&["misc"]), |(_, rule)| rule.clone())
    }
}
