//! Impact language: strong vs weak action verbs and quantified achievements.
//!
//! `analyze_impact` is the full lexical analysis returned to callers. The Impact Quality
//! component only needs its three counts, which come from the pluggable `ImpactScorer`
//! (default: `LexicalImpactScorer`, the same analysis reduced to counts).

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;
use tracing::warn;

use crate::document::sections::{ParsedDocument, SectionType};
use crate::scoring::ScorerError;

/// Sections whose prose is judged for impact.
pub const IMPACT_SECTIONS: [SectionType; 3] = [
    SectionType::Experience,
    SectionType::Projects,
    SectionType::Summary,
];

const TARGET_STRONG_VERBS: f64 = 10.0;
const TARGET_METRICS: f64 = 6.0;
const WEAK_PENALTY_PER_PHRASE: f64 = 0.1;
const MAX_WEAK_PENALTY: f64 = 0.4;
const MAX_SUGGESTIONS: usize = 5;

const STRONG_VERBS: &[(&str, &[&str])] = &[
    (
        "leadership",
        &["led", "managed", "directed", "headed", "supervised", "coordinated", "orchestrated", "spearheaded", "championed"],
    ),
    (
        "achievement",
        &["achieved", "accomplished", "attained", "exceeded", "surpassed", "outperformed", "delivered", "completed"],
    ),
    (
        "creation",
        &["built", "created", "designed", "developed", "engineered", "established", "founded", "initiated", "launched", "pioneered"],
    ),
    (
        "improvement",
        &["improved", "enhanced", "optimized", "streamlined", "accelerated", "boosted", "elevated", "strengthened", "transformed", "revamped"],
    ),
    (
        "technical",
        &["implemented", "deployed", "architected", "automated", "integrated", "configured", "programmed", "coded", "debugged"],
    ),
    (
        "analysis",
        &["analyzed", "evaluated", "assessed", "researched", "investigated", "identified", "diagnosed", "resolved"],
    ),
    (
        "communication",
        &["presented", "communicated", "negotiated", "persuaded", "influenced", "collaborated", "partnered"],
    ),
    (
        "growth",
        &["increased", "grew", "expanded", "scaled", "maximized", "generated", "produced", "drove"],
    ),
    (
        "reduction",
        &["reduced", "decreased", "minimized", "eliminated", "cut", "saved", "consolidated"],
    ),
];

const MODERATE_VERBS: &[&str] = &[
    "supported", "maintained", "handled", "performed", "conducted", "processed", "prepared",
    "organized", "compiled", "documented", "monitored", "tracked", "reported", "reviewed",
    "tested", "updated", "modified", "adjusted", "contributed", "utilized",
];

/// Weak phrases and the replacement hint shown for each.
const WEAK_PHRASES: &[(&str, &str)] = &[
    ("worked on", "Try: 'developed', 'built', 'implemented'"),
    ("helped with", "Try: 'collaborated on', 'contributed to', 'supported'"),
    ("assisted", "Try: 'supported', 'enabled', 'facilitated'"),
    ("was responsible for", "Try: 'led', 'managed', 'owned'"),
    ("responsible for", "Try: 'led', 'managed', 'owned'"),
    ("involved in", "Try: 'contributed to', 'participated in leading'"),
    ("participated in", "Try: 'contributed to', 'collaborated on'"),
    ("dealt with", "Try: 'managed', 'resolved', 'handled'"),
    ("did", "Try: specific action verb like 'created', 'developed'"),
    ("made", "Try: 'created', 'designed', 'produced'"),
    ("got", "Try: 'achieved', 'obtained', 'secured'"),
    ("worked with", "Try: 'collaborated with', 'partnered with'"),
    ("used", "Try: 'leveraged', 'utilized', 'applied'"),
    ("learned", "Try: 'mastered', 'acquired expertise in'"),
    ("tried", "Try: 'attempted', 'tested', 'experimented with'"),
];

/// Metric families; group 1 captures the numeric value.
const METRIC_PATTERNS: &[(&str, &str)] = &[
    ("percentage", r"(\d+(?:\.\d+)?)\s*%"),
    ("multiplier", r"(\d+(?:\.\d+)?)\s*[xX]\b"),
    ("currency", r"\$\s*([\d,]+(?:\.\d{2})?)\s*(?:K|M|B|million|billion)?"),
    ("users", r"(\d[\d,]*)\s*(?:users?|customers?|clients?|subscribers?)"),
    ("time_saved", r"(?:saved?|reduced?)\s*(\d+)\s*(?:hours?|days?|weeks?|months?)"),
    ("count", r"(\d[\d,]*)\s*(?:projects?|applications?|features?|tickets?|requests?)"),
    ("improvement", r"(?:by|of)\s*(\d+(?:\.\d+)?)\s*%"),
    ("accuracy", r"(\d+(?:\.\d+)?)\s*%?\s*(?:accuracy|precision|recall|f1)"),
    ("latency", r"(\d+(?:\.\d+)?)\s*(?:ms|milliseconds?|seconds?)\s*(?:latency|response)"),
    ("uptime", r"(\d+(?:\.\d+)?)\s*%?\s*(?:uptime|availability)"),
];

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid impact pattern {pattern:?}: {e}"))
}

fn inflected(verb: &str) -> Regex {
    compile(&format!(r"(?i)\b{}(?:ed|ing|s)?\b", regex::escape(verb)))
}

static STRONG_MATCHERS: LazyLock<Vec<(&'static str, &'static str, Regex)>> = LazyLock::new(|| {
    STRONG_VERBS
        .iter()
        .flat_map(|(category, verbs)| verbs.iter().map(move |verb| (*category, *verb)))
        .map(|(category, verb)| (category, verb, inflected(verb)))
        .collect()
});

static MODERATE_MATCHERS: LazyLock<Vec<(&'static str, Regex)>> =
    LazyLock::new(|| MODERATE_VERBS.iter().map(|verb| (*verb, inflected(verb))).collect());

static WEAK_MATCHERS: LazyLock<Vec<(&'static str, &'static str, Regex)>> = LazyLock::new(|| {
    WEAK_PHRASES
        .iter()
        .map(|(phrase, hint)| {
            let regex = compile(&format!(r"(?i)\b{}\b", regex::escape(phrase)));
            (*phrase, *hint, regex)
        })
        .collect()
});

static METRIC_MATCHERS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    METRIC_PATTERNS
        .iter()
        .map(|(kind, pattern)| (*kind, compile(&format!("(?i){pattern}"))))
        .collect()
});

// ────────────────────────────────────────────────────────────────────────────
// Output data models
// ────────────────────────────────────────────────────────────────────────────

/// The three counts the Impact Quality component is computed from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImpactCounts {
    pub strong_verb_count: usize,
    pub weak_phrase_count: usize,
    pub metric_count: usize,
}

impl ImpactCounts {
    /// Strong-verb credit minus a weak-phrase penalty capped at 0.4; never negative.
    pub fn verb_score(&self) -> f64 {
        let credit = (self.strong_verb_count as f64 / TARGET_STRONG_VERBS).min(1.0);
        let penalty = (self.weak_phrase_count as f64 * WEAK_PENALTY_PER_PHRASE).min(MAX_WEAK_PENALTY);
        (credit - penalty).max(0.0)
    }

    pub fn metric_score(&self) -> f64 {
        (self.metric_count as f64 / TARGET_METRICS).min(1.0)
    }

    pub fn score(&self) -> f64 {
        (0.6 * self.verb_score() + 0.4 * self.metric_score()).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerbStrength {
    Strong,
    Moderate,
    Weak,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionVerb {
    pub verb: &'static str,
    pub strength: VerbStrength,
    /// Strong verbs only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<&'static str>,
    pub context: String,
    /// Replacement hint, weak phrases only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub value: String,
    pub metric_type: &'static str,
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactAnalysis {
    pub strong_verbs: Vec<ActionVerb>,
    pub moderate_verbs: Vec<ActionVerb>,
    pub weak_phrases: Vec<ActionVerb>,
    pub metrics: Vec<Metric>,
    pub verb_score: f64,
    pub metric_score: f64,
    pub overall_score: f64,
    pub level: &'static str,
    pub suggestions: Vec<String>,
}

impl ImpactAnalysis {
    pub fn counts(&self) -> ImpactCounts {
        ImpactCounts {
            strong_verb_count: self.strong_verbs.len(),
            weak_phrase_count: self.weak_phrases.len(),
            metric_count: self.metrics.len(),
        }
    }

    /// Share of strong verbs among all detected verbs.
    pub fn verb_ratio(&self) -> f64 {
        let total = self.strong_verbs.len() + self.moderate_verbs.len() + self.weak_phrases.len();
        if total == 0 {
            0.0
        } else {
            self.strong_verbs.len() as f64 / total as f64
        }
    }
}

fn impact_level(score: f64) -> &'static str {
    match score {
        s if s >= 0.8 => "Excellent",
        s if s >= 0.6 => "Good",
        s if s >= 0.4 => "Moderate",
        s if s >= 0.2 => "Needs Improvement",
        _ => "Weak",
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Lexical analysis
// ────────────────────────────────────────────────────────────────────────────

fn context(text: &str, start: usize, end: usize, radius: usize) -> String {
    crate::skills::matcher::snippet_around(text, start, end, radius)
}

/// Prose judged for impact: Experience, Projects and Summary content, or the whole text
/// when the document has none of them.
pub fn impact_text(doc: &ParsedDocument) -> String {
    let combined = doc.combined_text(&IMPACT_SECTIONS);
    if combined.trim().is_empty() {
        doc.original_text.clone()
    } else {
        combined
    }
}

/// Full impact analysis of `text`. Strong and moderate verbs count once per verb;
/// every weak phrase occurrence counts.
pub fn analyze_text(text: &str) -> ImpactAnalysis {
    let strong_verbs: Vec<ActionVerb> = STRONG_MATCHERS
        .iter()
        .filter_map(|(category, verb, regex)| {
            regex.find(text).map(|m| ActionVerb {
                verb: *verb,
                strength: VerbStrength::Strong,
                category: Some(*category),
                context: context(text, m.start(), m.end(), 40),
                suggestion: None,
            })
        })
        .collect();

    let moderate_verbs: Vec<ActionVerb> = MODERATE_MATCHERS
        .iter()
        .filter_map(|(verb, regex)| {
            regex.find(text).map(|m| ActionVerb {
                verb: *verb,
                strength: VerbStrength::Moderate,
                category: None,
                context: context(text, m.start(), m.end(), 40),
                suggestion: None,
            })
        })
        .collect();

    let weak_phrases: Vec<ActionVerb> = WEAK_MATCHERS
        .iter()
        .flat_map(|(phrase, hint, regex)| {
            regex.find_iter(text).map(move |m| ActionVerb {
                verb: *phrase,
                strength: VerbStrength::Weak,
                category: None,
                context: context(text, m.start(), m.end(), 30),
                suggestion: Some(*hint),
            })
        })
        .collect();

    let metrics: Vec<Metric> = METRIC_MATCHERS
        .iter()
        .flat_map(|(kind, regex)| {
            regex.captures_iter(text).filter_map(move |caps| {
                let whole = caps.get(0)?;
                let value = caps.get(1).unwrap_or(whole).as_str().to_string();
                Some(Metric {
                    value,
                    metric_type: *kind,
                    context: context(text, whole.start(), whole.end(), 50),
                })
            })
        })
        .collect();

    let counts = ImpactCounts {
        strong_verb_count: strong_verbs.len(),
        weak_phrase_count: weak_phrases.len(),
        metric_count: metrics.len(),
    };
    let suggestions = impact_suggestions(&counts, &weak_phrases, &metrics);
    let overall_score = counts.score();

    ImpactAnalysis {
        strong_verbs,
        moderate_verbs,
        weak_phrases,
        metrics,
        verb_score: counts.verb_score(),
        metric_score: counts.metric_score(),
        overall_score,
        level: impact_level(overall_score),
        suggestions,
    }
}

pub fn analyze_impact(doc: &ParsedDocument) -> ImpactAnalysis {
    analyze_text(&impact_text(doc))
}

fn impact_suggestions(counts: &ImpactCounts, weak: &[ActionVerb], metrics: &[Metric]) -> Vec<String> {
    let mut suggestions = Vec::new();

    if counts.strong_verb_count < 5 {
        suggestions.push(format!(
            "Add more strong action verbs. Current: {}, Target: 8+",
            counts.strong_verb_count
        ));
    }

    let mut seen: Vec<&str> = Vec::new();
    for phrase in weak {
        if seen.len() == 3 {
            break;
        }
        if !seen.contains(&phrase.verb) {
            seen.push(phrase.verb);
            if let Some(hint) = phrase.suggestion {
                suggestions.push(format!("Replace '{}' - {}", phrase.verb, hint));
            }
        }
    }

    if counts.metric_count < 3 {
        suggestions.push("Add more quantified achievements (percentages, numbers, metrics)".to_string());
    }
    if counts.metric_count == 0 {
        suggestions.push("Include specific results: % improvement, users impacted, time saved".to_string());
    }

    let has_kind = |kind: &str| metrics.iter().any(|m| m.metric_type == kind);
    if !has_kind("percentage") {
        suggestions.push("Add percentage improvements (e.g., 'reduced load time by 40%')".to_string());
    }
    if !has_kind("users") && !has_kind("count") {
        suggestions.push("Mention scale/reach (e.g., 'serving 10,000 users')".to_string());
    }

    suggestions.truncate(MAX_SUGGESTIONS);
    suggestions
}

// ────────────────────────────────────────────────────────────────────────────
// Collaborator trait
// ────────────────────────────────────────────────────────────────────────────

/// Impact-language scorer. Implement this to swap backends (e.g. a model-based classifier)
/// without touching the aggregator.
///
/// Carried in `AppState` as `Arc<dyn ImpactScorer>`.
#[async_trait]
pub trait ImpactScorer: Send + Sync {
    /// Short backend name reported in component details.
    fn backend(&self) -> &'static str;

    async fn score(&self, text: &str) -> Result<ImpactCounts, ScorerError>;

    /// True when `score` would only repeat the lexical analysis the pipeline already ran.
    fn reuses_lexical_counts(&self) -> bool {
        false
    }
}

/// Pure-Rust regex scorer. Fast, deterministic, never fails.
pub struct LexicalImpactScorer;

#[async_trait]
impl ImpactScorer for LexicalImpactScorer {
    fn backend(&self) -> &'static str {
        "lexical"
    }

    async fn score(&self, text: &str) -> Result<ImpactCounts, ScorerError> {
        Ok(analyze_text(text).counts())
    }

    fn reuses_lexical_counts(&self) -> bool {
        true
    }
}

/// Impact counts as delivered to the aggregator.
#[derive(Debug, Clone, PartialEq)]
pub enum ImpactOutcome {
    Measured {
        counts: ImpactCounts,
        backend: &'static str,
    },
    /// The scorer failed; `counts` come from the lexical analysis instead.
    Degraded { counts: ImpactCounts, reason: String },
}

impl ImpactOutcome {
    pub fn counts(&self) -> ImpactCounts {
        match self {
            ImpactOutcome::Measured { counts, .. } | ImpactOutcome::Degraded { counts, .. } => *counts,
        }
    }
}

/// Runs the impact scorer over the document's impact text. `lexical` holds the counts of the
/// lexical pass already made over `doc`; they are reused by the lexical backend and stand in
/// when any other backend fails.
pub async fn measure_impact(
    scorer: &dyn ImpactScorer,
    doc: &ParsedDocument,
    lexical: ImpactCounts,
) -> ImpactOutcome {
    if scorer.reuses_lexical_counts() {
        return ImpactOutcome::Measured {
            counts: lexical,
            backend: scorer.backend(),
        };
    }
    match scorer.score(&impact_text(doc)).await {
        Ok(counts) => ImpactOutcome::Measured {
            counts,
            backend: scorer.backend(),
        },
        Err(e) => {
            warn!("Impact scorer '{}' failed, using lexical counts: {e}", scorer.backend());
            ImpactOutcome::Degraded {
                counts: lexical,
                reason: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::sections::segment;

    struct FailingImpactScorer;

    #[async_trait]
    impl ImpactScorer for FailingImpactScorer {
        fn backend(&self) -> &'static str {
            "failing"
        }

        async fn score(&self, _text: &str) -> Result<ImpactCounts, ScorerError> {
            Err(ScorerError::Unavailable("classifier offline".into()))
        }
    }

    #[test]
    fn test_strong_verbs_counted_once_per_verb() {
        let analysis = analyze_text("Built the API. Built the CLI. Led a team and optimized queries.");
        let verbs: Vec<&str> = analysis.strong_verbs.iter().map(|v| v.verb).collect();
        assert!(verbs.contains(&"built"));
        assert!(verbs.contains(&"led"));
        assert!(verbs.contains(&"optimized"));
        assert_eq!(verbs.iter().filter(|v| **v == "built").count(), 1);
    }

    #[test]
    fn test_inflected_forms_match_but_not_other_words() {
        let analysis = analyze_text("Cuts cloud costs; Builder of tools");
        let verbs: Vec<&str> = analysis.strong_verbs.iter().map(|v| v.verb).collect();
        assert_eq!(verbs, vec!["cut"]);
        assert_eq!(analysis.strong_verbs[0].category, Some("reduction"));
    }

    #[test]
    fn test_weak_phrases_every_occurrence_counts() {
        let analysis = analyze_text("Worked on billing. Worked on search. Helped with on-call.");
        assert_eq!(analysis.weak_phrases.len(), 3);
        assert_eq!(analysis.weak_phrases[0].suggestion, Some("Try: 'developed', 'built', 'implemented'"));
    }

    #[test]
    fn test_metrics_detected() {
        let analysis = analyze_text(
            "Reduced latency by 40% for 10,000 users and saved $2M; 3x throughput with 99.9% uptime",
        );
        let kinds: Vec<&str> = analysis.metrics.iter().map(|m| m.metric_type).collect();
        for kind in ["percentage", "users", "currency", "multiplier", "improvement", "uptime"] {
            assert!(kinds.contains(&kind), "missing {kind}");
        }
    }

    #[test]
    fn test_weak_penalty_is_bounded() {
        let counts = ImpactCounts {
            strong_verb_count: 0,
            weak_phrase_count: 50,
            metric_count: 0,
        };
        assert_eq!(counts.verb_score(), 0.0);
        assert_eq!(counts.score(), 0.0);

        let counts = ImpactCounts {
            strong_verb_count: 10,
            weak_phrase_count: 50,
            metric_count: 6,
        };
        assert!((counts.verb_score() - 0.6).abs() < 1e-9);
        assert!((counts.score() - (0.6 * 0.6 + 0.4)).abs() < 1e-9);
    }

    #[test]
    fn test_score_saturates_at_one() {
        let counts = ImpactCounts {
            strong_verb_count: 40,
            weak_phrase_count: 0,
            metric_count: 40,
        };
        assert_eq!(counts.score(), 1.0);
    }

    #[test]
    fn test_suggestions_capped_and_targeted() {
        let analysis = analyze_text("Worked on things. Helped with stuff. Responsible for tasks.");
        assert!(analysis.suggestions.len() <= 5);
        assert!(analysis.suggestions[0].starts_with("Add more strong action verbs"));
        assert!(analysis.suggestions.iter().any(|s| s.starts_with("Replace 'worked on'")));
    }

    #[test]
    fn test_impact_text_prefers_prose_sections() {
        let doc = segment("Skills\nRust\nExperience\nBuilt a compiler");
        assert_eq!(impact_text(&doc), "Built a compiler");

        let doc = segment("Skills\nRust, Go");
        assert_eq!(impact_text(&doc), "Skills\nRust, Go");
    }

    #[tokio::test]
    async fn test_lexical_scorer_matches_analysis() {
        let doc = segment("Experience\nLed a team of 5 and increased revenue by 20%");
        let counts = LexicalImpactScorer.score(&impact_text(&doc)).await.unwrap();
        assert_eq!(counts, analyze_impact(&doc).counts());
        let outcome = measure_impact(&LexicalImpactScorer, &doc, counts).await;
        assert!(matches!(outcome, ImpactOutcome::Measured { backend: "lexical", .. }));
    }

    #[tokio::test]
    async fn test_lexical_scorer_reuses_precomputed_counts() {
        // The document alone would yield zero counts; the supplied ones must come back untouched.
        let doc = segment("");
        let precomputed = ImpactCounts {
            strong_verb_count: 7,
            weak_phrase_count: 1,
            metric_count: 2,
        };
        let outcome = measure_impact(&LexicalImpactScorer, &doc, precomputed).await;
        assert_eq!(
            outcome,
            ImpactOutcome::Measured {
                counts: precomputed,
                backend: "lexical",
            }
        );
    }

    #[tokio::test]
    async fn test_failing_scorer_degrades_to_fallback_counts() {
        let doc = segment("Experience\nBuilt dashboards");
        let fallback = analyze_impact(&doc).counts();
        let outcome = measure_impact(&FailingImpactScorer, &doc, fallback).await;
        match outcome {
            ImpactOutcome::Degraded { counts, reason } => {
                assert_eq!(counts, fallback);
                assert!(reason.contains("classifier offline"));
            }
            other => panic!("expected degraded outcome, got {other:?}"),
        }
    }
}
