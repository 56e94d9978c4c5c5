//! The four score components. Each builder is pure: it takes finished intermediate results
//! and returns a `ScoreComponent` whose score is already clamped to [0, 1].

use serde::{Deserialize, Serialize, Serializer};

use crate::scoring::impact::ImpactOutcome;
use crate::scoring::semantic::SemanticOutcome;
use crate::scoring::DEGRADED_MARKER;
use crate::skills::coverage::SkillAnalysisResult;

pub const SKILL_COVERAGE_WEIGHT: f64 = 0.4;
pub const SEMANTIC_WEIGHT: f64 = 0.3;
pub const EVIDENCE_WEIGHT: f64 = 0.2;
pub const IMPACT_WEIGHT: f64 = 0.1;

/// Credit given to a detected skill that is only listed, relative to a proven one.
const LISTED_ONLY_CREDIT: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreLevel {
    Excellent,
    Good,
    Moderate,
    #[serde(rename = "Needs Work")]
    NeedsWork,
    Poor,
}

impl ScoreLevel {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 0.8 => ScoreLevel::Excellent,
            s if s >= 0.6 => ScoreLevel::Good,
            s if s >= 0.4 => ScoreLevel::Moderate,
            s if s >= 0.2 => ScoreLevel::NeedsWork,
            _ => ScoreLevel::Poor,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScoreLevel::Excellent => "Excellent",
            ScoreLevel::Good => "Good",
            ScoreLevel::Moderate => "Moderate",
            ScoreLevel::NeedsWork => "Needs Work",
            ScoreLevel::Poor => "Poor",
        }
    }
}

/// Clamps to [0, 1]; NaN becomes 0.
pub fn clamp_unit(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreComponent {
    pub name: &'static str,
    pub score: f64,
    pub weight: f64,
    pub details: String,
    /// Ranked, most important first.
    pub suggestions: Vec<String>,
    pub degraded: bool,
}

impl ScoreComponent {
    fn new(name: &'static str, score: f64, weight: f64, details: String, suggestions: Vec<String>) -> Self {
        Self {
            name,
            score: clamp_unit(score),
            weight,
            details,
            suggestions,
            degraded: false,
        }
    }

    fn degraded(mut self, reason: &str) -> Self {
        self.degraded = true;
        self.details = format!("{DEGRADED_MARKER} {} ({reason})", self.details);
        self
    }

    pub fn weighted_score(&self) -> f64 {
        self.score * self.weight
    }

    pub fn percentage(&self) -> u32 {
        (self.score * 100.0).round() as u32
    }

    pub fn level(&self) -> ScoreLevel {
        ScoreLevel::from_score(self.score)
    }
}

impl Serialize for ScoreComponent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct View<'a> {
            name: &'a str,
            score: f64,
            weight: f64,
            weighted_score: f64,
            percentage: u32,
            level: ScoreLevel,
            details: &'a str,
            suggestions: &'a [String],
            degraded: bool,
        }
        View {
            name: self.name,
            score: self.score,
            weight: self.weight,
            weighted_score: self.weighted_score(),
            percentage: self.percentage(),
            level: self.level(),
            details: &self.details,
            suggestions: &self.suggestions,
            degraded: self.degraded,
        }
        .serialize(serializer)
    }
}

fn pct(ratio: f64) -> u32 {
    (ratio * 100.0) as u32
}

// ────────────────────────────────────────────────────────────────────────────
// Builders
// ────────────────────────────────────────────────────────────────────────────

pub fn skill_coverage_component(skills: &SkillAnalysisResult) -> ScoreComponent {
    let must = skills.must_have_coverage();
    let nice = skills.nice_to_have_coverage();
    let score = skills.overall_coverage();

    let mut suggestions = Vec::new();
    if !skills.must_have_missing().is_empty() {
        let names: Vec<&str> = skills
            .must_have_missing()
            .iter()
            .take(3)
            .map(|id| skills.display_name(id))
            .collect();
        suggestions.push(format!("Add critical skills: {}", names.join(", ")));
    }
    // Bonus skills are only worth suggesting once the core gaps are small.
    if !skills.nice_to_have_missing().is_empty() && must > 0.7 {
        let names: Vec<&str> = skills
            .nice_to_have_missing()
            .iter()
            .take(2)
            .map(|id| skills.display_name(id))
            .collect();
        suggestions.push(format!("Consider adding: {}", names.join(", ")));
    }

    let details = format!(
        "Must-have: {}% ({}/{}) | Nice-to-have: {}% ({}/{})",
        pct(must),
        skills.must_have_matched().len(),
        skills.must_have_total(),
        pct(nice),
        skills.nice_to_have_matched().len(),
        skills.nice_to_have_total(),
    );

    ScoreComponent::new("Skill Coverage", score, SKILL_COVERAGE_WEIGHT, details, suggestions)
}

pub fn semantic_component(outcome: &SemanticOutcome) -> ScoreComponent {
    let score = outcome.score();

    let mut suggestions = Vec::new();
    if score < 0.5 {
        suggestions.push("Use more keywords and terminology from the job description".to_string());
    }
    if score < 0.3 {
        suggestions.push("Tailor your resume more specifically to this role".to_string());
    }

    match outcome {
        SemanticOutcome::Measured { similarity, backend } => {
            let details = match similarity.best_section() {
                Some((name, _)) => format!("Best match: {name} section ({backend})"),
                None => format!("No section text to compare ({backend})"),
            };
            ScoreComponent::new("Semantic Match", score, SEMANTIC_WEIGHT, details, suggestions)
        }
        SemanticOutcome::Degraded { reason, .. } => ScoreComponent::new(
            "Semantic Match",
            score,
            SEMANTIC_WEIGHT,
            "TF-IDF lexical overlap".to_string(),
            suggestions,
        )
        .degraded(reason),
    }
}

pub fn evidence_component(skills: &SkillAnalysisResult) -> ScoreComponent {
    if skills.detected_skills().is_empty() {
        return ScoreComponent::new(
            "Evidence Strength",
            0.0,
            EVIDENCE_WEIGHT,
            "No skills detected to evaluate".to_string(),
            vec!["Add skills with evidence in projects or experience".to_string()],
        );
    }

    let proven = skills.proven_count();
    let listed = skills.listed_only_count();
    let score =
        (skills.proven_skills_ratio() + LISTED_ONLY_CREDIT * skills.listed_only_ratio()).min(1.0);

    let mut suggestions = Vec::new();
    if listed > proven {
        let names: Vec<&str> = skills.listed_only_names().into_iter().take(3).collect();
        if !names.is_empty() {
            suggestions.push(format!("Add project examples using: {}", names.join(", ")));
        }
    }
    if proven == 0 {
        suggestions.push("Add concrete examples in Experience/Projects sections".to_string());
    }

    let details = format!("{proven} proven in Experience/Projects, {listed} only listed");
    ScoreComponent::new("Evidence Strength", score, EVIDENCE_WEIGHT, details, suggestions)
}

pub fn impact_component(outcome: &ImpactOutcome) -> ScoreComponent {
    let counts = outcome.counts();

    let mut suggestions = Vec::new();
    if counts.metric_count < 3 {
        suggestions.push("Add quantified achievements (%, numbers, timeframes)".to_string());
    }
    if counts.strong_verb_count < 5 {
        suggestions.push("Use stronger action verbs (built, developed, optimized)".to_string());
    }
    if counts.weak_phrase_count > 2 {
        suggestions.push("Replace weak phrases like 'worked on' with specific actions".to_string());
    }

    let details = format!(
        "{} strong verbs, {} metrics, {} weak phrases",
        counts.strong_verb_count, counts.metric_count, counts.weak_phrase_count
    );
    let component =
        ScoreComponent::new("Impact Quality", counts.score(), IMPACT_WEIGHT, details, suggestions);

    match outcome {
        ImpactOutcome::Measured { .. } => component,
        ImpactOutcome::Degraded { reason, .. } => component.degraded(reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::sections::segment;
    use crate::scoring::impact::ImpactCounts;
    use crate::scoring::semantic::SectionSimilarity;
    use crate::skills::coverage::analyze_role;
    use crate::skills::matcher::DEFAULT_FUZZY_THRESHOLD;
    use crate::taxonomy::{RoleTaxonomy, SkillDefinition, SkillPriority};

    fn def(id: &str, name: &str, priority: SkillPriority) -> SkillDefinition {
        SkillDefinition {
            id: id.into(),
            name: name.into(),
            category: "programming".into(),
            priority,
            weight: 1.0,
            aliases: vec![id.into()],
        }
    }

    fn role() -> RoleTaxonomy {
        RoleTaxonomy {
            id: "backend".into(),
            title: "Backend Engineer".into(),
            must_have: vec![
                def("python", "Python", SkillPriority::MustHave),
                def("sql", "SQL", SkillPriority::MustHave),
            ],
            nice_to_have: vec![def("django", "Django", SkillPriority::NiceToHave)],
        }
    }

    #[test]
    fn test_weights_sum_to_one() {
        let sum = SKILL_COVERAGE_WEIGHT + SEMANTIC_WEIGHT + EVIDENCE_WEIGHT + IMPACT_WEIGHT;
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_level_thresholds() {
        assert_eq!(ScoreLevel::from_score(0.8), ScoreLevel::Excellent);
        assert_eq!(ScoreLevel::from_score(0.79), ScoreLevel::Good);
        assert_eq!(ScoreLevel::from_score(0.4), ScoreLevel::Moderate);
        assert_eq!(ScoreLevel::from_score(0.2), ScoreLevel::NeedsWork);
        assert_eq!(ScoreLevel::from_score(0.19), ScoreLevel::Poor);
        assert_eq!(serde_json::to_value(ScoreLevel::NeedsWork).unwrap(), "Needs Work");
    }

    #[test]
    fn test_skill_coverage_all_missing() {
        let doc = segment("Familiar with scripting languages");
        let skills = analyze_role(&doc, &role(), DEFAULT_FUZZY_THRESHOLD);
        let c = skill_coverage_component(&skills);
        assert_eq!(c.score, 0.0);
        assert_eq!(c.suggestions[0], "Add critical skills: Python, SQL");
        // Core gaps are large, so no bonus suggestions.
        assert_eq!(c.suggestions.len(), 1);
    }

    #[test]
    fn test_bonus_skills_suggested_when_core_covered() {
        let doc = segment("Experience\nPython and SQL");
        let skills = analyze_role(&doc, &role(), DEFAULT_FUZZY_THRESHOLD);
        let c = skill_coverage_component(&skills);
        assert!((c.score - 0.7).abs() < 1e-9);
        assert_eq!(c.suggestions, vec!["Consider adding: Django".to_string()]);
        assert_eq!(c.details, "Must-have: 100% (2/2) | Nice-to-have: 0% (0/1)");
    }

    #[test]
    fn test_evidence_listed_only_counts_half() {
        let doc = segment("Skills\nDjango");
        let skills = analyze_role(&doc, &role(), DEFAULT_FUZZY_THRESHOLD);
        let c = evidence_component(&skills);
        assert!((c.score - 0.5).abs() < 1e-9);
        assert!(c.suggestions.iter().any(|s| s == "Add project examples using: Django"));
        assert!(c.suggestions.iter().any(|s| s.contains("concrete examples")));
    }

    #[test]
    fn test_evidence_without_detections() {
        let doc = segment("Nothing relevant here");
        let skills = analyze_role(&doc, &role(), DEFAULT_FUZZY_THRESHOLD);
        let c = evidence_component(&skills);
        assert_eq!(c.score, 0.0);
        assert_eq!(c.suggestions, vec!["Add skills with evidence in projects or experience".to_string()]);
    }

    #[test]
    fn test_semantic_degraded_marker() {
        let outcome = SemanticOutcome::Degraded {
            score: 0.25,
            reason: "backend down".into(),
        };
        let c = semantic_component(&outcome);
        assert!(c.degraded);
        assert!(c.details.starts_with(DEGRADED_MARKER));
        assert!(c.details.contains("backend down"));
        assert_eq!(c.suggestions.len(), 2);
    }

    #[test]
    fn test_semantic_measured_details_best_section() {
        let outcome = SemanticOutcome::Measured {
            similarity: SectionSimilarity::from_sections(vec![
                ("skills".into(), 0.9),
                ("experience".into(), 0.6),
            ]),
            backend: "embedding",
        };
        let c = semantic_component(&outcome);
        assert!(!c.degraded);
        assert_eq!(c.details, "Best match: skills section (embedding)");
    }

    #[test]
    fn test_impact_component_from_counts() {
        let outcome = ImpactOutcome::Measured {
            counts: ImpactCounts {
                strong_verb_count: 5,
                weak_phrase_count: 3,
                metric_count: 3,
            },
            backend: "lexical",
        };
        let c = impact_component(&outcome);
        // verb = 0.5 - 0.3 = 0.2, metric = 0.5
        assert!((c.score - (0.6 * 0.2 + 0.4 * 0.5)).abs() < 1e-9);
        assert_eq!(c.suggestions, vec!["Replace weak phrases like 'worked on' with specific actions".to_string()]);
    }

    #[test]
    fn test_component_scores_clamped() {
        let c = ScoreComponent::new("x", 3.0, 0.1, String::new(), vec![]);
        assert_eq!(c.score, 1.0);
        let c = ScoreComponent::new("x", f64::NAN, 0.1, String::new(), vec![]);
        assert_eq!(c.score, 0.0);
        assert_eq!(c.percentage(), 0);
    }
}
