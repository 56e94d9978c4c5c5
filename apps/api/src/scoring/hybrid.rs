//! Score Aggregator: combines the four components into the final hybrid score.
//!
//!   40% Skill Coverage
//! + 30% Semantic Similarity
//! + 20% Evidence Strength
//! + 10% Impact Quality

use serde::{Serialize, Serializer};

use crate::scoring::components::{
    evidence_component, impact_component, semantic_component, skill_coverage_component,
    ScoreComponent, ScoreLevel,
};
use crate::scoring::impact::ImpactOutcome;
use crate::scoring::semantic::SemanticOutcome;
use crate::skills::coverage::SkillAnalysisResult;

const SUGGESTIONS_PER_COMPONENT: usize = 2;
const MAX_TOP_SUGGESTIONS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct HybridScore {
    pub skill_coverage: ScoreComponent,
    pub semantic_similarity: ScoreComponent,
    pub evidence_strength: ScoreComponent,
    pub impact_quality: ScoreComponent,
}

impl HybridScore {
    pub fn components(&self) -> [&ScoreComponent; 4] {
        [
            &self.skill_coverage,
            &self.semantic_similarity,
            &self.evidence_strength,
            &self.impact_quality,
        ]
    }

    /// Σ score × weight. In [0, 1] because component scores are pre-clamped and weights sum to 1.
    pub fn final_score(&self) -> f64 {
        self.components().iter().map(|c| c.weighted_score()).sum()
    }

    pub fn final_percentage(&self) -> u32 {
        (self.final_score() * 100.0).round() as u32
    }

    pub fn final_level(&self) -> ScoreLevel {
        ScoreLevel::from_score(self.final_score())
    }

    pub fn is_degraded(&self) -> bool {
        self.components().iter().any(|c| c.degraded)
    }

    pub fn all_suggestions(&self) -> Vec<&str> {
        self.components()
            .iter()
            .flat_map(|c| c.suggestions.iter().map(String::as_str))
            .collect()
    }

    /// Up to two suggestions per component, weakest component first, five at most.
    pub fn top_suggestions(&self) -> Vec<&str> {
        let mut ordered = self.components();
        // Stable: equal scores keep component declaration order.
        ordered.sort_by(|a, b| a.score.total_cmp(&b.score));
        ordered
            .iter()
            .flat_map(|c| {
                c.suggestions
                    .iter()
                    .take(SUGGESTIONS_PER_COMPONENT)
                    .map(String::as_str)
            })
            .take(MAX_TOP_SUGGESTIONS)
            .collect()
    }

    /// Plain-text report of the breakdown and top recommendations.
    pub fn breakdown_text(&self) -> String {
        let mut lines = vec![
            format!(
                "Overall Score: {}/100 ({})",
                self.final_percentage(),
                self.final_level().as_str()
            ),
            String::new(),
            "Score Breakdown:".to_string(),
        ];
        for c in self.components() {
            lines.push(format!(
                "  {}: {}% (weight: {}%)",
                c.name,
                c.percentage(),
                (c.weight * 100.0).round() as u32
            ));
            lines.push(format!("    {}", c.details));
        }

        let top = self.top_suggestions();
        if !top.is_empty() {
            lines.push(String::new());
            lines.push("Top Recommendations:".to_string());
            for (i, suggestion) in top.iter().enumerate() {
                lines.push(format!("  {}. {suggestion}", i + 1));
            }
        }
        lines.join("\n")
    }
}

impl Serialize for HybridScore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct View<'a> {
            final_score: f64,
            final_percentage: u32,
            final_level: ScoreLevel,
            degraded: bool,
            components: [&'a ScoreComponent; 4],
            top_suggestions: Vec<&'a str>,
        }
        View {
            final_score: self.final_score(),
            final_percentage: self.final_percentage(),
            final_level: self.final_level(),
            degraded: self.is_degraded(),
            components: self.components(),
            top_suggestions: self.top_suggestions(),
        }
        .serialize(serializer)
    }
}

/// Builds the hybrid score from finished intermediate results. Never fails: collaborator
/// failures arrive here already folded into degraded outcomes.
pub fn aggregate(
    skills: &SkillAnalysisResult,
    semantic: &SemanticOutcome,
    impact: &ImpactOutcome,
) -> HybridScore {
    HybridScore {
        skill_coverage: skill_coverage_component(skills),
        semantic_similarity: semantic_component(semantic),
        evidence_strength: evidence_component(skills),
        impact_quality: impact_component(impact),
    }
}
