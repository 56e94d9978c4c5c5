//! Scores one resume against one role.
//!
//! `prepare` is the synchronous, CPU-bound half (segmentation, skill detection, impact and
//! ATS analysis); handlers run it on the blocking pool. `score` awaits the two collaborator
//! calls (semantic similarity and impact scoring) together and aggregates.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::ats::{analyze_ats, AtsAnalysis};
use crate::document::sections::{segment, ParsedDocument};
use crate::scoring::hybrid::{aggregate, HybridScore};
use crate::scoring::impact::{analyze_impact, measure_impact, ImpactAnalysis, ImpactScorer};
use crate::scoring::semantic::{measure_semantic, SemanticScorer};
use crate::skills::coverage::{analyze_role, SkillAnalysisResult};
use crate::taxonomy::RoleTaxonomy;

/// Everything computed for one resume/role pair.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub document: ParsedDocument,
    pub skills: SkillAnalysisResult,
    pub impact_analysis: ImpactAnalysis,
    pub ats: AtsAnalysis,
    /// Per-section semantic similarity; empty when the semantic score is degraded.
    pub semantic_sections: BTreeMap<String, f64>,
    pub score: HybridScore,
}

/// Output of the local analysis stage, ready for collaborator scoring.
#[derive(Debug, Clone)]
pub struct PreparedResume {
    pub document: ParsedDocument,
    pub skills: SkillAnalysisResult,
    pub impact_analysis: ImpactAnalysis,
    pub ats: AtsAnalysis,
}

/// Scoring pipeline with pluggable collaborators.
///
/// Carried in `AppState`; cheap to clone.
#[derive(Clone)]
pub struct Analyzer {
    semantic: Arc<dyn SemanticScorer>,
    impact: Arc<dyn ImpactScorer>,
    fuzzy_threshold: f64,
}

impl Analyzer {
    pub fn new(
        semantic: Arc<dyn SemanticScorer>,
        impact: Arc<dyn ImpactScorer>,
        fuzzy_threshold: f64,
    ) -> Self {
        Self {
            semantic,
            impact,
            fuzzy_threshold,
        }
    }

    pub fn fuzzy_threshold(&self) -> f64 {
        self.fuzzy_threshold
    }

    pub fn semantic_backend(&self) -> &'static str {
        self.semantic.backend()
    }

    pub fn impact_backend(&self) -> &'static str {
        self.impact.backend()
    }

    /// Local analysis only; never touches a collaborator. `text` must already be cleaned
    /// and capped.
    pub fn prepare(&self, text: &str, role: &RoleTaxonomy) -> PreparedResume {
        let document = segment(text);
        let skills = analyze_role(&document, role, self.fuzzy_threshold);
        let impact_analysis = analyze_impact(&document);
        let ats = analyze_ats(&document);

        debug!(
            "Segmented {} sections; {} of {} skills detected for '{}'; ATS {}%",
            document.sections.len(),
            skills.detected_skills().len(),
            skills.must_have_total() + skills.nice_to_have_total(),
            role.id,
            ats.ats_percentage()
        );

        PreparedResume {
            document,
            skills,
            impact_analysis,
            ats,
        }
    }

    /// Collaborator scoring and aggregation. Without a job description the role's
    /// reference text stands in for it.
    pub async fn score(
        &self,
        prepared: PreparedResume,
        role: &RoleTaxonomy,
        job_description: Option<&str>,
    ) -> Analysis {
        let PreparedResume {
            document,
            skills,
            impact_analysis,
            ats,
        } = prepared;

        let reference = match job_description.map(str::trim).filter(|jd| !jd.is_empty()) {
            Some(jd) => jd.to_string(),
            None => role.reference_text(),
        };

        let (semantic, impact) = tokio::join!(
            measure_semantic(self.semantic.as_ref(), &document, &reference),
            measure_impact(self.impact.as_ref(), &document, impact_analysis.counts()),
        );

        let score = aggregate(&skills, &semantic, &impact);

        info!(
            "Scored resume against '{}': {}/100 ({}){}",
            role.id,
            score.final_percentage(),
            score.final_level().as_str(),
            if score.is_degraded() { " [degraded]" } else { "" }
        );

        Analysis {
            semantic_sections: semantic.per_section(),
            document,
            skills,
            impact_analysis,
            ats,
            score,
        }
    }

    /// `prepare` then `score` on the current task.
    pub async fn analyze(
        &self,
        text: &str,
        role: &RoleTaxonomy,
        job_description: Option<&str>,
    ) -> Analysis {
        let prepared = self.prepare(text, role);
        self.score(prepared, role, job_description).await
    }
}
