//! Role Ranker: scores one resume against every role in the catalog.
//!
//! Each role gets its own detection + coverage pass over the shared, read-only document and
//! taxonomy; passes run in parallel on the rayon pool and are then stably sorted by alignment,
//! so equal alignments keep catalog order.

use std::collections::BTreeSet;

use rayon::prelude::*;
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::document::sections::ParsedDocument;
use crate::skills::coverage::{analyze_role, SkillAnalysisResult, MUST_HAVE_SHARE, NICE_TO_HAVE_SHARE};
use crate::taxonomy::{RoleTaxonomy, TaxonomyCatalog};

/// Bonus weight of the proven-skills ratio in role alignment.
const PROVEN_BONUS: f64 = 0.1;
const GOOD_FIT_THRESHOLD: f64 = 0.6;
const TOP_MATCHES: usize = 3;
const MAX_INSIGHT_ITEMS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct RoleMatch {
    pub role_id: String,
    pub role_title: String,
    pub alignment_score: f64,
    pub skills: SkillAnalysisResult,
}

impl RoleMatch {
    pub fn alignment_percentage(&self) -> u32 {
        (self.alignment_score * 100.0).round() as u32
    }

    pub fn fit_level(&self) -> &'static str {
        match self.alignment_score {
            s if s >= 0.75 => "Excellent Fit",
            s if s >= 0.6 => "Good Fit",
            s if s >= 0.45 => "Moderate Fit",
            s if s >= 0.3 => "Partial Fit",
            _ => "Low Fit",
        }
    }

    /// First three missing must-have skills, by display name.
    pub fn top_missing_skills(&self) -> Vec<&str> {
        self.skills
            .must_have_missing()
            .iter()
            .take(3)
            .map(|id| self.skills.display_name(id))
            .collect()
    }

    fn matched_ids(&self) -> impl Iterator<Item = &String> {
        self.skills
            .must_have_matched()
            .iter()
            .chain(self.skills.nice_to_have_matched())
    }
}

impl Serialize for RoleMatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct View<'a> {
            role_id: &'a str,
            role_title: &'a str,
            alignment_score: f64,
            alignment_percentage: u32,
            fit_level: &'a str,
            must_have_coverage: f64,
            nice_to_have_coverage: f64,
            proven_skills_ratio: f64,
            must_have_matched: &'a [String],
            must_have_missing: &'a [String],
            nice_to_have_matched: &'a [String],
            nice_to_have_missing: &'a [String],
            top_missing_skills: Vec<&'a str>,
        }
        View {
            role_id: &self.role_id,
            role_title: &self.role_title,
            alignment_score: self.alignment_score,
            alignment_percentage: self.alignment_percentage(),
            fit_level: self.fit_level(),
            must_have_coverage: self.skills.must_have_coverage(),
            nice_to_have_coverage: self.skills.nice_to_have_coverage(),
            proven_skills_ratio: self.skills.proven_skills_ratio(),
            must_have_matched: self.skills.must_have_matched(),
            must_have_missing: self.skills.must_have_missing(),
            nice_to_have_matched: self.skills.nice_to_have_matched(),
            nice_to_have_missing: self.skills.nice_to_have_missing(),
            top_missing_skills: self.top_missing_skills(),
        }
        .serialize(serializer)
    }
}

/// `min(1, 0.7·must + 0.3·nice + 0.1·proven)`.
pub fn alignment(skills: &SkillAnalysisResult) -> f64 {
    (MUST_HAVE_SHARE * skills.must_have_coverage()
        + NICE_TO_HAVE_SHARE * skills.nice_to_have_coverage()
        + PROVEN_BONUS * skills.proven_skills_ratio())
    .min(1.0)
}

pub fn match_role(doc: &ParsedDocument, role: &RoleTaxonomy, fuzzy_threshold: f64) -> RoleMatch {
    let skills = analyze_role(doc, role, fuzzy_threshold);
    RoleMatch {
        role_id: role.id.clone(),
        role_title: role.title.clone(),
        alignment_score: alignment(&skills),
        skills,
    }
}

/// All roles, best alignment first; ties keep catalog order.
pub fn rank_roles(
    doc: &ParsedDocument,
    catalog: &TaxonomyCatalog,
    fuzzy_threshold: f64,
) -> Vec<RoleMatch> {
    let mut matches: Vec<RoleMatch> = catalog
        .roles()
        .par_iter()
        .map(|role| match_role(doc, role, fuzzy_threshold))
        .collect();

    // `sort_by` is stable.
    matches.sort_by(|a, b| b.alignment_score.total_cmp(&a.alignment_score));

    debug!("Ranked {} roles", matches.len());
    matches
}

// ────────────────────────────────────────────────────────────────────────────
// Recommendation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestRole {
    pub role_id: String,
    pub title: String,
    pub alignment: u32,
    pub fit_level: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CareerPath {
    pub role: String,
    pub alignment: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleInsights {
    pub best_role: Option<BestRole>,
    /// Skills matched in at least two roles.
    pub skill_strengths: Vec<String>,
    /// Must-have skills missing in at least two of the top roles.
    pub skill_gaps: Vec<String>,
    pub career_paths: Vec<CareerPath>,
}

/// Ranked role matches plus every skill id detected for any role.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleRecommendation {
    /// Sorted by alignment, best first.
    pub matches: Vec<RoleMatch>,
    pub resume_skills: BTreeSet<String>,
}

/// Counts occurrences while keeping first-seen order.
fn count_in_order<'a>(items: impl Iterator<Item = &'a String>) -> Vec<(&'a String, usize)> {
    let mut counts: Vec<(&String, usize)> = Vec::new();
    for item in items {
        match counts.iter_mut().find(|(seen, _)| *seen == item) {
            Some((_, n)) => *n += 1,
            None => counts.push((item, 1)),
        }
    }
    counts
}

impl RoleRecommendation {
    pub fn best_match(&self) -> Option<&RoleMatch> {
        self.matches.first()
    }

    pub fn top_matches(&self) -> &[RoleMatch] {
        &self.matches[..self.matches.len().min(TOP_MATCHES)]
    }

    pub fn good_fit_roles(&self) -> Vec<&RoleMatch> {
        self.matches
            .iter()
            .filter(|m| m.alignment_score >= GOOD_FIT_THRESHOLD)
            .collect()
    }

    pub fn get_role_match(&self, role_id: &str) -> Option<&RoleMatch> {
        self.matches.iter().find(|m| m.role_id == role_id)
    }

    pub fn insights(&self) -> RoleInsights {
        let best_role = self.best_match().map(|best| BestRole {
            role_id: best.role_id.clone(),
            title: best.role_title.clone(),
            alignment: best.alignment_percentage(),
            fit_level: best.fit_level(),
        });

        let skill_strengths = count_in_order(self.matches.iter().flat_map(RoleMatch::matched_ids))
            .into_iter()
            .filter(|(_, n)| *n >= 2)
            .map(|(id, _)| id.clone())
            .take(MAX_INSIGHT_ITEMS)
            .collect();

        let skill_gaps = count_in_order(
            self.top_matches()
                .iter()
                .flat_map(|m| m.skills.must_have_missing().iter()),
        )
        .into_iter()
        .filter(|(_, n)| *n >= 2)
        .map(|(id, _)| id.clone())
        .take(MAX_INSIGHT_ITEMS)
        .collect();

        let career_paths = self
            .good_fit_roles()
            .into_iter()
            .map(|m| CareerPath {
                role: m.role_title.clone(),
                alignment: m.alignment_percentage(),
            })
            .collect();

        RoleInsights {
            best_role,
            skill_strengths,
            skill_gaps,
            career_paths,
        }
    }

    pub fn summary_text(&self) -> String {
        let Some(best) = self.best_match() else {
            return "No roles available for comparison.".to_string();
        };

        let mut lines = vec!["Your profile alignment:".to_string(), String::new()];
        for m in self.top_matches() {
            lines.push(format!(
                "  {}% - {} ({})",
                m.alignment_percentage(),
                m.role_title,
                m.fit_level()
            ));
        }

        lines.push(String::new());
        lines.push(format!("Best fit: {}", best.role_title));
        let missing = best.top_missing_skills();
        if !missing.is_empty() {
            lines.push(format!("To improve: Add {}", missing.join(", ")));
        }
        lines.join("\n")
    }
}

impl Serialize for RoleRecommendation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct View<'a> {
            matches: &'a [RoleMatch],
            resume_skills: &'a BTreeSet<String>,
            insights: RoleInsights,
            summary: String,
        }
        View {
            matches: &self.matches,
            resume_skills: &self.resume_skills,
            insights: self.insights(),
            summary: self.summary_text(),
        }
        .serialize(serializer)
    }
}

pub fn recommend_roles(
    doc: &ParsedDocument,
    catalog: &TaxonomyCatalog,
    fuzzy_threshold: f64,
) -> RoleRecommendation {
    let matches = rank_roles(doc, catalog, fuzzy_threshold);
    let resume_skills = matches
        .iter()
        .flat_map(RoleMatch::matched_ids)
        .cloned()
        .collect();
    RoleRecommendation {
        matches,
        resume_skills,
    }
}
