//! Skill Coverage Analyzer: matched / missing partitions and coverage ratios for one role.
//!
//! A `SkillAnalysisResult` is only ever built by [`analyze`]; its lists are private so the
//! partition `matched + missing == total` holds per tier for the value's whole lifetime.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use crate::document::sections::ParsedDocument;
use crate::skills::matcher::{detect_skills, DetectedSkill};
use crate::taxonomy::{RoleTaxonomy, SkillDefinition, SkillPriority};

/// Must-have / nice-to-have split used for coverage blends.
pub const MUST_HAVE_SHARE: f64 = 0.7;
pub const NICE_TO_HAVE_SHARE: f64 = 0.3;

#[derive(Debug, Clone, PartialEq)]
pub struct SkillAnalysisResult {
    detected_skills: BTreeMap<String, DetectedSkill>,
    must_have_matched: Vec<String>,
    must_have_missing: Vec<String>,
    nice_to_have_matched: Vec<String>,
    nice_to_have_missing: Vec<String>,
    /// Display names for every skill of the role, by id.
    names: BTreeMap<String, String>,
}

fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

impl SkillAnalysisResult {
    pub fn detected_skills(&self) -> &BTreeMap<String, DetectedSkill> {
        &self.detected_skills
    }

    pub fn must_have_matched(&self) -> &[String] {
        &self.must_have_matched
    }

    pub fn must_have_missing(&self) -> &[String] {
        &self.must_have_missing
    }

    pub fn nice_to_have_matched(&self) -> &[String] {
        &self.nice_to_have_matched
    }

    pub fn nice_to_have_missing(&self) -> &[String] {
        &self.nice_to_have_missing
    }

    pub fn must_have_total(&self) -> usize {
        self.must_have_matched.len() + self.must_have_missing.len()
    }

    pub fn nice_to_have_total(&self) -> usize {
        self.nice_to_have_matched.len() + self.nice_to_have_missing.len()
    }

    pub fn must_have_coverage(&self) -> f64 {
        ratio(self.must_have_matched.len(), self.must_have_total())
    }

    pub fn nice_to_have_coverage(&self) -> f64 {
        ratio(self.nice_to_have_matched.len(), self.nice_to_have_total())
    }

    pub fn overall_coverage(&self) -> f64 {
        MUST_HAVE_SHARE * self.must_have_coverage()
            + NICE_TO_HAVE_SHARE * self.nice_to_have_coverage()
    }

    pub fn proven_count(&self) -> usize {
        self.detected_skills.values().filter(|s| s.is_proven()).count()
    }

    pub fn listed_only_count(&self) -> usize {
        self.detected_skills
            .values()
            .filter(|s| s.is_only_listed())
            .count()
    }

    /// Share of detected skills with evidence in Experience, Projects or Certifications.
    pub fn proven_skills_ratio(&self) -> f64 {
        ratio(self.proven_count(), self.detected_skills.len())
    }

    /// Share of detected skills that only appear in Skills/Summary.
    pub fn listed_only_ratio(&self) -> f64 {
        ratio(self.listed_only_count(), self.detected_skills.len())
    }

    /// Display name for a skill id of this role, falling back to the id itself.
    pub fn display_name<'a>(&'a self, skill_id: &'a str) -> &'a str {
        self.names.get(skill_id).map(String::as_str).unwrap_or(skill_id)
    }

    /// Detected skills grouped by category; each group ordered by skill id.
    pub fn skills_by_category(&self) -> BTreeMap<String, Vec<&DetectedSkill>> {
        let mut groups: BTreeMap<String, Vec<&DetectedSkill>> = BTreeMap::new();
        for skill in self.detected_skills.values() {
            groups.entry(skill.category.clone()).or_default().push(skill);
        }
        groups
    }

    /// Detected skills that are only listed, in must-have-then-nice-to-have declaration order.
    pub fn listed_only_names(&self) -> Vec<&str> {
        self.must_have_matched
            .iter()
            .chain(self.nice_to_have_matched.iter())
            .filter(|id| {
                self.detected_skills
                    .get(id.as_str())
                    .is_some_and(DetectedSkill::is_only_listed)
            })
            .map(|id| self.display_name(id))
            .collect()
    }
}

impl Serialize for SkillAnalysisResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct View<'a> {
            must_have_matched: &'a [String],
            must_have_missing: &'a [String],
            nice_to_have_matched: &'a [String],
            nice_to_have_missing: &'a [String],
            must_have_coverage: f64,
            nice_to_have_coverage: f64,
            overall_coverage: f64,
            proven_skills_ratio: f64,
            detected_skills: Vec<&'a DetectedSkill>,
            skills_by_category: BTreeMap<String, Vec<&'a str>>,
        }
        View {
            must_have_matched: &self.must_have_matched,
            must_have_missing: &self.must_have_missing,
            nice_to_have_matched: &self.nice_to_have_matched,
            nice_to_have_missing: &self.nice_to_have_missing,
            must_have_coverage: self.must_have_coverage(),
            nice_to_have_coverage: self.nice_to_have_coverage(),
            overall_coverage: self.overall_coverage(),
            proven_skills_ratio: self.proven_skills_ratio(),
            detected_skills: self.detected_skills.values().collect(),
            skills_by_category: self
                .skills_by_category()
                .into_iter()
                .map(|(category, skills)| {
                    (category, skills.iter().map(|s| s.skill_id.as_str()).collect())
                })
                .collect(),
        }
        .serialize(serializer)
    }
}

/// Partitions a role's skills into matched / missing per tier, in declaration order.
///
/// Detected entries for ids outside `definitions` are dropped so the result only describes
/// the role it was built for.
pub fn analyze(
    mut detected: BTreeMap<String, DetectedSkill>,
    definitions: &[&SkillDefinition],
) -> SkillAnalysisResult {
    detected.retain(|id, _| definitions.iter().any(|d| &d.id == id));

    let mut result = SkillAnalysisResult {
        detected_skills: BTreeMap::new(),
        must_have_matched: Vec::new(),
        must_have_missing: Vec::new(),
        nice_to_have_matched: Vec::new(),
        nice_to_have_missing: Vec::new(),
        names: BTreeMap::new(),
    };

    for definition in definitions {
        if result.names.contains_key(&definition.id) {
            continue;
        }
        result
            .names
            .insert(definition.id.clone(), definition.name.clone());

        let found = detected.contains_key(&definition.id);
        let bucket = match (definition.priority, found) {
            (SkillPriority::MustHave, true) => &mut result.must_have_matched,
            (SkillPriority::MustHave, false) => &mut result.must_have_missing,
            (SkillPriority::NiceToHave, true) => &mut result.nice_to_have_matched,
            (SkillPriority::NiceToHave, false) => &mut result.nice_to_have_missing,
        };
        bucket.push(definition.id.clone());
    }

    result.detected_skills = detected;
    result
}

/// Detection plus coverage for one role; the per-role unit of work shared by analysis and ranking.
pub fn analyze_role(
    doc: &ParsedDocument,
    role: &RoleTaxonomy,
    fuzzy_threshold: f64,
) -> SkillAnalysisResult {
    let definitions: Vec<&SkillDefinition> = role.skills().collect();
    let detected = detect_skills(doc, &definitions, fuzzy_threshold);
    analyze(detected, &definitions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::sections::segment;
    use crate::skills::matcher::{Confidence, DEFAULT_FUZZY_THRESHOLD};

    fn def(id: &str, priority: SkillPriority, aliases: &[&str]) -> SkillDefinition {
        SkillDefinition {
            id: id.to_string(),
            name: id.to_uppercase(),
            category: if id == "sql" { "data".into() } else { "programming".into() },
            priority,
            weight: 1.0,
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn data_role() -> RoleTaxonomy {
        RoleTaxonomy {
            id: "data_engineer".into(),
            title: "Data Engineer".into(),
            must_have: vec![
                def("python", SkillPriority::MustHave, &["python"]),
                def("sql", SkillPriority::MustHave, &["sql"]),
            ],
            nice_to_have: vec![
                def("django", SkillPriority::NiceToHave, &["django"]),
                def("airflow", SkillPriority::NiceToHave, &["airflow"]),
            ],
        }
    }

    #[test]
    fn test_all_must_haves_proven_in_experience() {
        let doc = segment("Experience\nBuilt data pipelines using Python and SQL in production.");
        let result = analyze_role(&doc, &data_role(), DEFAULT_FUZZY_THRESHOLD);

        assert_eq!(result.must_have_matched(), ["python", "sql"]);
        assert!(result.must_have_missing().is_empty());
        assert_eq!(result.must_have_coverage(), 1.0);
        for id in ["python", "sql"] {
            let skill = &result.detected_skills()[id];
            assert_eq!(skill.confidence(), Confidence::High);
            assert!(skill.is_proven());
        }
        assert_eq!(result.proven_skills_ratio(), 1.0);
    }

    #[test]
    fn test_no_aliases_present_means_everything_missing() {
        let doc = segment("Familiar with scripting languages");
        let result = analyze_role(&doc, &data_role(), DEFAULT_FUZZY_THRESHOLD);

        assert!(result.must_have_matched().is_empty());
        assert_eq!(result.must_have_missing(), ["python", "sql"]);
        assert_eq!(result.must_have_coverage(), 0.0);
        assert_eq!(result.overall_coverage(), 0.0);
        assert_eq!(result.proven_skills_ratio(), 0.0);
        assert!(result.detected_skills().is_empty());
    }

    #[test]
    fn test_partition_holds_per_tier() {
        let doc = segment("Skills\nPython, Django\nProjects\nScheduled jobs with Airflow");
        let result = analyze_role(&doc, &data_role(), DEFAULT_FUZZY_THRESHOLD);
        assert_eq!(
            result.must_have_matched().len() + result.must_have_missing().len(),
            2
        );
        assert_eq!(
            result.nice_to_have_matched().len() + result.nice_to_have_missing().len(),
            2
        );
        assert_eq!(result.nice_to_have_coverage(), 1.0);
        assert_eq!(result.must_have_coverage(), 0.5);
        assert!((result.overall_coverage() - (0.7 * 0.5 + 0.3)).abs() < 1e-9);
    }

    #[test]
    fn test_skill_listed_only_in_skills_section() {
        let doc = segment("Skills\nDjango\nExperience\nWrote Python services");
        let result = analyze_role(&doc, &data_role(), DEFAULT_FUZZY_THRESHOLD);
        let django = &result.detected_skills()["django"];
        assert!(!django.is_proven());
        assert!(django.is_only_listed());
        assert_eq!(result.listed_only_count(), 1);
        assert_eq!(result.proven_count(), 1);
        assert_eq!(result.listed_only_names(), vec!["DJANGO"]);
    }

    #[test]
    fn test_zero_defined_skills_gives_zero_coverage() {
        let result = analyze(BTreeMap::new(), &[]);
        assert_eq!(result.must_have_coverage(), 0.0);
        assert_eq!(result.nice_to_have_coverage(), 0.0);
        assert_eq!(result.must_have_total(), 0);
    }

    #[test]
    fn test_skills_grouped_by_category() {
        let doc = segment("Experience\nPython and SQL daily");
        let result = analyze_role(&doc, &data_role(), DEFAULT_FUZZY_THRESHOLD);
        let groups = result.skills_by_category();
        assert_eq!(groups["data"].len(), 1);
        assert_eq!(groups["programming"][0].skill_id, "python");
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let result = analyze(BTreeMap::new(), &[]);
        assert_eq!(result.display_name("rust"), "rust");
    }

    #[test]
    fn test_serializes_derived_ratios() {
        let doc = segment("Experience\nPython");
        let result = analyze_role(&doc, &data_role(), DEFAULT_FUZZY_THRESHOLD);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["must_have_coverage"], 0.5);
        assert_eq!(json["must_have_missing"][0], "sql");
        assert_eq!(json["detected_skills"][0]["skill_id"], "python");
    }
}
