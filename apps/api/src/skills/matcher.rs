//! Taxonomy Skill Matcher: finds each skill's occurrences across document sections.
//!
//! Matching policy per skill:
//! 1. Exact pass: case-insensitive whole-word match of any alias in any section → HIGH.
//! 2. Fuzzy pass, only when the exact pass found nothing for the skill anywhere in the
//!    document: partial-ratio similarity of each alias (≥ 4 chars) against each section;
//!    a score at or above the threshold → MEDIUM.
//! 3. No evidence → the skill is absent from the returned map (the caller reports it missing).
//!
//! Overall confidence is the maximum over the evidence list, so it does not depend on the
//! order in which sections or aliases are visited.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, warn};

use crate::document::sections::{ParsedDocument, Section, SectionType};
use crate::skills::fuzzy::partial_ratio;
use crate::taxonomy::{SkillDefinition, SkillPriority};

/// Aliases shorter than this are never fuzzy-matched.
pub const MIN_FUZZY_ALIAS_CHARS: usize = 4;
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.85;
const SNIPPET_RADIUS_CHARS: usize = 50;

/// Detection confidence. Declaration order is the total order used for aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// One located occurrence of a skill alias.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evidence {
    pub section_type: SectionType,
    pub section_label: String,
    pub matched_alias: String,
    pub snippet: String,
    /// Byte offset of the match in the original document text.
    pub offset: usize,
    pub confidence: Confidence,
}

impl Evidence {
    pub fn weight(&self) -> f64 {
        self.section_type.weight()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectedSkill {
    pub skill_id: String,
    pub name: String,
    pub priority: SkillPriority,
    pub category: String,
    pub weight: f64,
    pub evidence: Vec<Evidence>,
}

impl DetectedSkill {
    /// Maximum confidence over all evidence.
    pub fn confidence(&self) -> Confidence {
        self.evidence
            .iter()
            .map(|e| e.confidence)
            .max()
            .unwrap_or(Confidence::Low)
    }

    /// At least one occurrence in Experience, Projects, or Certifications.
    pub fn is_proven(&self) -> bool {
        self.evidence.iter().any(|e| e.section_type.is_evidence())
    }

    /// Every occurrence is confined to Skills/Summary.
    pub fn is_only_listed(&self) -> bool {
        !self.evidence.is_empty() && self.evidence.iter().all(|e| e.section_type.is_listing())
    }

    /// Highest-weighted evidence; earliest wins ties.
    pub fn best_evidence(&self) -> Option<&Evidence> {
        self.evidence.iter().fold(None, |best: Option<&Evidence>, e| match best {
            Some(b) if b.weight() >= e.weight() => Some(b),
            _ => Some(e),
        })
    }

    pub fn evidence_score(&self) -> f64 {
        self.best_evidence().map(Evidence::weight).unwrap_or(0.0)
    }
}

impl Serialize for DetectedSkill {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct View<'a> {
            skill_id: &'a str,
            name: &'a str,
            priority: SkillPriority,
            category: &'a str,
            weight: f64,
            confidence: Confidence,
            is_proven: bool,
            is_only_listed: bool,
            evidence_score: f64,
            evidence: &'a [Evidence],
        }
        View {
            skill_id: &self.skill_id,
            name: &self.name,
            priority: self.priority,
            category: &self.category,
            weight: self.weight,
            confidence: self.confidence(),
            is_proven: self.is_proven(),
            is_only_listed: self.is_only_listed(),
            evidence_score: self.evidence_score(),
            evidence: &self.evidence,
        }
        .serialize(serializer)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Matching
// ────────────────────────────────────────────────────────────────────────────

/// Text around `[start, end)` widened by `radius` chars on each side, at char boundaries.
pub fn snippet_around(text: &str, start: usize, end: usize, radius: usize) -> String {
    let from = text[..start]
        .char_indices()
        .rev()
        .take(radius)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(start);
    let to = text[end..]
        .char_indices()
        .nth(radius)
        .map(|(i, _)| end + i)
        .unwrap_or(text.len());
    format!("...{}...", text[from..to].trim())
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Trimmed, non-empty aliases with case-insensitive duplicates removed (first kept).
fn normalized_aliases(skill: &SkillDefinition) -> Vec<&str> {
    let mut seen: Vec<String> = Vec::new();
    let mut aliases = Vec::new();
    for alias in skill.aliases.iter().map(|a| a.trim()).filter(|a| !a.is_empty()) {
        let key = alias.to_lowercase();
        if !seen.contains(&key) {
            seen.push(key);
            aliases.push(alias);
        }
    }
    aliases
}

/// Case-insensitive alias matcher with a word-boundary rule that also works for aliases
/// that start or end in symbols (`c++`, `.net`): the boundary is only enforced on sides
/// where the alias itself has a word character.
struct AliasPattern<'a> {
    alias: &'a str,
    regex: Regex,
    check_left: bool,
    check_right: bool,
}

impl<'a> AliasPattern<'a> {
    fn new(alias: &'a str) -> Option<Self> {
        let regex = match Regex::new(&format!("(?i){}", regex::escape(alias))) {
            Ok(regex) => regex,
            Err(e) => {
                warn!("Skipping alias '{alias}': {e}");
                return None;
            }
        };
        Some(Self {
            alias,
            regex,
            check_left: alias.chars().next().is_some_and(is_word_char),
            check_right: alias.chars().last().is_some_and(is_word_char),
        })
    }

    /// Byte ranges of whole-word occurrences in `text`.
    fn find_all(&self, text: &str) -> Vec<(usize, usize)> {
        self.regex
            .find_iter(text)
            .filter(|m| {
                let left_ok = !self.check_left
                    || !text[..m.start()].chars().next_back().is_some_and(is_word_char);
                let right_ok =
                    !self.check_right || !text[m.end()..].chars().next().is_some_and(is_word_char);
                left_ok && right_ok
            })
            .map(|m| (m.start(), m.end()))
            .collect()
    }
}

fn exact_evidence(doc: &ParsedDocument, patterns: &[AliasPattern<'_>]) -> Vec<Evidence> {
    let mut evidence = Vec::new();
    for section in &doc.sections {
        for pattern in patterns {
            for (start, end) in pattern.find_all(&section.content) {
                evidence.push(Evidence {
                    section_type: section.section_type,
                    section_label: section.label().to_string(),
                    matched_alias: pattern.alias.to_string(),
                    snippet: snippet_around(&section.content, start, end, SNIPPET_RADIUS_CHARS),
                    offset: content_offset(&doc.original_text, section, start),
                    confidence: Confidence::High,
                });
            }
        }
    }
    evidence
}

fn fuzzy_evidence(doc: &ParsedDocument, aliases: &[&str], threshold: f64) -> Vec<Evidence> {
    let mut evidence = Vec::new();
    for section in &doc.sections {
        for alias in aliases
            .iter()
            .filter(|a| a.chars().count() >= MIN_FUZZY_ALIAS_CHARS)
        {
            let Some(hit) = partial_ratio(alias, &section.content) else {
                continue;
            };
            if hit.score >= threshold {
                evidence.push(Evidence {
                    section_type: section.section_type,
                    section_label: section.label().to_string(),
                    matched_alias: alias.to_string(),
                    snippet: snippet_around(
                        &section.content,
                        hit.start,
                        hit.end,
                        SNIPPET_RADIUS_CHARS,
                    ),
                    offset: content_offset(&doc.original_text, section, hit.start),
                    confidence: Confidence::Medium,
                });
            }
        }
    }
    evidence
}

/// Maps an offset inside (trimmed) section content back to the original document text.
fn content_offset(original: &str, section: &Section, offset_in_content: usize) -> usize {
    let leading = original
        .get(section.start..section.end)
        .and_then(|body| body.find(section.content.as_str()))
        .unwrap_or(0);
    section.start + leading + offset_in_content
}

/// Detects one skill. Returns `None` when no evidence exists anywhere in the document.
pub fn detect_skill(
    doc: &ParsedDocument,
    skill: &SkillDefinition,
    fuzzy_threshold: f64,
) -> Option<DetectedSkill> {
    let aliases = normalized_aliases(skill);
    if aliases.is_empty() {
        return None;
    }

    let patterns: Vec<AliasPattern<'_>> =
        aliases.iter().filter_map(|a| AliasPattern::new(a)).collect();
    let mut evidence = exact_evidence(doc, &patterns);

    // Exact matches anywhere short-circuit fuzzy matching for the whole skill.
    if evidence.is_empty() {
        evidence = fuzzy_evidence(doc, &aliases, fuzzy_threshold);
    }

    if evidence.is_empty() {
        return None;
    }

    Some(DetectedSkill {
        skill_id: skill.id.clone(),
        name: skill.name.clone(),
        priority: skill.priority,
        category: skill.category.clone(),
        weight: skill.weight,
        evidence,
    })
}

/// Detects every skill in `skills` that has at least one occurrence in the document.
pub fn detect_skills(
    doc: &ParsedDocument,
    skills: &[&SkillDefinition],
    fuzzy_threshold: f64,
) -> BTreeMap<String, DetectedSkill> {
    let detected: BTreeMap<String, DetectedSkill> = skills
        .iter()
        .filter_map(|skill| detect_skill(doc, skill, fuzzy_threshold))
        .map(|d| (d.skill_id.clone(), d))
        .collect();

    debug!(
        "Detected {}/{} skills across {} sections",
        detected.len(),
        skills.len(),
        doc.sections.len()
    );
    detected
}
