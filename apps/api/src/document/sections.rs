//! Section Segmenter: splits free-form resume text into typed, ordered sections.
//!
//! Headings are recognised as whole lines against a single ordered catalog of
//! pattern groups (`HEADING_CATALOG`). Groups are checked in declaration order and the
//! first group that matches wins. Segmentation never fails: text without any recognised
//! heading becomes one `Other` section spanning the whole input.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};

/// Leading text longer than this (in chars) before the first heading becomes a Contact section.
const LEADING_CONTACT_MIN_CHARS: usize = 50;

/// Lines longer than this are never treated as headings.
const MAX_HEADING_CHARS: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    Summary,
    Skills,
    Experience,
    Projects,
    Education,
    Certifications,
    Awards,
    Publications,
    Contact,
    Other,
}

impl SectionType {
    /// Evidentiary weight of a skill mention found in this section.
    pub const fn weight(self) -> f64 {
        match self {
            SectionType::Experience => 1.0,
            SectionType::Projects => 0.9,
            SectionType::Certifications => 0.8,
            SectionType::Publications => 0.8,
            SectionType::Awards => 0.7,
            SectionType::Education => 0.6,
            SectionType::Skills => 0.5,
            SectionType::Summary => 0.4,
            SectionType::Other => 0.3,
            SectionType::Contact => 0.0,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            SectionType::Summary => "summary",
            SectionType::Skills => "skills",
            SectionType::Experience => "experience",
            SectionType::Projects => "projects",
            SectionType::Education => "education",
            SectionType::Certifications => "certifications",
            SectionType::Awards => "awards",
            SectionType::Publications => "publications",
            SectionType::Contact => "contact",
            SectionType::Other => "other",
        }
    }

    /// Sections where a skill mention counts as demonstrated use.
    pub const fn is_evidence(self) -> bool {
        matches!(
            self,
            SectionType::Experience | SectionType::Projects | SectionType::Certifications
        )
    }

    /// Sections where skills are typically only listed.
    pub const fn is_listing(self) -> bool {
        matches!(self, SectionType::Skills | SectionType::Summary)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Heading catalog
// ────────────────────────────────────────────────────────────────────────────

/// Ordered heading-pattern table. Each pattern must match the whole (decoration-stripped) line.
const HEADING_CATALOG: &[(SectionType, &[&str])] = &[
    (
        SectionType::Summary,
        &[
            r"(?:professional\s+)?summary",
            r"(?:career\s+)?objective",
            r"profile",
            r"about\s*(?:me)?",
            r"executive\s+summary",
            r"personal\s+statement",
        ],
    ),
    (
        SectionType::Skills,
        &[
            r"(?:technical\s+)?skills",
            r"technologies",
            r"competencies",
            r"expertise",
            r"proficiencies",
            r"tools?\s*(?:&|and)?\s*technologies",
            r"technical\s+proficiency",
            r"core\s+competencies",
        ],
    ),
    (
        SectionType::Experience,
        &[
            r"(?:work|professional|employment)\s*(?:experience|history)?",
            r"experience",
            r"career\s+history",
            r"work\s+history",
            r"professional\s+background",
            r"positions?\s+held",
        ],
    ),
    (
        SectionType::Projects,
        &[
            r"projects?",
            r"(?:personal|academic|professional)\s+projects?",
            r"portfolio",
            r"key\s+projects?",
            r"selected\s+projects?",
        ],
    ),
    (
        SectionType::Education,
        &[
            r"education(?:al\s+background)?",
            r"academic\s+(?:background|qualifications?)",
            r"qualifications?",
            r"degrees?",
            r"academic\s+history",
        ],
    ),
    (
        SectionType::Certifications,
        &[
            r"certifications?",
            r"licenses?\s*(?:&|and)?\s*certifications?",
            r"professional\s+certifications?",
            r"credentials?",
            r"accreditations?",
        ],
    ),
    (
        SectionType::Awards,
        &[
            r"awards?\s*(?:&|and)?\s*(?:honors?|achievements?)?",
            r"honors?\s*(?:&|and)?\s*awards?",
            r"achievements?",
            r"recognition",
            r"accomplishments?",
        ],
    ),
    (
        SectionType::Publications,
        &[
            r"publications?",
            r"papers?",
            r"research(?:\s+papers?)?",
            r"articles?",
        ],
    ),
    (
        SectionType::Contact,
        &[
            r"contact(?:\s+(?:info(?:rmation)?|details?))?",
            r"personal\s+(?:info(?:rmation)?|details?)",
        ],
    ),
];

/// One compiled whole-line regex per catalog group, in catalog order.
static HEADING_MATCHERS: LazyLock<Vec<(SectionType, Regex)>> = LazyLock::new(|| {
    HEADING_CATALOG
        .iter()
        .map(|(section_type, patterns)| {
            let pattern = format!("(?i)^(?:{})$", patterns.join("|"));
            let regex = Regex::new(&pattern).unwrap_or_else(|e| {
                panic!("invalid heading pattern for {section_type:?}: {e}")
            });
            (*section_type, regex)
        })
        .collect()
});

static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[•\-\*]").expect("bullet pattern is valid"));

/// Strips bullet/markdown decoration and trailing punctuation from a candidate heading line.
fn strip_decoration(line: &str) -> &str {
    line.trim()
        .trim_start_matches(|c: char| matches!(c, '#' | '*' | '-' | '•') || c.is_whitespace())
        .trim_end_matches(|c: char| {
            c.is_ascii_punctuation() || matches!(c, '–' | '—' | '•') || c.is_whitespace()
        })
}

/// Classifies a single line as a section heading, if it is one.
pub fn classify_heading(line: &str) -> Option<SectionType> {
    let candidate = strip_decoration(line);
    if candidate.is_empty() || candidate.chars().count() > MAX_HEADING_CHARS {
        return None;
    }
    HEADING_MATCHERS
        .iter()
        .find(|(_, regex)| regex.is_match(candidate))
        .map(|(section_type, _)| *section_type)
}

// ────────────────────────────────────────────────────────────────────────────
// Data model
// ────────────────────────────────────────────────────────────────────────────

/// A typed span of the resume. Offsets are byte offsets into the original text;
/// `start..end` covers the body between this heading and the next one.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub section_type: SectionType,
    pub heading: String,
    pub content: String,
    pub start: usize,
    pub end: usize,
}

impl Section {
    pub fn weight(&self) -> f64 {
        self.section_type.weight()
    }

    /// Heading text if present, otherwise the section type name.
    pub fn label(&self) -> &str {
        if self.heading.is_empty() {
            self.section_type.as_str()
        } else {
            &self.heading
        }
    }

    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }

    pub fn has_bullets(&self) -> bool {
        BULLET_RE.is_match(&self.content)
    }
}

impl Serialize for Section {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct View<'a> {
            section_type: SectionType,
            heading: &'a str,
            start: usize,
            end: usize,
            weight: f64,
            word_count: usize,
            has_bullets: bool,
        }
        View {
            section_type: self.section_type,
            heading: &self.heading,
            start: self.start,
            end: self.end,
            weight: self.weight(),
            word_count: self.word_count(),
            has_bullets: self.has_bullets(),
        }
        .serialize(serializer)
    }
}

/// Which of the commonly expected sections are present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionCompleteness {
    pub has_contact: bool,
    pub has_summary: bool,
    pub has_experience: bool,
    pub has_education: bool,
    pub has_skills: bool,
    pub has_projects: bool,
}

/// The segmented resume. Owns its sections; derived properties are always recomputed.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub original_text: String,
    pub sections: Vec<Section>,
}

impl ParsedDocument {
    pub fn get_section(&self, section_type: SectionType) -> Option<&Section> {
        self.sections.iter().find(|s| s.section_type == section_type)
    }

    pub fn get_sections(&self, section_type: SectionType) -> Vec<&Section> {
        self.sections
            .iter()
            .filter(|s| s.section_type == section_type)
            .collect()
    }

    /// Content of every section whose type is in `types`, in document order.
    pub fn combined_text(&self, types: &[SectionType]) -> String {
        self.sections
            .iter()
            .filter(|s| types.contains(&s.section_type))
            .map(|s| s.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Section texts keyed by type name, merged per type, in first-appearance order.
    pub fn texts_by_type(&self) -> Vec<(String, String)> {
        let mut merged: Vec<(String, String)> = Vec::new();
        for section in self.sections.iter().filter(|s| !s.content.trim().is_empty()) {
            let name = section.section_type.as_str();
            match merged.iter_mut().find(|(n, _)| n == name) {
                Some((_, text)) => {
                    text.push('\n');
                    text.push_str(&section.content);
                }
                None => merged.push((name.to_string(), section.content.clone())),
            }
        }
        merged
    }

    fn has(&self, section_type: SectionType) -> bool {
        self.sections.iter().any(|s| s.section_type == section_type)
    }

    pub fn has_experience(&self) -> bool {
        self.has(SectionType::Experience)
    }

    pub fn has_projects(&self) -> bool {
        self.has(SectionType::Projects)
    }

    pub fn has_skills(&self) -> bool {
        self.has(SectionType::Skills)
    }

    pub fn has_education(&self) -> bool {
        self.has(SectionType::Education)
    }

    pub fn word_count(&self) -> usize {
        self.sections.iter().map(Section::word_count).sum()
    }

    /// Percentage of words per section type, rounded to one decimal.
    pub fn section_balance(&self) -> BTreeMap<String, f64> {
        let total = self.word_count();
        if total == 0 {
            return BTreeMap::new();
        }
        let mut words: BTreeMap<String, usize> = BTreeMap::new();
        for section in &self.sections {
            *words.entry(section.section_type.as_str().to_string()).or_default() +=
                section.word_count();
        }
        words
            .into_iter()
            .map(|(name, count)| {
                let pct = (count as f64 / total as f64 * 1000.0).round() / 10.0;
                (name, pct)
            })
            .collect()
    }

    pub fn section_completeness(&self) -> SectionCompleteness {
        SectionCompleteness {
            has_contact: self.has(SectionType::Contact),
            has_summary: self.has(SectionType::Summary),
            has_experience: self.has_experience(),
            has_education: self.has_education(),
            has_skills: self.has_skills(),
            has_projects: self.has_projects(),
        }
    }
}

impl Serialize for ParsedDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct View<'a> {
            char_count: usize,
            word_count: usize,
            sections: &'a [Section],
            section_balance: BTreeMap<String, f64>,
            completeness: SectionCompleteness,
        }
        View {
            char_count: self.original_text.chars().count(),
            word_count: self.word_count(),
            sections: &self.sections,
            section_balance: self.section_balance(),
            completeness: self.section_completeness(),
        }
        .serialize(serializer)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Segmentation
// ────────────────────────────────────────────────────────────────────────────

/// A recognised heading line: `[line_start, line_end)` including the trailing newline.
struct HeadingHit {
    section_type: SectionType,
    heading: String,
    line_start: usize,
    line_end: usize,
}

fn find_headings(text: &str) -> Vec<HeadingHit> {
    let mut hits = Vec::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();
        if let Some(section_type) = classify_heading(line) {
            hits.push(HeadingHit {
                section_type,
                heading: line.trim().to_string(),
                line_start,
                line_end: offset,
            });
        }
    }
    hits
}

fn whole_text_section(text: &str) -> Section {
    Section {
        section_type: SectionType::Other,
        heading: String::new(),
        content: text.to_string(),
        start: 0,
        end: text.len(),
    }
}

/// Segments resume text into ordered, non-overlapping sections. Never fails.
pub fn segment(text: &str) -> ParsedDocument {
    let headings = find_headings(text);

    let mut sections = Vec::with_capacity(headings.len() + 1);

    if let Some(first) = headings.first() {
        let leading = text[..first.line_start].trim();
        if leading.chars().count() > LEADING_CONTACT_MIN_CHARS {
            sections.push(Section {
                section_type: SectionType::Contact,
                heading: String::new(),
                content: leading.to_string(),
                start: 0,
                end: first.line_start,
            });
        }
    }

    for (i, hit) in headings.iter().enumerate() {
        let start = hit.line_end;
        let end = headings
            .get(i + 1)
            .map(|next| next.line_start)
            .unwrap_or(text.len());
        let content = text[start..end].trim();
        if content.is_empty() {
            continue;
        }
        sections.push(Section {
            section_type: hit.section_type,
            heading: hit.heading.clone(),
            content: content.to_string(),
            start,
            end,
        });
    }

    if sections.is_empty() {
        sections.push(whole_text_section(text));
    }

    ParsedDocument {
        original_text: text.to_string(),
        sections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_headings_yields_single_other_section() {
        let text = "Jane Doe. Built data pipelines using Python and SQL in production.";
        let doc = segment(text);
        assert_eq!(doc.sections.len(), 1);
        let s = &doc.sections[0];
        assert_eq!(s.section_type, SectionType::Other);
        assert_eq!(s.start, 0);
        assert_eq!(s.end, text.len());
        assert_eq!(s.content, text);
    }

    #[test]
    fn test_empty_text_yields_single_other_section() {
        let doc = segment("");
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].section_type, SectionType::Other);
        assert_eq!(doc.sections[0].end, 0);
    }

    #[test]
    fn test_experience_then_education_boundaries() {
        let text = "Experience\nBuilt APIs in Rust.\nEducation\nBSc Computer Science\n";
        let doc = segment(text);
        assert_eq!(doc.sections.len(), 2);

        let exp = &doc.sections[0];
        assert_eq!(exp.section_type, SectionType::Experience);
        assert_eq!(exp.heading, "Experience");
        assert_eq!(exp.content, "Built APIs in Rust.");
        assert_eq!(exp.start, "Experience\n".len());
        assert_eq!(exp.end, text.find("Education").unwrap());

        let edu = &doc.sections[1];
        assert_eq!(edu.section_type, SectionType::Education);
        assert_eq!(edu.content, "BSc Computer Science");
        assert_eq!(edu.end, text.len());
        assert!(exp.end <= edu.start);
    }

    #[test]
    fn test_decorated_headings_recognised() {
        assert_eq!(classify_heading("## Technical Skills:"), Some(SectionType::Skills));
        assert_eq!(classify_heading("• WORK EXPERIENCE —"), Some(SectionType::Experience));
        assert_eq!(classify_heading("**Projects**"), Some(SectionType::Projects));
        assert_eq!(classify_heading("  Licenses & Certifications "), Some(SectionType::Certifications));
    }

    #[test]
    fn test_trailing_punctuation_stripped_from_headings() {
        assert_eq!(classify_heading("Experience."), Some(SectionType::Experience));
        assert_eq!(classify_heading("Skills;"), Some(SectionType::Skills));
        assert_eq!(classify_heading("Skills:"), Some(SectionType::Skills));
        assert_eq!(classify_heading("Projects!"), Some(SectionType::Projects));
        assert_eq!(classify_heading("Education ..."), Some(SectionType::Education));
    }

    #[test]
    fn test_punctuated_heading_keeps_skill_provenance() {
        let text = "Experience.\nShipped a billing service in Rust.\nSkills;\nPython";
        let doc = segment(text);
        let types: Vec<SectionType> = doc.sections.iter().map(|s| s.section_type).collect();
        assert_eq!(types, vec![SectionType::Experience, SectionType::Skills]);
        assert_eq!(doc.sections[0].heading, "Experience.");
        assert_eq!(doc.sections[1].content, "Python");
    }

    #[test]
    fn test_prose_lines_are_not_headings() {
        assert_eq!(classify_heading("Experience with Kubernetes in production"), None);
        assert_eq!(classify_heading("- Built dashboards"), None);
        assert_eq!(classify_heading(""), None);
    }

    #[test]
    fn test_first_matching_group_wins() {
        // "professional summary" could loosely read as experience; Summary is declared first.
        assert_eq!(classify_heading("Professional Summary"), Some(SectionType::Summary));
        assert_eq!(classify_heading("Professional Projects"), Some(SectionType::Projects));
    }

    #[test]
    fn test_adjacent_headings_drop_empty_section() {
        let text = "Skills\nExperience\nShipped a payments service.";
        let doc = segment(text);
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].section_type, SectionType::Experience);
    }

    #[test]
    fn test_all_headings_empty_falls_back_to_other() {
        let doc = segment("Skills\nExperience\n");
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].section_type, SectionType::Other);
    }

    #[test]
    fn test_long_preamble_becomes_contact_section() {
        let text = "Jane Doe | jane@example.com | +1 555 123 4567 | github.com/janedoe\nSkills\nRust, Go";
        let doc = segment(text);
        assert_eq!(doc.sections.len(), 2);
        assert_eq!(doc.sections[0].section_type, SectionType::Contact);
        assert_eq!(doc.sections[0].start, 0);
        assert_eq!(doc.sections[1].section_type, SectionType::Skills);
    }

    #[test]
    fn test_short_preamble_is_dropped() {
        let doc = segment("Jane Doe\nSkills\nRust, Go");
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].section_type, SectionType::Skills);
    }

    #[test]
    fn test_sections_ordered_and_non_overlapping() {
        let text = "Summary\nBackend engineer.\nSkills\nRust\nProjects\nA compiler\nAwards\nHackathon winner";
        let doc = segment(text);
        assert_eq!(doc.sections.len(), 4);
        for pair in doc.sections.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }

    #[test]
    fn test_weight_is_function_of_type() {
        let doc = segment("Experience\nBuilt things\nSkills\nRust");
        assert_eq!(doc.sections[0].weight(), 1.0);
        assert_eq!(doc.sections[1].weight(), 0.5);
        assert_eq!(SectionType::Contact.weight(), 0.0);
    }

    #[test]
    fn test_section_balance_sums_to_about_100() {
        let doc = segment("Experience\none two three\nSkills\nfour");
        let balance = doc.section_balance();
        assert_eq!(balance["experience"], 75.0);
        assert_eq!(balance["skills"], 25.0);
    }

    #[test]
    fn test_texts_by_type_merges_duplicates() {
        let doc = segment("Experience\nJob A\nSkills\nRust\nExperience\nJob B");
        let texts = doc.texts_by_type();
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[0], ("experience".to_string(), "Job A\nJob B".to_string()));
    }

    #[test]
    fn test_completeness_flags() {
        let doc = segment("Experience\nJob A\nEducation\nBSc");
        let c = doc.section_completeness();
        assert!(c.has_experience);
        assert!(c.has_education);
        assert!(!c.has_skills);
        assert!(!c.has_contact);
    }
}
