//! Applicant-tracking-system readiness: how well a parser would read the resume.
//!
//! Each check is independent and reports pass, warning or fail with an optional
//! suggestion. The result is informational and does not feed the hybrid score.

pub mod contact;

use std::sync::LazyLock;

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::document::sections::ParsedDocument;
use crate::scoring::lexical::term_counts;

pub use contact::{detect_contact_info, ContactInfo};

const MIN_WORDS: usize = 200;
const SHORT_WORDS: usize = 350;
const LONG_WORDS: usize = 1200;

const MIN_BULLETS: usize = 5;
const MAX_BULLETS: usize = 40;

const MAX_SPECIAL_CHARS: usize = 20;
const MAX_SHOUTED_WORDS: usize = 3;
const LONG_LINE_CHARS: usize = 200;
const MAX_LONG_LINES: usize = 5;

const MIN_DATES: usize = 2;

const STUFFING_SHARE: f64 = 0.1;
const TOP_KEYWORDS: usize = 20;

/// Checks whose failure means a parser is likely to drop the resume.
const PARSEABILITY_CHECKS: [&str; 3] = ["Email", "Section Completeness", "Resume Length"];

static BULLET_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"•", r"(?m)^\s*[-–—]\s", r"(?m)^\s*\*\s", r"(?m)^\s*\d+\.\s"]
        .into_iter()
        .map(|p| Regex::new(p).expect("bullet pattern is valid"))
        .collect()
});

static SPECIAL_CHAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[^\w\s\-.,;:!?@#$%&*()\[\]{}'"<>/\\|+=]"#).expect("special char pattern is valid")
});

static SHOUTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]{10,}\b").expect("caps pattern is valid"));

static DATE_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\b(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\s+\d{4}\b",
        r"\b\d{1,2}/\d{4}\b",
        r"(?i)\b\d{4}\s*[-–]\s*(?:\d{4}|present|current)\b",
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("date pattern is valid"))
    .collect()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AtsCheckStatus {
    Pass,
    Warning,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtsCheck {
    pub name: &'static str,
    pub status: AtsCheckStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl AtsCheck {
    fn pass(name: &'static str, message: impl Into<String>) -> Self {
        Self {
            name,
            status: AtsCheckStatus::Pass,
            message: message.into(),
            details: None,
            suggestion: None,
        }
    }

    fn warning(name: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: AtsCheckStatus::Warning,
            ..Self::pass(name, message)
        }
    }

    fn fail(name: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: AtsCheckStatus::Fail,
            ..Self::pass(name, message)
        }
    }

    fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordFrequency {
    pub term: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AtsAnalysis {
    pub checks: Vec<AtsCheck>,
    pub contact_info: ContactInfo,
    /// Most frequent terms, highest count first.
    pub keyword_density: Vec<KeywordFrequency>,
    /// Pass = 1, warning = 0.5, fail = 0, averaged over all checks.
    pub ats_score: f64,
    /// Share of the parseability checks that passed.
    pub parseability_score: f64,
    /// Share of standard sections present.
    pub completeness_score: f64,
}

impl AtsAnalysis {
    fn count(&self, status: AtsCheckStatus) -> usize {
        self.checks.iter().filter(|c| c.status == status).count()
    }

    pub fn passed_checks(&self) -> usize {
        self.count(AtsCheckStatus::Pass)
    }

    pub fn warning_checks(&self) -> usize {
        self.count(AtsCheckStatus::Warning)
    }

    pub fn failed_checks(&self) -> usize {
        self.count(AtsCheckStatus::Fail)
    }

    pub fn ats_percentage(&self) -> u32 {
        (self.ats_score * 100.0).round() as u32
    }

    pub fn critical_issues(&self) -> impl Iterator<Item = &AtsCheck> {
        self.checks.iter().filter(|c| c.status == AtsCheckStatus::Fail)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &AtsCheck> {
        self.checks.iter().filter(|c| c.status == AtsCheckStatus::Warning)
    }
}

impl Serialize for AtsAnalysis {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct View<'a> {
            checks: &'a [AtsCheck],
            contact_info: &'a ContactInfo,
            keyword_density: &'a [KeywordFrequency],
            ats_score: f64,
            ats_percentage: u32,
            parseability_score: f64,
            completeness_score: f64,
            passed_checks: usize,
            warning_checks: usize,
            failed_checks: usize,
            total_checks: usize,
        }

        View {
            checks: &self.checks,
            contact_info: &self.contact_info,
            keyword_density: &self.keyword_density,
            ats_score: self.ats_score,
            ats_percentage: self.ats_percentage(),
            parseability_score: self.parseability_score,
            completeness_score: self.completeness_score,
            passed_checks: self.passed_checks(),
            warning_checks: self.warning_checks(),
            failed_checks: self.failed_checks(),
            total_checks: self.checks.len(),
        }
        .serialize(serializer)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Checks
// ────────────────────────────────────────────────────────────────────────────

fn check_resume_length(text: &str) -> AtsCheck {
    const NAME: &str = "Resume Length";
    let words = text.split_whitespace().count();

    if words < MIN_WORDS {
        AtsCheck::fail(NAME, format!("Resume too short ({words} words)"))
            .details("Most ATS and recruiters expect at least 300-400 words")
            .suggest("Add more detail about your experience, projects and skills")
    } else if words < SHORT_WORDS {
        AtsCheck::warning(NAME, format!("Resume may be short ({words} words)"))
            .suggest("Expand on your achievements and responsibilities")
    } else if words > LONG_WORDS {
        AtsCheck::warning(NAME, format!("Resume may be too long ({words} words)"))
            .suggest("Condense to the most relevant experience (1-2 pages)")
    } else {
        AtsCheck::pass(NAME, format!("Good length ({words} words)"))
    }
}

fn check_bullet_points(text: &str) -> AtsCheck {
    const NAME: &str = "Bullet Points";
    let bullets: usize = BULLET_RES.iter().map(|re| re.find_iter(text).count()).sum();

    if bullets < MIN_BULLETS {
        AtsCheck::warning(NAME, format!("Few bullet points detected ({bullets})"))
            .suggest("Use bullet points for responsibilities and achievements")
    } else if bullets > MAX_BULLETS {
        AtsCheck::warning(NAME, format!("Many bullet points ({bullets})"))
            .suggest("Keep the 3-5 most impactful bullets per role")
    } else {
        AtsCheck::pass(NAME, format!("Good bullet usage ({bullets} bullets)"))
    }
}

fn check_formatting(text: &str) -> AtsCheck {
    const NAME: &str = "Formatting";
    let mut issues = Vec::new();

    if SPECIAL_CHAR_RE.find_iter(text).count() > MAX_SPECIAL_CHARS {
        issues.push("Unusual special characters detected");
    }
    if SHOUTED_RE.find_iter(text).count() > MAX_SHOUTED_WORDS {
        issues.push("Excessive use of ALL CAPS");
    }
    let long_lines = text
        .lines()
        .filter(|line| line.chars().count() > LONG_LINE_CHARS)
        .count();
    if long_lines > MAX_LONG_LINES {
        issues.push("Very long lines detected (possible copy-paste issues)");
    }

    if issues.is_empty() {
        AtsCheck::pass(NAME, "No major formatting issues detected")
    } else {
        AtsCheck::warning(NAME, issues.join("; "))
            .suggest("Clean up formatting for better ATS parsing")
    }
}

fn check_dates(text: &str) -> AtsCheck {
    const NAME: &str = "Date Formatting";
    let dates: usize = DATE_RES.iter().map(|re| re.find_iter(text).count()).sum();

    if dates < MIN_DATES {
        AtsCheck::warning(NAME, "Few dates detected")
            .suggest("Include dates for experience and education (e.g. 'Jan 2023 - Present')")
    } else {
        AtsCheck::pass(NAME, format!("Dates detected ({dates} found)"))
    }
}

fn check_contact_info(contact: &ContactInfo) -> Vec<AtsCheck> {
    let email = match &contact.email {
        Some(email) => AtsCheck::pass("Email", "Email detected").details(email),
        None => AtsCheck::fail("Email", "No email found")
            .suggest("Add your professional email address"),
    };

    let optional = [
        ("Phone", &contact.phone, "Consider adding a phone number"),
        ("LinkedIn", &contact.linkedin, "Add your LinkedIn URL"),
        ("GitHub", &contact.github, "Add a GitHub link to showcase your code"),
    ];

    std::iter::once(email)
        .chain(optional.into_iter().map(|(name, value, suggestion)| match value {
            Some(v) => AtsCheck::pass(name, format!("{name} detected")).details(v),
            None => AtsCheck::warning(name, format!("No {name} found")).suggest(suggestion),
        }))
        .collect()
}

fn check_section_completeness(doc: &ParsedDocument) -> AtsCheck {
    const NAME: &str = "Section Completeness";
    let completeness = doc.section_completeness();
    let missing: Vec<&str> = [
        ("Experience", completeness.has_experience),
        ("Education", completeness.has_education),
        ("Skills", completeness.has_skills),
    ]
    .into_iter()
    .filter_map(|(name, present)| (!present).then_some(name))
    .collect();

    match missing.as_slice() {
        [] => AtsCheck::pass(NAME, "All essential sections present"),
        [one] => AtsCheck::warning(NAME, format!("Missing section: {one}"))
            .suggest(format!("Consider adding a {one} section")),
        _ => AtsCheck::fail(NAME, format!("Missing key sections: {}", missing.join(", ")))
            .suggest(format!("Add clear {} sections", missing.join(", "))),
    }
}

fn check_section_balance(doc: &ParsedDocument) -> AtsCheck {
    const NAME: &str = "Section Balance";
    let balance = doc.section_balance();
    let pct = |name: &str| balance.get(name).copied().unwrap_or(0.0);
    let (experience, skills, education) = (pct("experience"), pct("skills"), pct("education"));

    let mut issues = Vec::new();
    if experience < 20.0 {
        issues.push("Experience section too brief");
    }
    if experience > 80.0 {
        issues.push("Experience section dominates resume");
    }
    if skills > 40.0 {
        issues.push("Skills section may be too long");
    }

    let details = format!("Experience: {experience}%, Skills: {skills}%, Education: {education}%");
    if issues.is_empty() {
        AtsCheck::pass(NAME, "Sections are well-balanced").details(details)
    } else {
        AtsCheck::warning(NAME, issues.join("; "))
            .details(details)
            .suggest("Balance content across sections")
    }
}

/// Alphabetic terms of three or more letters, stop words excluded, highest count first.
fn keyword_frequencies(text: &str) -> (Vec<KeywordFrequency>, usize) {
    let counts: Vec<(String, usize)> = term_counts(text)
        .into_iter()
        .filter(|(term, _)| term.chars().count() >= 3 && term.chars().all(char::is_alphabetic))
        .collect();
    let total = counts.iter().map(|(_, n)| n).sum();

    let mut ranked: Vec<KeywordFrequency> = counts
        .into_iter()
        .map(|(term, count)| KeywordFrequency { term, count })
        .collect();
    // Stable sort keeps ties in alphabetical order.
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    (ranked, total)
}

fn check_keyword_density(text: &str) -> (AtsCheck, Vec<KeywordFrequency>) {
    const NAME: &str = "Keyword Density";
    let (mut ranked, total) = keyword_frequencies(text);
    ranked.truncate(TOP_KEYWORDS);

    let check = match ranked.first() {
        Some(top) if top.count as f64 > total as f64 * STUFFING_SHARE => AtsCheck::warning(
            NAME,
            format!("Possible keyword stuffing detected ('{}')", top.term),
        )
        .suggest("Use keywords naturally in context, not repeated lists"),
        _ => {
            let leading: Vec<&str> = ranked.iter().take(5).map(|k| k.term.as_str()).collect();
            AtsCheck::pass(NAME, "Natural keyword distribution")
                .details(format!("Top keywords: {}", leading.join(", ")))
        }
    };
    (check, ranked)
}

// ────────────────────────────────────────────────────────────────────────────
// Entry point
// ────────────────────────────────────────────────────────────────────────────

pub fn analyze_ats(doc: &ParsedDocument) -> AtsAnalysis {
    let text = doc.original_text.as_str();
    let contact_info = detect_contact_info(text);

    let mut checks = vec![
        check_resume_length(text),
        check_bullet_points(text),
        check_formatting(text),
        check_dates(text),
    ];
    checks.extend(check_contact_info(&contact_info));
    checks.push(check_section_completeness(doc));
    if doc.word_count() > 0 {
        checks.push(check_section_balance(doc));
    }
    let (keyword_check, keyword_density) = check_keyword_density(text);
    checks.push(keyword_check);

    let points: f64 = checks
        .iter()
        .map(|c| match c.status {
            AtsCheckStatus::Pass => 1.0,
            AtsCheckStatus::Warning => 0.5,
            AtsCheckStatus::Fail => 0.0,
        })
        .sum();
    let ats_score = points / checks.len() as f64;

    let parseable = checks
        .iter()
        .filter(|c| PARSEABILITY_CHECKS.contains(&c.name) && c.status == AtsCheckStatus::Pass)
        .count();
    let parseability_score = parseable as f64 / PARSEABILITY_CHECKS.len() as f64;

    let completeness = doc.section_completeness();
    let flags = [
        completeness.has_contact,
        completeness.has_summary,
        completeness.has_experience,
        completeness.has_education,
        completeness.has_skills,
        completeness.has_projects,
    ];
    let completeness_score = flags.iter().filter(|f| **f).count() as f64 / flags.len() as f64;

    AtsAnalysis {
        checks,
        contact_info,
        keyword_density,
        ats_score,
        parseability_score,
        completeness_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::sections::segment;

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    fn find<'a>(analysis: &'a AtsAnalysis, name: &str) -> &'a AtsCheck {
        analysis.checks.iter().find(|c| c.name == name).unwrap()
    }

    #[test]
    fn test_length_thresholds() {
        assert_eq!(check_resume_length(&words(150)).status, AtsCheckStatus::Fail);
        assert_eq!(check_resume_length(&words(300)).status, AtsCheckStatus::Warning);
        assert_eq!(check_resume_length(&words(600)).status, AtsCheckStatus::Pass);
        assert_eq!(check_resume_length(&words(1300)).status, AtsCheckStatus::Warning);
    }

    #[test]
    fn test_bullet_styles_are_counted() {
        let text = "• Led migration\n- Cut costs\n* Wrote docs\n1. Hired team\n– Shipped v2";
        let check = check_bullet_points(text);
        assert_eq!(check.status, AtsCheckStatus::Pass);
        assert_eq!(check.message, "Good bullet usage (5 bullets)");

        assert_eq!(check_bullet_points("Plain prose only").status, AtsCheckStatus::Warning);
        let many = "- item\n".repeat(41);
        assert_eq!(check_bullet_points(&many).status, AtsCheckStatus::Warning);
    }

    #[test]
    fn test_formatting_flags_caps_and_long_lines() {
        assert_eq!(check_formatting("Clean text, nothing odd.").status, AtsCheckStatus::Pass);

        let shouting = "RESPONSIBLE INNOVATIVE COLLABORATIVE EXPERIENCED ENGINEER";
        let check = check_formatting(shouting);
        assert_eq!(check.status, AtsCheckStatus::Warning);
        assert!(check.message.contains("ALL CAPS"));

        let long = format!("{}\n", "x".repeat(201)).repeat(6);
        assert!(check_formatting(&long).message.contains("long lines"));

        let symbols = "★".repeat(21);
        assert!(check_formatting(&symbols).message.contains("special characters"));
    }

    #[test]
    fn test_date_formats() {
        let text = "Acme Corp, Jan 2021 - Present\nUniversity, 09/2016\nStartup 2018 – 2020";
        let check = check_dates(text);
        assert_eq!(check.status, AtsCheckStatus::Pass);
        assert_eq!(check_dates("No timeline here").status, AtsCheckStatus::Warning);
    }

    #[test]
    fn test_missing_email_fails_and_links_warn() {
        let checks = check_contact_info(&ContactInfo::default());
        assert_eq!(checks.len(), 4);
        assert_eq!(checks[0].name, "Email");
        assert_eq!(checks[0].status, AtsCheckStatus::Fail);
        assert!(checks[1..].iter().all(|c| c.status == AtsCheckStatus::Warning));

        let contact = ContactInfo {
            email: Some("a@b.io".into()),
            github: Some("github.com/a".into()),
            ..ContactInfo::default()
        };
        let checks = check_contact_info(&contact);
        assert_eq!(checks[0].status, AtsCheckStatus::Pass);
        assert_eq!(checks[0].details.as_deref(), Some("a@b.io"));
        assert_eq!(checks[3].status, AtsCheckStatus::Pass);
    }

    #[test]
    fn test_section_completeness_levels() {
        let full = segment("Experience\nBuilt things\nEducation\nBSc\nSkills\nRust");
        assert_eq!(check_section_completeness(&full).status, AtsCheckStatus::Pass);

        let one_missing = segment("Experience\nBuilt things\nSkills\nRust");
        let check = check_section_completeness(&one_missing);
        assert_eq!(check.status, AtsCheckStatus::Warning);
        assert_eq!(check.message, "Missing section: Education");

        let bare = segment("Built things with Rust");
        let check = check_section_completeness(&bare);
        assert_eq!(check.status, AtsCheckStatus::Fail);
        assert!(check.message.contains("Experience, Education, Skills"));
    }

    #[test]
    fn test_section_balance_flags_thin_experience() {
        let doc = segment(&format!("Experience\nShipped it\nSkills\n{}", words(30)));
        let check = check_section_balance(&doc);
        assert_eq!(check.status, AtsCheckStatus::Warning);
        assert!(check.message.contains("Experience section too brief"));
        assert!(check.message.contains("Skills section may be too long"));

        let doc = segment(&format!(
            "Experience\n{}\nSkills\n{}\nEducation\n{}",
            words(50),
            words(20),
            words(30)
        ));
        assert_eq!(check_section_balance(&doc).status, AtsCheckStatus::Pass);
    }

    #[test]
    fn test_keyword_stuffing_warns() {
        let stuffed = format!("{} built services", "python ".repeat(10));
        let (check, density) = check_keyword_density(&stuffed);
        assert_eq!(check.status, AtsCheckStatus::Warning);
        assert!(check.message.contains("'python'"));
        assert_eq!(density[0], KeywordFrequency { term: "python".into(), count: 10 });
    }

    #[test]
    fn test_keyword_density_skips_short_and_numeric_terms() {
        let (ranked, total) = keyword_frequencies("Go, C2 and k8s with rust rust 2024");
        assert_eq!(total, 2);
        assert_eq!(ranked, vec![KeywordFrequency { term: "rust".into(), count: 2 }]);
    }

    #[test]
    fn test_natural_distribution_passes_and_caps_at_twenty() {
        let text = "alpha bravo charlie delta echo foxtrot golf hotel india juliet kilo lima \
                    mike november oscar papa quebec romeo sierra tango uniform victor";
        let (check, density) = check_keyword_density(text);
        assert_eq!(check.status, AtsCheckStatus::Pass);
        assert_eq!(density.len(), TOP_KEYWORDS);
        assert_eq!(density[0].term, "alpha");
    }

    #[test]
    fn test_full_analysis_scores() {
        let doc = segment(
            "Jane Doe\njane@example.com\nExperience\n- Led a team, Jan 2021 - Present\n\
             Education\nBSc, 09/2016\nSkills\nRust, SQL",
        );
        let analysis = analyze_ats(&doc);

        assert_eq!(analysis.checks.len(), 11);
        assert_eq!(find(&analysis, "Email").status, AtsCheckStatus::Pass);
        assert_eq!(find(&analysis, "Resume Length").status, AtsCheckStatus::Fail);
        // Email and sections pass, length fails.
        assert!((analysis.parseability_score - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(
            analysis.passed_checks() + analysis.warning_checks() + analysis.failed_checks(),
            11
        );
        let expected =
            (analysis.passed_checks() as f64 + 0.5 * analysis.warning_checks() as f64) / 11.0;
        assert!((analysis.ats_score - expected).abs() < 1e-9);
        assert_eq!(analysis.critical_issues().count(), analysis.failed_checks());
        assert_eq!(analysis.warnings().count(), analysis.warning_checks());
    }

    #[test]
    fn test_empty_resume_skips_balance() {
        let analysis = analyze_ats(&segment(""));
        assert_eq!(analysis.checks.len(), 10);
        assert!(analysis.keyword_density.is_empty());
        assert_eq!(analysis.completeness_score, 0.0);
        assert_eq!(analysis.parseability_score, 0.0);
    }

    #[test]
    fn test_serializes_counts() {
        let value = serde_json::to_value(analyze_ats(&segment(""))).unwrap();
        assert_eq!(value["total_checks"], 10);
        assert_eq!(value["checks"][0]["status"], "fail");
        assert!(value["checks"][0].get("details").is_some());
        assert!(value["ats_percentage"].is_u64());
    }
}
