use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w.-]+@[\w.-]+\.\w+").expect("email pattern is valid"));

// Most specific first; the first pattern that hits wins.
static PHONE_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\+?\d{1,3}[-.\s]?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}",
        r"\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}",
        r"\d{10}",
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("phone pattern is valid"))
    .collect()
});

static LINKEDIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:linkedin\.com/in/|linkedin:\s*@?)[a-z0-9-]+")
        .expect("linkedin pattern is valid")
});

static GITHUB_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:github\.com/|github:\s*@?)[a-z0-9-]+").expect("github pattern is valid")
});

static LABELLED_SITE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:portfolio|website|site):\s*(https?://[\w.-]+\.\w+[/\w]*)")
        .expect("labelled site pattern is valid")
});

static BARE_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[\w.-]+\.\w+").expect("url pattern is valid"));

/// Contact details found anywhere in the resume text.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub website: Option<String>,
}

fn first_match(re: &Regex, text: &str) -> Option<String> {
    re.find(text).map(|m| m.as_str().to_string())
}

pub fn detect_contact_info(text: &str) -> ContactInfo {
    let website = LABELLED_SITE_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .or_else(|| first_match(&BARE_URL_RE, text));

    ContactInfo {
        email: first_match(&EMAIL_RE, text),
        phone: PHONE_RES.iter().find_map(|re| first_match(re, text)),
        linkedin: first_match(&LINKEDIN_RE, text),
        github: first_match(&GITHUB_RE, text),
        website,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_all_contact_fields() {
        let text = "Jane Doe\njane.doe@example.com | +1 (555) 123-4567\n\
                    linkedin.com/in/jane-doe | github.com/janedoe\n\
                    Portfolio: https://jane.dev/work";
        let contact = detect_contact_info(text);
        assert_eq!(contact.email.as_deref(), Some("jane.doe@example.com"));
        assert_eq!(contact.phone.as_deref(), Some("+1 (555) 123-4567"));
        assert_eq!(contact.linkedin.as_deref(), Some("linkedin.com/in/jane-doe"));
        assert_eq!(contact.github.as_deref(), Some("github.com/janedoe"));
        assert_eq!(contact.website.as_deref(), Some("https://jane.dev/work"));
    }

    #[test]
    fn test_labelled_handles() {
        let contact = detect_contact_info("GitHub: @janedoe\nLinkedIn: jane-doe");
        assert_eq!(contact.github.as_deref(), Some("GitHub: @janedoe"));
        assert_eq!(contact.linkedin.as_deref(), Some("LinkedIn: jane-doe"));
    }

    #[test]
    fn test_bare_url_is_website_fallback() {
        let contact = detect_contact_info("See https://janedoe.io for demos");
        assert_eq!(contact.website.as_deref(), Some("https://janedoe.io"));
    }

    #[test]
    fn test_plain_prose_has_no_contact() {
        assert_eq!(
            detect_contact_info("Built data pipelines in 2021"),
            ContactInfo::default()
        );
    }
}
