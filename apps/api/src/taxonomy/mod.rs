//! Role taxonomy catalog: role id → required / bonus skill definitions.
//!
//! Loaded once at startup and shared read-only (`Arc<TaxonomyCatalog>`) for the lifetime of
//! the process. Declaration order from the JSON file is preserved; ranking tie-breaks and
//! suggestion ordering depend on it.
//!
//! Malformed definitions never fail the load: a skill with no usable aliases simply can
//! never match and is reported as missing.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

const DEFAULT_MUST_HAVE_WEIGHT: f64 = 1.0;
const DEFAULT_NICE_TO_HAVE_WEIGHT: f64 = 0.5;
const DEFAULT_CATEGORY: &str = "other";

#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("Failed to read taxonomy file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Taxonomy is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Taxonomy root must be a JSON object of roles")]
    NotAnObject,

    #[error("Taxonomy contains no roles")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillPriority {
    MustHave,
    NiceToHave,
}

/// One canonical skill of a role, with the surface forms used to detect it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDefinition {
    pub id: String,
    pub name: String,
    pub category: String,
    pub priority: SkillPriority,
    pub weight: f64,
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleTaxonomy {
    pub id: String,
    pub title: String,
    pub must_have: Vec<SkillDefinition>,
    pub nice_to_have: Vec<SkillDefinition>,
}

impl RoleTaxonomy {
    /// All skill definitions, must-have first, each tier in declaration order.
    pub fn skills(&self) -> impl Iterator<Item = &SkillDefinition> {
        self.must_have.iter().chain(self.nice_to_have.iter())
    }

    /// Stand-in job description built from the role title and every alias.
    pub fn reference_text(&self) -> String {
        let mut parts = vec![self.title.clone()];
        for skill in self.skills() {
            parts.push(skill.name.clone());
            parts.extend(skill.aliases.iter().cloned());
        }
        parts.join(" ")
    }
}

/// Read-only, ordered set of roles.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaxonomyCatalog {
    roles: Vec<RoleTaxonomy>,
}

impl TaxonomyCatalog {
    pub fn new(roles: Vec<RoleTaxonomy>) -> Self {
        Self { roles }
    }

    /// Loads and parses a taxonomy JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TaxonomyError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| TaxonomyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = Self::from_json_str(&raw)?;
        info!(
            "Loaded taxonomy from {} ({} roles)",
            path.display(),
            catalog.len()
        );
        Ok(catalog)
    }

    /// Parses a catalog. Values carrying a `roles` object are tracks and are flattened in order.
    pub fn from_json_str(raw: &str) -> Result<Self, TaxonomyError> {
        let root: Value = serde_json::from_str(raw)?;
        let root = root.as_object().ok_or(TaxonomyError::NotAnObject)?;

        let mut roles = Vec::new();
        for (key, value) in root {
            match value.get("roles").and_then(Value::as_object) {
                Some(track_roles) => {
                    for (role_id, role_value) in track_roles {
                        roles.push(parse_role(role_id, role_value));
                    }
                }
                None => roles.push(parse_role(key, value)),
            }
        }

        if roles.is_empty() {
            return Err(TaxonomyError::Empty);
        }
        Ok(Self { roles })
    }

    pub fn get(&self, role_id: &str) -> Option<&RoleTaxonomy> {
        self.roles.iter().find(|r| r.id == role_id)
    }

    pub fn roles(&self) -> &[RoleTaxonomy] {
        &self.roles
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

fn parse_role(role_id: &str, value: &Value) -> RoleTaxonomy {
    if !value.is_object() {
        warn!("Role '{role_id}' is not an object; treating it as a role without skills");
    }
    let title = value
        .get("title")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| role_id.to_string());

    let must_have = parse_tier(role_id, value.get("must_have"), SkillPriority::MustHave, &[]);
    let taken: Vec<&str> = must_have.iter().map(|s| s.id.as_str()).collect();
    let nice_to_have = parse_tier(
        role_id,
        value.get("nice_to_have"),
        SkillPriority::NiceToHave,
        &taken,
    );

    RoleTaxonomy {
        id: role_id.to_string(),
        title,
        must_have,
        nice_to_have,
    }
}

fn parse_tier(
    role_id: &str,
    tier: Option<&Value>,
    priority: SkillPriority,
    taken: &[&str],
) -> Vec<SkillDefinition> {
    let Some(tier) = tier else {
        return Vec::new();
    };
    let Some(skills) = tier.as_object() else {
        warn!("Role '{role_id}': {priority:?} tier is not an object; ignoring it");
        return Vec::new();
    };

    skills
        .iter()
        .filter(|(skill_id, _)| {
            let duplicate = taken.contains(&skill_id.as_str());
            if duplicate {
                warn!("Role '{role_id}': skill '{skill_id}' is listed in both tiers; keeping must-have");
            }
            !duplicate
        })
        .map(|(skill_id, info)| parse_skill(role_id, skill_id, info, priority))
        .collect()
}

fn parse_skill(
    role_id: &str,
    skill_id: &str,
    info: &Value,
    priority: SkillPriority,
) -> SkillDefinition {
    let default_weight = match priority {
        SkillPriority::MustHave => DEFAULT_MUST_HAVE_WEIGHT,
        SkillPriority::NiceToHave => DEFAULT_NICE_TO_HAVE_WEIGHT,
    };

    // Shorthand: a bare array is the alias list.
    let (aliases, fields) = match info {
        Value::Array(items) => (string_list(items), None),
        Value::Object(fields) => (
            fields
                .get("aliases")
                .and_then(Value::as_array)
                .map(|items| string_list(items))
                .unwrap_or_default(),
            Some(fields),
        ),
        _ => (Vec::new(), None),
    };

    if aliases.is_empty() {
        warn!("Role '{role_id}': skill '{skill_id}' has no aliases and can never match");
    }

    SkillDefinition {
        id: skill_id.to_string(),
        name: fields
            .and_then(|f| field_str(f, "name"))
            .unwrap_or_else(|| humanize_id(skill_id)),
        category: fields
            .and_then(|f| field_str(f, "category"))
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        priority,
        weight: fields
            .and_then(|f| f.get("weight"))
            .and_then(Value::as_f64)
            .filter(|w| w.is_finite() && *w >= 0.0)
            .unwrap_or(default_weight),
        aliases,
    }
}

fn field_str(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Non-empty, trimmed string entries; anything else is skipped.
fn string_list(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// `machine_learning` → `Machine Learning`.
pub fn humanize_id(id: &str) -> String {
    id.split(['_', '-'])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CATALOG: &str = r#"{
        "data_engineer": {
            "title": "Data Engineer",
            "must_have": {
                "python": {"aliases": ["python", "py"], "weight": 1.0, "category": "programming"},
                "sql": {"aliases": ["sql", "postgresql"], "category": "data"}
            },
            "nice_to_have": {
                "airflow": {"aliases": ["airflow"]},
                "python": {"aliases": ["python3"]}
            }
        },
        "web_track": {
            "roles": {
                "backend_engineer": {
                    "title": "Backend Engineer",
                    "must_have": {"rust": ["rust", "rustlang"]}
                },
                "frontend_engineer": {"title": "Frontend Engineer"}
            }
        }
    }"#;

    #[test]
    fn test_parses_roles_in_declaration_order() {
        let catalog = TaxonomyCatalog::from_json_str(CATALOG).unwrap();
        let ids: Vec<&str> = catalog.roles().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["data_engineer", "backend_engineer", "frontend_engineer"]);
    }

    #[test]
    fn test_skill_fields_and_defaults() {
        let catalog = TaxonomyCatalog::from_json_str(CATALOG).unwrap();
        let role = catalog.get("data_engineer").unwrap();
        assert_eq!(role.title, "Data Engineer");
        assert_eq!(role.must_have[0].id, "python");
        assert_eq!(role.must_have[0].category, "programming");
        assert_eq!(role.must_have[1].weight, 1.0);
        assert_eq!(role.must_have[1].category, "data");
        assert_eq!(role.nice_to_have[0].weight, 0.5);
        assert_eq!(role.nice_to_have[0].category, "other");
        assert_eq!(role.nice_to_have[0].name, "Airflow");
    }

    #[test]
    fn test_duplicate_skill_keeps_must_have() {
        let catalog = TaxonomyCatalog::from_json_str(CATALOG).unwrap();
        let role = catalog.get("data_engineer").unwrap();
        assert_eq!(role.nice_to_have.len(), 1);
        assert_eq!(role.nice_to_have[0].id, "airflow");
    }

    #[test]
    fn test_alias_array_shorthand() {
        let catalog = TaxonomyCatalog::from_json_str(CATALOG).unwrap();
        let role = catalog.get("backend_engineer").unwrap();
        assert_eq!(role.must_have[0].aliases, ["rust", "rustlang"]);
    }

    #[test]
    fn test_missing_fields_become_zero_alias_skills() {
        let raw = r#"{"r": {"must_have": {"go": {"weight": "heavy"}, "k8s": 42}}}"#;
        let catalog = TaxonomyCatalog::from_json_str(raw).unwrap();
        let role = catalog.get("r").unwrap();
        assert_eq!(role.title, "r");
        assert_eq!(role.must_have.len(), 2);
        assert!(role.must_have.iter().all(|s| s.aliases.is_empty()));
        assert_eq!(role.must_have[0].weight, 1.0);
    }

    #[test]
    fn test_empty_catalog_rejected() {
        assert!(matches!(
            TaxonomyCatalog::from_json_str("{}"),
            Err(TaxonomyError::Empty)
        ));
    }

    #[test]
    fn test_non_object_root_rejected() {
        assert!(matches!(
            TaxonomyCatalog::from_json_str("[1, 2]"),
            Err(TaxonomyError::NotAnObject)
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CATALOG.as_bytes()).unwrap();
        let catalog = TaxonomyCatalog::load(file.path()).unwrap();
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = TaxonomyCatalog::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, TaxonomyError::Io { .. }));
    }

    #[test]
    fn test_humanize_id() {
        assert_eq!(humanize_id("machine_learning"), "Machine Learning");
        assert_eq!(humanize_id("ci-cd"), "Ci Cd");
        assert_eq!(humanize_id("SQL"), "Sql");
    }

    #[test]
    fn test_reference_text_contains_aliases() {
        let catalog = TaxonomyCatalog::from_json_str(CATALOG).unwrap();
        let text = catalog.get("data_engineer").unwrap().reference_text();
        assert!(text.starts_with("Data Engineer"));
        assert!(text.contains("postgresql"));
        assert!(text.contains("airflow"));
    }

    #[test]
    fn test_bundled_catalog_parses() {
        let raw = include_str!("../../data/skills_taxonomy.json");
        let catalog = TaxonomyCatalog::from_json_str(raw).unwrap();
        let ids: Vec<&str> = catalog.roles().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(
            ids,
            ["backend_engineer", "data_scientist", "data_engineer", "frontend_engineer"]
        );
        assert!(catalog.roles().iter().all(|r| r.skills().all(|s| !s.aliases.is_empty())));
    }
}
