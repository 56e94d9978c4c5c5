// Skill intelligence: taxonomy-driven detection with section provenance, and coverage analysis.
// Each analysis builds its own detection map from scratch; nothing here is shared between requests.

pub mod coverage;
pub mod fuzzy;
pub mod matcher;
