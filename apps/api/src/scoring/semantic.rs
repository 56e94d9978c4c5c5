//! Semantic similarity: resume vs job description.
//!
//! Default: `EmbeddingSemanticScorer`, one batched embedding call per document (every section
//! text plus the job description), cosine per section, section-weighted overall.
//! Without a configured backend `UnavailableSemanticScorer` is used, and every request takes the
//! lexical TF-IDF fallback in `measure_semantic`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::document::sections::{ParsedDocument, SectionType};
use crate::embedding_client::{cosine_similarity, EmbeddingClient};
use crate::scoring::lexical::tfidf_similarity;
use crate::scoring::ScorerError;

/// Texts longer than this are cut before embedding.
const MAX_EMBED_CHARS: usize = 5000;

/// Weight of each section in the overall semantic score.
pub fn section_weight(section_name: &str) -> f64 {
    match section_name {
        "experience" => 1.0,
        "projects" => 0.9,
        "skills" => 0.7,
        "summary" | "certifications" => 0.6,
        "education" => 0.5,
        _ => 0.3,
    }
}

/// Per-section similarities plus their weighted mean.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionSimilarity {
    pub overall: f64,
    /// Section name → similarity, in document order.
    pub per_section: Vec<(String, f64)>,
}

impl SectionSimilarity {
    /// Weighted mean over `per_section`; 0 when empty.
    pub fn from_sections(per_section: Vec<(String, f64)>) -> Self {
        let (weighted, total) = per_section
            .iter()
            .fold((0.0, 0.0), |(weighted, total), (name, sim)| {
                let w = section_weight(name);
                (weighted + sim * w, total + w)
            });
        let overall = if total > 0.0 { weighted / total } else { 0.0 };
        Self {
            overall,
            per_section,
        }
    }

    /// Section with the highest similarity; earliest wins ties.
    pub fn best_section(&self) -> Option<&(String, f64)> {
        self.per_section.iter().fold(None, |best: Option<&(String, f64)>, s| match best {
            Some(b) if b.1 >= s.1 => Some(b),
            _ => Some(s),
        })
    }
}

/// Semantic similarity collaborator. Implement this to swap backends without touching
/// the aggregator or handlers.
///
/// Carried in `AppState` as `Arc<dyn SemanticScorer>`.
#[async_trait]
pub trait SemanticScorer: Send + Sync {
    /// Short backend name reported in component details.
    fn backend(&self) -> &'static str;

    /// Whole-text similarity, used when the document has no recognised sections.
    async fn similarity(&self, a: &str, b: &str) -> Result<f64, ScorerError>;

    async fn similarity_per_section(
        &self,
        sections: &[(String, String)],
        reference: &str,
    ) -> Result<SectionSimilarity, ScorerError>;
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

// ────────────────────────────────────────────────────────────────────────────
// EmbeddingSemanticScorer
// ────────────────────────────────────────────────────────────────────────────

pub struct EmbeddingSemanticScorer {
    client: EmbeddingClient,
}

impl EmbeddingSemanticScorer {
    pub fn new(client: EmbeddingClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SemanticScorer for EmbeddingSemanticScorer {
    fn backend(&self) -> &'static str {
        "embedding"
    }

    async fn similarity(&self, a: &str, b: &str) -> Result<f64, ScorerError> {
        let inputs = vec![truncate_chars(a, MAX_EMBED_CHARS), truncate_chars(b, MAX_EMBED_CHARS)];
        let vectors = self.client.embed(&inputs).await?;
        match vectors.as_slice() {
            [va, vb] => Ok(cosine_similarity(va, vb)),
            _ => Err(ScorerError::InvalidScore(format!(
                "expected 2 embeddings, got {}",
                vectors.len()
            ))),
        }
    }

    async fn similarity_per_section(
        &self,
        sections: &[(String, String)],
        reference: &str,
    ) -> Result<SectionSimilarity, ScorerError> {
        let sections: Vec<&(String, String)> =
            sections.iter().filter(|(_, text)| !text.trim().is_empty()).collect();
        if sections.is_empty() {
            return Ok(SectionSimilarity::from_sections(Vec::new()));
        }

        // Reference text first, then one input per section.
        let mut inputs = Vec::with_capacity(sections.len() + 1);
        inputs.push(truncate_chars(reference, MAX_EMBED_CHARS));
        inputs.extend(sections.iter().map(|(_, text)| truncate_chars(text, MAX_EMBED_CHARS)));

        let vectors = self.client.embed(&inputs).await?;
        let Some((reference_vec, section_vecs)) = vectors.split_first() else {
            return Err(ScorerError::InvalidScore("no embeddings returned".into()));
        };

        let per_section = sections
            .iter()
            .zip(section_vecs)
            .map(|((name, _), v)| (name.clone(), cosine_similarity(v, reference_vec)))
            .collect();

        debug!("Embedded {} sections via {}", sections.len(), self.client.model());
        Ok(SectionSimilarity::from_sections(per_section))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// UnavailableSemanticScorer
// ────────────────────────────────────────────────────────────────────────────

/// Stand-in when no embedding backend is configured. Always fails, so every request is scored
/// with the lexical fallback and marked degraded.
pub struct UnavailableSemanticScorer;

#[async_trait]
impl SemanticScorer for UnavailableSemanticScorer {
    fn backend(&self) -> &'static str {
        "unconfigured"
    }

    async fn similarity(&self, _a: &str, _b: &str) -> Result<f64, ScorerError> {
        Err(ScorerError::Unavailable("EMBEDDING_API_URL is not set".into()))
    }

    async fn similarity_per_section(
        &self,
        _sections: &[(String, String)],
        _reference: &str,
    ) -> Result<SectionSimilarity, ScorerError> {
        Err(ScorerError::Unavailable("EMBEDDING_API_URL is not set".into()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Outcome
// ────────────────────────────────────────────────────────────────────────────

/// Semantic similarity as delivered to the aggregator.
#[derive(Debug, Clone, PartialEq)]
pub enum SemanticOutcome {
    Measured {
        similarity: SectionSimilarity,
        backend: &'static str,
    },
    /// The collaborator failed; `score` is the lexical TF-IDF substitute.
    Degraded { score: f64, reason: String },
}

impl SemanticOutcome {
    /// Score clamped to [0, 1]; NaN reads as 0.
    pub fn score(&self) -> f64 {
        let raw = match self {
            SemanticOutcome::Measured { similarity, .. } => similarity.overall,
            SemanticOutcome::Degraded { score, .. } => *score,
        };
        if raw.is_nan() {
            0.0
        } else {
            raw.clamp(0.0, 1.0)
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, SemanticOutcome::Degraded { .. })
    }

    /// Per-section similarities, empty when degraded.
    pub fn per_section(&self) -> BTreeMap<String, f64> {
        match self {
            SemanticOutcome::Measured { similarity, .. } => {
                similarity.per_section.iter().cloned().collect()
            }
            SemanticOutcome::Degraded { .. } => BTreeMap::new(),
        }
    }
}

/// Asks the collaborator for section-aware similarity, or whole-text similarity when the
/// document has no headings. Any failure (including a non-finite score) degrades to TF-IDF
/// over the whole text.
pub async fn measure_semantic(
    scorer: &dyn SemanticScorer,
    doc: &ParsedDocument,
    reference: &str,
) -> SemanticOutcome {
    let lexical = || tfidf_similarity(&doc.original_text, reference);

    let sections = doc.texts_by_type();
    let result = match sections.as_slice() {
        // No recognised headings: nothing to weight, compare the whole text directly.
        [(name, text)] if name == SectionType::Other.as_str() => scorer
            .similarity(text, reference)
            .await
            .map(|score| SectionSimilarity::from_sections(vec![(name.clone(), score)])),
        _ => scorer.similarity_per_section(&sections, reference).await,
    };

    match result {
        Ok(similarity) if similarity.overall.is_finite() => SemanticOutcome::Measured {
            similarity,
            backend: scorer.backend(),
        },
        Ok(similarity) => {
            warn!(
                "Semantic scorer '{}' returned a non-finite score ({}); using TF-IDF",
                scorer.backend(),
                similarity.overall
            );
            SemanticOutcome::Degraded {
                score: lexical(),
                reason: format!("non-finite score from {} backend", scorer.backend()),
            }
        }
        Err(e) => {
            warn!("Semantic scorer '{}' failed, using TF-IDF: {e}", scorer.backend());
            SemanticOutcome::Degraded {
                score: lexical(),
                reason: e.to_string(),
            }
        }
    }
}
