//! Scoring: the four hybrid score components and their external collaborators.
//!
//! Collaborators (semantic similarity, impact language) sit behind traits carried in
//! `AppState` as `Arc<dyn ...>`. Their failures never cross the aggregator boundary: each one
//! is turned into an outcome value that the component builders render, degraded or not.

pub mod components;
pub mod hybrid;
pub mod impact;
pub mod lexical;
pub mod semantic;

use thiserror::Error;

use crate::embedding_client::EmbeddingError;

/// Failure of an external scoring collaborator.
#[derive(Debug, Error)]
pub enum ScorerError {
    #[error("Scorer not configured: {0}")]
    Unavailable(String),

    #[error("Embedding backend error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Scorer returned an invalid value: {0}")]
    InvalidScore(String),
}

/// Marker placed at the start of `details` for every component computed in degraded mode.
pub const DEGRADED_MARKER: &str = "[degraded]";
