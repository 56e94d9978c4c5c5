use std::sync::Arc;

use crate::analysis::pipeline::Analyzer;
use crate::config::Config;
use crate::taxonomy::TaxonomyCatalog;

/// Shared application state injected into all route handlers via Axum extractors.
/// Everything here is read-only; each request builds its own analysis entities.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Role catalog, loaded once at startup.
    pub catalog: Arc<TaxonomyCatalog>,
    /// Scoring pipeline with its pluggable semantic and impact scorers.
    pub analyzer: Analyzer,
}
