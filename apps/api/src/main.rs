mod analysis;
mod ats;
mod config;
mod document;
mod embedding_client;
mod errors;
mod ranking;
mod routes;
mod scoring;
mod skills;
mod state;
mod taxonomy;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::pipeline::Analyzer;
use crate::config::Config;
use crate::embedding_client::EmbeddingClient;
use crate::routes::build_router;
use crate::scoring::impact::LexicalImpactScorer;
use crate::scoring::semantic::{EmbeddingSemanticScorer, SemanticScorer, UnavailableSemanticScorer};
use crate::state::AppState;
use crate::taxonomy::TaxonomyCatalog;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Intel API v{}", env!("CARGO_PKG_VERSION"));

    // Load the role catalog once; it is read-only for the life of the process
    let catalog = TaxonomyCatalog::load(&config.taxonomy_path)
        .with_context(|| format!("Failed to load taxonomy from {}", config.taxonomy_path))?;

    let semantic = build_semantic_scorer(&config)?;

    let analyzer = Analyzer::new(semantic, Arc::new(LexicalImpactScorer), config.fuzzy_threshold);
    info!(
        "Analyzer ready (semantic: {}, impact: {}, fuzzy threshold: {})",
        analyzer.semantic_backend(),
        analyzer.impact_backend(),
        analyzer.fuzzy_threshold()
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        catalog: Arc::new(catalog),
        analyzer,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Embedding-backed scorer when `EMBEDDING_API_URL` is set; otherwise every semantic score
/// degrades to TF-IDF.
fn build_semantic_scorer(config: &Config) -> Result<Arc<dyn SemanticScorer>> {
    match &config.embedding_api_url {
        Some(url) => {
            let client = EmbeddingClient::new(
                url,
                config.embedding_api_key.clone(),
                config.embedding_model.clone(),
            )?;
            info!(
                "Embedding client initialized (model: {}, endpoint: {})",
                client.model(),
                client.endpoint()
            );
            Ok(Arc::new(EmbeddingSemanticScorer::new(client)))
        }
        None => {
            warn!("EMBEDDING_API_URL is not set; semantic scores will use TF-IDF and be marked degraded");
            Ok(Arc::new(UnavailableSemanticScorer))
        }
    }
}
