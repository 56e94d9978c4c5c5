use anyhow::Context;
use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::analysis::pipeline::Analysis;
use crate::document::clean::{cap_text, clean_text};
use crate::document::extract::extract;
use crate::document::sections::segment;
use crate::errors::AppError;
use crate::ranking::{recommend_roles, RoleRecommendation};
use crate::state::AppState;
use crate::taxonomy::RoleTaxonomy;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub resume_text: String,
    pub role_id: String,
    pub job_description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RankRequest {
    pub resume_text: String,
}

#[derive(Serialize)]
pub struct RoleSummary {
    pub id: String,
    pub title: String,
    pub must_have_count: usize,
    pub nice_to_have_count: usize,
}

#[derive(Serialize)]
pub struct AnalysisResponse {
    pub analysis_id: Uuid,
    pub analyzed_at: DateTime<Utc>,
    pub role_id: String,
    pub role_title: String,
    pub truncated: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(flatten)]
    pub analysis: Analysis,
}

impl AnalysisResponse {
    fn new(role: &RoleTaxonomy, analysis: Analysis, truncated: bool, warnings: Vec<String>) -> Self {
        Self {
            analysis_id: Uuid::new_v4(),
            analyzed_at: Utc::now(),
            role_id: role.id.clone(),
            role_title: role.title.clone(),
            truncated,
            warnings,
            analysis,
        }
    }
}

fn find_role(state: &AppState, role_id: &str) -> Result<RoleTaxonomy, AppError> {
    state
        .catalog
        .get(role_id.trim())
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("Role '{role_id}' not found")))
}

/// Runs the CPU-bound analysis on the blocking pool, then awaits collaborator scoring.
async fn run_analysis(
    state: &AppState,
    text: String,
    role: &RoleTaxonomy,
    job_description: Option<&str>,
) -> Result<Analysis, AppError> {
    let prepared = {
        let analyzer = state.analyzer.clone();
        let role = role.clone();
        tokio::task::spawn_blocking(move || analyzer.prepare(&text, &role))
            .await
            .context("resume analysis task failed")?
    };
    Ok(state.analyzer.score(prepared, role, job_description).await)
}

/// GET /api/v1/roles
pub async fn handle_list_roles(State(state): State<AppState>) -> Json<Vec<RoleSummary>> {
    Json(
        state
            .catalog
            .roles()
            .iter()
            .map(|role| RoleSummary {
                id: role.id.clone(),
                title: role.title.clone(),
                must_have_count: role.must_have.len(),
                nice_to_have_count: role.nice_to_have.len(),
            })
            .collect(),
    )
}

/// POST /api/v1/analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let role = find_role(&state, &req.role_id)?;
    let (text, truncated) = cap_text(clean_text(&req.resume_text), state.config.max_input_chars);

    let analysis = run_analysis(&state, text, &role, req.job_description.as_deref()).await?;

    Ok(Json(AnalysisResponse::new(&role, analysis, truncated, Vec::new())))
}

/// POST /api/v1/analyze/upload
///
/// Multipart fields: `file` (PDF or plain text), `role_id`, optional `job_description`.
pub async fn handle_analyze_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisResponse>, AppError> {
    let mut file: Option<(String, Bytes)> = None;
    let mut role_id: Option<String> = None;
    let mut job_description: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("resume.txt").to_string();
                file = Some((filename, field.bytes().await?));
            }
            "role_id" => role_id = Some(field.text().await?),
            "job_description" => job_description = Some(field.text().await?),
            _ => {}
        }
    }

    let (filename, bytes) =
        file.ok_or_else(|| AppError::Validation("Missing 'file' field".to_string()))?;
    let role_id = role_id.ok_or_else(|| AppError::Validation("Missing 'role_id' field".to_string()))?;
    let role = find_role(&state, &role_id)?;

    let max_chars = state.config.max_input_chars;
    let extracted = {
        let filename = filename.clone();
        tokio::task::spawn_blocking(move || extract(&filename, &bytes, max_chars))
            .await
            .context("text extraction task failed")?
    };

    if !extracted.success {
        return Err(AppError::UnprocessableEntity(extracted.warnings.join("; ")));
    }
    info!(
        "Extracted {} chars from '{filename}'{}",
        extracted.text.chars().count(),
        if extracted.truncated { " (truncated)" } else { "" }
    );

    let analysis = run_analysis(&state, extracted.text, &role, job_description.as_deref()).await?;

    Ok(Json(AnalysisResponse::new(
        &role,
        analysis,
        extracted.truncated,
        extracted.warnings,
    )))
}

/// POST /api/v1/roles/rank
pub async fn handle_rank_roles(
    State(state): State<AppState>,
    Json(req): Json<RankRequest>,
) -> Result<Json<RoleRecommendation>, AppError> {
    let (text, _) = cap_text(clean_text(&req.resume_text), state.config.max_input_chars);
    let catalog = state.catalog.clone();
    let threshold = state.analyzer.fuzzy_threshold();

    let recommendation = tokio::task::spawn_blocking(move || {
        let doc = segment(&text);
        recommend_roles(&doc, &catalog, threshold)
    })
    .await
    .context("role ranking task failed")?;

    Ok(Json(recommendation))
}
