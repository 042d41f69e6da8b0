use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::domain::{CompanyId, CompanyScoringInput, EvidenceItem, ScoringRunId};
use super::repository::{AuditLog, RunRepository, ScoreRepository};
use super::run::{ScoreSummary, ScoringRun};
use super::service::{CompanyFailure, RunSummary, ScoringService, ScoringServiceError};

pub const DEFAULT_RESULTS_LIMIT: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRequest {
    pub companies: Vec<CompanyScoringInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionRequest {
    #[serde(default)]
    pub evidence: Vec<EvidenceItem>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AuditQuery {
    pub company_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResultsQuery {
    pub limit: Option<usize>,
}

/// Run outcome without per-stage breakdowns.
#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub run: ScoringRun,
    pub scores: Vec<ScoreSummary>,
    pub failures: Vec<CompanyFailure>,
}

impl From<RunSummary> for RunResponse {
    fn from(summary: RunSummary) -> Self {
        Self {
            run: summary.run,
            scores: summary.scores.iter().map(|score| score.summary()).collect(),
            failures: summary.failures,
        }
    }
}

/// Router builder exposing scoring runs, results, audit trails, and the
/// dimension preview.
pub fn scoring_router<S, R, A>(service: Arc<ScoringService<S, R, A>>) -> Router
where
    S: ScoreRepository + 'static,
    R: RunRepository + 'static,
    A: AuditLog + 'static,
{
    Router::new()
        .route("/api/v1/scoring/runs", post(create_run_handler::<S, R, A>))
        .route(
            "/api/v1/scoring/runs/:run_id",
            get(run_status_handler::<S, R, A>).put(rerun_handler::<S, R, A>),
        )
        .route(
            "/api/v1/scoring/runs/:run_id/audit",
            get(audit_handler::<S, R, A>),
        )
        .route("/api/v1/scoring/results", get(results_handler::<S, R, A>))
        .route(
            "/api/v1/scoring/results/:company_id",
            get(company_result_handler::<S, R, A>),
        )
        .route(
            "/api/v1/scoring/dimensions",
            post(dimensions_handler::<S, R, A>),
        )
        .with_state(service)
}

pub(crate) async fn create_run_handler<S, R, A>(
    State(service): State<Arc<ScoringService<S, R, A>>>,
    axum::Json(request): axum::Json<RunRequest>,
) -> Response
where
    S: ScoreRepository + 'static,
    R: RunRepository + 'static,
    A: AuditLog + 'static,
{
    let outcome =
        tokio::task::spawn_blocking(move || service.run_batch(request.companies)).await;
    run_response(outcome, StatusCode::CREATED)
}

pub(crate) async fn rerun_handler<S, R, A>(
    State(service): State<Arc<ScoringService<S, R, A>>>,
    Path(run_id): Path<String>,
    axum::Json(request): axum::Json<RunRequest>,
) -> Response
where
    S: ScoreRepository + 'static,
    R: RunRepository + 'static,
    A: AuditLog + 'static,
{
    let run_id = match parse_run_id(&run_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let outcome =
        tokio::task::spawn_blocking(move || service.rerun(run_id, request.companies)).await;
    run_response(outcome, StatusCode::OK)
}

pub(crate) async fn run_status_handler<S, R, A>(
    State(service): State<Arc<ScoringService<S, R, A>>>,
    Path(run_id): Path<String>,
) -> Response
where
    S: ScoreRepository + 'static,
    R: RunRepository + 'static,
    A: AuditLog + 'static,
{
    let run_id = match parse_run_id(&run_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.run(run_id) {
        Ok(run) => (StatusCode::OK, axum::Json(run)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn audit_handler<S, R, A>(
    State(service): State<Arc<ScoringService<S, R, A>>>,
    Path(run_id): Path<String>,
    Query(query): Query<AuditQuery>,
) -> Response
where
    S: ScoreRepository + 'static,
    R: RunRepository + 'static,
    A: AuditLog + 'static,
{
    let run_id = match parse_run_id(&run_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let company = query.company_id.map(CompanyId);
    match service.audit_trail(run_id, company.as_ref()) {
        Ok(records) => (StatusCode::OK, axum::Json(records)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn company_result_handler<S, R, A>(
    State(service): State<Arc<ScoringService<S, R, A>>>,
    Path(company_id): Path<String>,
) -> Response
where
    S: ScoreRepository + 'static,
    R: RunRepository + 'static,
    A: AuditLog + 'static,
{
    match service.latest_score(&CompanyId(company_id)) {
        Ok(score) => (StatusCode::OK, axum::Json(score)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn results_handler<S, R, A>(
    State(service): State<Arc<ScoringService<S, R, A>>>,
    Query(query): Query<ResultsQuery>,
) -> Response
where
    S: ScoreRepository + 'static,
    R: RunRepository + 'static,
    A: AuditLog + 'static,
{
    let limit = query.limit.unwrap_or(DEFAULT_RESULTS_LIMIT);
    match service.latest_scores(limit) {
        Ok(scores) => {
            let summaries: Vec<ScoreSummary> = scores.iter().map(|score| score.summary()).collect();
            (StatusCode::OK, axum::Json(summaries)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn dimensions_handler<S, R, A>(
    State(service): State<Arc<ScoringService<S, R, A>>>,
    axum::Json(request): axum::Json<DimensionRequest>,
) -> Response
where
    S: ScoreRepository + 'static,
    R: RunRepository + 'static,
    A: AuditLog + 'static,
{
    let preview = service.preview_dimensions(&request.evidence);
    (StatusCode::OK, axum::Json(preview)).into_response()
}

fn parse_run_id(raw: &str) -> Result<ScoringRunId, Response> {
    Uuid::parse_str(raw.trim()).map(ScoringRunId).map_err(|_| {
        let payload = json!({
            "error": format!("`{raw}` is not a valid scoring run id"),
        });
        (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
    })
}

fn run_response(
    outcome: Result<Result<RunSummary, ScoringServiceError>, tokio::task::JoinError>,
    success: StatusCode,
) -> Response {
    match outcome {
        Ok(Ok(summary)) => (success, axum::Json(RunResponse::from(summary))).into_response(),
        Ok(Err(err)) => error_response(err),
        Err(join) => {
            let payload = json!({
                "error": format!("scoring task aborted: {join}"),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

fn error_response(err: ScoringServiceError) -> Response {
    let status = match &err {
        ScoringServiceError::EmptyBatch | ScoringServiceError::InvalidLimit { .. } => {
            StatusCode::BAD_REQUEST
        }
        ScoringServiceError::RunNotFound(_) | ScoringServiceError::ScoreNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        ScoringServiceError::Repository(_) | ScoringServiceError::Audit(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let payload = json!({
        "error": err.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
