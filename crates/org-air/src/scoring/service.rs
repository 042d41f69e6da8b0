use std::sync::Arc;

use chrono::Utc;
use rayon::prelude::*;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};

use super::audit::{AuditRecord, AuditStep, StageTrace};
use super::config::{ModelVersion, ScoringConfig};
use super::domain::{CompanyId, CompanyScoringInput, EvidenceItem, ScoringRunId};
use super::engine::{DimensionPreview, ScoringContext, ScoringEngine};
use super::hr::portfolio_average;
use super::repository::{AuditError, AuditLog, RepositoryError, RunRepository, ScoreRepository};
use super::run::{OrgAirScore, RunStatus, ScoringRun};
use crate::telemetry::run_span;

pub const MAX_RESULTS_LIMIT: usize = 200;

/// Batch driver composing the engine with score, run, and audit storage.
pub struct ScoringService<S, R, A> {
    engine: Arc<ScoringEngine>,
    scores: Arc<S>,
    runs: Arc<R>,
    audit: Arc<A>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompanyFailure {
    pub company_id: CompanyId,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run: ScoringRun,
    pub scores: Vec<OrgAirScore>,
    pub failures: Vec<CompanyFailure>,
}

enum CompanyOutcome {
    Scored(Box<OrgAirScore>),
    Failed(CompanyFailure),
}

impl<S, R, A> ScoringService<S, R, A>
where
    S: ScoreRepository + 'static,
    R: RunRepository + 'static,
    A: AuditLog + 'static,
{
    pub fn new(
        config: ScoringConfig,
        model_version: ModelVersion,
        scores: Arc<S>,
        runs: Arc<R>,
        audit: Arc<A>,
    ) -> Self {
        Self::with_engine(Arc::new(ScoringEngine::new(config, model_version)), scores, runs, audit)
    }

    pub fn with_engine(engine: Arc<ScoringEngine>, scores: Arc<S>, runs: Arc<R>, audit: Arc<A>) -> Self {
        Self {
            engine,
            scores,
            runs,
            audit,
        }
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    /// Score a batch under a fresh run id.
    pub fn run_batch(&self, companies: Vec<CompanyScoringInput>) -> Result<RunSummary, ScoringServiceError> {
        if companies.is_empty() {
            return Err(ScoringServiceError::EmptyBatch);
        }
        let run = ScoringRun::start(
            ScoringRunId::new(),
            self.engine.model_version(),
            self.engine.run_parameters(),
        );
        let run = self.runs.create(run)?;
        info!(run_id = %run.id, companies = companies.len(), "scoring run started");
        self.execute(run, &companies)
    }

    /// Re-execute an existing run id. Scores for the same companies are
    /// overwritten in place.
    pub fn rerun(
        &self,
        run_id: ScoringRunId,
        companies: Vec<CompanyScoringInput>,
    ) -> Result<RunSummary, ScoringServiceError> {
        if companies.is_empty() {
            return Err(ScoringServiceError::EmptyBatch);
        }
        let stored = self
            .runs
            .fetch(run_id)?
            .ok_or(ScoringServiceError::RunNotFound(run_id))?;
        let run = stored.restart(self.engine.run_parameters());
        self.runs.update(run.clone())?;
        info!(run_id = %run.id, companies = companies.len(), "scoring run restarted");
        self.execute(run, &companies)
    }

    fn execute(
        &self,
        mut run: ScoringRun,
        companies: &[CompanyScoringInput],
    ) -> Result<RunSummary, ScoringServiceError> {
        let span = run_span(&run, companies.len());
        let _entered = span.enter();

        let history = match self.scores.history(run.model_version) {
            Ok(history) => history,
            Err(err) => {
                error!(run_id = %run.id, error = %err, "history snapshot failed");
                self.mark_failed(&mut run);
                return Err(err.into());
            }
        };

        let as_of = run.started_at;
        let average = portfolio_average(
            companies
                .iter()
                .map(|company| self.engine.hiring_signal_count(&company.evidence, as_of)),
        );
        let context = ScoringContext {
            run_id: run.id,
            as_of,
            portfolio_hiring_average: average,
            history: &history,
        };

        let outcomes: Vec<CompanyOutcome> = companies
            .par_iter()
            .map(|input| span.in_scope(|| self.score_one(input, &context)))
            .collect();

        let mut scores = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                CompanyOutcome::Scored(score) => scores.push(*score),
                CompanyOutcome::Failed(failure) => failures.push(failure),
            }
        }

        let scored = u32::try_from(scores.len()).unwrap_or(u32::MAX);
        run.finish(RunStatus::Success, scored);
        if let Err(err) = self.runs.update(run.clone()) {
            error!(run_id = %run.id, error = %err, "run status update failed");
            self.mark_failed(&mut run);
            return Err(err.into());
        }

        info!(
            run_id = %run.id,
            scored = scores.len(),
            failed = failures.len(),
            "scoring run finished"
        );
        Ok(RunSummary {
            run,
            scores,
            failures,
        })
    }

    /// The audit trail is written before the score, so a company that fails
    /// at any step leaves no score row behind for this run.
    fn score_one(&self, input: &CompanyScoringInput, context: &ScoringContext<'_>) -> CompanyOutcome {
        let company_id = input.company.company_id.clone();

        let scoring = match self.engine.score_company(input, context) {
            Ok(scoring) => scoring,
            Err(err) => return self.fail_company(input, context, Vec::new(), err.to_string()),
        };
        let score = scoring.score;
        let traces = scoring.traces;

        let mut trail = traces.clone();
        trail.push(StageTrace::new(
            AuditStep::FinalWrite,
            json!({ "company_id": company_id, "scoring_run_id": context.run_id }),
            json!({
                "composite_score": score.composite_score,
                "score_band": score.score_band,
                "sem_lower": score.sem_lower,
                "sem_upper": score.sem_upper,
            }),
        ));
        if let Err(err) = self.write_trail(context.run_id, &company_id, trail) {
            let failure = CompanyFailure {
                company_id,
                error: err.to_string(),
            };
            warn!(
                run_id = %context.run_id,
                company_id = %failure.company_id,
                error = %failure.error,
                "audit trail write failed, score not persisted"
            );
            return CompanyOutcome::Failed(failure);
        }

        match self.scores.upsert(score.clone()) {
            Ok(()) => CompanyOutcome::Scored(Box::new(score)),
            Err(err) => self.fail_company(input, context, traces, err.to_string()),
        }
    }

    /// Replace the company's trail with the completed stages plus a failure
    /// record.
    fn fail_company(
        &self,
        input: &CompanyScoringInput,
        context: &ScoringContext<'_>,
        mut traces: Vec<StageTrace>,
        message: String,
    ) -> CompanyOutcome {
        let company_id = input.company.company_id.clone();
        warn!(
            run_id = %context.run_id,
            company_id = %company_id,
            error = %message,
            "company scoring failed"
        );
        traces.push(StageTrace::new(
            AuditStep::Failure,
            json!({ "company_id": company_id, "evidence_items": input.evidence.len() }),
            json!({ "error": message }),
        ));
        if let Err(err) = self.write_trail(context.run_id, &company_id, traces) {
            warn!(
                run_id = %context.run_id,
                company_id = %company_id,
                error = %err,
                "failure audit write failed"
            );
        }
        CompanyOutcome::Failed(CompanyFailure {
            company_id,
            error: message,
        })
    }

    fn write_trail(
        &self,
        run_id: ScoringRunId,
        company_id: &CompanyId,
        traces: Vec<StageTrace>,
    ) -> Result<(), AuditError> {
        let recorded_at = Utc::now();
        let records = traces
            .into_iter()
            .map(|trace| AuditRecord::from_trace(run_id, company_id.clone(), trace, recorded_at))
            .collect();
        self.audit.record(run_id, company_id, records)
    }

    fn mark_failed(&self, run: &mut ScoringRun) {
        run.finish(RunStatus::Failed, 0);
        if let Err(err) = self.runs.update(run.clone()) {
            error!(run_id = %run.id, error = %err, "could not mark run failed");
        }
    }

    pub fn run(&self, run_id: ScoringRunId) -> Result<ScoringRun, ScoringServiceError> {
        self.runs
            .fetch(run_id)?
            .ok_or(ScoringServiceError::RunNotFound(run_id))
    }

    pub fn audit_trail(
        &self,
        run_id: ScoringRunId,
        company_id: Option<&CompanyId>,
    ) -> Result<Vec<AuditRecord>, ScoringServiceError> {
        self.run(run_id)?;
        Ok(self.audit.for_run(run_id, company_id)?)
    }

    pub fn latest_score(&self, company_id: &CompanyId) -> Result<OrgAirScore, ScoringServiceError> {
        self.scores
            .latest_for_company(company_id)?
            .ok_or_else(|| ScoringServiceError::ScoreNotFound(company_id.clone()))
    }

    pub fn latest_scores(&self, limit: usize) -> Result<Vec<OrgAirScore>, ScoringServiceError> {
        if limit == 0 || limit > MAX_RESULTS_LIMIT {
            return Err(ScoringServiceError::InvalidLimit { requested: limit });
        }
        Ok(self.scores.latest(limit)?)
    }

    pub fn preview_dimensions(&self, evidence: &[EvidenceItem]) -> DimensionPreview {
        self.engine.preview_dimensions(evidence)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScoringServiceError {
    #[error("batch contains no companies")]
    EmptyBatch,
    #[error("scoring run {0} not found")]
    RunNotFound(ScoringRunId),
    #[error("no score recorded for company {0}")]
    ScoreNotFound(CompanyId),
    #[error("limit must be between 1 and {max}, got {requested}", max = MAX_RESULTS_LIMIT)]
    InvalidLimit { requested: usize },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Audit(#[from] AuditError),
}
