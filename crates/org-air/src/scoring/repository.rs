use super::audit::AuditRecord;
use super::config::ModelVersion;
use super::domain::{CompanyId, HistoricalScore, ScoringRunId};
use super::run::{OrgAirScore, ScoringRun};

/// Score storage keyed by `(company_id, scoring_run_id)`.
pub trait ScoreRepository: Send + Sync {
    /// Insert or overwrite the score for the key.
    fn upsert(&self, score: OrgAirScore) -> Result<(), RepositoryError>;
    fn fetch(
        &self,
        company_id: &CompanyId,
        run_id: ScoringRunId,
    ) -> Result<Option<OrgAirScore>, RepositoryError>;
    fn latest_for_company(&self, company_id: &CompanyId) -> Result<Option<OrgAirScore>, RepositoryError>;
    /// Most recent score per company, newest first.
    fn latest(&self, limit: usize) -> Result<Vec<OrgAirScore>, RepositoryError>;
    /// Latest score per company produced by `model_version`.
    fn history(&self, model_version: ModelVersion) -> Result<Vec<HistoricalScore>, RepositoryError>;
}

pub trait RunRepository: Send + Sync {
    fn create(&self, run: ScoringRun) -> Result<ScoringRun, RepositoryError>;
    fn update(&self, run: ScoringRun) -> Result<(), RepositoryError>;
    fn fetch(&self, id: ScoringRunId) -> Result<Option<ScoringRun>, RepositoryError>;
}

/// Append-only audit sink.
pub trait AuditLog: Send + Sync {
    /// Store the ordered trail for one company, replacing any earlier trail
    /// for the same run and company.
    fn record(
        &self,
        run_id: ScoringRunId,
        company_id: &CompanyId,
        records: Vec<AuditRecord>,
    ) -> Result<(), AuditError>;
    fn for_run(
        &self,
        run_id: ScoringRunId,
        company_id: Option<&CompanyId>,
    ) -> Result<Vec<AuditRecord>, AuditError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit log unavailable: {0}")]
    Unavailable(String),
}
