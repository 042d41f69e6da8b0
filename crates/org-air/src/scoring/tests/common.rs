use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::scoring::audit::AuditRecord;
use crate::scoring::config::{ModelVersion, ScoringConfig};
use crate::scoring::domain::{
    CompanyId, CompanyProfile, CompanyScoringInput, EvidenceItem, HistoricalScore, ScoringRunId,
};
use crate::scoring::repository::{
    AuditError, AuditLog, RepositoryError, RunRepository, ScoreRepository,
};
use crate::scoring::run::{OrgAirScore, ScoringRun};
use crate::scoring::{scoring_router, ScoringService};

pub(super) type MemoryService = ScoringService<MemoryScores, MemoryRuns, MemoryAudit>;

pub(super) fn strong_evidence() -> Vec<EvidenceItem> {
    let mut items = Vec::new();
    for i in 0..12 {
        items.push(
            EvidenceItem::new(
                "jobs",
                format!("Machine learning engineer #{i}: Python, SQL, MLOps on AWS and Kubernetes"),
            )
            .with_title("Machine Learning Engineer"),
        );
    }
    for i in 0..6 {
        items.push(EvidenceItem::new(
            "jobs",
            format!("Data engineer #{i} building Spark and Databricks pipelines for the data lake"),
        ));
    }
    items.push(EvidenceItem::new(
        "sec_item_1",
        "Our AI strategy and roadmap drive transformation; the CEO leads investment in \
         predictive use case deployment in production",
    ));
    items.push(EvidenceItem::new(
        "sec_item_1a",
        "Model risk, responsible AI, privacy and security controls are overseen by audit",
    ));
    items.push(EvidenceItem::new(
        "glassdoor_reviews",
        "Culture of experimentation, learning and innovation; leadership supports change",
    ));
    items.push(EvidenceItem::new(
        "tech",
        "Cloud-native platform on AWS with Kubernetes, a vector database and LLM APIs",
    ));
    items
}

pub(super) fn sparse_evidence() -> Vec<EvidenceItem> {
    vec![EvidenceItem::new(
        "news",
        "Company announces new store openings and a loyalty program",
    )]
}

pub(super) fn company(id: &str, sector: &str, evidence: Vec<EvidenceItem>) -> CompanyScoringInput {
    CompanyScoringInput::new(
        CompanyProfile::new(id)
            .in_sector(sector)
            .with_market_cap_percentile(0.6),
        evidence,
    )
}

pub(super) fn batch() -> Vec<CompanyScoringInput> {
    vec![
        company("NVDA", "Services", strong_evidence()),
        company("DG", "Consumer", sparse_evidence()),
        company("GE", "Industrials", Vec::new()),
    ]
}

pub(super) fn build_service() -> (
    MemoryService,
    Arc<MemoryScores>,
    Arc<MemoryRuns>,
    Arc<MemoryAudit>,
) {
    build_service_for(ModelVersion::V2)
}

pub(super) fn build_service_for(
    model_version: ModelVersion,
) -> (
    MemoryService,
    Arc<MemoryScores>,
    Arc<MemoryRuns>,
    Arc<MemoryAudit>,
) {
    let scores = Arc::new(MemoryScores::default());
    let runs = Arc::new(MemoryRuns::default());
    let audit = Arc::new(MemoryAudit::default());
    let service = ScoringService::new(
        ScoringConfig::standard(),
        model_version,
        scores.clone(),
        runs.clone(),
        audit.clone(),
    );
    (service, scores, runs, audit)
}

pub(super) fn router_with_service(service: MemoryService) -> axum::Router {
    scoring_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

#[derive(Default, Clone)]
pub(super) struct MemoryScores {
    pub(super) records: Arc<Mutex<HashMap<(CompanyId, ScoringRunId), OrgAirScore>>>,
}

impl MemoryScores {
    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("score mutex poisoned").len()
    }
}

impl ScoreRepository for MemoryScores {
    fn upsert(&self, score: OrgAirScore) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("score mutex poisoned");
        guard.insert((score.company_id.clone(), score.scoring_run_id), score);
        Ok(())
    }

    fn fetch(
        &self,
        company_id: &CompanyId,
        run_id: ScoringRunId,
    ) -> Result<Option<OrgAirScore>, RepositoryError> {
        let guard = self.records.lock().expect("score mutex poisoned");
        Ok(guard.get(&(company_id.clone(), run_id)).cloned())
    }

    fn latest_for_company(&self, company_id: &CompanyId) -> Result<Option<OrgAirScore>, RepositoryError> {
        let guard = self.records.lock().expect("score mutex poisoned");
        Ok(guard
            .values()
            .filter(|score| &score.company_id == company_id)
            .max_by_key(|score| score.scored_at)
            .cloned())
    }

    fn latest(&self, limit: usize) -> Result<Vec<OrgAirScore>, RepositoryError> {
        let guard = self.records.lock().expect("score mutex poisoned");
        let mut newest: BTreeMap<CompanyId, OrgAirScore> = BTreeMap::new();
        for score in guard.values() {
            match newest.get(&score.company_id) {
                Some(existing) if existing.scored_at >= score.scored_at => {}
                _ => {
                    newest.insert(score.company_id.clone(), score.clone());
                }
            }
        }
        let mut scores: Vec<OrgAirScore> = newest.into_values().collect();
        scores.sort_by(|a, b| b.scored_at.cmp(&a.scored_at));
        scores.truncate(limit);
        Ok(scores)
    }

    fn history(&self, model_version: ModelVersion) -> Result<Vec<HistoricalScore>, RepositoryError> {
        Ok(self
            .latest(usize::MAX)?
            .into_iter()
            .filter(|score| score.model_version == model_version)
            .map(|score| score.to_history())
            .collect())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryRuns {
    pub(super) runs: Arc<Mutex<HashMap<ScoringRunId, ScoringRun>>>,
}

impl RunRepository for MemoryRuns {
    fn create(&self, run: ScoringRun) -> Result<ScoringRun, RepositoryError> {
        let mut guard = self.runs.lock().expect("run mutex poisoned");
        if guard.contains_key(&run.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(run.id, run.clone());
        Ok(run)
    }

    fn update(&self, run: ScoringRun) -> Result<(), RepositoryError> {
        let mut guard = self.runs.lock().expect("run mutex poisoned");
        if !guard.contains_key(&run.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(run.id, run);
        Ok(())
    }

    fn fetch(&self, id: ScoringRunId) -> Result<Option<ScoringRun>, RepositoryError> {
        let guard = self.runs.lock().expect("run mutex poisoned");
        Ok(guard.get(&id).cloned())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryAudit {
    pub(super) trails: Arc<Mutex<BTreeMap<(ScoringRunId, CompanyId), Vec<AuditRecord>>>>,
}

impl AuditLog for MemoryAudit {
    fn record(
        &self,
        run_id: ScoringRunId,
        company_id: &CompanyId,
        records: Vec<AuditRecord>,
    ) -> Result<(), AuditError> {
        let mut guard = self.trails.lock().expect("audit mutex poisoned");
        guard.insert((run_id, company_id.clone()), records);
        Ok(())
    }

    fn for_run(
        &self,
        run_id: ScoringRunId,
        company_id: Option<&CompanyId>,
    ) -> Result<Vec<AuditRecord>, AuditError> {
        let guard = self.trails.lock().expect("audit mutex poisoned");
        Ok(guard
            .iter()
            .filter(|((run, company), _)| {
                *run == run_id && company_id.map_or(true, |wanted| wanted == company)
            })
            .flat_map(|(_, records)| records.iter().cloned())
            .collect())
    }
}

/// Rejects writes for one company and behaves normally otherwise.
pub(super) struct RejectingScores {
    pub(super) inner: MemoryScores,
    pub(super) reject: CompanyId,
}

impl ScoreRepository for RejectingScores {
    fn upsert(&self, score: OrgAirScore) -> Result<(), RepositoryError> {
        if score.company_id == self.reject {
            return Err(RepositoryError::Unavailable("write rejected".to_string()));
        }
        self.inner.upsert(score)
    }

    fn fetch(
        &self,
        company_id: &CompanyId,
        run_id: ScoringRunId,
    ) -> Result<Option<OrgAirScore>, RepositoryError> {
        self.inner.fetch(company_id, run_id)
    }

    fn latest_for_company(&self, company_id: &CompanyId) -> Result<Option<OrgAirScore>, RepositoryError> {
        self.inner.latest_for_company(company_id)
    }

    fn latest(&self, limit: usize) -> Result<Vec<OrgAirScore>, RepositoryError> {
        self.inner.latest(limit)
    }

    fn history(&self, model_version: ModelVersion) -> Result<Vec<HistoricalScore>, RepositoryError> {
        self.inner.history(model_version)
    }
}

pub(super) struct UnavailableScores;

impl ScoreRepository for UnavailableScores {
    fn upsert(&self, _score: OrgAirScore) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(
        &self,
        _company_id: &CompanyId,
        _run_id: ScoringRunId,
    ) -> Result<Option<OrgAirScore>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn latest_for_company(&self, _company_id: &CompanyId) -> Result<Option<OrgAirScore>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn latest(&self, _limit: usize) -> Result<Vec<OrgAirScore>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn history(&self, _model_version: ModelVersion) -> Result<Vec<HistoricalScore>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) struct UnavailableAudit;

impl AuditLog for UnavailableAudit {
    fn record(
        &self,
        _run_id: ScoringRunId,
        _company_id: &CompanyId,
        _records: Vec<AuditRecord>,
    ) -> Result<(), AuditError> {
        Err(AuditError::Unavailable("audit sink offline".to_string()))
    }

    fn for_run(
        &self,
        _run_id: ScoringRunId,
        _company_id: Option<&CompanyId>,
    ) -> Result<Vec<AuditRecord>, AuditError> {
        Err(AuditError::Unavailable("audit sink offline".to_string()))
    }
}
