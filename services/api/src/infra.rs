use metrics_exporter_prometheus::PrometheusHandle;
use org_air::config::ScoringSettings;
use org_air::error::AppError;
use org_air::scoring::{
    AuditError, AuditLog, AuditRecord, CompanyId, HistoricalScore, ModelVersion, OrgAirScore,
    RepositoryError, RunRepository, ScoreRepository, ScoringRun, ScoringRunId, ScoringService,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

pub(crate) type ApiScoringService =
    ScoringService<InMemoryScoreRepository, InMemoryRunRepository, InMemoryAuditLog>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("in-memory store mutex poisoned".to_string()))
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryScoreRepository {
    records: Arc<Mutex<HashMap<(CompanyId, ScoringRunId), OrgAirScore>>>,
}

impl ScoreRepository for InMemoryScoreRepository {
    fn upsert(&self, score: OrgAirScore) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.records)?;
        guard.insert((score.company_id.clone(), score.scoring_run_id), score);
        Ok(())
    }

    fn fetch(
        &self,
        company_id: &CompanyId,
        run_id: ScoringRunId,
    ) -> Result<Option<OrgAirScore>, RepositoryError> {
        let guard = lock(&self.records)?;
        Ok(guard.get(&(company_id.clone(), run_id)).cloned())
    }

    fn latest_for_company(
        &self,
        company_id: &CompanyId,
    ) -> Result<Option<OrgAirScore>, RepositoryError> {
        let guard = lock(&self.records)?;
        Ok(guard
            .values()
            .filter(|score| &score.company_id == company_id)
            .max_by_key(|score| score.scored_at)
            .cloned())
    }

    fn latest(&self, limit: usize) -> Result<Vec<OrgAirScore>, RepositoryError> {
        let guard = lock(&self.records)?;
        let mut newest: BTreeMap<&CompanyId, &OrgAirScore> = BTreeMap::new();
        for score in guard.values() {
            let entry = newest.entry(&score.company_id).or_insert(score);
            if score.scored_at > entry.scored_at {
                *entry = score;
            }
        }
        let mut scores: Vec<OrgAirScore> = newest.into_values().cloned().collect();
        scores.sort_by(|a, b| b.scored_at.cmp(&a.scored_at));
        scores.truncate(limit);
        Ok(scores)
    }

    fn history(&self, model_version: ModelVersion) -> Result<Vec<HistoricalScore>, RepositoryError> {
        Ok(self
            .latest(usize::MAX)?
            .iter()
            .filter(|score| score.model_version == model_version)
            .map(OrgAirScore::to_history)
            .collect())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryRunRepository {
    runs: Arc<Mutex<HashMap<ScoringRunId, ScoringRun>>>,
}

impl RunRepository for InMemoryRunRepository {
    fn create(&self, run: ScoringRun) -> Result<ScoringRun, RepositoryError> {
        let mut guard = lock(&self.runs)?;
        if guard.contains_key(&run.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(run.id, run.clone());
        Ok(run)
    }

    fn update(&self, run: ScoringRun) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.runs)?;
        if guard.contains_key(&run.id) {
            guard.insert(run.id, run);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: ScoringRunId) -> Result<Option<ScoringRun>, RepositoryError> {
        let guard = lock(&self.runs)?;
        Ok(guard.get(&id).cloned())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryAuditLog {
    trails: Arc<Mutex<BTreeMap<(ScoringRunId, CompanyId), Vec<AuditRecord>>>>,
}

impl AuditLog for InMemoryAuditLog {
    fn record(
        &self,
        run_id: ScoringRunId,
        company_id: &CompanyId,
        records: Vec<AuditRecord>,
    ) -> Result<(), AuditError> {
        let mut guard = self
            .trails
            .lock()
            .map_err(|_| AuditError::Unavailable("audit mutex poisoned".to_string()))?;
        guard.insert((run_id, company_id.clone()), records);
        Ok(())
    }

    fn for_run(
        &self,
        run_id: ScoringRunId,
        company_id: Option<&CompanyId>,
    ) -> Result<Vec<AuditRecord>, AuditError> {
        let guard = self
            .trails
            .lock()
            .map_err(|_| AuditError::Unavailable("audit mutex poisoned".to_string()))?;
        Ok(guard
            .iter()
            .filter(|((run, company), _)| {
                *run == run_id && company_id.map_or(true, |wanted| wanted == company)
            })
            .flat_map(|(_, records)| records.iter().cloned())
            .collect())
    }
}

/// Scoring service over fresh in-memory stores.
pub(crate) fn build_scoring_service(
    settings: &ScoringSettings,
) -> Result<ApiScoringService, AppError> {
    let config = settings.scoring_config()?;
    Ok(ScoringService::new(
        config,
        settings.model_version,
        Arc::new(InMemoryScoreRepository::default()),
        Arc::new(InMemoryRunRepository::default()),
        Arc::new(InMemoryAuditLog::default()),
    ))
}

/// `COMPANY=Sector` pairs for the score command. Company ids are uppercased.
pub(crate) fn parse_sector_mapping(raw: &str) -> Result<(String, String), String> {
    let (company, sector) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected COMPANY=SECTOR, got '{raw}'"))?;
    let company = company.trim().to_ascii_uppercase();
    let sector = sector.trim().to_string();
    if company.is_empty() || sector.is_empty() {
        return Err(format!("expected COMPANY=SECTOR, got '{raw}'"));
    }
    Ok((company, sector))
}

#[cfg(test)]
mod tests {
    use super::*;
    use org_air::scoring::{CompanyProfile, CompanyScoringInput, EvidenceItem};

    #[test]
    fn sector_mapping_parses_pairs() {
        assert_eq!(
            parse_sector_mapping(" wmt = Consumer "),
            Ok(("WMT".to_string(), "Consumer".to_string()))
        );
        assert!(parse_sector_mapping("WMT").is_err());
        assert!(parse_sector_mapping("=Consumer").is_err());
    }

    #[test]
    fn in_memory_service_scores_and_serves_results() {
        let service = build_scoring_service(&ScoringSettings::default()).expect("service builds");
        let companies = vec![
            CompanyScoringInput::new(
                CompanyProfile::new("JPM").in_sector("Financial"),
                vec![EvidenceItem::new("jobs", "Data scientist for machine learning fraud models")],
            ),
            CompanyScoringInput::new(CompanyProfile::new("GE").in_sector("Industrials"), Vec::new()),
        ];

        let summary = service.run_batch(companies).expect("batch runs");
        assert!(summary.failures.is_empty());

        let latest = service.latest_scores(10).expect("latest scores");
        assert_eq!(latest.len(), 2);
        let trail = service
            .audit_trail(summary.run.id, Some(&CompanyId::from("GE")))
            .expect("audit trail");
        assert_eq!(trail.len(), 8);
    }
}
