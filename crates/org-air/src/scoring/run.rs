use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::composite::{CompositeResult, ScoreBand};
use super::config::ModelVersion;
use super::domain::{CompanyId, Dimension, DimensionScore, HistoricalScore, ScoringRunId};
use super::hr::{HrAdjustment, HrScore};
use super::sem::SemEstimate;
use super::synergy::{FormulaSynergy, SynergyResult};
use super::talent::TalentConcentration;
use super::vr::VrResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Success,
    Failed,
}

impl RunStatus {
    pub fn label(self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Success => "success",
            RunStatus::Failed => "failed",
        }
    }
}

/// Persisted batch execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRun {
    pub id: ScoringRunId,
    pub companies_scored: u32,
    pub model_version: ModelVersion,
    pub parameters: Value,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl ScoringRun {
    pub fn start(id: ScoringRunId, model_version: ModelVersion, parameters: Value) -> Self {
        Self {
            id,
            companies_scored: 0,
            model_version,
            parameters,
            status: RunStatus::Running,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Reset a stored run for re-execution under the same id.
    pub fn restart(mut self, parameters: Value) -> Self {
        self.companies_scored = 0;
        self.parameters = parameters;
        self.status = RunStatus::Running;
        self.started_at = Utc::now();
        self.finished_at = None;
        self
    }

    pub fn finish(&mut self, status: RunStatus, companies_scored: u32) {
        self.status = status;
        self.companies_scored = companies_scored;
        self.finished_at = Some(Utc::now());
    }
}

/// Every intermediate result that fed the composite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub dimension_scores: Vec<DimensionScore>,
    pub sector: String,
    pub sector_configured: bool,
    pub hr_adjustment: HrAdjustment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hr: Option<HrScore>,
    pub talent: TalentConcentration,
    pub vr: VrResult,
    pub rule_synergy: SynergyResult,
    pub formula_synergy: FormulaSynergy,
    pub composite: CompositeResult,
    pub sem: SemEstimate,
}

/// Final score for one company in one run. Unique on
/// `(company_id, scoring_run_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrgAirScore {
    pub company_id: CompanyId,
    pub scoring_run_id: ScoringRunId,
    pub model_version: ModelVersion,
    pub vr_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hr_score: Option<f64>,
    pub synergy_bonus: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synergy_score: Option<f64>,
    pub talent_penalty: f64,
    pub composite_score: f64,
    pub score_band: ScoreBand,
    pub sem_lower: f64,
    pub sem_upper: f64,
    pub breakdown: ScoreBreakdown,
    pub scored_at: DateTime<Utc>,
}

impl OrgAirScore {
    pub fn dimension_vector(&self) -> [f64; 7] {
        let mut vector = [0.0; 7];
        for score in &self.breakdown.dimension_scores {
            vector[score.dimension.index()] = score.score;
        }
        vector
    }

    pub fn dimension(&self, dimension: Dimension) -> Option<&DimensionScore> {
        self.breakdown
            .dimension_scores
            .iter()
            .find(|score| score.dimension == dimension)
    }

    /// Training row for later confidence estimates.
    pub fn to_history(&self) -> HistoricalScore {
        HistoricalScore {
            company_id: self.company_id.clone(),
            dimensions: self.dimension_vector(),
            composite: self.composite_score,
        }
    }

    pub fn summary(&self) -> ScoreSummary {
        ScoreSummary {
            company_id: self.company_id.clone(),
            scoring_run_id: self.scoring_run_id,
            model_version: self.model_version,
            composite_score: self.composite_score,
            score_band: self.score_band.label(),
            vr_score: self.vr_score,
            hr_score: self.hr_score,
            sem_lower: self.sem_lower,
            sem_upper: self.sem_upper,
            scored_at: self.scored_at,
        }
    }
}

/// Compact view used by list endpoints and the CLI table.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreSummary {
    pub company_id: CompanyId,
    pub scoring_run_id: ScoringRunId,
    pub model_version: ModelVersion,
    pub composite_score: f64,
    pub score_band: &'static str,
    pub vr_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hr_score: Option<f64>,
    pub sem_lower: f64,
    pub sem_upper: f64,
    pub scored_at: DateTime<Utc>,
}
