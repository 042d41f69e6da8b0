use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::domain::{CompanyId, ScoringRunId};

/// Pipeline stage an audit row describes, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStep {
    DimensionScoring,
    HrBaseline,
    TalentPenalty,
    VrModel,
    Synergy,
    Composite,
    SemConfidence,
    FinalWrite,
    Failure,
}

impl AuditStep {
    pub fn label(self) -> &'static str {
        match self {
            AuditStep::DimensionScoring => "dimension_scoring",
            AuditStep::HrBaseline => "hr_baseline",
            AuditStep::TalentPenalty => "talent_penalty",
            AuditStep::VrModel => "vr_model",
            AuditStep::Synergy => "synergy",
            AuditStep::Composite => "composite",
            AuditStep::SemConfidence => "sem_confidence",
            AuditStep::FinalWrite => "final_write",
            AuditStep::Failure => "failure",
        }
    }
}

/// Input and output of one stage before it is bound to a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTrace {
    pub step: AuditStep,
    pub input: Value,
    pub output: Value,
}

impl StageTrace {
    pub fn new(step: AuditStep, input: Value, output: Value) -> Self {
        Self { step, input, output }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub scoring_run_id: ScoringRunId,
    pub company_id: CompanyId,
    pub step: AuditStep,
    pub input: Value,
    pub output: Value,
    pub recorded_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn from_trace(
        scoring_run_id: ScoringRunId,
        company_id: CompanyId,
        trace: StageTrace,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            scoring_run_id,
            company_id,
            step: trace.step,
            input: trace.input,
            output: trace.output,
            recorded_at,
        }
    }
}
