//! Single-company pipeline. Pure apart from the `scored_at` timestamp: the
//! batch service supplies everything shared across companies through
//! [`ScoringContext`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::audit::{AuditStep, StageTrace};
use super::composite::{blend, CompositeInputs};
use super::config::{ModelVersion, ScoringConfig};
use super::domain::{
    clamp, round2, CompanyScoringInput, DimensionFeature, DimensionScore, EvidenceItem,
    HistoricalScore, ScoringRunId,
};
use super::evidence::{coverage_report, map_evidence, DimensionCoverage, SourcePayload};
use super::hr::{
    apply_to_talent, compute_hr_factor, count_hiring_signals, hiring_signals, hr_score,
    position_factor,
};
use super::rubric::score_features;
use super::run::{OrgAirScore, ScoreBreakdown};
use super::sector::resolve_sector;
use super::sem::SemEstimator;
use super::synergy::{formula_synergy, rule_synergy};
use super::talent;
use super::vr::compute_vr;

/// Values shared by every company in a batch.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub run_id: ScoringRunId,
    pub as_of: DateTime<Utc>,
    pub portfolio_hiring_average: f64,
    /// Prior scores of the same model version.
    pub history: &'a [HistoricalScore],
}

#[derive(Debug, Clone)]
pub struct CompanyScoring {
    pub score: OrgAirScore,
    pub traces: Vec<StageTrace>,
}

/// Evidence-only view of the first two stages.
#[derive(Debug, Clone, Serialize)]
pub struct DimensionPreview {
    pub payloads: BTreeMap<&'static str, SourcePayload>,
    pub features: Vec<DimensionFeature>,
    pub scores: Vec<DimensionScore>,
    pub coverage: Vec<DimensionCoverage>,
}

#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error("company id must not be empty")]
    EmptyCompanyId,
    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },
    #[error("failed to record {} output: {source}", step.label())]
    Trace {
        step: AuditStep,
        #[source]
        source: serde_json::Error,
    },
}

pub struct ScoringEngine {
    config: ScoringConfig,
    model_version: ModelVersion,
    sem: SemEstimator,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig, model_version: ModelVersion) -> Self {
        let sem = SemEstimator::new(config.sem);
        Self {
            config,
            model_version,
            sem,
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn model_version(&self) -> ModelVersion {
        self.model_version
    }

    /// Parameters persisted on the run record.
    pub fn run_parameters(&self) -> Value {
        json!({
            "config_version": self.config.version,
            "model_version": self.model_version.label(),
            "composite_formula": self.model_version.formula(),
            "band_scheme": self.model_version.band_scheme(),
            "synergy_cap": self.config.synergy_cap,
            "talent_penalty": self.config.talent_penalty,
            "dispersion": self.config.dispersion,
            "hr": self.config.hr,
            "sem": self.config.sem,
        })
    }

    pub fn hiring_signal_count(&self, evidence: &[EvidenceItem], as_of: DateTime<Utc>) -> u32 {
        count_hiring_signals(evidence, as_of, self.config.hr.window_days)
    }

    pub fn preview_dimensions(&self, evidence: &[EvidenceItem]) -> DimensionPreview {
        let mapping = map_evidence(evidence, &self.config.source_profiles);
        let scores = score_features(&mapping.features, &self.config.rubric_bands);
        let coverage = coverage_report(&mapping, &self.config.source_profiles);
        DimensionPreview {
            payloads: mapping
                .payloads
                .iter()
                .map(|(bucket, payload)| (bucket.label(), payload.clone()))
                .collect(),
            features: mapping.features,
            scores,
            coverage,
        }
    }

    pub fn score_company(
        &self,
        input: &CompanyScoringInput,
        context: &ScoringContext<'_>,
    ) -> Result<CompanyScoring, ScoringError> {
        validate(input, context)?;
        let company_id = &input.company.company_id;
        let config = &self.config;
        let model = self.model_version;
        let mut traces = Vec::with_capacity(7);

        let mapping = map_evidence(&input.evidence, &config.source_profiles);
        let mut scores = score_features(&mapping.features, &config.rubric_bands);
        traces.push(StageTrace::new(
            AuditStep::DimensionScoring,
            json!({
                "evidence_items": input.evidence.len(),
                "source_payloads": mapping
                    .payloads
                    .iter()
                    .map(|(bucket, payload)| (bucket.label(), payload.count))
                    .collect::<BTreeMap<_, _>>(),
            }),
            json!({
                "features": mapping.features,
                "dimension_scores": scores,
                "coverage": coverage_report(&mapping, &config.source_profiles),
            }),
        ));

        let sector = resolve_sector(&config.sectors, input.company.sector.as_deref());
        if !sector.configured {
            warn!(
                company_id = %company_id,
                sector = %sector.profile.sector_name,
                "sector not configured; using uniform weights"
            );
        }
        let baseline = sector.profile.hr_baseline();

        let signals: Vec<&EvidenceItem> =
            hiring_signals(&input.evidence, context.as_of, config.hr.window_days).collect();
        let signal_count = u32::try_from(signals.len()).unwrap_or(u32::MAX);
        let adjustment = compute_hr_factor(
            signal_count,
            context.portfolio_hiring_average,
            baseline,
            &config.hr,
        );
        let talent_multiplier = model.applies_talent_multiplier();
        if talent_multiplier {
            apply_to_talent(&mut scores, adjustment.hr_factor);
        }
        traces.push(StageTrace::new(
            AuditStep::HrBaseline,
            json!({
                "sector": sector.profile.sector_name,
                "hiring_signals": signal_count,
                "portfolio_average": context.portfolio_hiring_average,
                "baseline": baseline,
            }),
            json!({
                "adjustment": adjustment,
                "talent_multiplier_applied": talent_multiplier,
            }),
        ));

        let concentration = talent::assess(signals.iter().copied(), &config.talent_penalty);
        traces.push(StageTrace::new(
            AuditStep::TalentPenalty,
            json!({
                "sample_size": concentration.sample_size,
                "config": config.talent_penalty,
            }),
            trace_output(AuditStep::TalentPenalty, &concentration)?,
        ));

        let weights = sector.profile.normalized_weights();
        let vr = compute_vr(&scores, &weights, &config.dispersion);
        traces.push(StageTrace::new(
            AuditStep::VrModel,
            json!({
                "sector": sector.profile.sector_name,
                "sector_configured": sector.configured,
                "weights": weights,
                "dispersion": config.dispersion,
            }),
            trace_output(AuditStep::VrModel, &vr)?,
        ));

        let penalized_vr = clamp(vr.vr_score * concentration.penalty_factor, 0.0, 100.0);
        let position = position_factor(
            vr.vr_score,
            sector.profile.average_vr(),
            input.company.market_cap_percentile.unwrap_or(0.5),
        );
        let hr = hr_score(baseline, adjustment.hr_factor, position);

        let dimension_vector = vector(&scores);
        let rules = rule_synergy(&dimension_vector, &config.synergy_rules, config.synergy_cap);
        let formula = formula_synergy(
            penalized_vr,
            hr.score,
            None,
            input.timing_factor.unwrap_or(1.0),
        );
        traces.push(StageTrace::new(
            AuditStep::Synergy,
            json!({
                "dimension_scores": dimension_vector,
                "vr": penalized_vr,
                "hr": hr.score,
                "cap": config.synergy_cap,
            }),
            json!({
                "rule_based": rules,
                "formula_based": formula,
            }),
        ));

        let composite_inputs = CompositeInputs {
            vr: if model.blends_hr() { penalized_vr } else { vr.vr_score },
            hr: hr.score,
            synergy_score: formula.synergy_score,
            synergy_bonus: rules.synergy_bonus,
            penalty_factor: concentration.penalty_factor,
        };
        let composite = blend(model.formula(), composite_inputs, model.band_scheme());
        traces.push(StageTrace::new(
            AuditStep::Composite,
            json!({
                "model_version": model.label(),
                "inputs": composite_inputs,
            }),
            trace_output(AuditStep::Composite, &composite)?,
        ));

        let training: Vec<HistoricalScore> = context
            .history
            .iter()
            .filter(|row| &row.company_id != company_id)
            .cloned()
            .collect();
        let sem = self
            .sem
            .estimate(&dimension_vector, composite.composite_score, &training);
        if sem.attempts.iter().any(|attempt| !attempt.succeeded) {
            warn!(
                company_id = %company_id,
                method = sem.method_used.label(),
                "confidence estimate fell back"
            );
        }
        traces.push(StageTrace::new(
            AuditStep::SemConfidence,
            json!({
                "training_rows": training.len(),
                "observed": composite.composite_score,
                "params": self.sem.params(),
            }),
            trace_output(AuditStep::SemConfidence, &sem)?,
        ));

        debug!(
            company_id = %company_id,
            run_id = %context.run_id,
            composite = composite.composite_score,
            "company scored"
        );

        let blended = model.blends_hr();
        let score = OrgAirScore {
            company_id: company_id.clone(),
            scoring_run_id: context.run_id,
            model_version: model,
            vr_score: round2(vr.vr_score),
            hr_score: blended.then(|| round2(hr.score)),
            synergy_bonus: round2(rules.synergy_bonus),
            synergy_score: blended.then(|| round2(formula.synergy_score)),
            talent_penalty: concentration.talent_penalty,
            composite_score: composite.composite_score,
            score_band: composite.score_band,
            sem_lower: sem.lower,
            sem_upper: sem.upper,
            breakdown: ScoreBreakdown {
                dimension_scores: scores,
                sector: sector.profile.sector_name,
                sector_configured: sector.configured,
                hr_adjustment: adjustment,
                hr: blended.then_some(hr),
                talent: concentration,
                vr,
                rule_synergy: rules,
                formula_synergy: formula,
                composite,
                sem,
            },
            scored_at: Utc::now(),
        };

        Ok(CompanyScoring { score, traces })
    }
}

fn validate(input: &CompanyScoringInput, context: &ScoringContext<'_>) -> Result<(), ScoringError> {
    if input.company.company_id.0.trim().is_empty() {
        return Err(ScoringError::EmptyCompanyId);
    }
    let numbers = [
        ("timing_factor", input.timing_factor),
        ("market_cap_percentile", input.company.market_cap_percentile),
        ("portfolio_hiring_average", Some(context.portfolio_hiring_average)),
    ];
    for (field, value) in numbers {
        if let Some(value) = value.filter(|value| !value.is_finite()) {
            return Err(ScoringError::NonFinite { field, value });
        }
    }
    Ok(())
}

fn trace_output<T: Serialize>(step: AuditStep, value: &T) -> Result<Value, ScoringError> {
    serde_json::to_value(value).map_err(|source| ScoringError::Trace { step, source })
}

fn vector(scores: &[DimensionScore]) -> [f64; 7] {
    let mut vector = [0.0; 7];
    for score in scores {
        vector[score.dimension.index()] = score.score;
    }
    vector
}
