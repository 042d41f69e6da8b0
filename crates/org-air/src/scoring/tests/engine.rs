use super::common::*;
use chrono::Utc;

use crate::scoring::composite::{blend, CompositeFormula};
use crate::scoring::config::{ModelVersion, ScoringConfig};
use crate::scoring::domain::{
    CompanyId, CompanyProfile, CompanyScoringInput, Dimension, HistoricalScore, ScoringRunId,
};
use crate::scoring::engine::{ScoringContext, ScoringEngine};
use crate::scoring::sem::SemMethod;

fn context(history: &[HistoricalScore], portfolio_hiring_average: f64) -> ScoringContext<'_> {
    ScoringContext {
        run_id: ScoringRunId::new(),
        as_of: Utc::now(),
        portfolio_hiring_average,
        history,
    }
}

fn engine(model_version: ModelVersion) -> ScoringEngine {
    ScoringEngine::new(ScoringConfig::standard(), model_version)
}

fn history_rows(own: &str) -> Vec<HistoricalScore> {
    let mut rows = vec![HistoricalScore {
        company_id: CompanyId::from(own),
        dimensions: [99.0; 7],
        composite: 99.0,
    }];
    for i in 0..6 {
        let base = 30.0 + 10.0 * f64::from(i);
        rows.push(HistoricalScore {
            company_id: CompanyId(format!("PEER{i}")),
            dimensions: [base, base + 5.0, base - 5.0, base, base + 2.0, base - 2.0, base + 1.0],
            composite: base + 1.0,
        });
    }
    rows
}

#[test]
fn zero_evidence_scores_neutral_everywhere() {
    let input = CompanyScoringInput::new(CompanyProfile::new("GE").in_sector("Industrials"), Vec::new());
    let result = engine(ModelVersion::V2)
        .score_company(&input, &context(&[], 0.0))
        .expect("scores");

    assert_eq!(result.score.dimension_vector(), [50.0; 7]);
    assert_eq!(result.score.talent_penalty, 0.0);
    assert!(result.score.breakdown.sector_configured);
}

#[test]
fn blended_composite_matches_its_recorded_inputs() {
    let input = company("NVDA", "Services", strong_evidence());
    let result = engine(ModelVersion::V2)
        .score_company(&input, &context(&[], 18.0))
        .expect("scores");
    let breakdown = &result.score.breakdown;

    let inputs = breakdown.composite.inputs;
    let penalized = breakdown.vr.vr_score * breakdown.talent.penalty_factor;
    assert!((inputs.vr - penalized).abs() < 1e-9);
    assert_eq!(
        Some(inputs.hr),
        breakdown.hr.as_ref().map(|hr| hr.score)
    );
    assert_eq!(inputs.synergy_score, breakdown.formula_synergy.synergy_score);

    let recomputed = blend(CompositeFormula::blended(), inputs, ModelVersion::V2.band_scheme());
    assert_eq!(recomputed.composite_score, result.score.composite_score);
    assert_eq!(recomputed.score_band, result.score.score_band);
}

#[test]
fn legacy_composite_adds_bonus_then_penalizes() {
    let input = company("NVDA", "Services", strong_evidence());
    let result = engine(ModelVersion::V1)
        .score_company(&input, &context(&[], 18.0))
        .expect("scores");
    let breakdown = &result.score.breakdown;

    assert_eq!(breakdown.composite.formula, CompositeFormula::Legacy);
    assert_eq!(breakdown.composite.inputs.vr, breakdown.vr.vr_score);
    let expected = ((breakdown.vr.vr_score + breakdown.rule_synergy.synergy_bonus).clamp(0.0, 100.0)
        * breakdown.talent.penalty_factor
        * 100.0)
        .round()
        / 100.0;
    assert!((result.score.composite_score - expected).abs() < 1e-9);
    assert!(breakdown.hr.is_none());
}

#[test]
fn talent_multiplier_only_touches_talent_under_v1() {
    let input = company("NVDA", "Services", strong_evidence());
    // 18 postings against an average of 36 puts the hiring factor below 1.
    let legacy = engine(ModelVersion::V1)
        .score_company(&input, &context(&[], 36.0))
        .expect("legacy scores");
    let current = engine(ModelVersion::V2)
        .score_company(&input, &context(&[], 36.0))
        .expect("current scores");

    assert!(legacy.score.breakdown.hr_adjustment.hr_factor < 1.0);
    for dimension in Dimension::ALL {
        let before = current.score.dimension(dimension).expect("v2 dimension").score;
        let after = legacy.score.dimension(dimension).expect("v1 dimension").score;
        if dimension == Dimension::TalentSkills {
            assert!(after < before, "talent {after} should drop below {before}");
        } else {
            assert_eq!(after, before, "{dimension:?}");
        }
    }
}

#[test]
fn unknown_sector_falls_back_to_uniform_weights() {
    let input = company("ACME", "Technology", strong_evidence());
    let result = engine(ModelVersion::V2)
        .score_company(&input, &context(&[], 18.0))
        .expect("scores");

    assert!(!result.score.breakdown.sector_configured);
    assert_eq!(result.score.breakdown.sector, "Technology");
    let vr_trace = &result.traces[3];
    let weights = vr_trace.input["weights"].as_array().expect("weights");
    for weight in weights {
        let weight = weight.as_f64().expect("numeric weight");
        assert!((weight - 1.0 / 7.0).abs() < 1e-12);
    }
}

#[test]
fn own_history_row_is_excluded_from_training() {
    let history = history_rows("NVDA");
    let input = company("NVDA", "Services", strong_evidence());
    let result = engine(ModelVersion::V2)
        .score_company(&input, &context(&history, 18.0))
        .expect("scores");

    let sem = &result.score.breakdown.sem;
    assert_eq!(sem.training_rows, 6);
    assert_eq!(sem.attempts[0].method, SemMethod::SemSimplified);
    assert!(result.score.sem_lower <= result.score.sem_upper);
}

#[test]
fn empty_history_uses_constant_band() {
    let input = company("DG", "Consumer", sparse_evidence());
    let result = engine(ModelVersion::V2)
        .score_company(&input, &context(&[], 0.0))
        .expect("scores");

    let score = &result.score;
    assert_eq!(score.breakdown.sem.method_used, SemMethod::FallbackConstantBand);
    assert!(score.composite_score - score.sem_lower <= 5.0 + 1e-9);
    assert!(score.sem_upper - score.composite_score <= 5.0 + 1e-9);
}
