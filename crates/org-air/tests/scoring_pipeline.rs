use std::collections::BTreeMap;

use chrono::{Duration, Utc};
use org_air::intake::EvidenceImporter;
use org_air::scoring::portfolio::{all_in_range, expected_composite, validate_ranges, PORTFOLIO_PRIORS};
use org_air::scoring::{
    CompanyProfile, CompanyScoringInput, Dimension, EvidenceItem, ModelVersion, ScoringConfig,
    ScoringContext, ScoringEngine, ScoringRunId,
};

fn context(portfolio_hiring_average: f64) -> ScoringContext<'static> {
    ScoringContext {
        run_id: ScoringRunId::new(),
        as_of: Utc::now(),
        portfolio_hiring_average,
        history: &[],
    }
}

fn postings(count: usize) -> Vec<EvidenceItem> {
    (0..count)
        .map(|i| {
            EvidenceItem::new(
                "jobs",
                format!("Machine learning engineer {i} with Python and MLOps experience"),
            )
        })
        .collect()
}

#[test]
fn csv_export_scores_end_to_end() {
    let csv = "ticker,signal_type,content_text\n\
JPM,jobs,Machine learning engineer for fraud detection with Python\n\
JPM,jobs,Data engineer building Spark pipelines\n\
JPM,sec_item_1,Our AI strategy is led by the CEO with production use cases\n\
GE,news,Quarterly results announced\n";
    let import = EvidenceImporter::from_reader(csv.as_bytes()).expect("import succeeds");
    let engine = ScoringEngine::new(ScoringConfig::standard(), ModelVersion::V2);
    let ctx = context(2.0);

    let mut composites = BTreeMap::new();
    for company in import.companies {
        let sector = if company.company_id == "JPM" { "Financial" } else { "Industrials" };
        let input = company.into_input(Some(sector));
        let result = engine.score_company(&input, &ctx).expect("company scores");
        assert_eq!(result.traces.len(), 7);
        assert_eq!(result.score.breakdown.dimension_scores.len(), 7);
        composites.insert(result.score.company_id.0.clone(), result.score.composite_score);
    }

    assert_eq!(composites.len(), 2);
    assert!(composites.values().all(|score| (0.0..=100.0).contains(score)));
}

#[test]
fn stale_postings_fall_outside_the_hiring_window() {
    let engine = ScoringEngine::new(ScoringConfig::standard(), ModelVersion::V2);
    let now = Utc::now();
    let mut evidence = postings(4);
    evidence.extend(
        postings(6)
            .into_iter()
            .map(|item| item.published(now - Duration::days(800))),
    );

    assert_eq!(engine.hiring_signal_count(&evidence, now), 4);
}

#[test]
fn above_average_hiring_lifts_hr_and_composite() {
    let engine = ScoringEngine::new(ScoringConfig::standard(), ModelVersion::V2);
    let input = CompanyScoringInput::new(
        CompanyProfile::new("WMT")
            .in_sector("Consumer")
            .with_market_cap_percentile(0.65),
        postings(12),
    );

    let hot = engine.score_company(&input, &context(6.0)).expect("scores");
    let cold = engine.score_company(&input, &context(24.0)).expect("scores");

    assert!(hot.score.breakdown.hr_adjustment.hr_factor > 1.0);
    assert!(cold.score.breakdown.hr_adjustment.hr_factor < 1.0);
    assert!(hot.score.hr_score > cold.score.hr_score);
    assert!(hot.score.composite_score >= cold.score.composite_score);
    assert_eq!(
        hot.score.dimension(Dimension::TalentSkills).map(|d| d.score),
        cold.score.dimension(Dimension::TalentSkills).map(|d| d.score),
        "the blended model leaves talent untouched"
    );
}

#[test]
fn calibration_priors_land_in_expected_ranges() {
    let scores: BTreeMap<String, f64> = PORTFOLIO_PRIORS
        .iter()
        .map(|prior| (prior.ticker.to_string(), expected_composite(prior)))
        .collect();
    let checks = validate_ranges(&scores);
    assert_eq!(checks.len(), 5);
    assert!(all_in_range(&checks), "{checks:?}");

    let ordered: Vec<f64> = PORTFOLIO_PRIORS
        .iter()
        .map(|prior| scores[prior.ticker])
        .collect();
    assert!(ordered.windows(2).all(|pair| pair[0] > pair[1]));
}
