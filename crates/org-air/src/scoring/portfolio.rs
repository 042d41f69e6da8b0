//! Calibration priors and expected composite ranges for the five-company
//! reference portfolio.

use std::collections::BTreeMap;

use serde::Serialize;

use super::composite::{blend, BandScheme, CompositeFormula, CompositeInputs};
use super::hr::{hr_score, PositionFactor};
use super::sector::DEFAULT_HR_BASELINE;
use super::synergy::formula_synergy;
use super::talent::{penalty_factor, TalentPenaltyConfig};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PortfolioPrior {
    pub ticker: &'static str,
    pub vr_target: f64,
    pub position_factor_target: f64,
    /// Expected hiring HHI, penalized as if the sample were just large enough.
    pub talent_concentration_target: f64,
    pub market_cap_percentile: f64,
}

pub const PORTFOLIO_PRIORS: [PortfolioPrior; 5] = [
    PortfolioPrior {
        ticker: "NVDA",
        vr_target: 95.0,
        position_factor_target: 0.90,
        talent_concentration_target: 0.12,
        market_cap_percentile: 0.95,
    },
    PortfolioPrior {
        ticker: "JPM",
        vr_target: 70.0,
        position_factor_target: 0.50,
        talent_concentration_target: 0.18,
        market_cap_percentile: 0.75,
    },
    PortfolioPrior {
        ticker: "WMT",
        vr_target: 55.0,
        position_factor_target: 0.30,
        talent_concentration_target: 0.20,
        market_cap_percentile: 0.65,
    },
    PortfolioPrior {
        ticker: "GE",
        vr_target: 40.0,
        position_factor_target: 0.00,
        talent_concentration_target: 0.25,
        market_cap_percentile: 0.50,
    },
    PortfolioPrior {
        ticker: "DG",
        vr_target: 25.0,
        position_factor_target: -0.30,
        talent_concentration_target: 0.30,
        market_cap_percentile: 0.35,
    },
];

/// Inclusive composite bounds per ticker.
pub const EXPECTED_RANGES: [(&str, f64, f64); 5] = [
    ("NVDA", 84.0, 94.0),
    ("JPM", 66.0, 76.0),
    ("WMT", 55.0, 66.0),
    ("GE", 45.0, 55.0),
    ("DG", 34.0, 45.0),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeCheck {
    pub ticker: String,
    pub score: Option<f64>,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub in_range: bool,
}

pub fn prior(ticker: &str) -> Option<&'static PortfolioPrior> {
    PORTFOLIO_PRIORS
        .iter()
        .find(|prior| prior.ticker.eq_ignore_ascii_case(ticker))
}

/// Composite implied by a prior under the blended formula at the default
/// HR baseline and neutral hiring.
pub fn expected_composite(prior: &PortfolioPrior) -> f64 {
    let talent = TalentPenaltyConfig::default();
    let (factor, _) = penalty_factor(
        prior.talent_concentration_target,
        talent.min_sample_size,
        &talent,
    );
    let vr = prior.vr_target * factor;
    let position = PositionFactor {
        vr_component: prior.position_factor_target,
        market_cap_component: prior.position_factor_target,
        value: prior.position_factor_target,
    };
    let hr = hr_score(DEFAULT_HR_BASELINE, 1.0, position);
    let synergy = formula_synergy(vr, hr.score, None, 1.0);
    blend(
        CompositeFormula::blended(),
        CompositeInputs {
            vr,
            hr: hr.score,
            synergy_score: synergy.synergy_score,
            synergy_bonus: 0.0,
            penalty_factor: factor,
        },
        BandScheme::Quintile,
    )
    .composite_score
}

/// Check scores (keyed by ticker, case-insensitive) against every expected
/// range. Missing tickers are reported out of range.
pub fn validate_ranges(scores: &BTreeMap<String, f64>) -> Vec<RangeCheck> {
    let normalized: BTreeMap<String, f64> = scores
        .iter()
        .map(|(ticker, score)| (ticker.to_ascii_uppercase(), *score))
        .collect();

    EXPECTED_RANGES
        .iter()
        .map(|(ticker, lower, upper)| {
            let score = normalized.get(*ticker).copied();
            RangeCheck {
                ticker: (*ticker).to_string(),
                score,
                lower_bound: *lower,
                upper_bound: *upper,
                in_range: score.is_some_and(|value| *lower <= value && value <= *upper),
            }
        })
        .collect()
}

pub fn all_in_range(checks: &[RangeCheck]) -> bool {
    !checks.is_empty() && checks.iter().all(|check| check.in_range)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priors_reproduce_expected_ranges() {
        let scores: BTreeMap<String, f64> = PORTFOLIO_PRIORS
            .iter()
            .map(|prior| (prior.ticker.to_string(), expected_composite(prior)))
            .collect();
        let checks = validate_ranges(&scores);
        assert!(all_in_range(&checks), "{checks:?}");
    }

    #[test]
    fn concentrated_hiring_lowers_expected_composite() {
        let base = *prior("NVDA").expect("nvda");
        let concentrated = PortfolioPrior {
            talent_concentration_target: 0.80,
            ..base
        };
        assert!(expected_composite(&concentrated) < expected_composite(&base));
    }

    #[test]
    fn out_of_range_score_is_flagged() {
        let mut scores: BTreeMap<String, f64> = EXPECTED_RANGES
            .iter()
            .map(|(ticker, lower, upper)| (ticker.to_lowercase(), (lower + upper) / 2.0))
            .collect();
        scores.insert("nvda".to_string(), 60.0);
        let checks = validate_ranges(&scores);
        let nvda = checks.iter().find(|check| check.ticker == "NVDA").expect("nvda");
        assert!(!nvda.in_range);
        assert!(!all_in_range(&checks));
    }

    #[test]
    fn missing_ticker_fails_validation() {
        let checks = validate_ranges(&BTreeMap::new());
        assert!(checks.iter().all(|check| check.score.is_none()));
        assert!(!all_in_range(&checks));
        assert!(!all_in_range(&[]));
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(prior("wmt").map(|prior| prior.vr_target), Some(55.0));
        assert!(prior("AAPL").is_none());
    }
}
