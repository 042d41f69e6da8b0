use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{clamp, Dimension, DimensionFeature, DimensionScore};

pub const NEUTRAL_SCORE: f64 = 50.0;
pub const NEUTRAL_CONFIDENCE: f64 = 0.50;
const TIER_SCORES: [f64; 5] = [25.0, 50.0, 75.0, 90.0, 100.0];

/// Cut points on `weighted_signal` separating the five score tiers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RubricBand {
    pub low: f64,
    pub mid: f64,
    pub high: f64,
    pub very_high: f64,
}

impl RubricBand {
    pub const fn new(low: f64, mid: f64, high: f64, very_high: f64) -> Self {
        Self {
            low,
            mid,
            high,
            very_high,
        }
    }

    pub fn tier_score(&self, signal: f64) -> f64 {
        if signal < self.low {
            TIER_SCORES[0]
        } else if signal < self.mid {
            TIER_SCORES[1]
        } else if signal < self.high {
            TIER_SCORES[2]
        } else if signal < self.very_high {
            TIER_SCORES[3]
        } else {
            TIER_SCORES[4]
        }
    }

    pub fn is_ordered(&self) -> bool {
        self.low < self.mid && self.mid < self.high && self.high < self.very_high
    }
}

pub type RubricBands = BTreeMap<Dimension, RubricBand>;

/// Bands tuned to typical evidence volumes per dimension. Talent sees the
/// most postings, so its bands are the widest.
pub fn standard_rubric_bands() -> RubricBands {
    Dimension::ALL
        .into_iter()
        .map(|dimension| (dimension, default_band(dimension)))
        .collect()
}

fn default_band(dimension: Dimension) -> RubricBand {
    match dimension {
        Dimension::DataInfrastructure => RubricBand::new(1.0, 3.0, 6.0, 12.0),
        Dimension::AiGovernance => RubricBand::new(1.0, 3.0, 6.0, 12.0),
        Dimension::TechnologyStack => RubricBand::new(1.5, 4.0, 8.0, 15.0),
        Dimension::TalentSkills => RubricBand::new(2.0, 5.0, 10.0, 20.0),
        Dimension::LeadershipVision => RubricBand::new(1.0, 3.0, 6.0, 12.0),
        Dimension::UseCasePortfolio => RubricBand::new(1.0, 3.0, 6.0, 12.0),
        Dimension::CultureChange => RubricBand::new(0.75, 2.0, 5.0, 10.0),
    }
}

pub fn confidence(evidence_count: u32, reliability_weighted: f64) -> f64 {
    let volume = (f64::from(evidence_count) / 80.0).min(1.0);
    let reliability = clamp(reliability_weighted, 0.0, 1.0);
    clamp(0.40 + 0.35 * volume + 0.20 * reliability, 0.40, 0.95)
}

pub fn score_feature(feature: &DimensionFeature, band: &RubricBand) -> DimensionScore {
    if feature.evidence_count == 0 {
        return DimensionScore {
            dimension: feature.dimension,
            score: NEUTRAL_SCORE,
            confidence: NEUTRAL_CONFIDENCE,
            evidence_count: 0,
            top_keywords: Vec::new(),
            reasons: vec!["no evidence → neutral default".to_string()],
        };
    }

    let signal = if feature.weighted_signal.is_finite() {
        feature.weighted_signal.max(0.0)
    } else {
        0.0
    };
    let score = band.tier_score(signal);
    let confidence = confidence(feature.evidence_count, feature.reliability_weighted);

    DimensionScore {
        dimension: feature.dimension,
        score,
        confidence,
        evidence_count: feature.evidence_count,
        top_keywords: feature.top_keywords.clone(),
        reasons: vec![format!(
            "weighted_signal {:.3} against bands {}/{}/{}/{} → tier {}",
            signal, band.low, band.mid, band.high, band.very_high, score
        )],
    }
}

/// One score per dimension in canonical order. Dimensions missing from the
/// feature list or the band table fall back to the neutral result and the
/// standard band respectively.
pub fn score_features(features: &[DimensionFeature], bands: &RubricBands) -> Vec<DimensionScore> {
    Dimension::ALL
        .into_iter()
        .map(|dimension| {
            let band = bands
                .get(&dimension)
                .copied()
                .filter(RubricBand::is_ordered)
                .unwrap_or_else(|| default_band(dimension));
            match features.iter().find(|f| f.dimension == dimension) {
                Some(feature) => score_feature(feature, &band),
                None => score_feature(&DimensionFeature::empty(dimension), &band),
            }
        })
        .collect()
}
