use serde::{Deserialize, Serialize};

use super::domain::{clamp, Dimension, DimensionScore};

pub const CONFIDENCE_FLOOR: f64 = 0.20;
pub const MAX_DISPERSION_PENALTY: f64 = 15.0;
pub const DEFAULT_DISPERSION_STRENGTH: f64 = 8.0;

/// Imbalance penalty: coefficient of variation of the raw scores times
/// `strength`, capped at `MAX_DISPERSION_PENALTY`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispersionPenalty {
    pub enabled: bool,
    pub strength: f64,
}

impl Default for DispersionPenalty {
    fn default() -> Self {
        Self {
            enabled: true,
            strength: DEFAULT_DISPERSION_STRENGTH,
        }
    }
}

impl DispersionPenalty {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            strength: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VrContribution {
    pub dimension: Dimension,
    pub raw_score: f64,
    pub confidence: f64,
    pub confidence_used: f64,
    pub sector_weight: f64,
    pub weighted_confidence: f64,
    pub weighted_score: f64,
    pub evidence_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VrResult {
    pub vr_score: f64,
    pub weighted_mean: f64,
    pub coefficient_of_variation: f64,
    pub dispersion_penalty: f64,
    pub contributions: Vec<VrContribution>,
}

/// Population coefficient of variation; zero when the mean is effectively zero.
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if mean.abs() < 1e-9 {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt() / mean.abs()
}

pub fn compute_vr(
    scores: &[DimensionScore],
    weights: &[f64; 7],
    dispersion: &DispersionPenalty,
) -> VrResult {
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    let mut contributions = Vec::with_capacity(scores.len());
    let mut raw_scores = Vec::with_capacity(scores.len());

    for score in scores {
        let raw_score = clamp(score.score, 0.0, 100.0);
        let confidence = clamp(score.confidence, 0.0, 1.0);
        let confidence_used = confidence.max(CONFIDENCE_FLOOR);
        let sector_weight = weights[score.dimension.index()];
        let weighted_confidence = sector_weight * confidence_used;
        let weighted_score = raw_score * weighted_confidence;

        numerator += weighted_score;
        denominator += weighted_confidence;
        raw_scores.push(raw_score);

        contributions.push(VrContribution {
            dimension: score.dimension,
            raw_score,
            confidence,
            confidence_used,
            sector_weight,
            weighted_confidence,
            weighted_score,
            evidence_count: score.evidence_count,
        });
    }

    let weighted_mean = if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    };

    let coefficient_of_variation = coefficient_of_variation(&raw_scores);
    let dispersion_penalty = if dispersion.enabled && dispersion.strength.is_finite() {
        clamp(
            coefficient_of_variation * dispersion.strength.max(0.0),
            0.0,
            MAX_DISPERSION_PENALTY,
        )
    } else {
        0.0
    };

    VrResult {
        vr_score: clamp(weighted_mean - dispersion_penalty, 0.0, 100.0),
        weighted_mean,
        coefficient_of_variation,
        dispersion_penalty,
        contributions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(values: [f64; 7], confidence: f64) -> Vec<DimensionScore> {
        Dimension::ALL
            .into_iter()
            .zip(values)
            .map(|(dimension, score)| DimensionScore {
                dimension,
                score,
                confidence,
                evidence_count: 4,
                top_keywords: Vec::new(),
                reasons: Vec::new(),
            })
            .collect()
    }

    #[test]
    fn uniform_scores_have_no_penalty() {
        let result = compute_vr(
            &scores([60.0; 7], 0.7),
            &[1.0 / 7.0; 7],
            &DispersionPenalty::default(),
        );
        assert!((result.vr_score - 60.0).abs() < 1e-9);
        assert_eq!(result.dispersion_penalty, 0.0);
    }

    #[test]
    fn imbalanced_vector_is_penalized_within_cap() {
        let values = [70.0, 90.0, 90.0, 100.0, 90.0, 90.0, 90.0];
        let result = compute_vr(
            &scores(values, 0.8),
            &[1.0 / 7.0; 7],
            &DispersionPenalty::default(),
        );
        assert!(result.vr_score > 0.0 && result.vr_score < 100.0);
        assert!(result.vr_score >= 70.0 - MAX_DISPERSION_PENALTY);
        assert!(result.dispersion_penalty > 0.0);
        assert!(result.dispersion_penalty <= MAX_DISPERSION_PENALTY);
    }

    #[test]
    fn confidence_floor_applies_to_weighting() {
        let mut input = scores([50.0; 7], 0.05);
        input[0].score = 100.0;
        let result = compute_vr(&input, &[1.0 / 7.0; 7], &DispersionPenalty::disabled());
        assert_eq!(result.contributions[0].confidence_used, CONFIDENCE_FLOOR);
        assert!((result.weighted_mean - (100.0 + 6.0 * 50.0) / 7.0).abs() < 1e-9);
    }

    #[test]
    fn zero_weights_produce_zero_vr() {
        let result = compute_vr(&scores([80.0; 7], 0.9), &[0.0; 7], &DispersionPenalty::disabled());
        assert_eq!(result.vr_score, 0.0);
    }

    #[test]
    fn cv_is_zero_for_zero_mean() {
        assert_eq!(coefficient_of_variation(&[0.0, 0.0]), 0.0);
        assert_eq!(coefficient_of_variation(&[]), 0.0);
    }
}
