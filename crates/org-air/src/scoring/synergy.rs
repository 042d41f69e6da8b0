use serde::{Deserialize, Serialize};

use super::domain::{clamp, Dimension};

pub const DEFAULT_SYNERGY_CAP: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynergyType {
    Positive,
    Negative,
}

impl SynergyType {
    pub fn label(self) -> &'static str {
        match self {
            SynergyType::Positive => "positive",
            SynergyType::Negative => "negative",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynergyRule {
    pub dim_a: Dimension,
    pub dim_b: Dimension,
    pub synergy_type: SynergyType,
    pub threshold: f64,
    /// Points contributed when active. The sign follows `synergy_type`, so a
    /// drag configured as `3.0` or `-3.0` subtracts three points either way.
    pub magnitude: f64,
}

impl SynergyRule {
    pub fn positive(dim_a: Dimension, dim_b: Dimension, threshold: f64, magnitude: f64) -> Self {
        Self {
            dim_a,
            dim_b,
            synergy_type: SynergyType::Positive,
            threshold,
            magnitude,
        }
    }

    pub fn negative(dim_a: Dimension, dim_b: Dimension, threshold: f64, magnitude: f64) -> Self {
        Self {
            dim_a,
            dim_b,
            synergy_type: SynergyType::Negative,
            threshold,
            magnitude,
        }
    }

    fn signed_magnitude(&self) -> f64 {
        let magnitude = if self.magnitude.is_finite() {
            self.magnitude.abs()
        } else {
            0.0
        };
        match self.synergy_type {
            SynergyType::Positive => magnitude,
            SynergyType::Negative => -magnitude,
        }
    }
}

pub fn standard_synergy_rules() -> Vec<SynergyRule> {
    use Dimension::*;

    vec![
        SynergyRule::positive(DataInfrastructure, TechnologyStack, 60.0, 3.0),
        SynergyRule::positive(AiGovernance, CultureChange, 60.0, 3.0),
        SynergyRule::positive(LeadershipVision, UseCasePortfolio, 60.0, 2.5),
        SynergyRule::positive(TalentSkills, UseCasePortfolio, 60.0, 2.5),
        SynergyRule::negative(UseCasePortfolio, AiGovernance, 60.0, -3.0),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynergyHit {
    pub dim_a: Dimension,
    pub dim_b: Dimension,
    pub synergy_type: SynergyType,
    pub threshold: f64,
    pub magnitude: f64,
    pub activated: bool,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynergyResult {
    pub raw_total: f64,
    pub synergy_bonus: f64,
    pub cap: f64,
    pub hits: Vec<SynergyHit>,
}

/// Evaluate every rule against the dimension vector and cap the total to
/// `±cap`.
pub fn rule_synergy(scores: &[f64; 7], rules: &[SynergyRule], cap: f64) -> SynergyResult {
    let cap = if cap.is_finite() { cap.abs() } else { DEFAULT_SYNERGY_CAP };
    let mut raw_total = 0.0;
    let mut hits = Vec::with_capacity(rules.len());

    for rule in rules {
        let a = scores[rule.dim_a.index()];
        let b = scores[rule.dim_b.index()];
        let threshold = rule.threshold;

        let (activated, reason) = match rule.synergy_type {
            SynergyType::Positive => {
                if a >= threshold && b >= threshold {
                    (true, format!("both >= {threshold}"))
                } else {
                    (
                        false,
                        format!("needs both >= {threshold} (a={a:.1}, b={b:.1})"),
                    )
                }
            }
            SynergyType::Negative => {
                if a >= threshold && b < threshold {
                    (true, format!("a >= {threshold} and b < {threshold}"))
                } else {
                    (
                        false,
                        format!("needs a >= {threshold} & b < {threshold} (a={a:.1}, b={b:.1})"),
                    )
                }
            }
        };

        if activated {
            raw_total += rule.signed_magnitude();
        }

        hits.push(SynergyHit {
            dim_a: rule.dim_a,
            dim_b: rule.dim_b,
            synergy_type: rule.synergy_type,
            threshold,
            magnitude: rule.signed_magnitude(),
            activated,
            reason,
        });
    }

    SynergyResult {
        raw_total,
        synergy_bonus: clamp(raw_total, -cap, cap),
        cap,
        hits,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormulaSynergy {
    pub alignment: f64,
    pub timing_factor: f64,
    pub synergy_score: f64,
}

pub fn alignment(vr: f64, hr: f64) -> f64 {
    clamp(1.0 - (vr - hr).abs() / 100.0, 0.5, 1.0)
}

/// `VR × HR / 100 × alignment × timing`. A supplied alignment is clamped to
/// the same band as the derived one.
pub fn formula_synergy(vr: f64, hr: f64, alignment_override: Option<f64>, timing: f64) -> FormulaSynergy {
    let vr = clamp(vr, 0.0, 100.0);
    let hr = clamp(hr, 0.0, 100.0);
    let alignment = match alignment_override {
        Some(value) => clamp(value, 0.5, 1.0),
        None => alignment(vr, hr),
    };
    let timing_factor = if timing.is_finite() {
        clamp(timing, 0.8, 1.2)
    } else {
        1.0
    };
    FormulaSynergy {
        alignment,
        timing_factor,
        synergy_score: clamp(vr * hr / 100.0 * alignment * timing_factor, 0.0, 100.0),
    }
}
