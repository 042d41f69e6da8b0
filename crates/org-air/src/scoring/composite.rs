use serde::{Deserialize, Serialize};

use super::domain::{clamp, round2};

pub const DEFAULT_ALPHA: f64 = 0.60;
pub const DEFAULT_BETA: f64 = 0.12;

/// Composite formula bound to a model version.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "formula", rename_all = "snake_case")]
pub enum CompositeFormula {
    /// `(1-β)(α·VR + (1-α)·HR) + β·Synergy`
    Blended { alpha: f64, beta: f64 },
    /// `(VR + synergy_bonus) × penalty_factor`
    Legacy,
}

impl CompositeFormula {
    pub fn blended() -> Self {
        Self::Blended {
            alpha: DEFAULT_ALPHA,
            beta: DEFAULT_BETA,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CompositeFormula::Blended { .. } => "blended",
            CompositeFormula::Legacy => "legacy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandScheme {
    Quintile,
    Verbal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuintileBand {
    Nascent,
    Developing,
    Adequate,
    Good,
    Excellent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerbalBand {
    Leader,
    Strong,
    Developing,
    Emerging,
    Lagging,
}

/// Qualitative band, tagged with the scheme that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", content = "label", rename_all = "snake_case")]
pub enum ScoreBand {
    Quintile(QuintileBand),
    Verbal(VerbalBand),
}

impl ScoreBand {
    pub fn label(&self) -> &'static str {
        match self {
            ScoreBand::Quintile(band) => match band {
                QuintileBand::Nascent => "nascent",
                QuintileBand::Developing => "developing",
                QuintileBand::Adequate => "adequate",
                QuintileBand::Good => "good",
                QuintileBand::Excellent => "excellent",
            },
            ScoreBand::Verbal(band) => match band {
                VerbalBand::Leader => "leader",
                VerbalBand::Strong => "strong",
                VerbalBand::Developing => "developing",
                VerbalBand::Emerging => "emerging",
                VerbalBand::Lagging => "lagging",
            },
        }
    }
}

impl BandScheme {
    pub fn band(self, score: f64) -> ScoreBand {
        match self {
            BandScheme::Quintile => ScoreBand::Quintile(if score <= 20.0 {
                QuintileBand::Nascent
            } else if score <= 40.0 {
                QuintileBand::Developing
            } else if score <= 60.0 {
                QuintileBand::Adequate
            } else if score <= 80.0 {
                QuintileBand::Good
            } else {
                QuintileBand::Excellent
            }),
            BandScheme::Verbal => ScoreBand::Verbal(if score >= 85.0 {
                VerbalBand::Leader
            } else if score >= 70.0 {
                VerbalBand::Strong
            } else if score >= 55.0 {
                VerbalBand::Developing
            } else if score >= 40.0 {
                VerbalBand::Emerging
            } else {
                VerbalBand::Lagging
            }),
        }
    }
}

/// Inputs to the blend. Fields a formula does not use are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeInputs {
    pub vr: f64,
    pub hr: f64,
    pub synergy_score: f64,
    pub synergy_bonus: f64,
    pub penalty_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeResult {
    pub formula: CompositeFormula,
    pub inputs: CompositeInputs,
    pub composite_score: f64,
    pub score_band: ScoreBand,
}

pub fn blend(formula: CompositeFormula, inputs: CompositeInputs, scheme: BandScheme) -> CompositeResult {
    let raw = match formula {
        CompositeFormula::Blended { alpha, beta } => {
            let alpha = clamp(alpha, 0.0, 1.0);
            let beta = clamp(beta, 0.0, 1.0);
            (1.0 - beta) * (alpha * clamp(inputs.vr, 0.0, 100.0) + (1.0 - alpha) * clamp(inputs.hr, 0.0, 100.0))
                + beta * clamp(inputs.synergy_score, 0.0, 100.0)
        }
        CompositeFormula::Legacy => {
            clamp(inputs.vr + inputs.synergy_bonus, 0.0, 100.0) * clamp(inputs.penalty_factor, 0.0, 1.0)
        }
    };
    let composite_score = round2(clamp(raw, 0.0, 100.0));

    CompositeResult {
        formula,
        inputs,
        composite_score,
        score_band: scheme.band(composite_score),
    }
}
