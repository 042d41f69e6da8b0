//! Confidence band around the composite from a single-factor latent model.
//!
//! The estimator is a three-state machine: `SemSimplified` fits loadings and
//! OLS on the history, `Bootstrap` refits on resamples, and
//! `FallbackConstantBand` returns a fixed band around the observed composite.
//! Each failed state records an attempt and hands over to the next one; the
//! last state cannot fail, so estimation always terminates with a band.

mod bootstrap;
mod linalg;

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::debug;

use super::domain::{clamp, round2, HistoricalScore};
use linalg::{ols, one_factor_loadings, project, Row};

pub const MIN_FACTOR_ROWS: usize = 5;
pub const FALLBACK_HALF_WIDTH: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemMethod {
    SemSimplified,
    Bootstrap,
    FallbackConstantBand,
}

impl SemMethod {
    pub fn label(self) -> &'static str {
        match self {
            SemMethod::SemSimplified => "sem_simplified",
            SemMethod::Bootstrap => "bootstrap",
            SemMethod::FallbackConstantBand => "fallback_constant_band",
        }
    }

    fn next(self) -> SemMethod {
        match self {
            SemMethod::SemSimplified => SemMethod::Bootstrap,
            SemMethod::Bootstrap | SemMethod::FallbackConstantBand => {
                SemMethod::FallbackConstantBand
            }
        }
    }
}

/// Why a fitting state gave up.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EstimationError {
    #[error("too few training rows ({rows})")]
    TooFewRows { rows: usize },
    #[error("latent score has no spread (Sxx = {sxx:.3e})")]
    IllConditioned { sxx: f64 },
    #[error("no bootstrap resample produced a fit ({attempted} attempted)")]
    NoSuccessfulResample { attempted: usize },
    #[error("fit produced non-finite values")]
    NonFinite,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemAttempt {
    pub method: SemMethod,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitIndex {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r2: Option<f64>,
    pub rmse: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemEstimate {
    pub lower: f64,
    pub upper: f64,
    pub standard_error: f64,
    pub method_used: SemMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_fit_index: Option<FitIndex>,
    pub training_rows: usize,
    pub attempts: Vec<SemAttempt>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemParams {
    pub alpha: f64,
    pub bootstrap_samples: usize,
    pub seed: u64,
}

impl Default for SemParams {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            bootstrap_samples: 400,
            seed: 42,
        }
    }
}

impl SemParams {
    /// Two-sided normal critical value, 1.96 at the default alpha.
    pub fn z(&self) -> f64 {
        let alpha = clamp(self.alpha, 1e-6, 0.5);
        Normal::new(0.0, 1.0)
            .map(|normal| normal.inverse_cdf(1.0 - alpha / 2.0))
            .ok()
            .filter(|z| z.is_finite())
            .unwrap_or(1.96)
    }
}

struct Band {
    lower: f64,
    upper: f64,
    standard_error: f64,
    predicted: Option<f64>,
    fit: Option<FitIndex>,
}

pub struct SemEstimator {
    params: SemParams,
}

impl SemEstimator {
    pub fn new(params: SemParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SemParams {
        &self.params
    }

    /// Start state chosen by history size.
    pub fn estimate(
        &self,
        current: &[f64; 7],
        observed: f64,
        history: &[HistoricalScore],
    ) -> SemEstimate {
        let start = if history.len() >= MIN_FACTOR_ROWS {
            SemMethod::SemSimplified
        } else {
            SemMethod::Bootstrap
        };
        self.estimate_from(start, current, observed, history)
    }

    /// Run the state machine from an explicit start state.
    pub fn estimate_from(
        &self,
        start: SemMethod,
        current: &[f64; 7],
        observed: f64,
        history: &[HistoricalScore],
    ) -> SemEstimate {
        let rows: Vec<Row> = history.iter().map(|row| row.dimensions).collect();
        let targets: Vec<f64> = history.iter().map(|row| row.composite).collect();
        let mut attempts = Vec::new();
        let mut state = start;

        loop {
            let outcome = match state {
                SemMethod::SemSimplified => self.factor_band(current, &rows, &targets),
                SemMethod::Bootstrap => self.bootstrap_band(current, &rows, &targets),
                SemMethod::FallbackConstantBand => Ok(constant_band(observed)),
            };

            match outcome {
                Ok(band) => {
                    attempts.push(SemAttempt {
                        method: state,
                        succeeded: true,
                        failure: None,
                    });
                    return SemEstimate {
                        lower: round2(band.lower),
                        upper: round2(band.upper),
                        standard_error: (band.standard_error * 10_000.0).round() / 10_000.0,
                        method_used: state,
                        predicted: band.predicted.map(round2),
                        model_fit_index: band.fit,
                        training_rows: rows.len(),
                        attempts,
                    };
                }
                Err(err) => {
                    debug!(method = state.label(), error = %err, "sem state failed");
                    attempts.push(SemAttempt {
                        method: state,
                        succeeded: false,
                        failure: Some(err.to_string()),
                    });
                    state = state.next();
                }
            }
        }
    }

    fn factor_band(&self, current: &Row, rows: &[Row], targets: &[f64]) -> Result<Band, EstimationError> {
        if rows.len() < MIN_FACTOR_ROWS {
            return Err(EstimationError::TooFewRows { rows: rows.len() });
        }

        let loadings = one_factor_loadings(rows);
        let eta: Vec<f64> = rows.iter().map(|row| project(row, &loadings)).collect();
        let fit = ols(&eta, targets)?;

        let eta0 = project(current, &loadings);
        let predicted = fit.predict(eta0);
        let standard_error = fit.mean_prediction_se(eta0);
        if !(predicted.is_finite() && standard_error.is_finite()) {
            return Err(EstimationError::NonFinite);
        }

        let z = self.params.z();
        Ok(Band {
            lower: clamp(predicted - z * standard_error, 0.0, 100.0),
            upper: clamp(predicted + z * standard_error, 0.0, 100.0),
            standard_error,
            predicted: Some(predicted),
            fit: Some(FitIndex {
                r2: Some(fit.r2),
                rmse: fit.sigma,
            }),
        })
    }

    fn bootstrap_band(&self, current: &Row, rows: &[Row], targets: &[f64]) -> Result<Band, EstimationError> {
        let band = bootstrap::bootstrap_band(
            current,
            rows,
            targets,
            self.params.bootstrap_samples,
            self.params.seed,
            clamp(self.params.alpha, 1e-6, 0.5),
        )?;
        Ok(Band {
            lower: clamp(band.lower, 0.0, 100.0),
            upper: clamp(band.upper, 0.0, 100.0),
            standard_error: band.standard_error,
            predicted: None,
            fit: Some(FitIndex {
                r2: None,
                rmse: band.mean_rmse,
            }),
        })
    }
}

fn constant_band(observed: f64) -> Band {
    let observed = clamp(observed, 0.0, 100.0);
    Band {
        lower: clamp(observed - FALLBACK_HALF_WIDTH, 0.0, 100.0),
        upper: clamp(observed + FALLBACK_HALF_WIDTH, 0.0, 100.0),
        standard_error: FALLBACK_HALF_WIDTH,
        predicted: None,
        fit: None,
    }
}
