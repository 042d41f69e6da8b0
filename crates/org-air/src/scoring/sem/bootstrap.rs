use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::linalg::{ols, one_factor_loadings, project, Row};
use super::EstimationError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BootstrapBand {
    pub(crate) lower: f64,
    pub(crate) upper: f64,
    pub(crate) standard_error: f64,
    pub(crate) mean_rmse: f64,
    pub(crate) successful_resamples: usize,
}

/// Linear-interpolation percentile over an ascending slice.
pub(crate) fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }

    let rank = (p / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;

    if upper >= sorted.len() {
        sorted[sorted.len() - 1]
    } else {
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}

fn sample_sd(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
}

/// Resample training companies with replacement, refit loadings and OLS on
/// each resample, and predict the current company with that resample's model.
pub(crate) fn bootstrap_band(
    current: &Row,
    rows: &[Row],
    targets: &[f64],
    samples: usize,
    seed: u64,
    alpha: f64,
) -> Result<BootstrapBand, EstimationError> {
    let n = rows.len();
    if n == 0 {
        return Err(EstimationError::TooFewRows { rows: 0 });
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut predictions = Vec::with_capacity(samples);
    let mut sigmas = Vec::with_capacity(samples);
    let mut resample_rows: Vec<Row> = Vec::with_capacity(n);
    let mut resample_targets: Vec<f64> = Vec::with_capacity(n);

    for _ in 0..samples {
        resample_rows.clear();
        resample_targets.clear();
        for _ in 0..n {
            let pick = rng.gen_range(0..n);
            resample_rows.push(rows[pick]);
            resample_targets.push(targets[pick]);
        }

        let loadings = one_factor_loadings(&resample_rows);
        let eta: Vec<f64> = resample_rows
            .iter()
            .map(|row| project(row, &loadings))
            .collect();
        let Ok(fit) = ols(&eta, &resample_targets) else {
            continue;
        };
        let prediction = fit.predict(project(current, &loadings));
        if prediction.is_finite() {
            predictions.push(prediction);
            sigmas.push(fit.sigma);
        }
    }

    if predictions.is_empty() {
        return Err(EstimationError::NoSuccessfulResample { attempted: samples });
    }

    predictions.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let lower = percentile(&predictions, 100.0 * alpha / 2.0);
    let upper = percentile(&predictions, 100.0 * (1.0 - alpha / 2.0));

    Ok(BootstrapBand {
        lower,
        upper,
        standard_error: sample_sd(&predictions),
        mean_rmse: sigmas.iter().sum::<f64>() / sigmas.len() as f64,
        successful_resamples: predictions.len(),
    })
}
