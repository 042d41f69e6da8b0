//! Small dense helpers for the single-factor model. Everything is fixed at
//! seven columns, so plain arrays are enough.

use super::EstimationError;

pub(crate) const N: usize = 7;

pub(crate) type Row = [f64; N];
type Matrix = [[f64; N]; N];

fn column_means(rows: &[Row]) -> Row {
    let n = rows.len() as f64;
    let mut means = [0.0; N];
    for row in rows {
        for (mean, value) in means.iter_mut().zip(row) {
            *mean += value;
        }
    }
    means.map(|total| total / n)
}

/// Sample standard deviation per column; zero or undefined spread becomes 1.
fn column_sds(rows: &[Row], means: &Row) -> Row {
    let dof = rows.len() as f64 - 1.0;
    let mut sds = [0.0; N];
    for row in rows {
        for col in 0..N {
            sds[col] += (row[col] - means[col]).powi(2);
        }
    }
    sds.map(|ss| {
        let sd = (ss / dof).sqrt();
        if sd.is_finite() && sd > 0.0 {
            sd
        } else {
            1.0
        }
    })
}

/// Covariance of the standardized columns, i.e. the correlation matrix.
pub(crate) fn correlation_matrix(rows: &[Row]) -> Matrix {
    let mut matrix = [[0.0; N]; N];
    if rows.len() < 2 {
        return matrix;
    }
    let means = column_means(rows);
    let sds = column_sds(rows, &means);
    let dof = rows.len() as f64 - 1.0;

    let standardized: Vec<Row> = rows
        .iter()
        .map(|row| {
            let mut z = [0.0; N];
            for col in 0..N {
                z[col] = (row[col] - means[col]) / sds[col];
            }
            z
        })
        .collect();

    for i in 0..N {
        for j in i..N {
            let cov = standardized.iter().map(|z| z[i] * z[j]).sum::<f64>() / dof;
            matrix[i][j] = cov;
            matrix[j][i] = cov;
        }
    }
    matrix
}

/// Cyclic Jacobi eigen-decomposition of a symmetric matrix.
/// Returns eigenvalues and the eigenvectors as columns.
pub(crate) fn symmetric_eigen(mut a: Matrix) -> (Row, Matrix) {
    let mut v = [[0.0; N]; N];
    for (i, row) in v.iter_mut().enumerate() {
        row[i] = 1.0;
    }

    for _sweep in 0..64 {
        let off_diagonal: f64 = (0..N)
            .flat_map(|i| ((i + 1)..N).map(move |j| (i, j)))
            .map(|(i, j)| a[i][j] * a[i][j])
            .sum();
        if off_diagonal < 1e-22 {
            break;
        }

        for p in 0..N {
            for q in (p + 1)..N {
                if a[p][q].abs() < 1e-300 {
                    continue;
                }
                let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..N {
                    let (akp, akq) = (a[k][p], a[k][q]);
                    a[k][p] = c * akp - s * akq;
                    a[k][q] = s * akp + c * akq;
                }
                for k in 0..N {
                    let (apk, aqk) = (a[p][k], a[q][k]);
                    a[p][k] = c * apk - s * aqk;
                    a[q][k] = s * apk + c * aqk;
                }
                for row in v.iter_mut() {
                    let (vkp, vkq) = (row[p], row[q]);
                    row[p] = c * vkp - s * vkq;
                    row[q] = s * vkp + c * vkq;
                }
            }
        }
    }

    let mut eigenvalues = [0.0; N];
    for (i, value) in eigenvalues.iter_mut().enumerate() {
        *value = a[i][i];
    }
    (eigenvalues, v)
}

/// Non-negative loadings summing to 1 from the leading principal component.
pub(crate) fn one_factor_loadings(rows: &[Row]) -> Row {
    let uniform = [1.0 / N as f64; N];
    if rows.len() < 2 {
        return uniform;
    }

    let (eigenvalues, vectors) = symmetric_eigen(correlation_matrix(rows));
    let leading = (0..N).fold(0, |best, i| {
        if eigenvalues[i] > eigenvalues[best] {
            i
        } else {
            best
        }
    });

    let mut component = [0.0; N];
    for (i, value) in component.iter_mut().enumerate() {
        *value = vectors[i][leading];
    }
    if component.iter().sum::<f64>() < 0.0 {
        component = component.map(|value| -value);
    }

    let weights = component.map(f64::abs);
    let total: f64 = weights.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return uniform;
    }
    weights.map(|weight| weight / total)
}

pub(crate) fn project(row: &Row, loadings: &Row) -> f64 {
    row.iter().zip(loadings).map(|(x, w)| x * w).sum()
}

/// Simple linear regression `y = a + b·x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct OlsFit {
    pub(crate) intercept: f64,
    pub(crate) slope: f64,
    pub(crate) sigma: f64,
    pub(crate) r2: f64,
    pub(crate) n: usize,
    pub(crate) x_mean: f64,
    pub(crate) sxx: f64,
}

impl OlsFit {
    pub(crate) fn predict(&self, x0: f64) -> f64 {
        self.intercept + self.slope * x0
    }

    /// Standard error of the mean prediction at `x0`.
    pub(crate) fn mean_prediction_se(&self, x0: f64) -> f64 {
        self.sigma * (1.0 / self.n as f64 + (x0 - self.x_mean).powi(2) / self.sxx).sqrt()
    }
}

pub(crate) fn ols(x: &[f64], y: &[f64]) -> Result<OlsFit, EstimationError> {
    let n = x.len();
    if n == 0 || n != y.len() {
        return Err(EstimationError::TooFewRows { rows: n });
    }
    let nf = n as f64;
    let x_mean = x.iter().sum::<f64>() / nf;
    let y_mean = y.iter().sum::<f64>() / nf;
    let sxx: f64 = x.iter().map(|xi| (xi - x_mean).powi(2)).sum();
    if !sxx.is_finite() || sxx <= 1e-12 {
        return Err(EstimationError::IllConditioned { sxx });
    }

    let sxy: f64 = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| (xi - x_mean) * (yi - y_mean))
        .sum();
    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let ss_res: f64 = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| (yi - (intercept + slope * xi)).powi(2))
        .sum();
    let ss_tot: f64 = y.iter().map(|yi| (yi - y_mean).powi(2)).sum();
    let dof = n.saturating_sub(2).max(1) as f64;
    let sigma = (ss_res / dof).sqrt();
    let r2 = if ss_tot > 1e-12 { 1.0 - ss_res / ss_tot } else { 0.0 };

    if !(slope.is_finite() && intercept.is_finite() && sigma.is_finite()) {
        return Err(EstimationError::NonFinite);
    }

    Ok(OlsFit {
        intercept,
        slope,
        sigma,
        r2,
        n,
        x_mean,
        sxx,
    })
}
