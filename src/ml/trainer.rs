use linfa::prelude::*;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

use crate::ml::dataset::{ColumnMedians, PreparedDataset};
use crate::ml::encoder::FEATURE_COUNT;

/// Split and fitting parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Share of rows held out for evaluation
    pub test_fraction: f64,

    /// Shuffle seed; equal data and seed give equal splits
    pub split_seed: u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            split_seed: 0,
        }
    }
}

/// How the least-squares problem was solved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitMethod {
    /// Full-rank, overdetermined system fit by linfa
    Linfa,
    /// Minimum-norm solve of the centered normal equations
    NormalEquations,
}

impl fmt::Display for FitMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitMethod::Linfa => f.write_str("linfa least squares"),
            FitMethod::NormalEquations => f.write_str("minimum-norm normal equations"),
        }
    }
}

/// Fitted linear model, valid only for the encoder's feature order
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedModel {
    pub coefficients: [f64; FEATURE_COUNT],
    pub intercept: f64,
    /// Medians of the dataset the model was fit on, used to fill gaps at inference
    pub medians: ColumnMedians,
    pub method: FitMethod,
}

/// Held-out evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub mse: f64,
    /// `None` when fewer than two rows were held out
    pub r_squared: Option<f64>,
    pub train_size: usize,
    pub test_size: usize,
}

/// Split, fit ordinary least squares and evaluate on the held-out rows.
pub fn train_and_evaluate(
    dataset: &PreparedDataset,
    config: &TrainerConfig,
) -> (TrainedModel, Metrics) {
    let (train_idx, test_idx) = split_indices(dataset.len(), config);

    let x_train = dataset.features.select(Axis(0), &train_idx);
    let y_train = dataset.targets.select(Axis(0), &train_idx);
    let x_test = dataset.features.select(Axis(0), &test_idx);
    let y_test = dataset.targets.select(Axis(0), &test_idx);

    let (coefficients, intercept, method) = fit_least_squares(x_train.view(), y_train.view());
    let model = TrainedModel {
        coefficients,
        intercept,
        medians: dataset.medians,
        method,
    };

    let y_pred: Array1<f64> = x_test
        .rows()
        .into_iter()
        .map(|row| linear_combination(&model, row))
        .collect();

    let metrics = Metrics {
        mse: mean_squared_error(y_test.view(), y_pred.view()),
        r_squared: r_squared(y_test.view(), y_pred.view()),
        train_size: train_idx.len(),
        test_size: test_idx.len(),
    };

    info!(
        train_size = metrics.train_size,
        test_size = metrics.test_size,
        mse = metrics.mse,
        r_squared = ?metrics.r_squared,
        method = %model.method,
        "Model trained"
    );

    (model, metrics)
}

/// Seeded shuffle split. The test side holds `ceil(test_fraction * n)` rows,
/// clamped so both sides keep at least one row.
pub fn split_indices(n_samples: usize, config: &TrainerConfig) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = StdRng::seed_from_u64(config.split_seed);
    indices.shuffle(&mut rng);

    let n_test = ((config.test_fraction * n_samples as f64).ceil() as usize)
        .clamp(1, n_samples.saturating_sub(1).max(1));
    let n_train = n_samples.saturating_sub(n_test);

    let test = indices.split_off(n_train);
    (indices, test)
}

pub(crate) fn linear_combination(model: &TrainedModel, row: ArrayView1<f64>) -> f64 {
    model.intercept
        + model
            .coefficients
            .iter()
            .zip(row.iter())
            .map(|(coef, value)| coef * value)
            .sum::<f64>()
}

fn fit_least_squares(x: ArrayView2<f64>, y: ArrayView1<f64>) -> ([f64; FEATURE_COUNT], f64, FitMethod) {
    let (fallback, rank) = centered_normal_equations(x, y);

    if rank == FEATURE_COUNT && x.nrows() > FEATURE_COUNT {
        let dataset = Dataset::new(x.to_owned(), y.to_owned());
        match LinearRegression::new().fit(&dataset) {
            Ok(fitted) => {
                let params = fitted.params();
                let intercept = fitted.intercept();
                if params.len() == FEATURE_COUNT
                    && intercept.is_finite()
                    && params.iter().all(|p| p.is_finite())
                {
                    let mut coefficients = [0.0; FEATURE_COUNT];
                    for (slot, value) in coefficients.iter_mut().zip(params.iter()) {
                        *slot = *value;
                    }
                    return (coefficients, intercept, FitMethod::Linfa);
                }
                debug!("linfa returned non-finite parameters; using normal equations");
            }
            Err(err) => debug!(error = %err, "linfa fit failed; using normal equations"),
        }
    } else {
        debug!(rows = x.nrows(), rank, "Design is rank deficient or underdetermined");
    }

    (fallback.0, fallback.1, FitMethod::NormalEquations)
}

/// Solve `(XcᵀXc) β = Xcᵀyc` on centered data with Gauss-Jordan elimination,
/// then drop the null-space component so the result is the minimum-norm
/// least-squares solution. Returns the coefficients, intercept and numerical
/// rank.
fn centered_normal_equations(
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
) -> (([f64; FEATURE_COUNT], f64), usize) {
    let n = x.nrows().max(1) as f64;
    let x_mean: Array1<f64> = x.sum_axis(Axis(0)) / n;
    let y_mean = y.sum() / n;

    let xc: Array2<f64> = &x - &x_mean;
    let yc: Array1<f64> = &y - y_mean;

    let mut a = xc.t().dot(&xc);
    let mut b = xc.t().dot(&yc);

    let pivots = gauss_jordan(&mut a, &mut b);

    let mut coefficients = Array1::<f64>::zeros(FEATURE_COUNT);
    for (r, c) in &pivots {
        coefficients[*c] = b[*r];
    }
    for direction in null_space_basis(&a, &pivots) {
        let along = coefficients.dot(&direction);
        coefficients.scaled_add(-along, &direction);
    }

    let intercept = y_mean
        - coefficients
            .iter()
            .zip(x_mean.iter())
            .map(|(coef, mean)| coef * mean)
            .sum::<f64>();

    let mut fixed = [0.0; FEATURE_COUNT];
    for (slot, value) in fixed.iter_mut().zip(coefficients.iter()) {
        *slot = *value;
    }
    ((fixed, intercept), pivots.len())
}

/// Reduce `a` in place to reduced row echelon form with partial pivoting, applying
/// the same row operations to `b`. Returns `(row, column)` of each pivot.
fn gauss_jordan(a: &mut Array2<f64>, b: &mut Array1<f64>) -> Vec<(usize, usize)> {
    let scale = a.diag().iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    let tolerance = (scale * 1e-10).max(f64::MIN_POSITIVE);

    let mut pivots: Vec<(usize, usize)> = Vec::with_capacity(FEATURE_COUNT);
    let mut row = 0;
    for col in 0..FEATURE_COUNT {
        if row == FEATURE_COUNT {
            break;
        }
        let (best, magnitude) = (row..FEATURE_COUNT)
            .map(|r| (r, a[(r, col)].abs()))
            .fold((row, -1.0), |acc, cand| if cand.1 > acc.1 { cand } else { acc });
        if magnitude <= tolerance {
            continue;
        }

        if best != row {
            for c in 0..FEATURE_COUNT {
                a.swap((best, c), (row, c));
            }
            b.swap(best, row);
        }

        let pivot = a[(row, col)];
        for c in 0..FEATURE_COUNT {
            a[(row, c)] /= pivot;
        }
        b[row] /= pivot;

        for r in 0..FEATURE_COUNT {
            if r == row {
                continue;
            }
            let factor = a[(r, col)];
            if factor == 0.0 {
                continue;
            }
            for c in 0..FEATURE_COUNT {
                a[(r, c)] -= factor * a[(row, c)];
            }
            b[r] -= factor * b[row];
        }

        pivots.push((row, col));
        row += 1;
    }
    pivots
}

/// Orthonormal basis of the null space of a reduced row echelon matrix.
/// Each free column `f` contributes `e_f - sum(R[r, f] * e_pivot(r))`.
fn null_space_basis(reduced: &Array2<f64>, pivots: &[(usize, usize)]) -> Vec<Array1<f64>> {
    let mut basis: Vec<Array1<f64>> = Vec::new();
    for free in 0..FEATURE_COUNT {
        if pivots.iter().any(|(_, c)| *c == free) {
            continue;
        }
        let mut v = Array1::<f64>::zeros(FEATURE_COUNT);
        v[free] = 1.0;
        for (r, c) in pivots {
            v[*c] = -reduced[(*r, free)];
        }

        for q in &basis {
            let along = v.dot(q);
            v.scaled_add(-along, q);
        }
        let norm = v.dot(&v).sqrt();
        if norm > 1e-12 {
            basis.push(v / norm);
        }
    }
    basis
}

pub fn mean_squared_error(y_true: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let sum: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    sum / y_true.len() as f64
}

/// Coefficient of determination; undefined below two samples.
pub fn r_squared(y_true: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> Option<f64> {
    if y_true.len() < 2 {
        return None;
    }
    let mean = y_true.sum() / y_true.len() as f64;
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return Some(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Some(1.0 - ss_res / ss_tot)
}
