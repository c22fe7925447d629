//! Active-passive return decomposition (Lo, 2007).
//!
//! Splits the expected return of a dynamically weighted strategy into an
//! active component driven by the covariance between weights and returns
//! (market timing) and a passive component equal to the product of the mean
//! weight and the mean return (market exposure):
//!
//! ```text
//! E[R_p] = Cov(w_t, r_t) + E[w_t] * E[r_t]
//!        = active        + passive
//! ```
//!
//! The active ratio `active / (active + passive)` measures the share of
//! return attributable to timing. Under the population divisor the sum of
//! the two components equals the sample mean of the elementwise products
//! `w_i * r_i` exactly, which makes every decomposition independently
//! verifiable against its input.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::types::{AlignedSeries, CovarianceDivisor, ReturnWeightSample};

/// Configuration for the decomposition engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecompositionConfig {
    /// Divisor used for the covariance, variance, and correlation estimates.
    pub divisor: CovarianceDivisor,
    /// Tolerance below which a ratio denominator counts as zero.
    pub epsilon: f64,
}

impl Default for DecompositionConfig {
    fn default() -> Self {
        Self {
            divisor: CovarianceDivisor::Population,
            epsilon: 1e-12,
        }
    }
}

/// Result of decomposing one weight/return series.
///
/// Immutable value object; `weight_return_correlation` is `None` when either
/// series has zero variance, in which case the Pearson coefficient is
/// undefined (a constant-weight series still decomposes, with a zero active
/// component).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecompositionResult {
    /// Covariance between weights and returns (timing contribution).
    pub active_component: f64,
    /// Mean weight times mean return (exposure contribution).
    pub passive_component: f64,
    /// Active share of the total decomposed return.
    pub active_ratio: f64,
    /// Pearson correlation between weights and returns, if defined.
    pub weight_return_correlation: Option<f64>,
    /// Number of observations the decomposition used.
    pub sample_size: usize,
    /// Mean of the weight series.
    pub weight_mean: f64,
    /// Standard deviation of the weight series.
    pub weight_std: f64,
    /// Mean of the return series.
    pub return_mean: f64,
    /// Standard deviation of the return series.
    pub return_std: f64,
}

impl DecompositionResult {
    /// Total decomposed return: active plus passive.
    pub fn total(&self) -> f64 {
        self.active_component + self.passive_component
    }
}

/// Second-order sample moments of a paired series.
#[derive(Debug, Clone, Copy)]
struct Moments {
    n: usize,
    weight_mean: f64,
    return_mean: f64,
    covariance: f64,
    weight_var: f64,
    return_var: f64,
}

fn moments(samples: &[ReturnWeightSample], divisor: CovarianceDivisor) -> Result<Moments> {
    let n = samples.len();
    if n < 2 {
        return Err(AnalysisError::InsufficientData {
            required: 2,
            actual: n,
        });
    }
    for (i, sample) in samples.iter().enumerate() {
        sample.validate(i)?;
    }

    let count = n as f64;
    let weight_mean = samples.iter().map(|s| s.weight).sum::<f64>() / count;
    let return_mean = samples.iter().map(|s| s.ret).sum::<f64>() / count;

    let denom = divisor.denominator(n);
    let mut covariance = 0.0;
    let mut weight_var = 0.0;
    let mut return_var = 0.0;
    for sample in samples {
        let dw = sample.weight - weight_mean;
        let dr = sample.ret - return_mean;
        covariance += dw * dr;
        weight_var += dw * dw;
        return_var += dr * dr;
    }
    covariance /= denom;
    weight_var /= denom;
    return_var /= denom;

    Ok(Moments {
        n,
        weight_mean,
        return_mean,
        covariance,
        weight_var,
        return_var,
    })
}

/// Decompose a weight/return series into active and passive components.
///
/// Requires at least two observations; fails with
/// [`AnalysisError::DegenerateDecomposition`] when the total decomposed
/// return is within `config.epsilon` of zero, since the active ratio is
/// undefined there. Pure function: no mutation, no I/O.
pub fn decompose(
    series: &AlignedSeries,
    config: &DecompositionConfig,
) -> Result<DecompositionResult> {
    let m = moments(series.samples(), config.divisor)?;

    let active = m.covariance;
    let passive = m.weight_mean * m.return_mean;
    let total = active + passive;

    if total.abs() <= config.epsilon {
        return Err(AnalysisError::DegenerateDecomposition(format!(
            "total decomposed return {:e} is within {:e} of zero; active ratio is undefined",
            total, config.epsilon
        )));
    }

    let correlation = if m.weight_var > 0.0 && m.return_var > 0.0 {
        Some(m.covariance / (m.weight_var.sqrt() * m.return_var.sqrt()))
    } else {
        None
    };

    Ok(DecompositionResult {
        active_component: active,
        passive_component: passive,
        active_ratio: active / total,
        weight_return_correlation: correlation,
        sample_size: m.n,
        weight_mean: m.weight_mean,
        weight_std: m.weight_var.sqrt(),
        return_mean: m.return_mean,
        return_std: m.return_var.sqrt(),
    })
}

/// Pearson correlation coefficient between two series.
///
/// Fails with [`AnalysisError::DegenerateDecomposition`] when either series
/// has zero variance, rather than returning NaN.
pub fn pearson_correlation(xs: &[f64], ys: &[f64]) -> Result<f64> {
    if xs.len() != ys.len() {
        return Err(AnalysisError::Alignment {
            weights: xs.len(),
            returns: ys.len(),
        });
    }
    let n = xs.len();
    if n < 2 {
        return Err(AnalysisError::InsufficientData {
            required: 2,
            actual: n,
        });
    }

    let count = n as f64;
    let x_mean = xs.iter().sum::<f64>() / count;
    let y_mean = ys.iter().sum::<f64>() / count;

    let mut cov = 0.0;
    let mut x_var = 0.0;
    let mut y_var = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - x_mean;
        let dy = y - y_mean;
        cov += dx * dy;
        x_var += dx * dx;
        y_var += dy * dy;
    }

    if x_var == 0.0 || y_var == 0.0 {
        return Err(AnalysisError::DegenerateDecomposition(
            "correlation is undefined for a zero-variance series".to_string(),
        ));
    }

    Ok(cov / (x_var.sqrt() * y_var.sqrt()))
}

/// One window of a rolling decomposition.
///
/// Ratio and correlation are `None` for windows where they are undefined
/// (degenerate total or zero variance); the sweep itself never fabricates
/// NaN values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingPoint {
    /// Period of the last observation in the window.
    pub period: DateTime<Utc>,
    /// Active component over the window.
    pub active_component: f64,
    /// Passive component over the window.
    pub passive_component: f64,
    /// Active ratio over the window, if defined.
    pub active_ratio: Option<f64>,
    /// Weight/return correlation over the window, if defined.
    pub weight_return_correlation: Option<f64>,
}

/// Recompute the decomposition over a sliding window.
///
/// Produces one point per window, stamped with the period of the window's
/// last observation. Windows are evaluated in parallel.
pub fn rolling_decompose(
    series: &AlignedSeries,
    window: usize,
    config: &DecompositionConfig,
) -> Result<Vec<RollingPoint>> {
    if window < 2 {
        return Err(AnalysisError::InsufficientData {
            required: 2,
            actual: window,
        });
    }
    if series.len() < window {
        return Err(AnalysisError::InsufficientData {
            required: window,
            actual: series.len(),
        });
    }

    let samples = series.samples();
    samples
        .par_windows(window)
        .map(|chunk| {
            let m = moments(chunk, config.divisor)?;
            let active = m.covariance;
            let passive = m.weight_mean * m.return_mean;
            let total = active + passive;

            let active_ratio = if total.abs() > config.epsilon {
                Some(active / total)
            } else {
                None
            };
            let correlation = if m.weight_var > 0.0 && m.return_var > 0.0 {
                Some(m.covariance / (m.weight_var.sqrt() * m.return_var.sqrt()))
            } else {
                None
            };

            Ok(RollingPoint {
                period: chunk[window - 1].period,
                active_component: active,
                passive_component: passive,
                active_ratio,
                weight_return_correlation: correlation,
            })
        })
        .collect()
}
