//! Core data types for the decomposition engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::error::{AnalysisError, Result};

/// A single observation pairing a strategy weight with the asset return
/// realized over the same period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnWeightSample {
    /// Period the observation belongs to.
    pub period: DateTime<Utc>,
    /// Capital-allocation multiplier for the period, nominally near 1.0.
    pub weight: f64,
    /// Realized asset return for the period (0.01 = 1%).
    #[serde(rename = "return")]
    pub ret: f64,
}

impl ReturnWeightSample {
    /// Create a new sample.
    pub fn new(period: DateTime<Utc>, weight: f64, ret: f64) -> Self {
        Self {
            period,
            weight,
            ret,
        }
    }

    /// Check that both numeric fields are finite.
    pub fn is_finite(&self) -> bool {
        self.weight.is_finite() && self.ret.is_finite()
    }

    /// Validate finiteness, reporting the offending field and series index.
    pub(crate) fn validate(&self, index: usize) -> Result<()> {
        if !self.weight.is_finite() {
            return Err(AnalysisError::InvalidSample {
                index,
                field: "weight",
                value: self.weight,
            });
        }
        if !self.ret.is_finite() {
            return Err(AnalysisError::InvalidSample {
                index,
                field: "return",
                value: self.ret,
            });
        }
        Ok(())
    }
}

/// Policy for samples carrying a non-finite weight or return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NonFinitePolicy {
    /// Fail with an error naming the offending index.
    #[default]
    Fail,
    /// Drop the row from both series, keeping them aligned.
    Drop,
}

impl fmt::Display for NonFinitePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NonFinitePolicy::Fail => write!(f, "fail"),
            NonFinitePolicy::Drop => write!(f, "drop"),
        }
    }
}

/// Divisor convention shared by the covariance, variance, and correlation
/// estimates of a decomposition.
///
/// The additive identity `active + passive == mean(weight * return)` holds
/// exactly only under [`CovarianceDivisor::Population`]; with the
/// sample-corrected divisor the identity is off by the factor `n / (n - 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CovarianceDivisor {
    /// Divide by `n`.
    #[default]
    Population,
    /// Divide by `n - 1` (unbiased estimate).
    Sample,
}

impl CovarianceDivisor {
    /// Denominator for a series of `n` observations.
    pub fn denominator(&self, n: usize) -> f64 {
        match self {
            CovarianceDivisor::Population => n as f64,
            CovarianceDivisor::Sample => (n - 1) as f64,
        }
    }
}

impl fmt::Display for CovarianceDivisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CovarianceDivisor::Population => write!(f, "population"),
            CovarianceDivisor::Sample => write!(f, "sample"),
        }
    }
}

/// An ordered sequence of weight/return observations on a shared period axis.
///
/// Construction is the validation boundary: mismatched input lengths fail
/// with [`AnalysisError::Alignment`], and non-finite rows are either rejected
/// (naming the index) or dropped from both series, per [`NonFinitePolicy`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedSeries {
    samples: Vec<ReturnWeightSample>,
}

impl AlignedSeries {
    /// Build a series from samples, applying the non-finite policy.
    pub fn new(samples: Vec<ReturnWeightSample>, policy: NonFinitePolicy) -> Result<Self> {
        match policy {
            NonFinitePolicy::Fail => {
                for (i, sample) in samples.iter().enumerate() {
                    sample.validate(i)?;
                }
                Ok(Self { samples })
            }
            NonFinitePolicy::Drop => {
                let before = samples.len();
                let samples: Vec<ReturnWeightSample> =
                    samples.into_iter().filter(|s| s.is_finite()).collect();
                let dropped = before - samples.len();
                if dropped > 0 {
                    warn!("Dropped {} non-finite sample(s) of {}", dropped, before);
                }
                Ok(Self { samples })
            }
        }
    }

    /// Build a series from parallel period, weight, and return vectors.
    pub fn from_parts(
        periods: Vec<DateTime<Utc>>,
        weights: Vec<f64>,
        returns: Vec<f64>,
        policy: NonFinitePolicy,
    ) -> Result<Self> {
        if weights.len() != returns.len() {
            return Err(AnalysisError::Alignment {
                weights: weights.len(),
                returns: returns.len(),
            });
        }
        if periods.len() != weights.len() {
            return Err(AnalysisError::DataError(format!(
                "period axis has {} entries, series have {}",
                periods.len(),
                weights.len()
            )));
        }

        let samples = periods
            .into_iter()
            .zip(weights)
            .zip(returns)
            .map(|((period, weight), ret)| ReturnWeightSample::new(period, weight, ret))
            .collect();
        Self::new(samples, policy)
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the series holds no observations.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// All observations in period order.
    pub fn samples(&self) -> &[ReturnWeightSample] {
        &self.samples
    }

    /// Observation at `index`, if present.
    pub fn get(&self, index: usize) -> Option<&ReturnWeightSample> {
        self.samples.get(index)
    }

    /// The weight series as a vector.
    pub fn weights(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.weight).collect()
    }

    /// The return series as a vector.
    pub fn returns(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.ret).collect()
    }
}
