//! Performance statistics for NAV and per-period return series.
//!
//! All functions here are pure: they consume an in-memory sequence and a
//! [`MetricsConfig`] and produce a value, with no hidden state. Ratio
//! metrics whose denominator can legitimately be zero (Sharpe, Sortino,
//! Calmar) exist in two forms: free functions that fail with
//! [`AnalysisError::DegenerateDecomposition`], and `Option` fields on
//! [`PerformanceStats`] where `None` marks the metric as unavailable for
//! the reporting layer. Nothing ever falls back to NaN silently.

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Configuration shared by the performance metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Annualized risk-free rate (0.02 = 2%).
    pub risk_free_rate: f64,
    /// Periods per year used for annualization (252 trading days, 12 months).
    pub periods_per_year: usize,
    /// Tolerance below which a ratio denominator counts as zero.
    pub epsilon: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.02,
            periods_per_year: 252,
            epsilon: 1e-12,
        }
    }
}

/// Standard risk/return statistics for one strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    /// Compounded return over the whole sample.
    pub total_return: f64,
    /// Geometric annualized return.
    pub annualized_return: f64,
    /// Sample standard deviation of per-period returns, annualized.
    pub annualized_volatility: f64,
    /// Excess return per unit of volatility, if volatility is nonzero.
    pub sharpe_ratio: Option<f64>,
    /// Excess return per unit of downside deviation, if defined.
    pub sortino_ratio: Option<f64>,
    /// Annualized return over absolute max drawdown, if drawdown is nonzero.
    pub calmar_ratio: Option<f64>,
    /// Worst peak-to-trough decline, as a negative fraction.
    pub max_drawdown: f64,
    /// Fraction of periods with strictly positive return.
    pub win_rate: f64,
    /// Empirical 5th-percentile per-period return (lower tail).
    pub var_95: f64,
    /// Longest run of strictly negative returns.
    pub max_consecutive_losses: usize,
}

fn validate_returns(returns: &[f64], required: usize) -> Result<()> {
    if returns.len() < required {
        return Err(AnalysisError::InsufficientData {
            required,
            actual: returns.len(),
        });
    }
    for (i, r) in returns.iter().enumerate() {
        if !r.is_finite() {
            return Err(AnalysisError::InvalidSample {
                index: i,
                field: "return",
                value: *r,
            });
        }
    }
    Ok(())
}

/// Compounded return of a per-period return series.
pub fn total_return(returns: &[f64]) -> f64 {
    returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
}

/// Geometric annualized return over `returns.len()` periods.
pub fn annualized_return(returns: &[f64], config: &MetricsConfig) -> Result<f64> {
    validate_returns(returns, 2)?;
    let total = total_return(returns);
    if 1.0 + total <= 0.0 {
        // Capital fully wiped out; geometric annualization bottoms out here.
        return Ok(-1.0);
    }
    let years = returns.len() as f64 / config.periods_per_year as f64;
    Ok((1.0 + total).powf(1.0 / years) - 1.0)
}

/// Sample standard deviation of per-period returns, scaled to annual terms.
pub fn annualized_volatility(returns: &[f64], config: &MetricsConfig) -> Result<f64> {
    validate_returns(returns, 2)?;
    Ok(sample_std(returns) * (config.periods_per_year as f64).sqrt())
}

/// Sharpe ratio from a per-period return series.
///
/// Fails with [`AnalysisError::DegenerateDecomposition`] when the annualized
/// volatility is within epsilon of zero.
pub fn sharpe_ratio(returns: &[f64], config: &MetricsConfig) -> Result<f64> {
    let annual_return = annualized_return(returns, config)?;
    let volatility = annualized_volatility(returns, config)?;
    if volatility.abs() <= config.epsilon {
        return Err(AnalysisError::DegenerateDecomposition(
            "Sharpe ratio is undefined for zero volatility".to_string(),
        ));
    }
    Ok((annual_return - config.risk_free_rate) / volatility)
}

/// Sortino ratio from a per-period return series.
///
/// The denominator is the annualized sample standard deviation of the
/// strictly negative returns; fewer than two losing periods make it
/// degenerate.
pub fn sortino_ratio(returns: &[f64], config: &MetricsConfig) -> Result<f64> {
    let annual_return = annualized_return(returns, config)?;

    let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    if downside.len() < 2 {
        return Err(AnalysisError::DegenerateDecomposition(format!(
            "Sortino ratio needs at least 2 losing periods, got {}",
            downside.len()
        )));
    }
    let downside_deviation = sample_std(&downside) * (config.periods_per_year as f64).sqrt();
    if downside_deviation.abs() <= config.epsilon {
        return Err(AnalysisError::DegenerateDecomposition(
            "Sortino ratio is undefined for zero downside deviation".to_string(),
        ));
    }
    Ok((annual_return - config.risk_free_rate) / downside_deviation)
}

/// Calmar ratio from a per-period return series.
///
/// Fails when the max drawdown is within epsilon of zero.
pub fn calmar_ratio(returns: &[f64], config: &MetricsConfig) -> Result<f64> {
    let annual_return = annualized_return(returns, config)?;
    let drawdown = max_drawdown(&nav_path(returns))?;
    if drawdown.abs() <= config.epsilon {
        return Err(AnalysisError::DegenerateDecomposition(
            "Calmar ratio is undefined for zero drawdown".to_string(),
        ));
    }
    Ok(annual_return / drawdown.abs())
}

/// Worst peak-to-trough decline of a NAV path, as a negative fraction.
pub fn max_drawdown(navs: &[f64]) -> Result<f64> {
    if navs.len() < 2 {
        return Err(AnalysisError::InsufficientData {
            required: 2,
            actual: navs.len(),
        });
    }

    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    for (i, nav) in navs.iter().enumerate() {
        if !nav.is_finite() || *nav <= 0.0 {
            return Err(AnalysisError::DataError(format!(
                "NAV at index {} is not a positive finite value: {}",
                i, nav
            )));
        }
        peak = peak.max(*nav);
        worst = worst.min(nav / peak - 1.0);
    }
    Ok(worst)
}

/// Empirical lower-tail quantile of a per-period return series.
///
/// `confidence` is the VaR confidence level; 0.95 reads the 5th percentile.
/// Linear interpolation between order statistics.
pub fn value_at_risk(returns: &[f64], confidence: f64) -> Result<f64> {
    validate_returns(returns, 1)?;
    if !(0.0..1.0).contains(&confidence) {
        return Err(AnalysisError::ConfigError(format!(
            "VaR confidence must be in [0, 1), got {}",
            confidence
        )));
    }

    let mut sorted = returns.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("finite returns compare"));

    let q = 1.0 - confidence;
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        Ok(sorted[lo])
    } else {
        Ok(sorted[lo] + (pos - lo as f64) * (sorted[hi] - sorted[lo]))
    }
}

/// Fraction of periods with strictly positive return.
pub fn win_rate(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    returns.iter().filter(|r| **r > 0.0).count() as f64 / returns.len() as f64
}

/// Longest run of strictly negative returns.
pub fn max_consecutive_losses(returns: &[f64]) -> usize {
    let mut current = 0;
    let mut longest = 0;
    for r in returns {
        if *r < 0.0 {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// Compute the full statistics record from a per-period return series.
///
/// Needs at least two return periods. Degenerate ratio denominators surface
/// as `None` fields; every other error propagates.
pub fn compute_stats(returns: &[f64], config: &MetricsConfig) -> Result<PerformanceStats> {
    validate_returns(returns, 2)?;

    let sharpe = optional_ratio(sharpe_ratio(returns, config))?;
    let sortino = optional_ratio(sortino_ratio(returns, config))?;
    let calmar = optional_ratio(calmar_ratio(returns, config))?;

    Ok(PerformanceStats {
        total_return: total_return(returns),
        annualized_return: annualized_return(returns, config)?,
        annualized_volatility: annualized_volatility(returns, config)?,
        sharpe_ratio: sharpe,
        sortino_ratio: sortino,
        calmar_ratio: calmar,
        max_drawdown: max_drawdown(&nav_path(returns))?,
        win_rate: win_rate(returns),
        var_95: value_at_risk(returns, 0.95)?,
        max_consecutive_losses: max_consecutive_losses(returns),
    })
}

/// Compute the statistics record from a NAV path.
///
/// Needs at least three NAV points (two return periods).
pub fn stats_from_navs(navs: &[f64], config: &MetricsConfig) -> Result<PerformanceStats> {
    if navs.len() < 3 {
        return Err(AnalysisError::InsufficientData {
            required: 3,
            actual: navs.len(),
        });
    }
    for (i, nav) in navs.iter().enumerate() {
        if !nav.is_finite() || *nav <= 0.0 {
            return Err(AnalysisError::DataError(format!(
                "NAV at index {} is not a positive finite value: {}",
                i, nav
            )));
        }
    }

    let returns: Vec<f64> = navs.windows(2).map(|w| w[1] / w[0] - 1.0).collect();
    compute_stats(&returns, config)
}

/// Relative performance of an active NAV path against a passive one.
///
/// Both paths are truncated to their common tail before the excess-return
/// series is formed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveAnalysis {
    /// Mean excess return, annualized arithmetically.
    pub annualized_excess_return: f64,
    /// Annualized standard deviation of the excess returns.
    pub tracking_error: f64,
    /// Annualized excess return per unit of tracking error, if defined.
    pub information_ratio: Option<f64>,
    /// Fraction of periods where the active arm beat the passive arm.
    pub positive_period_ratio: f64,
    /// Max drawdown of the compounded excess-return path.
    pub max_relative_drawdown: f64,
    /// Skewness of the excess-return distribution.
    pub excess_skewness: f64,
    /// Excess kurtosis of the excess-return distribution.
    pub excess_kurtosis: f64,
}

/// Compare two NAV paths period by period.
pub fn compare_navs(
    active_navs: &[f64],
    passive_navs: &[f64],
    config: &MetricsConfig,
) -> Result<ActiveAnalysis> {
    let excess = excess_returns(active_navs, passive_navs)?;
    validate_returns(&excess, 2)?;

    let periods = config.periods_per_year as f64;
    let mean = excess.iter().sum::<f64>() / excess.len() as f64;
    let std = sample_std(&excess);
    let tracking_error = std * periods.sqrt();

    let information_ratio = if tracking_error.abs() > config.epsilon {
        Some(mean * periods / tracking_error)
    } else {
        None
    };

    Ok(ActiveAnalysis {
        annualized_excess_return: mean * periods,
        tracking_error,
        information_ratio,
        positive_period_ratio: win_rate(&excess),
        max_relative_drawdown: max_drawdown(&nav_path(&excess))?,
        excess_skewness: skewness(&excess),
        excess_kurtosis: excess_kurtosis(&excess),
    })
}

/// Per-period excess returns of the active path over the passive path,
/// formed on the common tail of the two series.
pub fn excess_returns(active_navs: &[f64], passive_navs: &[f64]) -> Result<Vec<f64>> {
    if active_navs.len() < 2 || passive_navs.len() < 2 {
        return Err(AnalysisError::InsufficientData {
            required: 2,
            actual: active_navs.len().min(passive_navs.len()),
        });
    }

    let active: Vec<f64> = active_navs.windows(2).map(|w| w[1] / w[0] - 1.0).collect();
    let passive: Vec<f64> = passive_navs.windows(2).map(|w| w[1] / w[0] - 1.0).collect();
    let len = active.len().min(passive.len());

    Ok(active[active.len() - len..]
        .iter()
        .zip(&passive[passive.len() - len..])
        .map(|(a, p)| a - p)
        .collect())
}

/// Compounded path of a return series, starting from 1.0.
fn nav_path(returns: &[f64]) -> Vec<f64> {
    let mut path = Vec::with_capacity(returns.len() + 1);
    let mut value = 1.0;
    path.push(value);
    for r in returns {
        value *= 1.0 + r;
        path.push(value);
    }
    path
}

fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    variance.sqrt()
}

fn skewness(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let m2 = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let m3 = values.iter().map(|v| (v - mean).powi(3)).sum::<f64>() / n;
    if m2 == 0.0 {
        return 0.0;
    }
    m3 / m2.powf(1.5)
}

fn excess_kurtosis(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let m2 = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let m4 = values.iter().map(|v| (v - mean).powi(4)).sum::<f64>() / n;
    if m2 == 0.0 {
        return 0.0;
    }
    m4 / (m2 * m2) - 3.0
}

fn optional_ratio(result: Result<f64>) -> Result<Option<f64>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(AnalysisError::DegenerateDecomposition(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: MetricsConfig = MetricsConfig {
        risk_free_rate: 0.02,
        periods_per_year: 252,
        epsilon: 1e-12,
    };

    #[test]
    fn test_total_return_compounds() {
        let total = total_return(&[0.10, -0.05]);
        assert!((total - (1.10 * 0.95 - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_max_drawdown_scenario() {
        // Peak at 110, trough at 90.
        let navs = [100.0, 110.0, 90.0, 95.0, 120.0];
        let dd = max_drawdown(&navs).unwrap();
        assert!((dd - (90.0 / 110.0 - 1.0)).abs() < 1e-9);
    }

    #[test]
    fn test_max_drawdown_monotonic_path_is_zero() {
        let navs = [100.0, 101.0, 103.0, 110.0];
        assert_eq!(max_drawdown(&navs).unwrap(), 0.0);
    }

    #[test]
    fn test_var_quantile_interpolation() {
        // Sorted: [-0.04, -0.02, 0.0, 0.01, 0.03]; 5th percentile sits
        // between the two lowest order statistics.
        let returns = [0.01, -0.02, 0.03, -0.04, 0.0];
        let var = value_at_risk(&returns, 0.95).unwrap();
        let expected = -0.04 + 0.2 * (-0.02 - -0.04);
        assert!((var - expected).abs() < 1e-12);
    }

    #[test]
    fn test_win_rate_counts_strict_positives() {
        let rate = win_rate(&[0.01, 0.0, -0.02, 0.03]);
        assert!((rate - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_max_consecutive_losses() {
        let returns = [-0.01, -0.02, 0.01, -0.01, -0.02, -0.03, 0.02];
        assert_eq!(max_consecutive_losses(&returns), 3);
        assert_eq!(max_consecutive_losses(&[0.01, 0.02]), 0);
    }

    #[test]
    fn test_zero_volatility_sharpe_is_degenerate() {
        let err = sharpe_ratio(&[0.01, 0.01, 0.01], &CONFIG).unwrap_err();
        assert!(matches!(err, AnalysisError::DegenerateDecomposition(_)));

        // But compute_stats still succeeds, flagging the ratio unavailable.
        let stats = compute_stats(&[0.01, 0.01, 0.01], &CONFIG).unwrap();
        assert!(stats.sharpe_ratio.is_none());
        assert!(stats.calmar_ratio.is_none());
        assert!(stats.annualized_volatility.abs() < 1e-12);
    }

    #[test]
    fn test_insufficient_data_boundaries() {
        // One return period is not enough for volatility-based metrics.
        let err = compute_stats(&[0.01], &CONFIG).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { .. }));

        // Two NAV points give one return, still insufficient.
        let err = stats_from_navs(&[100.0, 101.0], &CONFIG).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InsufficientData {
                required: 3,
                actual: 2
            }
        ));

        // Three NAV points are the minimum.
        assert!(stats_from_navs(&[100.0, 101.0, 99.0], &CONFIG).is_ok());
    }

    #[test]
    fn test_non_finite_return_names_index() {
        let err = compute_stats(&[0.01, f64::NAN, 0.02], &CONFIG).unwrap_err();
        match err {
            AnalysisError::InvalidSample { index, field, .. } => {
                assert_eq!(index, 1);
                assert_eq!(field, "return");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_stats_from_navs_matches_returns_path() {
        let navs = [100.0, 102.0, 99.0, 104.0, 103.0];
        let returns: Vec<f64> = navs.windows(2).map(|w| w[1] / w[0] - 1.0).collect();

        let from_navs = stats_from_navs(&navs, &CONFIG).unwrap();
        let from_returns = compute_stats(&returns, &CONFIG).unwrap();

        assert!((from_navs.total_return - from_returns.total_return).abs() < 1e-12);
        assert!((from_navs.max_drawdown - from_returns.max_drawdown).abs() < 1e-12);
        assert!((from_navs.total_return - (103.0 / 100.0 - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_compare_navs_identical_paths() {
        let navs = [100.0, 101.0, 99.0, 102.0];
        let analysis = compare_navs(&navs, &navs, &CONFIG).unwrap();

        assert_eq!(analysis.annualized_excess_return, 0.0);
        assert_eq!(analysis.tracking_error, 0.0);
        assert!(analysis.information_ratio.is_none());
        assert_eq!(analysis.positive_period_ratio, 0.0);
    }

    #[test]
    fn test_compare_navs_outperformance() {
        let active = [100.0, 103.0, 104.0, 108.0];
        let passive = [100.0, 101.0, 102.0, 103.0];
        let analysis = compare_navs(&active, &passive, &CONFIG).unwrap();

        assert!(analysis.annualized_excess_return > 0.0);
        assert!(analysis.tracking_error > 0.0);
        assert!(analysis.information_ratio.unwrap() > 0.0);
        assert!(analysis.positive_period_ratio > 0.5);
    }

    #[test]
    fn test_excess_returns_align_on_common_tail() {
        let active = [100.0, 101.0, 102.0, 103.0, 104.0];
        let passive = [100.0, 101.0, 102.0];
        let excess = excess_returns(&active, &passive).unwrap();
        assert_eq!(excess.len(), 2);
    }
}
