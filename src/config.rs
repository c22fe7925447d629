//! Configuration file support for analysis runs.
//!
//! Allows loading full study configurations from TOML files for
//! reproducibility.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::decompose::DecompositionConfig;
use crate::error::{AnalysisError, Result};
use crate::metrics::MetricsConfig;
use crate::strategies::{MomentumTilt, MomentumWeights};
use crate::types::{CovarianceDivisor, NonFinitePolicy};

/// Complete analysis configuration loaded from a file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisFileConfig {
    /// Data settings.
    #[serde(default)]
    pub data: DataSettings,
    /// Strategy settings.
    #[serde(default)]
    pub strategy: StrategySettings,
    /// Decomposition engine settings.
    #[serde(default)]
    pub decomposition: DecompositionSettings,
    /// Performance metrics settings.
    #[serde(default)]
    pub metrics: MetricsSettings,
    /// Rolling-window settings.
    #[serde(default)]
    pub rolling: RollingSettings,
}

/// Data settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSettings {
    /// Path to the close-price CSV file.
    pub path: Option<String>,
    /// Symbol name used in reports.
    #[serde(default = "default_symbol")]
    pub symbol: String,
    /// Date format in the CSV.
    pub date_format: Option<String>,
    /// CSV delimiter.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

fn default_symbol() -> String {
    "ASSET".to_string()
}
fn default_delimiter() -> char {
    ','
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            path: None,
            symbol: default_symbol(),
            date_format: None,
            delimiter: ',',
        }
    }
}

/// Strategy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategySettings {
    /// Momentum lookback in periods.
    #[serde(default = "default_lookback")]
    pub lookback: usize,
    /// Capital invested on the first trading day of each month.
    #[serde(default = "default_contribution")]
    pub contribution: f64,
    /// Momentum weight tiers.
    #[serde(default)]
    pub weights: WeightSettings,
}

fn default_lookback() -> usize {
    5
}
fn default_contribution() -> f64 {
    1.0
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            lookback: default_lookback(),
            contribution: default_contribution(),
            weights: WeightSettings::default(),
        }
    }
}

/// Momentum weight tiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightSettings {
    #[serde(default = "default_strong_up")]
    pub strong_up: f64,
    #[serde(default = "default_mild_up")]
    pub mild_up: f64,
    #[serde(default = "default_mild_down")]
    pub mild_down: f64,
    #[serde(default = "default_strong_down")]
    pub strong_down: f64,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_strong_up() -> f64 {
    1.3
}
fn default_mild_up() -> f64 {
    1.1
}
fn default_mild_down() -> f64 {
    0.9
}
fn default_strong_down() -> f64 {
    0.7
}
fn default_threshold() -> f64 {
    0.05
}

impl Default for WeightSettings {
    fn default() -> Self {
        Self {
            strong_up: default_strong_up(),
            mild_up: default_mild_up(),
            mild_down: default_mild_down(),
            strong_down: default_strong_down(),
            threshold: default_threshold(),
        }
    }
}

/// Decomposition engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecompositionSettings {
    /// Covariance divisor: "population" or "sample".
    #[serde(default = "default_divisor")]
    pub divisor: String,
    /// Tolerance for degenerate-denominator checks.
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
    /// Non-finite sample policy: "fail" or "drop".
    #[serde(default = "default_non_finite")]
    pub non_finite: String,
}

fn default_divisor() -> String {
    "population".to_string()
}
fn default_epsilon() -> f64 {
    1e-12
}
fn default_non_finite() -> String {
    "fail".to_string()
}

impl Default for DecompositionSettings {
    fn default() -> Self {
        Self {
            divisor: default_divisor(),
            epsilon: default_epsilon(),
            non_finite: default_non_finite(),
        }
    }
}

/// Performance metrics settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSettings {
    /// Annualized risk-free rate.
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,
    /// Periods per year for annualization.
    #[serde(default = "default_periods_per_year")]
    pub periods_per_year: usize,
}

fn default_risk_free_rate() -> f64 {
    0.02
}
fn default_periods_per_year() -> usize {
    252
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            risk_free_rate: default_risk_free_rate(),
            periods_per_year: default_periods_per_year(),
        }
    }
}

/// Rolling-window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollingSettings {
    /// Window length in periods.
    #[serde(default = "default_window")]
    pub window: usize,
}

fn default_window() -> usize {
    252
}

impl Default for RollingSettings {
    fn default() -> Self {
        Self {
            window: default_window(),
        }
    }
}

impl AnalysisFileConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let content = fs::read_to_string(path)?;
        let config: AnalysisFileConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| AnalysisError::ConfigError(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Convert to the typed decomposition config.
    pub fn to_decomposition_config(&self) -> Result<DecompositionConfig> {
        let divisor = match self.decomposition.divisor.to_lowercase().as_str() {
            "population" => CovarianceDivisor::Population,
            "sample" => CovarianceDivisor::Sample,
            other => {
                return Err(AnalysisError::ConfigError(format!(
                    "Unknown covariance divisor '{}' (expected 'population' or 'sample')",
                    other
                )))
            }
        };

        if self.decomposition.epsilon < 0.0 || !self.decomposition.epsilon.is_finite() {
            return Err(AnalysisError::ConfigError(format!(
                "Epsilon must be a non-negative finite number, got {}",
                self.decomposition.epsilon
            )));
        }

        Ok(DecompositionConfig {
            divisor,
            epsilon: self.decomposition.epsilon,
        })
    }

    /// The configured non-finite sample policy.
    pub fn non_finite_policy(&self) -> Result<NonFinitePolicy> {
        match self.decomposition.non_finite.to_lowercase().as_str() {
            "fail" => Ok(NonFinitePolicy::Fail),
            "drop" => Ok(NonFinitePolicy::Drop),
            other => Err(AnalysisError::ConfigError(format!(
                "Unknown non-finite policy '{}' (expected 'fail' or 'drop')",
                other
            ))),
        }
    }

    /// Convert to the typed metrics config.
    pub fn to_metrics_config(&self) -> Result<MetricsConfig> {
        if self.metrics.periods_per_year == 0 {
            return Err(AnalysisError::ConfigError(
                "periods_per_year must be positive".to_string(),
            ));
        }
        Ok(MetricsConfig {
            risk_free_rate: self.metrics.risk_free_rate,
            periods_per_year: self.metrics.periods_per_year,
            epsilon: self.decomposition.epsilon,
        })
    }

    /// Build the momentum strategy described by the config.
    pub fn to_momentum_strategy(&self) -> Result<MomentumTilt> {
        if self.strategy.lookback == 0 {
            return Err(AnalysisError::ConfigError(
                "Momentum lookback must be positive".to_string(),
            ));
        }
        Ok(MomentumTilt::new(
            self.strategy.lookback,
            MomentumWeights {
                strong_up: self.strategy.weights.strong_up,
                mild_up: self.strategy.weights.mild_up,
                mild_down: self.strategy.weights.mild_down,
                strong_down: self.strategy.weights.strong_down,
                threshold: self.strategy.weights.threshold,
            },
        ))
    }

    /// Generate an example configuration file content.
    pub fn example() -> String {
        r#"# apsplit configuration file
# Configures one active-passive decomposition study

[data]
path = "data/prices.csv"
symbol = "2330.TW"
# date_format = "%Y-%m-%d"
delimiter = ","

[strategy]
lookback = 5          # momentum lookback in trading days
contribution = 1.0    # invested on the first trading day of each month

[strategy.weights]
strong_up = 1.3       # trailing return above threshold
mild_up = 1.1         # positive trailing return below threshold
mild_down = 0.9       # negative trailing return above -threshold
strong_down = 0.7     # trailing return below -threshold
threshold = 0.05

[decomposition]
divisor = "population"   # or "sample" (n - 1)
epsilon = 1e-12
non_finite = "fail"      # or "drop"

[metrics]
risk_free_rate = 0.02
periods_per_year = 252

[rolling]
window = 252
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = AnalysisFileConfig::default();
        assert_eq!(config.strategy.lookback, 5);
        assert_eq!(config.strategy.weights.strong_up, 1.3);
        assert_eq!(config.metrics.periods_per_year, 252);
        assert_eq!(config.decomposition.divisor, "population");
        assert_eq!(config.rolling.window, 252);
    }

    #[test]
    fn test_load_config() {
        let toml_content = r#"
[data]
path = "prices.csv"
symbol = "TEST"

[strategy]
lookback = 10
contribution = 500.0

[strategy.weights]
strong_up = 1.5
threshold = 0.03

[decomposition]
divisor = "sample"
non_finite = "drop"

[metrics]
risk_free_rate = 0.01
periods_per_year = 12
"#;
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", toml_content).unwrap();

        let config = AnalysisFileConfig::load(file.path()).unwrap();
        assert_eq!(config.data.symbol, "TEST");
        assert_eq!(config.strategy.lookback, 10);
        assert_eq!(config.strategy.contribution, 500.0);
        assert_eq!(config.strategy.weights.strong_up, 1.5);
        // Unset tiers fall back to defaults.
        assert_eq!(config.strategy.weights.mild_down, 0.9);
        assert_eq!(config.metrics.periods_per_year, 12);

        let decomp = config.to_decomposition_config().unwrap();
        assert_eq!(decomp.divisor, CovarianceDivisor::Sample);
        assert_eq!(config.non_finite_policy().unwrap(), NonFinitePolicy::Drop);
    }

    #[test]
    fn test_unknown_divisor_fails() {
        let config = AnalysisFileConfig {
            decomposition: DecompositionSettings {
                divisor: "bessel".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let err = config.to_decomposition_config().unwrap_err();
        assert!(matches!(err, AnalysisError::ConfigError(_)));
    }

    #[test]
    fn test_zero_periods_per_year_fails() {
        let config = AnalysisFileConfig {
            metrics: MetricsSettings {
                periods_per_year: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.to_metrics_config().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let config = AnalysisFileConfig::default();
        let file = NamedTempFile::new().unwrap();
        config.save(file.path()).unwrap();

        let loaded = AnalysisFileConfig::load(file.path()).unwrap();
        assert_eq!(loaded.strategy.lookback, config.strategy.lookback);
        assert_eq!(loaded.data.symbol, config.data.symbol);
    }

    #[test]
    fn test_example_config_parses() {
        let example = AnalysisFileConfig::example();
        let config: AnalysisFileConfig = toml::from_str(&example).unwrap();
        assert_eq!(config.data.symbol, "2330.TW");
        assert!(config.to_decomposition_config().is_ok());
        assert!(config.to_momentum_strategy().is_ok());
    }
}
