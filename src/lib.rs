//! apsplit - Active-passive return decomposition for periodic-investment strategies.
//!
//! # Overview
//!
//! apsplit empirically tests the active-passive return decomposition
//! (Lo, 2007) on a single equity series. It simulates two arms of a
//! periodic-investment study — a constant-weight control and a
//! momentum-reweighted variant — and splits the active arm's expected
//! return into:
//!
//! - an **active component**: the covariance between per-period weights and
//!   asset returns, the value created (or destroyed) by timing, and
//! - a **passive component**: the product of the mean weight and the mean
//!   return, the value of plain market exposure,
//!
//! plus the active ratio, correlation diagnostics, and standard performance
//! statistics (Sharpe, Sortino, Calmar, drawdown, VaR, win rate).
//!
//! The sum of the two components equals the sample mean of the elementwise
//! weight-return products under the default population divisor, so every
//! decomposition can be verified against its own input.
//!
//! # Quick Start
//!
//! ```no_run
//! use apsplit::backtest::Simulator;
//! use apsplit::data::{load_csv, DataConfig};
//! use apsplit::decompose::{decompose, DecompositionConfig};
//! use apsplit::strategies::MomentumTilt;
//! use apsplit::types::NonFinitePolicy;
//!
//! let prices = load_csv("data/prices.csv", &DataConfig::default()).unwrap();
//!
//! let simulator = Simulator::with_defaults();
//! let mut strategy = MomentumTilt::default_params();
//! let result = simulator.run(&prices, &mut strategy).unwrap();
//!
//! let series = result.aligned_series(NonFinitePolicy::Fail).unwrap();
//! let split = decompose(&series, &DecompositionConfig::default()).unwrap();
//!
//! println!("Active:  {:.6}", split.active_component);
//! println!("Passive: {:.6}", split.passive_component);
//! println!("Ratio:   {:.4}", split.active_ratio);
//! ```
//!
//! # Modules
//!
//! - [`types`]: Aligned weight/return series and validation policies
//! - [`decompose`]: The decomposition engine and rolling-window variant
//! - [`metrics`]: Performance statistics for NAV and return series
//! - [`data`]: Price-series loading and the `PriceSource` seam
//! - [`strategy`]: Weight strategy trait and context
//! - [`strategies`]: Built-in passive and momentum strategies
//! - [`backtest`]: Periodic-investment simulator
//! - [`config`]: TOML configuration file support
//! - [`report`]: Flat records, terminal reports, JSON/CSV export
//! - [`viz`]: Sparklines and SVG charts

pub mod backtest;
pub mod cli;
pub mod config;
pub mod data;
pub mod decompose;
pub mod error;
pub mod metrics;
pub mod report;
pub mod strategies;
pub mod strategy;
pub mod types;
pub mod viz;

// Re-exports for convenience
pub use backtest::{SimulationConfig, SimulationResult, Simulator};
pub use config::AnalysisFileConfig;
pub use data::{load_csv, CsvSource, DataConfig, PricePoint, PriceSource};
pub use decompose::{
    decompose, pearson_correlation, rolling_decompose, DecompositionConfig, DecompositionResult,
    RollingPoint,
};
pub use error::{AnalysisError, Result};
pub use metrics::{compute_stats, stats_from_navs, MetricsConfig, PerformanceStats};
pub use report::{ReportFormatter, StudyReport};
pub use strategies::{FixedWeight, MomentumTilt, MomentumWeights};
pub use strategy::{WeightContext, WeightStrategy};
pub use types::{AlignedSeries, CovarianceDivisor, NonFinitePolicy, ReturnWeightSample};
