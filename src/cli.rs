//! Command-line interface for the decomposition study.

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::backtest::{SimulationConfig, Simulator};
use crate::config::AnalysisFileConfig;
use crate::data::{data_quality_report, load_csv, DataConfig, PricePoint};
use crate::decompose::{decompose, rolling_decompose, DecompositionConfig, RollingPoint};
use crate::error::{AnalysisError, Result};
use crate::metrics::{compare_navs, stats_from_navs, MetricsConfig};
use crate::report::{ReportFormatter, StudyReport};
use crate::strategies::{FixedWeight, MomentumTilt, MomentumWeights};
use crate::types::{AlignedSeries, NonFinitePolicy};
use crate::viz;

/// apsplit - active-passive return decomposition for periodic-investment strategies.
#[derive(Parser)]
#[command(name = "apsplit")]
#[command(version)]
#[command(about = "Decompose strategy returns into active and passive components")]
#[command(long_about = None)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the study on a close-price CSV file
    Run {
        /// Path to the price data file
        #[arg(short, long)]
        data: PathBuf,

        /// Symbol name used in reports
        #[arg(short, long, default_value = "ASSET")]
        symbol: String,

        /// Momentum lookback in trading days
        #[arg(short, long, default_value = "5")]
        lookback: usize,

        /// Capital invested on the first trading day of each month
        #[arg(short, long, default_value = "1.0")]
        contribution: f64,

        /// Annualized risk-free rate
        #[arg(long, default_value = "0.02")]
        risk_free_rate: f64,

        /// Periods per year for annualization
        #[arg(long, default_value = "252")]
        periods_per_year: usize,

        /// Rolling decomposition window (0 disables)
        #[arg(short, long, default_value = "252")]
        window: usize,

        /// Directory to write SVG charts into
        #[arg(long)]
        charts_dir: Option<PathBuf>,
    },

    /// Run the study from a TOML configuration file
    RunConfig {
        /// Path to the configuration file
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Generate an example configuration file
    Init {
        /// Output path for the config file
        #[arg(short, long, default_value = "apsplit.toml")]
        output: PathBuf,
    },

    /// Validate a price data file
    Validate {
        /// Path to the price data file
        #[arg(short, long)]
        data: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

impl Cli {
    /// Initialize logging based on verbosity level.
    pub fn init_logging(&self) {
        let level = match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };

        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(false)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");
    }
}

struct StudyParams {
    symbol: String,
    lookback: usize,
    contribution: f64,
    weights: MomentumWeights,
    decomposition: DecompositionConfig,
    metrics: MetricsConfig,
    policy: NonFinitePolicy,
    window: usize,
}

/// Run the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    cli.init_logging();

    match &cli.command {
        Commands::Run {
            data,
            symbol,
            lookback,
            contribution,
            risk_free_rate,
            periods_per_year,
            window,
            charts_dir,
        } => {
            let prices = load_csv(data, &DataConfig::default())?;
            let params = StudyParams {
                symbol: symbol.clone(),
                lookback: *lookback,
                contribution: *contribution,
                weights: MomentumWeights::default(),
                decomposition: DecompositionConfig::default(),
                metrics: MetricsConfig {
                    risk_free_rate: *risk_free_rate,
                    periods_per_year: *periods_per_year,
                    ..Default::default()
                },
                policy: NonFinitePolicy::Fail,
                window: *window,
            };
            let (report, series) = run_study(&prices, &params)?;
            emit(&report, cli.output)?;
            if let Some(dir) = charts_dir {
                write_charts(dir, &report, &series)?;
            }
            Ok(())
        }

        Commands::RunConfig { config } => {
            let file_config = AnalysisFileConfig::load(config)?;
            let path = file_config.data.path.clone().ok_or_else(|| {
                AnalysisError::ConfigError("data.path is required".to_string())
            })?;

            let data_config = DataConfig {
                date_format: file_config.data.date_format.clone(),
                delimiter: file_config.data.delimiter as u8,
                ..Default::default()
            };
            let prices = load_csv(&path, &data_config)?;

            let params = StudyParams {
                symbol: file_config.data.symbol.clone(),
                lookback: file_config.strategy.lookback,
                contribution: file_config.strategy.contribution,
                weights: MomentumWeights {
                    strong_up: file_config.strategy.weights.strong_up,
                    mild_up: file_config.strategy.weights.mild_up,
                    mild_down: file_config.strategy.weights.mild_down,
                    strong_down: file_config.strategy.weights.strong_down,
                    threshold: file_config.strategy.weights.threshold,
                },
                decomposition: file_config.to_decomposition_config()?,
                metrics: file_config.to_metrics_config()?,
                policy: file_config.non_finite_policy()?,
                window: file_config.rolling.window,
            };

            let (report, _) = run_study(&prices, &params)?;
            emit(&report, cli.output)
        }

        Commands::Init { output } => {
            fs::write(output, AnalysisFileConfig::example())?;
            println!("Wrote example configuration to {}", output.display());
            Ok(())
        }

        Commands::Validate { data } => {
            let prices = load_csv(data, &DataConfig::default())?;
            let quality = data_quality_report(&prices)?;
            println!("Rows:          {}", quality.rows);
            println!(
                "Range:         {} to {}",
                quality.first.format("%Y-%m-%d"),
                quality.last.format("%Y-%m-%d")
            );
            println!(
                "Close range:   {:.2} to {:.2}",
                quality.min_close, quality.max_close
            );
            println!("Extreme moves: {}", quality.extreme_moves);
            Ok(())
        }
    }
}

/// Run both strategy arms, decompose the active one, and assemble the report.
///
/// Also returns the active arm's aligned series for chart rendering.
fn run_study(
    prices: &[PricePoint],
    params: &StudyParams,
) -> Result<(StudyReport, AlignedSeries)> {
    if params.lookback == 0 {
        return Err(AnalysisError::ConfigError(
            "Momentum lookback must be positive".to_string(),
        ));
    }
    if params.metrics.periods_per_year == 0 {
        return Err(AnalysisError::ConfigError(
            "periods_per_year must be positive".to_string(),
        ));
    }

    let simulator = Simulator::new(SimulationConfig {
        contribution: params.contribution,
    });

    let passive = simulator.run(prices, &mut FixedWeight::unit())?;
    let mut momentum = MomentumTilt::new(params.lookback, params.weights);
    let active = simulator.run(prices, &mut momentum)?;

    let series = active.aligned_series(params.policy)?;
    let decomposition = decompose(&series, &params.decomposition)?;

    let passive_stats = stats_from_navs(&passive.navs(), &params.metrics)?;
    let active_stats = stats_from_navs(&active.navs(), &params.metrics)?;
    let relative = compare_navs(&active.navs(), &passive.navs(), &params.metrics)?;

    let rolling: Vec<RollingPoint> = if params.window >= 2 && series.len() >= params.window {
        rolling_decompose(&series, params.window, &params.decomposition)?
    } else {
        if params.window >= 2 {
            info!(
                "Skipping rolling decomposition: {} periods < window {}",
                series.len(),
                params.window
            );
        }
        Vec::new()
    };

    let report = StudyReport {
        symbol: params.symbol.clone(),
        periods: series.len(),
        passive: passive_stats,
        active: active_stats,
        decomposition,
        relative,
        rolling,
    };
    Ok((report, series))
}

fn emit(report: &StudyReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            ReportFormatter::print_report(report);
        }
        OutputFormat::Json => {
            println!("{}", report.to_json()?);
        }
        OutputFormat::Csv => {
            println!("{}", StudyReport::csv_header());
            println!("{}", report.to_csv_line());
        }
    }
    Ok(())
}

fn write_charts(dir: &Path, report: &StudyReport, series: &AlignedSeries) -> Result<()> {
    fs::create_dir_all(dir)?;

    fs::write(
        dir.join("decomposition.svg"),
        viz::decomposition_bar_svg(&report.decomposition),
    )?;
    fs::write(
        dir.join("weight_return_scatter.svg"),
        viz::weight_return_scatter_svg(series),
    )?;
    info!("Wrote charts to {}", dir.display());
    Ok(())
}
