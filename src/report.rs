//! Reporting and serialization of analysis results.
//!
//! Results leave the core as flat key-value records with stable field
//! names; undefined metrics serialize as `null`, never NaN. The terminal
//! report and comparison table are rendering conveniences on top of the
//! same records.

use colored::Colorize;
use serde::Serialize;
use serde_json::{Map, Number, Value};
use tabled::{builder::Builder, settings::Style};

use crate::decompose::{DecompositionResult, RollingPoint};
use crate::error::Result;
use crate::metrics::{ActiveAnalysis, PerformanceStats};

fn number(value: f64) -> Value {
    Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
}

fn optional(value: Option<f64>) -> Value {
    value.map(number).unwrap_or(Value::Null)
}

/// Flatten a decomposition result into a key-value record.
pub fn decomposition_record(result: &DecompositionResult) -> Map<String, Value> {
    let mut record = Map::new();
    record.insert("active_component".into(), number(result.active_component));
    record.insert("passive_component".into(), number(result.passive_component));
    record.insert("active_ratio".into(), number(result.active_ratio));
    record.insert(
        "weight_return_correlation".into(),
        optional(result.weight_return_correlation),
    );
    record.insert("sample_size".into(), Value::from(result.sample_size));
    record.insert("weight_mean".into(), number(result.weight_mean));
    record.insert("weight_std".into(), number(result.weight_std));
    record.insert("return_mean".into(), number(result.return_mean));
    record.insert("return_std".into(), number(result.return_std));
    record
}

/// Flatten a performance stats record into a key-value record.
pub fn stats_record(stats: &PerformanceStats) -> Map<String, Value> {
    let mut record = Map::new();
    record.insert("total_return".into(), number(stats.total_return));
    record.insert("annualized_return".into(), number(stats.annualized_return));
    record.insert(
        "annualized_volatility".into(),
        number(stats.annualized_volatility),
    );
    record.insert("sharpe_ratio".into(), optional(stats.sharpe_ratio));
    record.insert("sortino_ratio".into(), optional(stats.sortino_ratio));
    record.insert("calmar_ratio".into(), optional(stats.calmar_ratio));
    record.insert("max_drawdown".into(), number(stats.max_drawdown));
    record.insert("win_rate".into(), number(stats.win_rate));
    record.insert("var_95".into(), number(stats.var_95));
    record.insert(
        "max_consecutive_losses".into(),
        Value::from(stats.max_consecutive_losses),
    );
    record
}

/// Full study document assembled by the orchestration layer.
#[derive(Debug, Clone, Serialize)]
pub struct StudyReport {
    /// Symbol the study ran on.
    pub symbol: String,
    /// Number of simulated periods.
    pub periods: usize,
    /// Performance of the passive control arm.
    pub passive: PerformanceStats,
    /// Performance of the momentum-tilted arm.
    pub active: PerformanceStats,
    /// Decomposition of the active arm's weight/return series.
    pub decomposition: DecompositionResult,
    /// Relative performance of active over passive.
    pub relative: ActiveAnalysis,
    /// Rolling-window decomposition, if requested.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rolling: Vec<RollingPoint>,
}

impl StudyReport {
    /// Serialize the full document as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// One CSV line of the headline numbers.
    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{:.6},{:.6},{:.6},{},{:.6},{:.6},{:.6},{:.6}",
            self.symbol,
            self.periods,
            self.decomposition.active_component,
            self.decomposition.passive_component,
            self.decomposition.active_ratio,
            fmt_csv_opt(self.decomposition.weight_return_correlation),
            self.passive.total_return,
            self.active.total_return,
            self.passive.max_drawdown,
            self.active.max_drawdown,
        )
    }

    /// Header matching [`StudyReport::to_csv_line`].
    pub fn csv_header() -> &'static str {
        "symbol,periods,active_component,passive_component,active_ratio,\
         weight_return_correlation,passive_total_return,active_total_return,\
         passive_max_drawdown,active_max_drawdown"
    }
}

fn fmt_csv_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{:.6}", v)).unwrap_or_default()
}

fn fmt_pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{:.prec$}", v, prec = precision),
        None => "n/a".to_string(),
    }
}

/// Format results for terminal display.
pub struct ReportFormatter;

impl ReportFormatter {
    /// Print the full study report to stdout.
    pub fn print_report(report: &StudyReport) {
        println!();
        println!("{}", "═".repeat(62).blue());
        println!("{}", " ACTIVE-PASSIVE DECOMPOSITION STUDY ".bold().blue());
        println!("{}", "═".repeat(62).blue());
        println!();

        println!("{}", "Overview".bold().underline());
        println!("  Symbol:           {}", report.symbol);
        println!("  Periods:          {}", report.periods);
        println!();

        println!("{}", "Strategy Performance".bold().underline());
        println!("{}", Self::comparison_table(&[
            ("Passive DCA", &report.passive),
            ("Momentum DCA", &report.active),
        ]));
        println!();

        let d = &report.decomposition;
        println!("{}", "Return Decomposition".bold().underline());
        println!("  Active (timing):  {:>12.6}", d.active_component);
        println!("  Passive (exposure):{:>11.6}", d.passive_component);
        println!("  Active Ratio:     {:>12.4}", d.active_ratio);
        println!(
            "  W/R Correlation:  {:>12}",
            fmt_opt(d.weight_return_correlation, 4)
        );
        println!("  Sample Size:      {:>12}", d.sample_size);
        println!(
            "  Weight Mean/Std:  {:>12.4} / {:.4}",
            d.weight_mean, d.weight_std
        );
        println!(
            "  Return Mean/Std:  {:>12.6} / {:.6}",
            d.return_mean, d.return_std
        );
        println!();

        let verdict = if d.active_component > 0.0 {
            format!(
                "Timing added value: {} of the decomposed return is active",
                fmt_pct(d.active_ratio)
            )
            .green()
        } else if d.active_component < 0.0 {
            "Timing destroyed value: the active component is negative"
                .to_string()
                .red()
        } else {
            "No timing effect: the weight series is uncorrelated with returns"
                .to_string()
                .normal()
        };
        println!("  {}", verdict);
        println!();

        let r = &report.relative;
        println!("{}", "Active vs Passive".bold().underline());
        println!(
            "  Excess Return:    {:>12} (annualized)",
            fmt_pct(r.annualized_excess_return)
        );
        println!("  Tracking Error:   {:>12}", fmt_pct(r.tracking_error));
        println!(
            "  Information Ratio:{:>12}",
            fmt_opt(r.information_ratio, 3)
        );
        println!(
            "  Positive Periods: {:>12}",
            fmt_pct(r.positive_period_ratio)
        );
        println!(
            "  Relative Drawdown:{:>12}",
            fmt_pct(r.max_relative_drawdown)
        );
        println!();

        if !report.rolling.is_empty() {
            let defined = report
                .rolling
                .iter()
                .filter(|p| p.active_ratio.is_some())
                .count();
            println!("{}", "Rolling Decomposition".bold().underline());
            println!("  Windows:          {:>12}", report.rolling.len());
            println!("  Defined Ratios:   {:>12}", defined);
            println!();
        }

        println!("{}", "═".repeat(62).blue());
    }

    /// Render a strategy comparison table.
    pub fn comparison_table(rows: &[(&str, &PerformanceStats)]) -> String {
        let mut builder = Builder::default();
        builder.push_record([
            "Strategy", "Return", "Annual", "Vol", "Sharpe", "Sortino", "Max DD", "Win Rate",
            "VaR 95%",
        ]);

        for (name, stats) in rows {
            builder.push_record([
                name.to_string(),
                fmt_pct(stats.total_return),
                fmt_pct(stats.annualized_return),
                fmt_pct(stats.annualized_volatility),
                fmt_opt(stats.sharpe_ratio, 2),
                fmt_opt(stats.sortino_ratio, 2),
                fmt_pct(stats.max_drawdown),
                fmt_pct(stats.win_rate),
                fmt_pct(stats.var_95),
            ]);
        }

        builder.build().with(Style::rounded()).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::ActiveAnalysis;

    fn sample_stats() -> PerformanceStats {
        PerformanceStats {
            total_return: 0.25,
            annualized_return: 0.12,
            annualized_volatility: 0.18,
            sharpe_ratio: Some(0.55),
            sortino_ratio: Some(0.80),
            calmar_ratio: Some(0.75),
            max_drawdown: -0.16,
            win_rate: 0.52,
            var_95: -0.018,
            max_consecutive_losses: 4,
        }
    }

    fn sample_decomposition() -> DecompositionResult {
        DecompositionResult {
            active_component: 0.0002,
            passive_component: 0.0008,
            active_ratio: 0.2,
            weight_return_correlation: None,
            sample_size: 252,
            weight_mean: 1.02,
            weight_std: 0.2,
            return_mean: 0.0008,
            return_std: 0.015,
        }
    }

    fn sample_report() -> StudyReport {
        StudyReport {
            symbol: "TEST".to_string(),
            periods: 252,
            passive: sample_stats(),
            active: sample_stats(),
            decomposition: sample_decomposition(),
            relative: ActiveAnalysis {
                annualized_excess_return: 0.015,
                tracking_error: 0.04,
                information_ratio: Some(0.375),
                positive_period_ratio: 0.51,
                max_relative_drawdown: -0.05,
                excess_skewness: 0.1,
                excess_kurtosis: 1.2,
            },
            rolling: vec![],
        }
    }

    #[test]
    fn test_decomposition_record_has_stable_keys() {
        let record = decomposition_record(&sample_decomposition());
        for key in [
            "active_component",
            "passive_component",
            "active_ratio",
            "weight_return_correlation",
            "sample_size",
            "weight_mean",
            "weight_std",
            "return_mean",
            "return_std",
        ] {
            assert!(record.contains_key(key), "missing key: {}", key);
        }
        // Undefined correlation serializes as null, never NaN.
        assert_eq!(record["weight_return_correlation"], Value::Null);
        assert_eq!(record["sample_size"], Value::from(252));
    }

    #[test]
    fn test_stats_record_flags_unavailable_metrics() {
        let stats = PerformanceStats {
            sharpe_ratio: None,
            ..sample_stats()
        };
        let record = stats_record(&stats);
        assert_eq!(record["sharpe_ratio"], Value::Null);
        assert!(record["total_return"].is_number());
    }

    #[test]
    fn test_report_json_roundtrip() {
        let json = sample_report().to_json().unwrap();
        assert!(json.contains("\"symbol\": \"TEST\""));
        assert!(json.contains("active_component"));
        assert!(json.contains("null")); // undefined correlation

        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["decomposition"]["sample_size"], Value::from(252));
    }

    #[test]
    fn test_csv_line_matches_header() {
        let line = sample_report().to_csv_line();
        let header_fields = StudyReport::csv_header().split(',').count();
        assert_eq!(line.split(',').count(), header_fields);
        assert!(line.starts_with("TEST,252,"));
    }

    #[test]
    fn test_comparison_table_renders() {
        let stats = sample_stats();
        let table = ReportFormatter::comparison_table(&[("Passive DCA", &stats)]);
        assert!(table.contains("Passive DCA"));
        assert!(table.contains("Sharpe"));
        assert!(table.contains("25.00%"));
    }
}
