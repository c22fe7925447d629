//! Price-series loading and preparation.
//!
//! The analysis core consumes an ordered close-price series through the
//! [`PriceSource`] seam; the only implementation shipped here reads CSV
//! files. Loading validates at the boundary: non-positive or non-finite
//! closes are skipped (with accounting) or fail the load, rows are sorted
//! by timestamp, and duplicate timestamps are collapsed.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{AnalysisError, Result};

/// One close-price observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
}

impl PricePoint {
    /// Create a new price point.
    pub fn new(timestamp: DateTime<Utc>, close: f64) -> Self {
        Self { timestamp, close }
    }

    /// Check that the close is a positive finite price.
    pub fn is_valid(&self) -> bool {
        self.close.is_finite() && self.close > 0.0
    }
}

/// Data loading configuration.
#[derive(Debug, Clone)]
pub struct DataConfig {
    /// Date format string for parsing (e.g., "%Y-%m-%d").
    pub date_format: Option<String>,
    /// Whether the CSV has headers.
    pub has_headers: bool,
    /// CSV delimiter character.
    pub delimiter: u8,
    /// Skip invalid rows instead of failing.
    pub skip_invalid: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            date_format: None,
            has_headers: true,
            delimiter: b',',
            skip_invalid: true,
        }
    }
}

/// Raw CSV row with flexible column naming.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(
        alias = "Date",
        alias = "date",
        alias = "DATE",
        alias = "Timestamp",
        alias = "timestamp",
        alias = "Time",
        alias = "time"
    )]
    date: String,
    #[serde(
        alias = "Close",
        alias = "close",
        alias = "Adj Close",
        alias = "adj_close",
        alias = "Price",
        alias = "price"
    )]
    close: f64,
}

/// Parse a date string, honoring an explicit format when configured and
/// falling back to common formats otherwise.
fn parse_datetime(s: &str, format: Option<&str>) -> Result<DateTime<Utc>> {
    if let Some(fmt) = format {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&dt));
        }
        let d = NaiveDate::parse_from_str(s, fmt)?;
        return Ok(Utc.from_utc_datetime(&d.and_hms_opt(0, 0, 0).unwrap()));
    }

    let datetime_formats = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%SZ"];
    for fmt in &datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&dt));
        }
    }

    let date_formats = ["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%m/%d/%Y"];
    for fmt in &date_formats {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&d.and_hms_opt(0, 0, 0).unwrap()));
        }
    }

    // Unix timestamp fallback
    if let Ok(ts) = s.parse::<i64>() {
        if let Some(dt) = DateTime::from_timestamp(ts, 0) {
            return Ok(dt);
        }
    }

    Err(AnalysisError::DataError(format!(
        "Could not parse date: '{}'",
        s
    )))
}

/// Load a close-price series from a CSV file.
pub fn load_csv(path: impl AsRef<Path>, config: &DataConfig) -> Result<Vec<PricePoint>> {
    let path = path.as_ref();
    info!("Loading price data from: {}", path.display());

    let mut reader = ReaderBuilder::new()
        .has_headers(config.has_headers)
        .delimiter(config.delimiter)
        .flexible(true)
        .from_path(path)?;

    let mut prices = Vec::new();
    let mut skipped = 0;
    let mut row_num = 0;

    for result in reader.deserialize() {
        row_num += 1;
        let row: CsvRow = match result {
            Ok(r) => r,
            Err(e) => {
                if config.skip_invalid {
                    debug!("Skipping unparseable row {}: {}", row_num, e);
                    skipped += 1;
                    continue;
                }
                return Err(e.into());
            }
        };

        let timestamp = match parse_datetime(&row.date, config.date_format.as_deref()) {
            Ok(t) => t,
            Err(e) => {
                if config.skip_invalid {
                    debug!("Skipping row {} with bad date: {}", row_num, e);
                    skipped += 1;
                    continue;
                }
                return Err(e);
            }
        };

        let point = PricePoint::new(timestamp, row.close);
        if !point.is_valid() {
            if config.skip_invalid {
                debug!("Skipping row {} with invalid close {}", row_num, row.close);
                skipped += 1;
                continue;
            }
            return Err(AnalysisError::DataError(format!(
                "Row {} has invalid close: {}",
                row_num, row.close
            )));
        }

        prices.push(point);
    }

    if prices.is_empty() {
        return Err(AnalysisError::DataError(format!(
            "No usable rows in {}",
            path.display()
        )));
    }

    prices.sort_by_key(|p| p.timestamp);
    let before = prices.len();
    prices.dedup_by_key(|p| p.timestamp);
    let duplicates = before - prices.len();

    if skipped > 0 || duplicates > 0 {
        warn!(
            "Loaded {} rows ({} skipped, {} duplicate timestamps removed)",
            prices.len(),
            skipped,
            duplicates
        );
    } else {
        info!("Loaded {} rows", prices.len());
    }

    Ok(prices)
}

/// A source of ordered close-price series.
///
/// The analysis pipeline depends on this seam rather than on any concrete
/// retrieval mechanism, so simulated or cached data can be injected.
pub trait PriceSource {
    /// Fetch the full price series, oldest first.
    fn fetch(&self) -> Result<Vec<PricePoint>>;
}

/// CSV-file-backed price source.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    config: DataConfig,
}

impl CsvSource {
    /// Create a source reading from `path` with the given loader config.
    pub fn new(path: impl Into<PathBuf>, config: DataConfig) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }
}

impl PriceSource for CsvSource {
    fn fetch(&self) -> Result<Vec<PricePoint>> {
        load_csv(&self.path, &self.config)
    }
}

/// Per-period simple returns of a price series.
///
/// Same length as the input; the first period has no predecessor and is
/// reported as zero.
pub fn simple_returns(prices: &[PricePoint]) -> Vec<f64> {
    let mut returns = Vec::with_capacity(prices.len());
    for (i, point) in prices.iter().enumerate() {
        if i == 0 {
            returns.push(0.0);
        } else {
            returns.push(point.close / prices[i - 1].close - 1.0);
        }
    }
    returns
}

/// Summary of a loaded price series for sanity checking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataQualityReport {
    pub rows: usize,
    pub first: DateTime<Utc>,
    pub last: DateTime<Utc>,
    pub min_close: f64,
    pub max_close: f64,
    /// Periods with an absolute return above 20%.
    pub extreme_moves: usize,
}

/// Summarize a price series.
pub fn data_quality_report(prices: &[PricePoint]) -> Result<DataQualityReport> {
    if prices.is_empty() {
        return Err(AnalysisError::DataError(
            "Cannot summarize an empty price series".to_string(),
        ));
    }

    let mut min_close = f64::INFINITY;
    let mut max_close = f64::NEG_INFINITY;
    for p in prices {
        min_close = min_close.min(p.close);
        max_close = max_close.max(p.close);
    }

    let extreme_moves = simple_returns(prices)
        .iter()
        .filter(|r| r.abs() > 0.2)
        .count();

    Ok(DataQualityReport {
        rows: prices.len(),
        first: prices[0].timestamp,
        last: prices[prices.len() - 1].timestamp,
        min_close,
        max_close,
        extreme_moves,
    })
}
