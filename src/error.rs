//! Error types for the decomposition engine.

use thiserror::Error;

/// Main error type for the analysis engine.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Insufficient data: need at least {required} samples, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Invalid sample at index {index}: non-finite {field} ({value})")]
    InvalidSample {
        index: usize,
        field: &'static str,
        value: f64,
    },

    #[error("Degenerate decomposition: {0}")]
    DegenerateDecomposition(String),

    #[error("Alignment error: weight series has {weights} entries, return series has {returns}")]
    Alignment { weights: usize, returns: usize },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParseError(#[from] chrono::ParseError),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;
