use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Insufficient data: {required} candles required, {available} available")]
    InsufficientData { required: usize, available: usize },

    #[error("Computation failure: {0}")]
    ComputationFailure(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Market data source error: {0}")]
    DataSourceError(String),

    #[error("CSV parsing system error: {source}")]
    CsvSystemError {
        #[from]
        source: csv::Error,
    },

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("CSV data format error: {0}")]
    CsvDataFormatError(String),

    // Catch-all for anyhow errors raised by helpers
    #[error(transparent)]
    AnyhowError(#[from] anyhow::Error),
}

impl EngineError {
    /// True when the error only means "cannot evaluate yet".
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, EngineError::InsufficientData { .. })
    }
}

pub fn ensure_len(available: usize, required: usize) -> Result<(), EngineError> {
    if available < required {
        return Err(EngineError::InsufficientData { required, available });
    }
    Ok(())
}
