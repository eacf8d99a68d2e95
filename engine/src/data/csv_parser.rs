use crate::error::EngineError;
use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use shared::models::Candle;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

#[derive(Debug, Deserialize)]
struct CandleRow {
    timestamp: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Loads historical candles for backtesting.
///
/// CSV Header: timestamp,open,high,low,close,volume
/// Example Row: 2024-03-06T09:00:00Z,1.0800,1.0805,1.0795,1.0802,1250000
pub struct HistoricalCsvLoader;

impl HistoricalCsvLoader {
    pub fn load_candles_from_csv(file_path: impl AsRef<Path>, symbol: &str) -> Result<Vec<Candle>, EngineError> {
        let file = File::open(file_path.as_ref())?;
        Self::load_candles_from_reader(BufReader::new(file), symbol)
    }

    /// Rows are sorted ascending and de-duplicated by timestamp (first row wins).
    pub fn load_candles_from_reader<R: Read>(reader: R, symbol: &str) -> Result<Vec<Candle>, EngineError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);

        let mut candles = Vec::new();
        for (idx, result) in rdr.deserialize::<CandleRow>().enumerate() {
            let row = result?;
            let candle = Candle {
                symbol: symbol.to_string(),
                timestamp: row.timestamp,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            };
            if !candle.is_consistent() {
                return Err(EngineError::CsvDataFormatError(format!(
                    "Inconsistent candle at line {}: high/low must bound open/close and volume must be non-negative",
                    idx + 2
                )));
            }
            candles.push(candle);
        }

        candles.sort_by_key(|c| c.timestamp);
        candles.dedup_by_key(|c| c.timestamp);
        tracing::debug!(symbol, candles = candles.len(), "Loaded historical candles");
        Ok(candles)
    }
}
