// Technical indicators module
pub mod adx;
pub mod analysis;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use adx::Adx;
pub use analysis::TechnicalAnalysis;
pub use bollinger::BollingerPosition;
pub use ema::Ema;
pub use macd::Macd;
pub use rsi::Rsi;
pub use sma::Sma;

use shared::models::Candle;
use serde_json::Value;

// Common trait for all indicators
pub trait IndicatorCalculator: Send + Sync {
    fn name(&self) -> &str;
    fn parameters(&self) -> Value; // Parameters used for this indicator instance
    fn calculate(&self, data: &[Candle]) -> Vec<Option<f64>>; // None where the indicator cannot be calculated yet

    /// Most recent computable value.
    fn latest(&self, data: &[Candle]) -> Option<f64> {
        self.calculate(data).last().copied().flatten()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{Duration, TimeZone, Utc};
    use shared::models::Candle;

    pub fn flat_candle(index: usize, close: f64) -> Candle {
        ohlc_candle(index, close, close, close, close)
    }

    pub fn ohlc_candle(index: usize, open: f64, high: f64, low: f64, close: f64) -> Candle {
        let start = Utc.with_ymd_and_hms(2024, 3, 6, 9, 0, 0).unwrap();
        Candle {
            symbol: "TEST".to_string(),
            timestamp: start + Duration::minutes(index as i64),
            open, high, low, close,
            volume: 0.0,
        }
    }

    pub fn closes(values: &[f64]) -> Vec<Candle> {
        values.iter().enumerate().map(|(i, &c)| flat_candle(i, c)).collect()
    }
}
