// Signal scoring pipeline: WVRS detection, features, heuristic scorers,
// composition, validation and backtesting.
pub mod backtest;
pub mod composer;
pub mod features;
pub mod scorers;
pub mod validator;
pub mod wvrs;

pub use backtest::BacktestRunner;
pub use composer::SignalComposer;
pub use features::{FeatureExtractor, FixedSentiment, RandomSentiment, SentimentSource};
pub use validator::SignalValidator;
pub use wvrs::WvrsDetector;

use uuid::Uuid;

/// Stable identifier derived from the inputs that produced a signal.
pub(crate) fn signal_id(prefix: &str, key: &str) -> String {
    let uuid = Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("{}:{}", prefix, key).as_bytes());
    format!("{}_{}", prefix, uuid.simple())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{Duration, TimeZone, Utc};
    use shared::models::Candle;

    pub fn candle(index: usize, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Candle {
        // Wednesday morning, inside active trading hours
        let start = Utc.with_ymd_and_hms(2024, 3, 6, 9, 0, 0).unwrap();
        Candle {
            symbol: "EUR/USD".to_string(),
            timestamp: start + Duration::minutes(index as i64),
            open, high, low, close, volume,
        }
    }

    /// Quiet candle with no dominant wick.
    pub fn base_candle(index: usize) -> Candle {
        candle(index, 1.0790, 1.0792, 1.0789, 1.0791, 1000.0)
    }

    /// Eleven quiet candles followed by a 90% lower-wick candle on 3x volume.
    pub fn lower_wick_series() -> Vec<Candle> {
        let mut candles: Vec<Candle> = (0..11).map(base_candle).collect();
        candles.push(candle(11, 1.0798, 1.0800, 1.0780, 1.0799, 3000.0));
        candles
    }
}
