// Cleaning and per-minute aggregation of raw market samples
use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use shared::models::{Candle, MarketDataPoint};
use std::collections::BTreeMap;

/// Samples whose high-low range reaches this fraction of the close are outliers.
pub const OUTLIER_RANGE_FRACTION: f64 = 0.1;

/// Keeps samples with a positive close and volume whose range stays under
/// [`OUTLIER_RANGE_FRACTION`] of the close.
pub fn is_valid_sample(point: &MarketDataPoint) -> bool {
    point.close > 0.0
        && point.volume > 0.0
        && ((point.high - point.low).abs() / point.close) < OUTLIER_RANGE_FRACTION
}

pub fn clean(points: Vec<MarketDataPoint>) -> Vec<MarketDataPoint> {
    let received = points.len();
    let cleaned: Vec<MarketDataPoint> = points.into_iter().filter(is_valid_sample).collect();
    if cleaned.len() < received {
        tracing::trace!(received, kept = cleaned.len(), "Dropped invalid market samples");
    }
    cleaned
}

fn minute_bucket(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp
        .duration_trunc(TimeDelta::minutes(1))
        .unwrap_or(timestamp)
}

/// Folds samples into one candle per minute, ascending by time.
///
/// Samples are ordered by timestamp first (arrival order is not trusted), so
/// `open` is the earliest sample's open and `close` the latest sample's close.
/// Minutes without samples produce no candle. Input is expected to be cleaned.
pub fn aggregate(points: &[MarketDataPoint]) -> Vec<Candle> {
    let mut ordered: Vec<&MarketDataPoint> = points.iter().collect();
    ordered.sort_by_key(|p| p.timestamp);

    let mut buckets: BTreeMap<DateTime<Utc>, Candle> = BTreeMap::new();
    for point in ordered {
        let bucket = minute_bucket(point.timestamp);
        buckets
            .entry(bucket)
            .and_modify(|candle| {
                candle.high = candle.high.max(point.high);
                candle.low = candle.low.min(point.low);
                candle.close = point.close;
                candle.volume += point.volume;
            })
            .or_insert_with(|| Candle {
                symbol: point.symbol.clone(),
                timestamp: bucket,
                open: point.open,
                high: point.high,
                low: point.low,
                close: point.close,
                volume: point.volume,
            });
    }
    buckets.into_values().collect()
}
