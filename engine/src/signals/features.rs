// Feature vector handed to the heuristic scorers
use crate::error::{ensure_len, EngineError};
use crate::indicators::ema::recursive_ema;
use chrono::{DateTime, Datelike, Timelike, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::models::{Candle, MlFeatures, TimeFeatures};

pub const MIN_FEATURE_CANDLES: usize = 10;
const RECENT_WINDOW: usize = 20;
const SUPPORT_RESISTANCE_WINDOW: usize = 50;

/// Supplies the `market_sentiment` feature.
pub trait SentimentSource: Send {
    fn sample(&mut self) -> f64;
}

/// Uniform draw in [0.3, 0.7).
pub struct RandomSentiment {
    rng: StdRng,
}

impl RandomSentiment {
    pub fn new() -> Self {
        RandomSentiment { rng: StdRng::from_entropy() }
    }

    pub fn seeded(seed: u64) -> Self {
        RandomSentiment { rng: StdRng::seed_from_u64(seed) }
    }
}

impl Default for RandomSentiment {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentSource for RandomSentiment {
    fn sample(&mut self) -> f64 {
        self.rng.gen_range(0.3..0.7)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedSentiment(pub f64);

impl SentimentSource for FixedSentiment {
    fn sample(&mut self) -> f64 {
        self.0
    }
}

pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn extract(candles: &[Candle], sentiment: &mut dyn SentimentSource) -> Result<MlFeatures, EngineError> {
        ensure_len(candles.len(), MIN_FEATURE_CANDLES)?;
        let n = candles.len();
        let latest = &candles[n - 1];
        let previous_1m = &candles[n - 2];
        let previous_5m = &candles[n - 6];

        let recent = &candles[n.saturating_sub(RECENT_WINDOW)..];
        let avg_volume = recent.iter().map(|c| c.volume).sum::<f64>() / recent.len() as f64;
        let recent_closes: Vec<f64> = recent.iter().map(|c| c.close).collect();

        let ema9 = recursive_ema(&recent_closes, 9);
        let ema21 = recursive_ema(&recent_closes, 21);

        let wide = &candles[n.saturating_sub(SUPPORT_RESISTANCE_WINDOW)..];
        let resistance = wide.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
        let support = wide.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
        let support_resistance = if resistance > support {
            (latest.close - support) / (resistance - support)
        } else {
            0.5
        };

        let features = MlFeatures {
            price_change_1m: relative_change(previous_1m.close, latest.close),
            price_change_5m: relative_change(previous_5m.close, latest.close),
            volume_ratio: if avg_volume > 0.0 { latest.volume / avg_volume } else { 1.0 },
            volatility: volatility(&recent_closes),
            trend_strength: if ema21 != 0.0 { (ema9 - ema21) / ema21 } else { 0.0 },
            support_resistance,
            market_sentiment: sentiment.sample(),
            time_features: time_features(latest.timestamp),
        };
        tracing::trace!(?features, "Extracted features");
        Ok(features)
    }
}

fn relative_change(from: f64, to: f64) -> f64 {
    if from != 0.0 {
        (to - from) / from
    } else {
        0.0
    }
}

/// Population standard deviation of log returns. 0 below two prices.
pub fn volatility(prices: &[f64]) -> f64 {
    if prices.len() < 2 {
        return 0.0;
    }
    let returns: Vec<f64> = prices
        .windows(2)
        .filter(|w| w[0] > 0.0 && w[1] > 0.0)
        .map(|w| (w[1] / w[0]).ln())
        .collect();
    if returns.is_empty() {
        return 0.0;
    }
    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / returns.len() as f64;
    variance.sqrt()
}

pub fn time_features(at: DateTime<Utc>) -> TimeFeatures {
    let hour = at.hour();
    let day_of_week = at.weekday().num_days_from_sunday();
    TimeFeatures { hour, day_of_week, is_market_open: is_market_open(day_of_week, hour) }
}

/// Forex week: closed on weekends, before 01:00 Monday and after 21:00 Friday.
pub fn is_market_open(day_of_week: u32, hour: u32) -> bool {
    match day_of_week {
        0 | 6 => false,
        1 => hour >= 1,
        5 => hour <= 21,
        _ => true,
    }
}
