// Exponential Moving Average (EMA) indicator implementation
use super::IndicatorCalculator;
use shared::models::Candle;
use serde_json::Value;

pub struct Ema {
    name: String,
    period: usize,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self {
            name: format!("EMA({})", period),
            period,
        }
    }
}

/// SMA-seeded EMA over `values`, `None` until `period` values are available.
pub fn ema_series(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 || values.len() < period {
        return vec![None; values.len()];
    }

    let mut results = vec![None; period - 1];
    let multiplier = 2.0 / (period as f64 + 1.0);

    // Calculate initial SMA for the first EMA value
    let initial_sum: f64 = values.iter().take(period).sum();
    let mut previous_ema = initial_sum / period as f64;
    results.push(Some(previous_ema));

    for value in values.iter().skip(period) {
        let ema = (value - previous_ema) * multiplier + previous_ema;
        results.push(Some(ema));
        previous_ema = ema;
    }
    results
}

/// EMA seeded with the first value, so it is defined for any non-empty input.
/// Returns 0.0 for an empty slice.
pub fn recursive_ema(values: &[f64], period: usize) -> f64 {
    let Some((&first, rest)) = values.split_first() else {
        return 0.0;
    };
    let multiplier = 2.0 / (period as f64 + 1.0);
    rest.iter().fold(first, |ema, value| value * multiplier + ema * (1.0 - multiplier))
}

impl IndicatorCalculator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period })
    }

    fn calculate(&self, data: &[Candle]) -> Vec<Option<f64>> {
        let closes: Vec<f64> = data.iter().map(|c| c.close).collect();
        ema_series(&closes, self.period)
    }
}
