// Simple Moving Average (SMA) indicator implementation
use super::IndicatorCalculator;
use shared::models::Candle;
use serde_json::Value;

pub struct Sma {
    name: String,
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        Self {
            name: format!("SMA({})", period),
            period,
        }
    }
}

/// Rolling mean over `values`, `None` until the first full window.
pub fn sma_series(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 || values.len() < period {
        return vec![None; values.len()];
    }

    let mut results = vec![None; period - 1];
    let mut sum: f64 = values.iter().take(period).sum();
    results.push(Some(sum / period as f64));

    // Slide the window
    for i in period..values.len() {
        sum = sum - values[i - period] + values[i];
        results.push(Some(sum / period as f64));
    }
    results
}

impl IndicatorCalculator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period })
    }

    fn calculate(&self, data: &[Candle]) -> Vec<Option<f64>> {
        let closes: Vec<f64> = data.iter().map(|c| c.close).collect();
        sma_series(&closes, self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::closes;

    fn assert_opt_vec_eq(a: &[Option<f64>], b: &[Option<f64>]) {
        assert_eq!(a.len(), b.len(), "Vectors differ in length");
        for (i, (val_a, val_b)) in a.iter().zip(b.iter()).enumerate() {
            match (val_a, val_b) {
                (None, None) => {}
                (Some(x), Some(y)) => assert!((x - y).abs() < 1e-9, "Mismatch at index {}: {} != {}", i, x, y),
                _ => panic!("Mismatch at index {}: {:?} != {:?}", i, val_a, val_b),
            }
        }
    }

    #[test]
    fn test_sma_calculation() {
        let candles = closes(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let results = Sma::new(3).calculate(&candles);
        assert_opt_vec_eq(&results, &[None, None, Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn test_sma_insufficient_data() {
        let candles = closes(&[1.0, 2.0]);
        assert_opt_vec_eq(&Sma::new(3).calculate(&candles), &[None, None]);
    }

    #[test]
    fn test_sma_period_one() {
        let candles = closes(&[1.0, 2.0, 3.0]);
        assert_opt_vec_eq(&Sma::new(1).calculate(&candles), &[Some(1.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_sma_period_zero_yields_nothing() {
        let candles = closes(&[1.0, 2.0]);
        assert_opt_vec_eq(&Sma::new(0).calculate(&candles), &[None, None]);
        assert_eq!(Sma::new(0).latest(&candles), None);
    }

    #[test]
    fn test_sma_empty_data() {
        assert!(Sma::new(3).calculate(&[]).is_empty());
    }
}
