// Relative Strength Index (RSI) indicator implementation
use super::IndicatorCalculator;
use shared::models::Candle;
use serde_json::Value;

pub struct Rsi {
    name: String,
    period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self {
            name: format!("RSI({})", period),
            period,
        }
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        // No losses in the window
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

impl IndicatorCalculator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period })
    }

    fn calculate(&self, data: &[Candle]) -> Vec<Option<f64>> {
        if data.len() <= self.period || self.period == 0 {
            return vec![None; data.len()];
        }

        let mut results = vec![None; self.period]; // RSI needs 'period' initial changes

        let mut gains = 0.0;
        let mut losses = 0.0;
        for i in 1..=self.period {
            let change = data[i].close - data[i - 1].close;
            if change > 0.0 {
                gains += change;
            } else {
                losses -= change; // losses are positive values
            }
        }

        let mut avg_gain = gains / self.period as f64;
        let mut avg_loss = losses / self.period as f64;
        results.push(Some(rsi_from_averages(avg_gain, avg_loss)));

        // Wilder smoothing for the rest of the series
        for i in (self.period + 1)..data.len() {
            let change = data[i].close - data[i - 1].close;
            let (current_gain, current_loss) = if change > 0.0 { (change, 0.0) } else { (0.0, -change) };

            avg_gain = (avg_gain * (self.period - 1) as f64 + current_gain) / self.period as f64;
            avg_loss = (avg_loss * (self.period - 1) as f64 + current_loss) / self.period as f64;
            results.push(Some(rsi_from_averages(avg_gain, avg_loss)));
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::closes;

    #[test]
    fn test_rsi_reference_series_in_range() {
        let candles = closes(&[
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
            45.89, 46.03, 45.61, 46.28, 46.28, 46.00, 46.03, 46.41, 46.22, 45.64,
        ]);
        let results = Rsi::new(14).calculate(&candles);

        for value in results.iter().take(14) {
            assert_eq!(*value, None);
        }
        // Stockcharts reference values sit around 70 then 60-67 with this smoothing
        let first = results[14].unwrap();
        assert!(first > 50.0 && first < 80.0, "RSI[14] out of expected range: {}", first);
        let later = results[17].unwrap();
        assert!(later > 55.0 && later < 80.0, "RSI[17] out of expected range: {}", later);
    }

    #[test]
    fn test_rsi_insufficient_data() {
        let candles = closes(&[1.0; 10]);
        assert_eq!(Rsi::new(14).calculate(&candles), vec![None; 10]);
        assert_eq!(Rsi::new(14).latest(&candles), None);
    }

    #[test]
    fn test_rsi_all_gains() {
        let values: Vec<f64> = (1..=20).map(|i| i as f64).collect();
        let results = Rsi::new(14).calculate(&closes(&values));
        for value in results.iter().skip(14) {
            assert_eq!(*value, Some(100.0));
        }
    }

    #[test]
    fn test_rsi_all_losses() {
        let values: Vec<f64> = (1..=20).map(|i| 20.0 - i as f64).collect();
        let results = Rsi::new(14).calculate(&closes(&values));
        for value in results.iter().skip(14) {
            // avg_gain stays 0 => RS 0 => RSI 0
            assert_eq!(*value, Some(0.0));
        }
    }
}
