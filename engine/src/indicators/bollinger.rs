// Bollinger %B: where the close sits between the lower (0) and upper (1) band
use super::sma::sma_series;
use super::IndicatorCalculator;
use shared::models::Candle;
use serde_json::Value;

/// Relative deviation under which the bands count as collapsed.
const COLLAPSED_BAND_TOLERANCE: f64 = 4.0 * f64::EPSILON;

pub struct BollingerPosition {
    name: String,
    period: usize,
    std_dev: f64,
}

impl BollingerPosition {
    pub fn new(period: usize, std_dev: f64) -> Self {
        Self {
            name: format!("BB%B({},{})", period, std_dev),
            period,
            std_dev,
        }
    }
}

impl IndicatorCalculator for BollingerPosition {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period, "std_dev": self.std_dev })
    }

    fn calculate(&self, data: &[Candle]) -> Vec<Option<f64>> {
        let closes: Vec<f64> = data.iter().map(|c| c.close).collect();
        let middle = sma_series(&closes, self.period);

        middle
            .iter()
            .enumerate()
            .map(|(i, mid)| {
                let mid = (*mid)?;
                let window = &closes[i + 1 - self.period..=i];
                let variance = window.iter().map(|c| (c - mid).powi(2)).sum::<f64>() / self.period as f64;
                let deviation = variance.sqrt();
                // Identical closes leave an ulp-sized residue in the mean
                if deviation <= COLLAPSED_BAND_TOLERANCE * mid.abs().max(1.0) {
                    return Some(0.5);
                }
                let width = 2.0 * self.std_dev * deviation;
                let lower = mid - self.std_dev * deviation;
                Some((closes[i] - lower) / width)
            })
            .collect()
    }
}
