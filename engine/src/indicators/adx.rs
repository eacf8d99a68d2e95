// Average Directional Index (ADX), Wilder smoothing throughout
use super::IndicatorCalculator;
use shared::models::Candle;
use serde_json::Value;

pub struct Adx {
    name: String,
    period: usize,
}

impl Adx {
    pub fn new(period: usize) -> Self {
        Self {
            name: format!("ADX({})", period),
            period,
        }
    }
}

/// Wilder smoothing seeded with the mean of the first `period` values.
fn wilder_smooth(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 || values.len() < period {
        return vec![None; values.len()];
    }
    let mut results = vec![None; period - 1];
    let mut smoothed = values.iter().take(period).sum::<f64>() / period as f64;
    results.push(Some(smoothed));
    for value in values.iter().skip(period) {
        smoothed = (smoothed * (period - 1) as f64 + value) / period as f64;
        results.push(Some(smoothed));
    }
    results
}

impl IndicatorCalculator for Adx {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period })
    }

    fn calculate(&self, data: &[Candle]) -> Vec<Option<f64>> {
        let n = data.len();
        if self.period == 0 || n < 2 {
            return vec![None; n];
        }

        // Directional movement and true range per consecutive pair
        let mut plus_dm = Vec::with_capacity(n - 1);
        let mut minus_dm = Vec::with_capacity(n - 1);
        let mut true_range = Vec::with_capacity(n - 1);
        for pair in data.windows(2) {
            let (prev, cur) = (&pair[0], &pair[1]);
            let up = cur.high - prev.high;
            let down = prev.low - cur.low;
            plus_dm.push(if up > down && up > 0.0 { up } else { 0.0 });
            minus_dm.push(if down > up && down > 0.0 { down } else { 0.0 });
            true_range.push(
                (cur.high - cur.low)
                    .max((cur.high - prev.close).abs())
                    .max((cur.low - prev.close).abs()),
            );
        }

        let smooth_tr = wilder_smooth(&true_range, self.period);
        let smooth_plus = wilder_smooth(&plus_dm, self.period);
        let smooth_minus = wilder_smooth(&minus_dm, self.period);

        let dx: Vec<Option<f64>> = (0..true_range.len())
            .map(|i| match (smooth_tr[i], smooth_plus[i], smooth_minus[i]) {
                (Some(tr), Some(p), Some(m)) if tr > 0.0 => {
                    let plus_di = 100.0 * p / tr;
                    let minus_di = 100.0 * m / tr;
                    let sum = plus_di + minus_di;
                    Some(if sum == 0.0 { 0.0 } else { 100.0 * (plus_di - minus_di).abs() / sum })
                }
                (Some(_), Some(_), Some(_)) => Some(0.0),
                _ => None,
            })
            .collect();

        let first_dx = dx.iter().position(|v| v.is_some()).unwrap_or(dx.len());
        let defined: Vec<f64> = dx.iter().skip(first_dx).flatten().copied().collect();
        let adx = wilder_smooth(&defined, self.period);

        // One leading None for the first candle, which has no predecessor
        let mut results = vec![None; 1 + first_dx];
        results.extend(adx);
        results
    }
}
