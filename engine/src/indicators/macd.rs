// Moving Average Convergence Divergence (MACD) indicator implementation
use super::ema::ema_series;
use super::IndicatorCalculator;
use shared::models::{Candle, MacdSnapshot};
use serde_json::Value;

pub struct Macd {
    name: String,
    fast: usize,
    slow: usize,
    signal: usize,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        Self {
            name: format!("MACD({},{},{})", fast, slow, signal),
            fast,
            slow,
            signal,
        }
    }

    /// MACD line, signal line and histogram per candle.
    /// Defined once `slow + signal - 1` closes are available.
    pub fn lines(&self, data: &[Candle]) -> Vec<Option<MacdSnapshot>> {
        let closes: Vec<f64> = data.iter().map(|c| c.close).collect();
        let fast = ema_series(&closes, self.fast);
        let slow = ema_series(&closes, self.slow);

        let macd_line: Vec<Option<f64>> = fast
            .iter()
            .zip(slow.iter())
            .map(|(f, s)| match (f, s) {
                (Some(f), Some(s)) => Some(f - s),
                _ => None,
            })
            .collect();

        // Signal EMA runs over the defined part of the MACD line only
        let first_defined = macd_line.iter().position(|v| v.is_some()).unwrap_or(macd_line.len());
        let defined: Vec<f64> = macd_line.iter().skip(first_defined).flatten().copied().collect();
        let signal = ema_series(&defined, self.signal);

        let mut results = vec![None; first_defined];
        for (line, signal) in defined.iter().zip(signal.iter()) {
            results.push(signal.map(|signal| MacdSnapshot {
                line: *line,
                signal,
                histogram: line - signal,
            }));
        }
        results
    }

    pub fn latest_lines(&self, data: &[Candle]) -> Option<MacdSnapshot> {
        self.lines(data).last().copied().flatten()
    }
}

impl IndicatorCalculator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "fast": self.fast, "slow": self.slow, "signal": self.signal })
    }

    /// Histogram series.
    fn calculate(&self, data: &[Candle]) -> Vec<Option<f64>> {
        self.lines(data).into_iter().map(|v| v.map(|m| m.histogram)).collect()
    }
}
