// Snapshot of the latest indicator values consumed by the scorers
use super::ema::recursive_ema;
use super::{Adx, BollingerPosition, Ema, IndicatorCalculator, Macd, Rsi};
use shared::models::{Candle, EmaPair, MacdSnapshot, TechnicalIndicators};

pub struct TechnicalAnalysis {
    rsi: Rsi,
    macd: Macd,
    ema_fast: Ema,
    ema_slow: Ema,
    adx: Adx,
    bollinger: BollingerPosition,
}

impl Default for TechnicalAnalysis {
    fn default() -> Self {
        TechnicalAnalysis {
            rsi: Rsi::new(14),
            macd: Macd::new(12, 26, 9),
            ema_fast: Ema::new(9),
            ema_slow: Ema::new(21),
            adx: Adx::new(14),
            bollinger: BollingerPosition::new(20, 2.0),
        }
    }
}

impl TechnicalAnalysis {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest values over `candles`. Short series fall back to neutral readings
    /// (RSI 50, flat MACD, ADX 0, mid-band) instead of failing.
    pub fn analyze(&self, candles: &[Candle]) -> TechnicalIndicators {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();

        let rsi = self.rsi.latest(candles).unwrap_or(50.0);
        let macd = self
            .macd
            .latest_lines(candles)
            .unwrap_or(MacdSnapshot { line: 0.0, signal: 0.0, histogram: 0.0 });
        let ema = EmaPair {
            ema9: self.ema_fast.latest(candles).unwrap_or_else(|| recursive_ema(&closes, 9)),
            ema21: self.ema_slow.latest(candles).unwrap_or_else(|| recursive_ema(&closes, 21)),
        };
        let adx = self.adx.latest(candles).unwrap_or(0.0);
        let bollinger_position = self.bollinger.latest(candles).unwrap_or(0.5);

        tracing::trace!(
            candles = candles.len(),
            rsi_indicator = %self.rsi.name(),
            macd_parameters = %self.macd.parameters(),
            rsi,
            macd_histogram = macd.histogram,
            adx,
            bollinger_position,
            "Computed technical indicators"
        );

        TechnicalIndicators { rsi, macd, ema, adx, bollinger_position }
    }
}
