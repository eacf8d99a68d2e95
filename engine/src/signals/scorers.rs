// Heuristic "model" scorers. Deterministic formulas, not trained models.
use super::features::volatility;
use shared::models::{Candle, MlFeatures, TechnicalIndicators};

const SEQUENCE_WINDOW: usize = 10;

pub struct ScoringInput<'a> {
    pub features: &'a MlFeatures,
    pub indicators: &'a TechnicalIndicators,
    pub candles: &'a [Candle],
}

/// Maps features and indicators to a probability-like score in [0, 1].
pub trait HeuristicScorer: Send + Sync {
    fn name(&self) -> &str;
    fn score(&self, input: &ScoringInput<'_>) -> f64;
}

/// Momentum, volume and session-hours heuristic ("Random Forest").
pub struct MomentumScorer;

impl HeuristicScorer for MomentumScorer {
    fn name(&self) -> &str {
        "random_forest"
    }

    fn score(&self, input: &ScoringInput<'_>) -> f64 {
        let f = input.features;
        let mut score: f64 = 0.5;

        if f.price_change_1m.abs() > 0.001 {
            score += if f.price_change_1m > 0.0 { 0.1 } else { -0.1 };
        }
        if f.volume_ratio > 1.2 {
            score += 0.15;
        }
        if f.volatility > 0.02 {
            score += if f.trend_strength > 0.0 { 0.1 } else { -0.1 };
        }
        let time = f.time_features;
        if time.is_market_open && (8..=16).contains(&time.hour) {
            score += 0.05;
        }
        score.clamp(0.0, 1.0)
    }
}

/// Oscillator and trend-strength heuristic ("XGBoost").
pub struct IndicatorScorer;

impl HeuristicScorer for IndicatorScorer {
    fn name(&self) -> &str {
        "xgboost"
    }

    fn score(&self, input: &ScoringInput<'_>) -> f64 {
        let t = input.indicators;
        let f = input.features;
        let mut score: f64 = 0.5;

        if t.rsi < 30.0 {
            score += 0.2;
        } else if t.rsi > 70.0 {
            score -= 0.2;
        }

        score += if t.macd.histogram > 0.0 { 0.15 } else { -0.15 };

        // Relative price proxy; only a >5% one-minute move reaches either bound.
        let relative_price = f.price_change_1m + 1.0;
        if relative_price < 0.95 {
            score += 0.1;
        } else if relative_price > 1.05 {
            score -= 0.1;
        }

        if t.adx > 25.0 {
            score += if f.trend_strength > 0.0 { 0.1 } else { -0.1 };
        }
        score.clamp(0.0, 1.0)
    }
}

/// Up-move frequency over the last ten closes ("LSTM").
pub struct SequenceScorer;

impl HeuristicScorer for SequenceScorer {
    fn name(&self) -> &str {
        "lstm"
    }

    fn score(&self, input: &ScoringInput<'_>) -> f64 {
        let candles = input.candles;
        if candles.len() < SEQUENCE_WINDOW {
            return 0.5;
        }
        let closes: Vec<f64> = candles[candles.len() - SEQUENCE_WINDOW..].iter().map(|c| c.close).collect();
        let up_moves = closes.windows(2).filter(|w| w[1] > w[0]).count();
        let trend_score = up_moves as f64 / (SEQUENCE_WINDOW - 1) as f64;
        let volatility_score = if volatility(&closes) < 0.02 { 0.6 } else { 0.4 };
        (0.7 * trend_score + 0.3 * volatility_score).clamp(0.0, 1.0)
    }
}

pub fn default_scorers() -> Vec<Box<dyn HeuristicScorer>> {
    vec![Box::new(MomentumScorer), Box::new(IndicatorScorer), Box::new(SequenceScorer)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::fixtures::candle;
    use shared::models::{EmaPair, MacdSnapshot, TimeFeatures};

    fn features() -> MlFeatures {
        MlFeatures {
            price_change_1m: 0.0,
            price_change_5m: 0.0,
            volume_ratio: 1.0,
            volatility: 0.001,
            trend_strength: 0.0,
            support_resistance: 0.5,
            market_sentiment: 0.5,
            time_features: TimeFeatures { hour: 3, day_of_week: 3, is_market_open: true },
        }
    }

    fn indicators() -> TechnicalIndicators {
        TechnicalIndicators {
            rsi: 50.0,
            macd: MacdSnapshot { line: 0.0, signal: 0.0, histogram: 0.0 },
            ema: EmaPair { ema9: 1.08, ema21: 1.08 },
            adx: 10.0,
            bollinger_position: 0.5,
        }
    }

    fn score(scorer: &dyn HeuristicScorer, f: &MlFeatures, t: &TechnicalIndicators, candles: &[Candle]) -> f64 {
        scorer.score(&ScoringInput { features: f, indicators: t, candles })
    }

    #[test]
    fn test_momentum_neutral_is_half() {
        assert_eq!(score(&MomentumScorer, &features(), &indicators(), &[]), 0.5);
    }

    #[test]
    fn test_momentum_bullish_stack() {
        let f = MlFeatures {
            price_change_1m: 0.002,
            volume_ratio: 1.5,
            volatility: 0.03,
            trend_strength: 0.01,
            time_features: TimeFeatures { hour: 10, day_of_week: 2, is_market_open: true },
            ..features()
        };
        assert!((score(&MomentumScorer, &f, &indicators(), &[]) - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_momentum_active_hours_need_open_market() {
        let f = MlFeatures {
            time_features: TimeFeatures { hour: 10, day_of_week: 6, is_market_open: false },
            ..features()
        };
        assert_eq!(score(&MomentumScorer, &f, &indicators(), &[]), 0.5);
    }

    #[test]
    fn test_indicator_oversold_and_positive_histogram() {
        let t = TechnicalIndicators {
            rsi: 25.0,
            macd: MacdSnapshot { line: 0.001, signal: 0.0, histogram: 0.001 },
            adx: 30.0,
            ..indicators()
        };
        let f = MlFeatures { trend_strength: 0.002, ..features() };
        // 0.5 + 0.2 + 0.15 + 0.1
        assert!((score(&IndicatorScorer, &f, &t, &[]) - 0.95).abs() < 1e-12);
    }

    #[test]
    fn test_indicator_clamped_at_zero() {
        let t = TechnicalIndicators { rsi: 80.0, adx: 40.0, ..indicators() };
        let f = MlFeatures { price_change_1m: 0.2, trend_strength: -0.01, ..features() };
        // 0.5 - 0.2 - 0.15 - 0.1 - 0.1 = -0.05
        assert_eq!(score(&IndicatorScorer, &f, &t, &[]), 0.0);
    }

    #[test]
    fn test_sequence_short_history_is_half() {
        let candles: Vec<Candle> = (0..9).map(|i| candle(i, 1.08, 1.08, 1.08, 1.08, 1.0)).collect();
        assert_eq!(score(&SequenceScorer, &features(), &indicators(), &candles), 0.5);
    }

    #[test]
    fn test_sequence_steady_uptrend() {
        let candles: Vec<Candle> = (0..12)
            .map(|i| {
                let close = 1.08 + i as f64 * 0.0001;
                candle(i, close, close, close, close, 1.0)
            })
            .collect();
        // 9/9 up-moves, calm volatility: 0.7 + 0.18
        assert!((score(&SequenceScorer, &features(), &indicators(), &candles) - 0.88).abs() < 1e-12);
    }

    #[test]
    fn test_sequence_flat_prices() {
        let candles: Vec<Candle> = (0..10).map(|i| candle(i, 1.08, 1.08, 1.08, 1.08, 1.0)).collect();
        assert!((score(&SequenceScorer, &features(), &indicators(), &candles) - 0.18).abs() < 1e-12);
    }

    #[test]
    fn test_default_scorers_names() {
        let names: Vec<String> = default_scorers().iter().map(|s| s.name().to_string()).collect();
        assert_eq!(names, vec!["random_forest", "xgboost", "lstm"]);
    }
}
