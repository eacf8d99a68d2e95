// Blends WVRS detections and heuristic scores into a single AiSignal
use super::features::{FeatureExtractor, SentimentSource};
use super::scorers::{default_scorers, HeuristicScorer, ScoringInput};
use super::signal_id;
use super::wvrs::WvrsDetector;
use crate::config::EngineSettings;
use crate::error::EngineError;
use crate::indicators::TechnicalAnalysis;
use shared::models::{
    AiSignal, Candle, MlFeatures, RiskLevel, SignalDirection, SignalScore, TechnicalIndicators, WvrsSignal,
};

const WEIGHT_BASE: f64 = 0.25;
const WEIGHT_TECHNICAL: f64 = 0.30;
const WEIGHT_ML: f64 = 0.25;
const WEIGHT_VOLUME: f64 = 0.15;
const WEIGHT_TREND: f64 = 0.05;

const WVRS_BONUS_WEIGHT: f64 = 0.2;
const WVRS_PRESENCE_BONUS: f64 = 10.0;
const MAX_CONFIDENCE: f64 = 98.0;

const STRONG_TECHNICAL_SCORE: f64 = 0.9;
const STRONG_TREND_SCORE: f64 = 0.8;

/// Score components before weighting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreComponents {
    pub base_probability: f64,
    pub technical_score: f64,
    pub ml_confidence: f64,
    pub volume_score: f64,
    pub trend_score: f64,
}

impl ScoreComponents {
    pub fn weighted_confidence(&self) -> f64 {
        100.0
            * (WEIGHT_BASE * self.base_probability
                + WEIGHT_TECHNICAL * self.technical_score
                + WEIGHT_ML * self.ml_confidence
                + WEIGHT_VOLUME * self.volume_score
                + WEIGHT_TREND * self.trend_score)
    }

    /// Weighted confidence and the risk tier it falls in.
    pub fn blend(&self) -> SignalScore {
        let final_confidence = self.weighted_confidence();
        SignalScore {
            base_probability: self.base_probability,
            technical_score: self.technical_score,
            ml_confidence: self.ml_confidence,
            volume_score: self.volume_score,
            trend_score: self.trend_score,
            final_confidence,
            risk_level: RiskLevel::from_confidence(final_confidence),
        }
    }
}

pub struct SignalComposer {
    settings: EngineSettings,
    detector: WvrsDetector,
    analysis: TechnicalAnalysis,
    scorers: Vec<Box<dyn HeuristicScorer>>,
    sentiment: Box<dyn SentimentSource>,
}

impl SignalComposer {
    pub fn new(settings: EngineSettings, sentiment: Box<dyn SentimentSource>) -> Self {
        Self::with_scorers(settings, sentiment, default_scorers())
    }

    pub fn with_scorers(
        settings: EngineSettings,
        sentiment: Box<dyn SentimentSource>,
        scorers: Vec<Box<dyn HeuristicScorer>>,
    ) -> Self {
        SignalComposer {
            detector: WvrsDetector::new(settings.wvrs.clone()),
            analysis: TechnicalAnalysis::new(),
            settings,
            scorers,
            sentiment,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Runs one evaluation over `candles`. `None` when nothing clears the
    /// confidence threshold or when any stage fails.
    pub fn compose(&mut self, pair: &str, candles: &[Candle]) -> Option<AiSignal> {
        match self.try_compose(pair, candles) {
            Ok(signal) => signal,
            Err(err) if err.is_insufficient_data() => {
                tracing::debug!(symbol = %pair, error = %err, "Skipping signal composition");
                None
            }
            Err(err) => {
                tracing::warn!(symbol = %pair, error = %err, "Signal composition failed");
                None
            }
        }
    }

    pub fn try_compose(&mut self, pair: &str, candles: &[Candle]) -> Result<Option<AiSignal>, EngineError> {
        let wvrs = self.detector.analyze(candles, self.settings.timeframe);
        let features = FeatureExtractor::extract(candles, self.sentiment.as_mut())?;
        let indicators = self.analysis.analyze(candles);

        let signal = match wvrs {
            Some(ref wvrs) if wvrs.confidence >= self.settings.strong_wvrs_confidence => {
                compose_from_wvrs(pair, wvrs, features, indicators)
            }
            _ => match self.compose_blended(pair, candles, wvrs.as_ref(), features, indicators)? {
                Some(signal) => signal,
                None => return Ok(None),
            },
        };

        if signal.signal_score.final_confidence < self.settings.confidence_threshold {
            tracing::debug!(
                symbol = %pair,
                confidence = signal.signal_score.final_confidence,
                threshold = self.settings.confidence_threshold,
                "Signal below confidence threshold"
            );
            return Ok(None);
        }
        Ok(Some(signal))
    }

    fn compose_blended(
        &self,
        pair: &str,
        candles: &[Candle],
        wvrs: Option<&WvrsSignal>,
        features: MlFeatures,
        indicators: TechnicalIndicators,
    ) -> Result<Option<AiSignal>, EngineError> {
        let latest = match candles.last() {
            Some(candle) => candle,
            None => return Ok(None),
        };
        if self.scorers.is_empty() {
            return Err(EngineError::ComputationFailure("no heuristic scorers configured".to_string()));
        }

        let input = ScoringInput { features: &features, indicators: &indicators, candles };
        let scores: Vec<f64> = self.scorers.iter().map(|scorer| scorer.score(&input)).collect();
        if let Some(bad) = scores.iter().position(|s| !s.is_finite()) {
            return Err(EngineError::ComputationFailure(format!(
                "scorer {} produced a non-finite score",
                self.scorers[bad].name()
            )));
        }

        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        let ml_confidence = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let wvrs_bonus = wvrs.map_or(0.0, |w| w.confidence / 100.0 * WVRS_BONUS_WEIGHT);

        let components = ScoreComponents {
            base_probability: (mean + wvrs_bonus).min(1.0),
            technical_score: technical_score(&indicators),
            ml_confidence,
            volume_score: (features.volume_ratio / 2.0).min(1.0),
            trend_score: features.trend_strength.abs() * 10.0,
        };
        let mut score = components.blend();
        if wvrs.is_some() {
            score.final_confidence = (score.final_confidence + WVRS_PRESENCE_BONUS).min(MAX_CONFIDENCE);
        }
        if !score.final_confidence.is_finite() {
            return Err(EngineError::ComputationFailure("non-finite final confidence".to_string()));
        }

        tracing::debug!(
            symbol = %pair,
            scores = ?scores,
            final_confidence = score.final_confidence,
            wvrs_present = wvrs.is_some(),
            "Blended heuristic scores"
        );

        let direction = match wvrs {
            Some(w) => SignalDirection::from(w.direction),
            None if score.base_probability > 0.5 => SignalDirection::Call,
            None => SignalDirection::Put,
        };

        let entry_price = latest.close;
        let (target_price, stop_loss) = match wvrs {
            Some(w) => (w.take_profit_1, w.stop_loss),
            None => {
                let target_distance = features.volatility * 2.0;
                let stop_distance = features.volatility * 1.5;
                match direction {
                    SignalDirection::Call => (entry_price * (1.0 + target_distance), entry_price * (1.0 - stop_distance)),
                    SignalDirection::Put => (entry_price * (1.0 - target_distance), entry_price * (1.0 + stop_distance)),
                }
            }
        };

        let reasoning = match wvrs {
            Some(w) => weak_wvrs_reasoning(w),
            None => indicator_reasoning(&indicators, &features),
        };

        let key = format!("{}:{}", pair, latest.timestamp.timestamp_millis());
        Ok(Some(AiSignal {
            id: signal_id("signal", &key),
            pair: pair.to_string(),
            direction,
            confidence: round_confidence(score.final_confidence),
            entry_price,
            target_price,
            stop_loss,
            expiration: expiration_for(score.final_confidence),
            technical_indicators: indicators,
            ml_features: features,
            signal_score: score,
            timestamp: latest.timestamp,
            reasoning,
        }))
    }
}

/// Signal taken straight from a strong WVRS detection: prices, expiration and
/// id are the detection's own.
pub fn compose_from_wvrs(
    pair: &str,
    wvrs: &WvrsSignal,
    features: MlFeatures,
    indicators: TechnicalIndicators,
) -> AiSignal {
    let base = wvrs.confidence / 100.0;
    let signal_score = SignalScore {
        base_probability: base,
        technical_score: STRONG_TECHNICAL_SCORE,
        ml_confidence: base,
        volume_score: (wvrs.volume_ratio / 2.0).min(1.0),
        trend_score: STRONG_TREND_SCORE,
        final_confidence: wvrs.confidence,
        risk_level: RiskLevel::from_wvrs_confidence(wvrs.confidence),
    };

    let mut reasoning = Vec::with_capacity(wvrs.reasoning.len() + 5);
    reasoning.push("WVRS Strategy - institutional wick detected".to_string());
    reasoning.extend(wvrs.reasoning.iter().cloned());
    reasoning.push(format!("WVRS confidence: {}%", wvrs.confidence));
    reasoning.push(format!("Wick: {:.1}%", wvrs.wick_percentage));
    reasoning.push(format!("Volume: {:.2}x", wvrs.volume_ratio));
    if let Some(zone) = wvrs.context_zone {
        reasoning.push(format!("Zone: {}", zone));
    }

    tracing::info!(
        symbol = %pair,
        direction = %wvrs.direction,
        confidence = wvrs.confidence,
        "Strong WVRS detection drives the signal"
    );

    AiSignal {
        id: wvrs.id.clone(),
        pair: pair.to_string(),
        direction: SignalDirection::from(wvrs.direction),
        confidence: round_confidence(wvrs.confidence),
        entry_price: wvrs.entry_price,
        target_price: wvrs.take_profit_1,
        stop_loss: wvrs.stop_loss,
        expiration: wvrs.expiration_minutes,
        technical_indicators: indicators,
        ml_features: features,
        signal_score,
        timestamp: wvrs.timestamp,
        reasoning,
    }
}

/// RSI, MACD, Bollinger, EMA and ADX composite in [0, 1].
pub fn technical_score(indicators: &TechnicalIndicators) -> f64 {
    let mut score: f64 = 0.5;

    if indicators.rsi < 30.0 {
        score += 0.2;
    } else if indicators.rsi > 70.0 {
        score -= 0.2;
    } else if (40.0..=60.0).contains(&indicators.rsi) {
        score += 0.1;
    }

    score += if indicators.macd.histogram > 0.0 { 0.15 } else { -0.15 };

    if indicators.bollinger_position < 0.2 {
        score += 0.1;
    } else if indicators.bollinger_position > 0.8 {
        score -= 0.1;
    }

    score += if indicators.ema.ema9 > indicators.ema.ema21 { 0.1 } else { -0.1 };

    if indicators.adx > 25.0 {
        score += 0.05;
    }
    score.clamp(0.0, 1.0)
}

/// Minutes to expiry for a blended signal.
pub fn expiration_for(final_confidence: f64) -> u32 {
    if final_confidence >= 90.0 {
        1
    } else if final_confidence >= 80.0 {
        3
    } else {
        5
    }
}

fn round_confidence(confidence: f64) -> u8 {
    confidence.round().clamp(0.0, 100.0) as u8
}

fn weak_wvrs_reasoning(wvrs: &WvrsSignal) -> Vec<String> {
    let mut reasons = vec![
        "WVRS Strategy - institutional signal detected".to_string(),
        format!("Wick {:.1}% - zone rejection", wvrs.wick_percentage),
        format!("Volume {:.2}x - major intervention", wvrs.volume_ratio),
    ];
    if let Some(zone) = wvrs.context_zone {
        reasons.push(format!("Zone {} - favorable context", zone));
    }
    reasons
}

fn indicator_reasoning(indicators: &TechnicalIndicators, features: &MlFeatures) -> Vec<String> {
    let mut reasons = Vec::new();

    if indicators.rsi < 30.0 {
        reasons.push(format!("RSI oversold ({:.1}) - potential buy signal", indicators.rsi));
    } else if indicators.rsi > 70.0 {
        reasons.push(format!("RSI overbought ({:.1}) - potential sell signal", indicators.rsi));
    }

    if indicators.macd.histogram > 0.0 {
        reasons.push("MACD above signal line - bullish momentum".to_string());
    } else {
        reasons.push("MACD below signal line - bearish momentum".to_string());
    }

    if features.volume_ratio > 1.5 {
        reasons.push(format!(
            "High volume ({:.0}% of average) - move confirmed",
            features.volume_ratio * 100.0
        ));
    }

    if features.trend_strength.abs() > 0.01 {
        let trend = if features.trend_strength > 0.0 { "Bullish" } else { "Bearish" };
        reasons.push(format!("{} trend confirmed by EMAs", trend));
    }

    if indicators.adx > 25.0 {
        reasons.push(format!("Strong trend strength (ADX: {:.1}) - directional move", indicators.adx));
    }
    reasons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::features::FixedSentiment;
    use crate::signals::fixtures::{base_candle, candle, lower_wick_series};
    use shared::models::{ConfirmationStatus, ContextZone, EmaPair, MacdSnapshot, TimeFeatures, WvrsDirection};

    fn composer(settings: EngineSettings) -> SignalComposer {
        SignalComposer::new(settings, Box::new(FixedSentiment(0.5)))
    }

    fn permissive() -> EngineSettings {
        EngineSettings { confidence_threshold: 0.0, ..EngineSettings::default() }
    }

    /// 62.5% lower wick on 1.6x volume, WVRS confidence 80.
    fn weak_wick_series() -> Vec<Candle> {
        let mut candles: Vec<Candle> = (0..11).map(base_candle).collect();
        candles.push(candle(11, 1.07925, 1.0800, 1.0780, 1.0793, 1600.0));
        candles
    }

    fn neutral_indicators() -> TechnicalIndicators {
        TechnicalIndicators {
            rsi: 50.0,
            macd: MacdSnapshot { line: 0.0, signal: 0.0, histogram: 0.0 },
            ema: EmaPair { ema9: 1.08, ema21: 1.08 },
            adx: 0.0,
            bollinger_position: 0.5,
        }
    }

    fn neutral_features() -> MlFeatures {
        MlFeatures {
            price_change_1m: 0.0,
            price_change_5m: 0.0,
            volume_ratio: 1.0,
            volatility: 0.0,
            trend_strength: 0.0,
            support_resistance: 0.5,
            market_sentiment: 0.5,
            time_features: TimeFeatures { hour: 9, day_of_week: 3, is_market_open: true },
        }
    }

    #[test]
    fn test_scenario_wvrs_confidence_92_drives_signal() {
        let wvrs = WvrsSignal {
            id: "wvrs_fixture".to_string(),
            timestamp: base_candle(0).timestamp,
            direction: WvrsDirection::Buy,
            confidence: 92.0,
            entry_price: 1.08,
            stop_loss: 1.079,
            take_profit_1: 1.081,
            take_profit_2: 1.082,
            expiration_minutes: 10,
            wick_percentage: 75.0,
            volume_ratio: 2.4,
            context_zone: Some(ContextZone::Support),
            confirmation_status: ConfirmationStatus::Pending,
            reasoning: vec!["Lower wick of 75.0% detected".to_string()],
        };
        let signal = compose_from_wvrs("EUR/USD", &wvrs, neutral_features(), neutral_indicators());

        assert_eq!(signal.confidence, 92);
        assert_eq!(signal.direction, SignalDirection::Call);
        assert_eq!(signal.signal_score.technical_score, 0.9);
        assert_eq!(signal.signal_score.trend_score, 0.8);
        assert_eq!(signal.signal_score.volume_score, 1.0);
        assert_eq!(signal.signal_score.risk_level, RiskLevel::Low);
        assert_eq!(signal.id, "wvrs_fixture");
        assert_eq!(signal.target_price, 1.081);
        assert_eq!(signal.stop_loss, 1.079);
        assert_eq!(signal.expiration, 10);
        assert_eq!(
            signal.reasoning,
            vec![
                "WVRS Strategy - institutional wick detected",
                "Lower wick of 75.0% detected",
                "WVRS confidence: 92%",
                "Wick: 75.0%",
                "Volume: 2.40x",
                "Zone: SUPPORT",
            ]
        );
    }

    #[test]
    fn test_strong_detection_on_wick_series() {
        let candles = lower_wick_series();
        let signal = composer(EngineSettings::default()).compose("EUR/USD", &candles).unwrap();

        assert_eq!(signal.direction, SignalDirection::Call);
        assert_eq!(signal.confidence, 98);
        assert_eq!(signal.signal_score.risk_level, RiskLevel::Low);
        assert_eq!(signal.signal_score.technical_score, 0.9);
        assert!((signal.stop_loss - 1.0778).abs() < 1e-9);
        assert_eq!(signal.expiration, 10);
        assert_eq!(signal.timestamp, candles[11].timestamp);
        assert!(signal.id.starts_with("wvrs_"));
    }

    #[test]
    fn test_compose_is_idempotent_with_fixed_sentiment() {
        let candles = lower_wick_series();
        let mut engine = composer(EngineSettings::default());
        assert_eq!(engine.compose("EUR/USD", &candles), engine.compose("EUR/USD", &candles));

        let mut engine = composer(permissive());
        let quiet: Vec<Candle> = (0..30).map(base_candle).collect();
        let first = engine.compose("EUR/USD", &quiet).unwrap();
        assert_eq!(Some(first), engine.compose("EUR/USD", &quiet));
    }

    #[test]
    fn test_blended_confidence_matches_weights_without_wvrs() {
        let candles: Vec<Candle> = (0..30).map(base_candle).collect();
        let signal = composer(permissive()).compose("EUR/USD", &candles).unwrap();
        let s = signal.signal_score;
        let expected = 100.0
            * (0.25 * s.base_probability
                + 0.30 * s.technical_score
                + 0.25 * s.ml_confidence
                + 0.15 * s.volume_score
                + 0.05 * s.trend_score);
        assert!((s.final_confidence - expected).abs() < 1e-9);
        assert_eq!(s.risk_level, RiskLevel::from_confidence(s.final_confidence));
        assert_eq!(signal.confidence, s.final_confidence.round() as u8);
        assert_eq!(signal.expiration, expiration_for(s.final_confidence));
        assert!(signal.reasoning.iter().any(|r| r == "MACD below signal line - bearish momentum"));
    }

    #[test]
    fn test_blended_prices_follow_volatility() {
        let candles: Vec<Candle> = (0..30).map(base_candle).collect();
        let signal = composer(permissive()).compose("EUR/USD", &candles).unwrap();
        let vol = signal.ml_features.volatility;
        let entry = candles[29].close;
        assert_eq!(signal.entry_price, entry);
        match signal.direction {
            SignalDirection::Call => {
                assert!((signal.target_price - entry * (1.0 + 2.0 * vol)).abs() < 1e-12);
                assert!((signal.stop_loss - entry * (1.0 - 1.5 * vol)).abs() < 1e-12);
            }
            SignalDirection::Put => {
                assert!((signal.target_price - entry * (1.0 - 2.0 * vol)).abs() < 1e-12);
                assert!((signal.stop_loss - entry * (1.0 + 1.5 * vol)).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_weak_wvrs_adds_bonus_and_takes_its_levels() {
        let candles = weak_wick_series();
        let wvrs = WvrsDetector::default().analyze(&candles, shared::models::TimeFrame::M5).unwrap();
        assert_eq!(wvrs.confidence, 80.0);

        let signal = composer(permissive()).compose("EUR/USD", &candles).unwrap();
        let s = signal.signal_score;
        let components = ScoreComponents {
            base_probability: s.base_probability,
            technical_score: s.technical_score,
            ml_confidence: s.ml_confidence,
            volume_score: s.volume_score,
            trend_score: s.trend_score,
        };
        let pre_bonus = components.weighted_confidence();
        assert!((s.final_confidence - (pre_bonus + 10.0).min(98.0)).abs() < 1e-9);
        assert_eq!(s.risk_level, RiskLevel::from_confidence(pre_bonus));

        assert_eq!(signal.direction, SignalDirection::Call);
        assert_eq!(signal.target_price, wvrs.take_profit_1);
        assert_eq!(signal.stop_loss, wvrs.stop_loss);
        assert_eq!(signal.reasoning[0], "WVRS Strategy - institutional signal detected");
        assert_eq!(signal.reasoning[1], "Wick 62.5% - zone rejection");
        assert_eq!(signal.reasoning[2], "Volume 1.60x - major intervention");
        assert!(signal.id.starts_with("signal_"));
    }

    #[test]
    fn test_never_returns_below_threshold() {
        let series: Vec<Vec<Candle>> = vec![
            lower_wick_series(),
            weak_wick_series(),
            (0..30).map(base_candle).collect(),
            (0..40)
                .map(|i| {
                    let close = 1.08 + i as f64 * 0.0003;
                    candle(i, close - 0.0002, close + 0.0001, close - 0.0003, close, 1000.0 + i as f64 * 50.0)
                })
                .collect(),
        ];
        for threshold in [60.0, 75.0, 90.0, 99.0] {
            let settings = EngineSettings { confidence_threshold: threshold, ..EngineSettings::default() };
            let mut engine = composer(settings);
            for candles in &series {
                if let Some(signal) = engine.compose("EUR/USD", candles) {
                    assert!(signal.signal_score.final_confidence >= threshold);
                }
            }
        }
    }

    #[test]
    fn test_insufficient_candles_return_none() {
        let candles: Vec<Candle> = (0..9).map(base_candle).collect();
        let mut engine = composer(permissive());
        assert!(engine.compose("EUR/USD", &candles).is_none());
        let err = engine.try_compose("EUR/USD", &candles).unwrap_err();
        assert!(err.is_insufficient_data());
        assert!(engine.compose("EUR/USD", &[]).is_none());
    }

    #[test]
    fn test_no_scorers_is_computation_failure() {
        let candles: Vec<Candle> = (0..30).map(base_candle).collect();
        let mut engine = SignalComposer::with_scorers(permissive(), Box::new(FixedSentiment(0.5)), Vec::new());
        let err = engine.try_compose("EUR/USD", &candles).unwrap_err();
        assert!(matches!(err, EngineError::ComputationFailure(_)));
        assert!(engine.compose("EUR/USD", &candles).is_none());
    }

    #[test]
    fn test_technical_score_table() {
        assert!((technical_score(&neutral_indicators()) - 0.35).abs() < 1e-12);

        let bullish = TechnicalIndicators {
            rsi: 25.0,
            macd: MacdSnapshot { line: 0.001, signal: 0.0, histogram: 0.001 },
            ema: EmaPair { ema9: 1.09, ema21: 1.08 },
            adx: 30.0,
            bollinger_position: 0.1,
        };
        assert_eq!(technical_score(&bullish), 1.0);

        let bearish = TechnicalIndicators {
            rsi: 75.0,
            bollinger_position: 0.9,
            ..neutral_indicators()
        };
        assert_eq!(technical_score(&bearish), 0.0);
    }

    #[test]
    fn test_expiration_breakpoints() {
        assert_eq!(expiration_for(95.0), 1);
        assert_eq!(expiration_for(90.0), 1);
        assert_eq!(expiration_for(85.0), 3);
        assert_eq!(expiration_for(80.0), 3);
        assert_eq!(expiration_for(79.9), 5);
        assert_eq!(expiration_for(75.0), 5);
    }

    #[test]
    fn test_indicator_reasoning_order() {
        let indicators = TechnicalIndicators {
            rsi: 25.0,
            macd: MacdSnapshot { line: 0.001, signal: 0.0, histogram: 0.001 },
            adx: 31.0,
            ..neutral_indicators()
        };
        let features = MlFeatures { volume_ratio: 1.8, trend_strength: -0.02, ..neutral_features() };
        assert_eq!(
            indicator_reasoning(&indicators, &features),
            vec![
                "RSI oversold (25.0) - potential buy signal",
                "MACD above signal line - bullish momentum",
                "High volume (180% of average) - move confirmed",
                "Bearish trend confirmed by EMAs",
                "Strong trend strength (ADX: 31.0) - directional move",
            ]
        );
    }
}
