// Wick + Volume Rejection Strategy (WVRS) detection and confirmation
use super::signal_id;
use crate::config::WvrsConfig;
use crate::indicators::ema::recursive_ema;
use shared::models::{Candle, ConfirmationStatus, ContextZone, TimeFrame, WvrsDirection, WvrsSignal};

/// Candles inspected for support/resistance.
const CONTEXT_WINDOW: usize = 20;
/// Zone tolerance as a fraction of the context range.
const ZONE_TOLERANCE: f64 = 0.02;
const CONTEXT_EMA_PERIOD: usize = 21;
/// Stop distance beyond the wick extreme, as a fraction of the candle range.
const STOP_BUFFER: f64 = 0.1;

const MIN_CONFIDENCE: f64 = 60.0;
const MAX_CONFIDENCE: f64 = 98.0;
const CONFIRMED_BONUS: f64 = 10.0;
const REJECTED_PENALTY: f64 = 20.0;
const REJECTED_FLOOR: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WickSide {
    Upper,
    Lower,
}

impl WickSide {
    fn label(&self) -> &'static str {
        match self {
            WickSide::Upper => "upper",
            WickSide::Lower => "lower",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandleStructure {
    pub wick_side: Option<WickSide>,
    pub wick_percentage: f64,
    pub body_size: f64,
    pub total_range: f64,
}

impl CandleStructure {
    /// The dominant wick must beat both the opposite wick and the body.
    pub fn of(candle: &Candle) -> Self {
        let total_range = candle.range();
        let body_size = candle.body();
        let upper = candle.upper_wick();
        let lower = candle.lower_wick();

        let (wick_side, wick_size) = if upper > lower && upper > body_size {
            (Some(WickSide::Upper), upper)
        } else if lower > upper && lower > body_size {
            (Some(WickSide::Lower), lower)
        } else {
            (None, 0.0)
        };

        let wick_percentage = if total_range > 0.0 { wick_size / total_range * 100.0 } else { 0.0 };
        CandleStructure { wick_side, wick_percentage, body_size, total_range }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeAnalysis {
    pub is_elevated: bool,
    pub volume_ratio: f64,
    pub volume_sma: f64,
    pub current_volume: f64,
}

pub struct WvrsDetector {
    config: WvrsConfig,
}

impl Default for WvrsDetector {
    fn default() -> Self {
        Self::new(WvrsConfig::default())
    }
}

impl WvrsDetector {
    pub fn new(config: WvrsConfig) -> Self {
        WvrsDetector { config }
    }

    pub fn config(&self) -> &WvrsConfig {
        &self.config
    }

    /// Runs the detector on the last candle of `candles`.
    ///
    /// Returns `None` when the series is shorter than `volume_sma_period + 2`,
    /// the timeframe is not enabled, the wick is below `min_wick_percentage`
    /// or volume is not elevated.
    pub fn analyze(&self, candles: &[Candle], timeframe: TimeFrame) -> Option<WvrsSignal> {
        if candles.len() < self.config.min_candles() {
            tracing::trace!(candles = candles.len(), required = self.config.min_candles(), "WVRS: not enough candles");
            return None;
        }
        if !self.config.timeframes.contains(&timeframe) {
            tracing::debug!(%timeframe, "WVRS: timeframe not enabled");
            return None;
        }

        let current = candles.last()?;
        let structure = CandleStructure::of(current);
        let wick_side = match structure.wick_side {
            Some(side) if structure.wick_percentage >= self.config.min_wick_percentage => side,
            _ => {
                tracing::trace!(wick_percentage = structure.wick_percentage, "WVRS: no significant wick");
                return None;
            }
        };

        let volume = self.analyze_volume(candles);
        if !volume.is_elevated {
            tracing::debug!(
                volume = volume.current_volume,
                volume_sma = volume.volume_sma,
                "WVRS: wick found but volume not elevated"
            );
            return None;
        }

        let zone = detect_context_zone(candles);
        let mut signal = self.build_signal(current, &structure, wick_side, &volume, zone, timeframe);
        signal.confidence = self.confidence(&structure, &volume, zone, timeframe);

        tracing::debug!(
            direction = %signal.direction,
            confidence = signal.confidence,
            wick_percentage = signal.wick_percentage,
            volume_ratio = signal.volume_ratio,
            zone = ?signal.context_zone,
            "WVRS signal detected"
        );
        Some(signal)
    }

    /// Volume of the last candle against the mean of the `volume_sma_period`
    /// candles before it, and against the previous candle alone.
    pub fn analyze_volume(&self, candles: &[Candle]) -> VolumeAnalysis {
        let n = candles.len();
        let current_volume = candles.last().map_or(0.0, |c| c.volume);
        let previous_volume = if n >= 2 { candles[n - 2].volume } else { 0.0 };

        let start = n.saturating_sub(self.config.volume_sma_period + 1);
        let history = &candles[start..n.saturating_sub(1)];
        let volume_sma = if history.is_empty() {
            0.0
        } else {
            history.iter().map(|c| c.volume).sum::<f64>() / history.len() as f64
        };

        let is_elevated = current_volume > volume_sma
            || current_volume >= previous_volume * self.config.min_volume_multiplier;
        let volume_ratio = if volume_sma > 0.0 { current_volume / volume_sma } else { 1.0 };

        VolumeAnalysis { is_elevated, volume_ratio, volume_sma, current_volume }
    }

    fn build_signal(
        &self,
        candle: &Candle,
        structure: &CandleStructure,
        wick_side: WickSide,
        volume: &VolumeAnalysis,
        zone: Option<ContextZone>,
        timeframe: TimeFrame,
    ) -> WvrsSignal {
        let direction = match wick_side {
            WickSide::Lower => WvrsDirection::Buy,
            WickSide::Upper => WvrsDirection::Sell,
        };
        let entry_price = candle.close;
        let stop_loss = match direction {
            WvrsDirection::Buy => candle.low - candle.range() * STOP_BUFFER,
            WvrsDirection::Sell => candle.high + candle.range() * STOP_BUFFER,
        };

        let risk = (entry_price - stop_loss).abs();
        let ratios = self.config.risk_reward_ratios;
        let target = |ratio: f64| match direction {
            WvrsDirection::Buy => entry_price + risk * ratio,
            WvrsDirection::Sell => entry_price - risk * ratio,
        };

        let key = format!("{}:{}:{}", candle.symbol, candle.timestamp.timestamp_millis(), direction);
        WvrsSignal {
            id: signal_id("wvrs", &key),
            timestamp: candle.timestamp,
            direction,
            confidence: 0.0,
            entry_price,
            stop_loss,
            take_profit_1: target(ratios.tp1),
            take_profit_2: target(ratios.tp2),
            expiration_minutes: self.expiration_minutes(timeframe),
            wick_percentage: structure.wick_percentage,
            volume_ratio: volume.volume_ratio,
            context_zone: zone,
            confirmation_status: ConfirmationStatus::Pending,
            reasoning: reasoning(wick_side, structure, volume, zone, direction),
        }
    }

    fn expiration_minutes(&self, timeframe: TimeFrame) -> u32 {
        let options = self.config.binary_options;
        if options.enabled {
            options.expiration_candles * timeframe.minutes()
        } else {
            timeframe.expiration_minutes()
        }
    }

    /// Additive score clamped to [60, 98].
    pub fn confidence(
        &self,
        structure: &CandleStructure,
        volume: &VolumeAnalysis,
        zone: Option<ContextZone>,
        timeframe: TimeFrame,
    ) -> f64 {
        let mut confidence: f64 = 50.0;

        if structure.wick_percentage >= 70.0 {
            confidence += 20.0;
        } else if structure.wick_percentage >= 60.0 {
            confidence += 15.0;
        }

        if volume.volume_ratio >= 2.0 {
            confidence += 20.0;
        } else if volume.volume_ratio >= 1.5 {
            confidence += 15.0;
        }

        confidence += match zone {
            Some(ContextZone::Support) | Some(ContextZone::Resistance) => 15.0,
            Some(ContextZone::Ema) | Some(ContextZone::Fibonacci) => 10.0,
            None => 0.0,
        };

        confidence += match timeframe {
            TimeFrame::M5 | TimeFrame::M15 => 10.0,
            TimeFrame::H1 | TimeFrame::H4 => 5.0,
            TimeFrame::M1 => 0.0,
        };

        if structure.wick_percentage < 65.0 {
            confidence -= 10.0;
        }

        confidence.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
    }

    /// Applies the candle following the signal. Returns a new value, `signal`
    /// is left untouched.
    ///
    /// A close beyond the entry in the signal direction confirms it, a close
    /// beyond the stop rejects it, anything in between stays PENDING.
    pub fn confirm(&self, signal: &WvrsSignal, next: &Candle) -> WvrsSignal {
        let mut updated = signal.clone();
        let (continued, stopped, confirmation) = match signal.direction {
            WvrsDirection::Buy => (
                next.close > signal.entry_price,
                next.close < signal.stop_loss,
                "Confirmation: next candle broke higher",
            ),
            WvrsDirection::Sell => (
                next.close < signal.entry_price,
                next.close > signal.stop_loss,
                "Confirmation: next candle broke lower",
            ),
        };

        if continued {
            updated.confirmation_status = ConfirmationStatus::Confirmed;
            updated.confidence = (signal.confidence + CONFIRMED_BONUS).min(MAX_CONFIDENCE);
            updated.reasoning.push(confirmation.to_string());
        } else if stopped {
            updated.confirmation_status = ConfirmationStatus::Rejected;
            updated.confidence = (signal.confidence - REJECTED_PENALTY).max(REJECTED_FLOOR);
            updated.reasoning.push("Rejection: stop loss hit".to_string());
        }
        updated
    }
}

/// Support/resistance over the last 20 candles, then the 21-period EMA of
/// all closes. FIBONACCI is never produced here.
pub fn detect_context_zone(candles: &[Candle]) -> Option<ContextZone> {
    let current_price = candles.last()?.close;
    let recent = &candles[candles.len().saturating_sub(CONTEXT_WINDOW)..];

    let resistance = recent.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
    let support = recent.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
    let tolerance = (resistance - support) * ZONE_TOLERANCE;

    if (current_price - resistance).abs() <= tolerance {
        return Some(ContextZone::Resistance);
    }
    if (current_price - support).abs() <= tolerance {
        return Some(ContextZone::Support);
    }

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let ema = recursive_ema(&closes, CONTEXT_EMA_PERIOD);
    if (current_price - ema).abs() <= tolerance {
        return Some(ContextZone::Ema);
    }
    None
}

fn reasoning(
    wick_side: WickSide,
    structure: &CandleStructure,
    volume: &VolumeAnalysis,
    zone: Option<ContextZone>,
    direction: WvrsDirection,
) -> Vec<String> {
    let mut reasons = vec![
        format!("{} wick of {:.1}% detected", capitalize(wick_side.label()), structure.wick_percentage),
        format!("Volume {:.2}x above average", volume.volume_ratio),
    ];
    if let Some(zone) = zone {
        reasons.push(format!("{} zone identified - likely institutional rejection", zone));
    }
    reasons.push(format!("{} signal - major intervention detected", direction));
    if structure.wick_percentage >= 70.0 {
        reasons.push("Extreme wick (>70%) - very strong signal".to_string());
    }
    if volume.volume_ratio >= 2.0 {
        reasons.push("Abnormally high volume - institutional confirmation".to_string());
    }
    reasons
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
