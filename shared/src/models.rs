use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One OHLCV bucket. `high`/`low` bound both `open` and `close`, volume is non-negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn upper_wick(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    pub fn lower_wick(&self) -> f64 {
        self.open.min(self.close) - self.low
    }

    /// Checks the OHLCV invariant.
    pub fn is_consistent(&self) -> bool {
        self.high >= self.open.max(self.close)
            && self.low <= self.open.min(self.close)
            && self.volume >= 0.0
    }
}

/// Raw sample as delivered by a market data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketDataPoint {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub bid: f64,
    pub ask: f64,
    pub spread: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TimeFrame {
    M1,
    M5,
    M15,
    H1,
    H4,
}

impl TimeFrame {
    /// Candle duration.
    pub fn minutes(&self) -> u32 {
        match self {
            TimeFrame::M1 => 1,
            TimeFrame::M5 => 5,
            TimeFrame::M15 => 15,
            TimeFrame::H1 => 60,
            TimeFrame::H4 => 240,
        }
    }

    /// Binary-options expiration used for signals detected on this timeframe.
    pub fn expiration_minutes(&self) -> u32 {
        match self {
            TimeFrame::M1 => 2,
            TimeFrame::M5 => 10,
            TimeFrame::M15 => 30,
            TimeFrame::H1 => 120,
            TimeFrame::H4 => 480,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFrame::M1 => "M1",
            TimeFrame::M5 => "M5",
            TimeFrame::M15 => "M15",
            TimeFrame::H1 => "H1",
            TimeFrame::H4 => "H4",
        }
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeFrame {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "M1" => Ok(TimeFrame::M1),
            "M5" => Ok(TimeFrame::M5),
            "M15" => Ok(TimeFrame::M15),
            "H1" => Ok(TimeFrame::H1),
            "H4" => Ok(TimeFrame::H4),
            other => Err(format!("Unknown timeframe '{}'. Use M1, M5, M15, H1 or H4.", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdSnapshot {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmaPair {
    pub ema9: f64,
    pub ema21: f64,
}

/// Latest indicator values over a candle series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TechnicalIndicators {
    pub rsi: f64,
    pub macd: MacdSnapshot,
    pub ema: EmaPair,
    pub adx: f64,
    /// Close position inside the Bollinger bands, 0 = lower band, 1 = upper band.
    pub bollinger_position: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeFeatures {
    pub hour: u32,
    /// 0 = Sunday.
    pub day_of_week: u32,
    pub is_market_open: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MlFeatures {
    pub price_change_1m: f64,
    pub price_change_5m: f64,
    pub volume_ratio: f64,
    pub volatility: f64,
    pub trend_strength: f64,
    pub support_resistance: f64,
    pub market_sentiment: f64,
    pub time_features: TimeFeatures,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WvrsDirection {
    Buy,
    Sell,
}

impl fmt::Display for WvrsDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WvrsDirection::Buy => f.write_str("BUY"),
            WvrsDirection::Sell => f.write_str("SELL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContextZone {
    Support,
    Resistance,
    /// Declared category; no detector currently produces it.
    Fibonacci,
    Ema,
}

impl fmt::Display for ContextZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ContextZone::Support => "SUPPORT",
            ContextZone::Resistance => "RESISTANCE",
            ContextZone::Fibonacci => "FIBONACCI",
            ContextZone::Ema => "EMA",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfirmationStatus {
    Pending,
    Confirmed,
    Rejected,
}

/// Wick + volume rejection candidate detected on the latest candle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WvrsSignal {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub direction: WvrsDirection,
    pub confidence: f64,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit_1: f64,
    pub take_profit_2: f64,
    pub expiration_minutes: u32,
    pub wick_percentage: f64,
    pub volume_ratio: f64,
    pub context_zone: Option<ContextZone>,
    pub confirmation_status: ConfirmationStatus,
    pub reasoning: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalDirection {
    Call,
    Put,
}

impl From<WvrsDirection> for SignalDirection {
    fn from(direction: WvrsDirection) -> Self {
        match direction {
            WvrsDirection::Buy => SignalDirection::Call,
            WvrsDirection::Sell => SignalDirection::Put,
        }
    }
}

impl fmt::Display for SignalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalDirection::Call => f.write_str("CALL"),
            SignalDirection::Put => f.write_str("PUT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Tier for a blended confidence: >= 85 LOW, < 70 HIGH, MEDIUM otherwise.
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 85.0 {
            RiskLevel::Low
        } else if confidence < 70.0 {
            RiskLevel::High
        } else {
            RiskLevel::Medium
        }
    }

    /// Tier for a signal derived straight from a WVRS detection.
    pub fn from_wvrs_confidence(confidence: f64) -> Self {
        if confidence >= 90.0 {
            RiskLevel::Low
        } else if confidence >= 80.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalScore {
    pub base_probability: f64,
    pub technical_score: f64,
    pub ml_confidence: f64,
    pub volume_score: f64,
    pub trend_score: f64,
    pub final_confidence: f64,
    pub risk_level: RiskLevel,
}

/// The decision handed to consumers of the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiSignal {
    pub id: String,
    pub pair: String,
    pub direction: SignalDirection,
    /// Rounded percent.
    pub confidence: u8,
    pub entry_price: f64,
    pub target_price: f64,
    pub stop_loss: f64,
    /// Minutes.
    pub expiration: u32,
    pub technical_indicators: TechnicalIndicators,
    pub ml_features: MlFeatures,
    pub signal_score: SignalScore,
    pub timestamp: DateTime<Utc>,
    pub reasoning: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Signals that entered a simulated trade, i.e. confirmed detections.
    pub total_signals: usize,
    /// Every detection, whatever its confirmation outcome.
    pub detected_signals: usize,
    pub confirmed_signals: usize,
    pub rejected_signals: usize,
    pub pending_signals: usize,
    pub wins: usize,
    pub losses: usize,
    /// Percent of confirmed signals that reached the first target.
    pub success_rate: f64,
    pub avg_confidence: f64,
    /// Unit P&L ratio: each trade counts +1 or -1.
    pub profit_factor: f64,
}
