// Engine settings, loaded from a JSON file or taken from defaults
use crate::error::EngineError;
use serde::Deserialize;
use shared::models::{RiskLevel, TimeFrame};
use std::path::Path;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct EngineSettings {
    pub pair: String,
    pub timeframe: TimeFrame,
    pub cycle_interval_ms: u64,
    pub confidence_threshold: f64,
    /// WVRS confidence at which the detection alone drives the signal.
    pub strong_wvrs_confidence: f64,
    pub risk_tiers: RiskTiers,
    /// Largest credible |target - entry| / entry.
    pub max_price_move: f64,
    pub wvrs: WvrsConfig,
    pub mock_source: MockSourceSettings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            pair: "EUR/USD".to_string(),
            timeframe: TimeFrame::M5,
            cycle_interval_ms: 60_000,
            confidence_threshold: 75.0,
            strong_wvrs_confidence: 85.0,
            risk_tiers: RiskTiers::default(),
            max_price_move: 0.10,
            wvrs: WvrsConfig::default(),
            mock_source: MockSourceSettings::default(),
        }
    }
}

impl EngineSettings {
    pub fn from_json_str(raw: &str) -> Result<Self, EngineError> {
        let settings: EngineSettings = serde_json::from_str(raw)
            .map_err(|e| EngineError::ConfigError(format!("Invalid engine settings JSON: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "Loaded engine settings file");
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.pair.trim().is_empty() {
            return Err(EngineError::ConfigError("pair must not be empty".to_string()));
        }
        if self.cycle_interval_ms == 0 {
            return Err(EngineError::ConfigError("cycle_interval_ms must be greater than 0".to_string()));
        }
        for (name, value) in [
            ("confidence_threshold", self.confidence_threshold),
            ("strong_wvrs_confidence", self.strong_wvrs_confidence),
            ("risk_tiers.low.min_confidence", self.risk_tiers.low.min_confidence),
            ("risk_tiers.medium.min_confidence", self.risk_tiers.medium.min_confidence),
            ("risk_tiers.high.min_confidence", self.risk_tiers.high.min_confidence),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(EngineError::ConfigError(format!("{} must be within [0, 100], got {}", name, value)));
            }
        }
        for (name, tier) in [
            ("risk_tiers.low.max_risk", self.risk_tiers.low),
            ("risk_tiers.medium.max_risk", self.risk_tiers.medium),
            ("risk_tiers.high.max_risk", self.risk_tiers.high),
        ] {
            if tier.max_risk <= 0.0 {
                return Err(EngineError::ConfigError(format!("{} must be positive, got {}", name, tier.max_risk)));
            }
        }
        if self.max_price_move <= 0.0 {
            return Err(EngineError::ConfigError("max_price_move must be positive".to_string()));
        }
        self.wvrs.validate()?;
        if self.mock_source.history_minutes == 0 || self.mock_source.ticks_per_minute == 0 {
            return Err(EngineError::ConfigError("mock_source needs at least one minute and one tick per minute".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct RiskTier {
    pub max_risk: f64,
    pub min_confidence: f64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct RiskTiers {
    pub low: RiskTier,
    pub medium: RiskTier,
    pub high: RiskTier,
}

impl Default for RiskTiers {
    fn default() -> Self {
        RiskTiers {
            low: RiskTier { max_risk: 0.02, min_confidence: 85.0 },
            medium: RiskTier { max_risk: 0.05, min_confidence: 75.0 },
            high: RiskTier { max_risk: 0.10, min_confidence: 65.0 },
        }
    }
}

impl RiskTiers {
    pub fn tier(&self, level: RiskLevel) -> &RiskTier {
        match level {
            RiskLevel::Low => &self.low,
            RiskLevel::Medium => &self.medium,
            RiskLevel::High => &self.high,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct WvrsConfig {
    pub min_wick_percentage: f64,
    pub min_volume_multiplier: f64,
    pub volume_sma_period: usize,
    pub timeframes: Vec<TimeFrame>,
    pub risk_reward_ratios: RiskRewardRatios,
    pub binary_options: BinaryOptionsConfig,
}

impl Default for WvrsConfig {
    fn default() -> Self {
        WvrsConfig {
            min_wick_percentage: 60.0,
            min_volume_multiplier: 1.5,
            volume_sma_period: 10,
            timeframes: vec![TimeFrame::M1, TimeFrame::M5, TimeFrame::M15, TimeFrame::H1, TimeFrame::H4],
            risk_reward_ratios: RiskRewardRatios::default(),
            binary_options: BinaryOptionsConfig::default(),
        }
    }
}

impl WvrsConfig {
    /// Shortest series the detector will look at.
    pub fn min_candles(&self) -> usize {
        self.volume_sma_period + 2
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.volume_sma_period == 0 {
            return Err(EngineError::ConfigError("wvrs.volume_sma_period must be greater than 0".to_string()));
        }
        if !(0.0..=100.0).contains(&self.min_wick_percentage) {
            return Err(EngineError::ConfigError(format!(
                "wvrs.min_wick_percentage must be within [0, 100], got {}",
                self.min_wick_percentage
            )));
        }
        if self.min_volume_multiplier <= 0.0 {
            return Err(EngineError::ConfigError("wvrs.min_volume_multiplier must be positive".to_string()));
        }
        if self.binary_options.enabled && self.binary_options.expiration_candles == 0 {
            return Err(EngineError::ConfigError("wvrs.binary_options.expiration_candles must be greater than 0".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct RiskRewardRatios {
    pub tp1: f64,
    pub tp2: f64,
}

impl Default for RiskRewardRatios {
    fn default() -> Self {
        RiskRewardRatios { tp1: 1.0, tp2: 2.0 }
    }
}

/// When enabled, WVRS signals expire after `expiration_candles` candles of their timeframe.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct BinaryOptionsConfig {
    pub enabled: bool,
    pub expiration_candles: u32,
}

impl Default for BinaryOptionsConfig {
    fn default() -> Self {
        BinaryOptionsConfig { enabled: true, expiration_candles: 2 }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MockSourceSettings {
    pub sources: Vec<String>,
    pub base_price: f64,
    pub history_minutes: u32,
    pub ticks_per_minute: u32,
    /// Fixed seed for reproducible runs; entropy-seeded when absent.
    pub seed: Option<u64>,
}

impl Default for MockSourceSettings {
    fn default() -> Self {
        MockSourceSettings {
            sources: ["Alpha Vantage", "Yahoo Finance", "Quandl", "WebSocket"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            base_price: 1.0800,
            history_minutes: 60,
            ticks_per_minute: 4,
            seed: None,
        }
    }
}
