// Post-hoc sanity checks on composed signals
use crate::config::{EngineSettings, RiskTiers};
use shared::models::AiSignal;

#[derive(Debug, Clone, PartialEq)]
pub struct SignalValidator {
    confidence_threshold: f64,
    risk_tiers: RiskTiers,
    max_price_move: f64,
}

impl Default for SignalValidator {
    fn default() -> Self {
        Self::from_settings(&EngineSettings::default())
    }
}

impl SignalValidator {
    pub fn new(confidence_threshold: f64, risk_tiers: RiskTiers, max_price_move: f64) -> Self {
        SignalValidator { confidence_threshold, risk_tiers, max_price_move }
    }

    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self::new(settings.confidence_threshold, settings.risk_tiers, settings.max_price_move)
    }

    /// Pure predicate over a signal.
    pub fn validate(&self, signal: &AiSignal) -> bool {
        self.rejection(signal).is_none()
    }

    /// First failed check, if any.
    pub fn rejection(&self, signal: &AiSignal) -> Option<&'static str> {
        let confidence = f64::from(signal.confidence);
        if confidence < self.confidence_threshold {
            return Some("confidence below threshold");
        }
        if signal.pair.trim().is_empty() {
            return Some("missing pair");
        }
        if signal.entry_price <= 0.0 || !signal.entry_price.is_finite() {
            return Some("non-positive entry price");
        }
        let tier = self.risk_tiers.tier(signal.signal_score.risk_level);
        if confidence < tier.min_confidence {
            return Some("confidence below risk tier minimum");
        }
        let stop_distance = (signal.entry_price - signal.stop_loss).abs() / signal.entry_price;
        if stop_distance.is_nan() || stop_distance > tier.max_risk {
            return Some("stop distance exceeds risk tier");
        }
        let price_move = (signal.target_price - signal.entry_price).abs() / signal.entry_price;
        if price_move.is_nan() || price_move > self.max_price_move {
            return Some("target move too large");
        }
        None
    }
}
