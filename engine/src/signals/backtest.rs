// Replays the WVRS detector over history and simulates each confirmed trade
use super::wvrs::WvrsDetector;
use crate::config::WvrsConfig;
use shared::models::{BacktestReport, Candle, ConfirmationStatus, TimeFrame, WvrsDirection, WvrsSignal};

/// Candles a confirmed trade is given to reach its first target.
const TRADE_HORIZON: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeOutcome {
    Win,
    Loss,
}

pub struct BacktestRunner {
    detector: WvrsDetector,
}

impl Default for BacktestRunner {
    fn default() -> Self {
        Self::new(WvrsConfig::default())
    }
}

impl BacktestRunner {
    pub fn new(config: WvrsConfig) -> Self {
        BacktestRunner { detector: WvrsDetector::new(config) }
    }

    /// Evaluates every prefix ending at `i` for `i` in
    /// `[volume_sma_period + 1, len - 2]`, confirming with candle `i + 1`.
    ///
    /// Confirmed trades are simulated over candles `i+1..=i+9`; a trade that
    /// reaches neither its first target nor its stop counts as a loss.
    /// `total_signals` counts confirmed trades only; every detection lands in
    /// `detected_signals`. PENDING detections are never simulated.
    pub fn run(&self, candles: &[Candle], timeframe: TimeFrame) -> BacktestReport {
        let mut report = BacktestReport::default();
        let mut confidence_sum = 0.0;
        let start = self.detector.config().volume_sma_period + 1;

        for i in start..candles.len().saturating_sub(1) {
            let signal = match self.detector.analyze(&candles[..=i], timeframe) {
                Some(signal) => signal,
                None => continue,
            };
            report.detected_signals += 1;

            let confirmed = self.detector.confirm(&signal, &candles[i + 1]);
            match confirmed.confirmation_status {
                ConfirmationStatus::Confirmed => {
                    report.confirmed_signals += 1;
                    report.total_signals += 1;
                    confidence_sum += confirmed.confidence;
                    let horizon_end = (i + 1 + TRADE_HORIZON).min(candles.len());
                    match simulate_trade(&confirmed, &candles[i + 1..horizon_end]) {
                        TradeOutcome::Win => report.wins += 1,
                        TradeOutcome::Loss => report.losses += 1,
                    }
                }
                ConfirmationStatus::Rejected => report.rejected_signals += 1,
                ConfirmationStatus::Pending => report.pending_signals += 1,
            }
        }

        if report.confirmed_signals > 0 {
            let confirmed = report.confirmed_signals as f64;
            report.success_rate = report.wins as f64 / confirmed * 100.0;
            report.avg_confidence = confidence_sum / confirmed;
        }
        if report.losses > 0 {
            report.profit_factor = (report.wins as f64 - report.losses as f64) / report.losses as f64;
        }

        tracing::info!(
            candles = candles.len(),
            %timeframe,
            detected = report.detected_signals,
            total = report.total_signals,
            confirmed = report.confirmed_signals,
            wins = report.wins,
            losses = report.losses,
            "Backtest complete"
        );
        report
    }
}

/// Target is checked before stop on each candle.
pub fn simulate_trade(signal: &WvrsSignal, future: &[Candle]) -> TradeOutcome {
    for candle in future {
        match signal.direction {
            WvrsDirection::Buy => {
                if candle.high >= signal.take_profit_1 {
                    return TradeOutcome::Win;
                }
                if candle.low <= signal.stop_loss {
                    return TradeOutcome::Loss;
                }
            }
            WvrsDirection::Sell => {
                if candle.low <= signal.take_profit_1 {
                    return TradeOutcome::Win;
                }
                if candle.high >= signal.stop_loss {
                    return TradeOutcome::Loss;
                }
            }
        }
    }
    TradeOutcome::Loss
}
