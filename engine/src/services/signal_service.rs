// Periodic collect, compose and validate cycle
use crate::config::EngineSettings;
use crate::data::{collect_candles, MarketDataSource};
use crate::signals::{SignalComposer, SignalValidator};
use shared::models::AiSignal;
use shared::utils::format_signal_line;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;

pub struct SignalService {
    settings: EngineSettings,
    source: Box<dyn MarketDataSource>,
    composer: SignalComposer,
    validator: SignalValidator,
}

impl SignalService {
    pub fn new(settings: EngineSettings, source: Box<dyn MarketDataSource>, composer: SignalComposer) -> Self {
        let validator = SignalValidator::from_settings(&settings);
        SignalService { settings, source, composer, validator }
    }

    /// One collect, compose, validate pass. Source failures and invalid
    /// signals are logged and yield `None`.
    pub fn run_cycle(&mut self) -> Option<AiSignal> {
        let pair = self.settings.pair.as_str();
        let candles = match collect_candles(self.source.as_mut()) {
            Ok(candles) => candles,
            Err(e) => {
                tracing::warn!(symbol = %pair, error = %e, "Market data collection failed");
                return None;
            }
        };

        let signal = self.composer.compose(pair, &candles)?;
        if let Some(reason) = self.validator.rejection(&signal) {
            tracing::info!(symbol = %pair, id = %signal.id, confidence = signal.confidence, reason, "Signal failed validation");
            return None;
        }

        tracing::info!(
            symbol = %pair,
            id = %signal.id,
            direction = %signal.direction,
            confidence = signal.confidence,
            expiration = signal.expiration,
            "Signal emitted"
        );
        Some(signal)
    }

    /// Spawns the cycle loop on the current tokio runtime. The first cycle
    /// runs one `cycle_interval_ms` after start.
    pub fn start<F>(mut self, mut callback: F) -> SignalServiceHandle
    where
        F: FnMut(&AiSignal, &str) + Send + 'static,
    {
        let period = Duration::from_millis(self.settings.cycle_interval_ms);
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut ticks = IntervalStream::new(interval);
            tracing::info!(symbol = %self.settings.pair, interval_ms = self.settings.cycle_interval_ms, "Signal service started");

            loop {
                tokio::select! {
                    biased;
                    // Resolves on stop() and when the handle is dropped
                    _ = &mut stop_rx => break,
                    tick = ticks.next() => {
                        if tick.is_none() {
                            break;
                        }
                        if let Some(signal) = self.run_cycle() {
                            let line = format_signal_line(&signal);
                            callback(&signal, &line);
                        }
                    }
                }
            }
            tracing::info!(symbol = %self.settings.pair, "Signal service stopped");
        });

        SignalServiceHandle { stop_tx, task }
    }
}

pub struct SignalServiceHandle {
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl SignalServiceHandle {
    /// Stops the loop and waits for it to exit. A cycle already running
    /// completes first; no cycle starts afterwards.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(());
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Signal service task ended abnormally");
        }
    }
}
