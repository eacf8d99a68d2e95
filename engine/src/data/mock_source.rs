// Fabricated random-walk market data standing in for real feeds
use super::MarketDataSource;
use crate::config::MockSourceSettings;
use crate::error::EngineError;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::models::MarketDataPoint;

const HALF_SPREAD: f64 = 0.0001;

pub struct MockMarketSource {
    symbol: String,
    settings: MockSourceSettings,
    rng: StdRng,
}

impl MockMarketSource {
    pub fn new(symbol: &str, settings: MockSourceSettings) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        MockMarketSource { symbol: symbol.to_string(), settings, rng }
    }

    /// Random-walk ticks covering the `history_minutes` before `now`, one
    /// sample per configured source per tick.
    pub fn collect_at(&mut self, now: DateTime<Utc>) -> Vec<MarketDataPoint> {
        let minutes = self.settings.history_minutes as i64;
        let ticks = self.settings.ticks_per_minute.max(1) as i64;
        let tick_ms = 60_000 / ticks;
        let start = now - Duration::minutes(minutes);

        let mut mid = self.settings.base_price + self.rng.gen_range(0.0..0.01);
        let mut points = Vec::with_capacity((minutes * ticks) as usize * self.settings.sources.len());

        for step in 0..(minutes * ticks) {
            let timestamp = start + Duration::milliseconds(step * tick_ms);
            let open = mid;
            mid = (mid + self.rng.gen_range(-0.0005..0.0005)).max(HALF_SPREAD * 10.0);

            for _source in &self.settings.sources {
                let noise = self.rng.gen_range(-0.00005..0.00005);
                let (o, c) = (open + noise, mid + noise);
                let high = o.max(c) + self.rng.gen_range(0.0..0.001);
                let low = o.min(c) - self.rng.gen_range(0.0..0.001);
                points.push(MarketDataPoint {
                    symbol: self.symbol.clone(),
                    timestamp,
                    open: o,
                    high,
                    low,
                    close: c,
                    volume: 1_000_000.0 + self.rng.gen_range(0.0..500_000.0),
                    bid: c - HALF_SPREAD,
                    ask: c + HALF_SPREAD,
                    spread: 2.0 * HALF_SPREAD,
                });
            }
        }
        points
    }
}

impl MarketDataSource for MockMarketSource {
    fn collect(&mut self) -> Result<Vec<MarketDataPoint>, EngineError> {
        let points = self.collect_at(Utc::now());
        tracing::debug!(
            symbol = %self.symbol,
            sources = self.settings.sources.len(),
            points = points.len(),
            "Generated mock market data"
        );
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::aggregator::{aggregate, clean};
    use chrono::TimeZone;

    fn seeded(seed: u64) -> MockMarketSource {
        MockMarketSource::new("EUR/USD", MockSourceSettings { seed: Some(seed), ..MockSourceSettings::default() })
    }

    #[test]
    fn test_seeded_source_is_reproducible() {
        let now = Utc.with_ymd_and_hms(2024, 3, 6, 10, 0, 0).unwrap();
        assert_eq!(seeded(42).collect_at(now), seeded(42).collect_at(now));
    }

    #[test]
    fn test_points_cover_history_per_source() {
        let now = Utc.with_ymd_and_hms(2024, 3, 6, 10, 0, 0).unwrap();
        let points = seeded(1).collect_at(now);
        // 60 minutes x 4 ticks x 4 sources
        assert_eq!(points.len(), 960);
        assert!(points.iter().all(|p| p.timestamp < now));
        assert!(points.iter().all(|p| (p.ask - p.bid - p.spread).abs() < 1e-12));
    }

    #[test]
    fn test_points_survive_cleaning_and_aggregate_per_minute() {
        let now = Utc.with_ymd_and_hms(2024, 3, 6, 10, 0, 0).unwrap();
        let points = seeded(3).collect_at(now);
        let cleaned = clean(points.clone());
        assert_eq!(cleaned.len(), points.len());
        let candles = aggregate(&cleaned);
        assert_eq!(candles.len(), 60);
        assert!(candles.iter().all(|c| c.is_consistent()));
    }
}
