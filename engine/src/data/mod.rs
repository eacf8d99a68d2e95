// Market data collection, cleaning and aggregation
pub mod aggregator;
pub mod csv_parser;
pub mod mock_source;

use crate::error::EngineError;
use shared::models::{Candle, MarketDataPoint};

/// External collaborator supplying raw samples. Arrival order is not guaranteed.
pub trait MarketDataSource: Send {
    fn collect(&mut self) -> Result<Vec<MarketDataPoint>, EngineError>;
}

/// Collects, cleans and aggregates one batch into minute candles.
pub fn collect_candles(source: &mut dyn MarketDataSource) -> Result<Vec<Candle>, EngineError> {
    let points = aggregator::clean(source.collect()?);
    Ok(aggregator::aggregate(&points))
}
