// Replays WVRS detection over a historical CSV and prints the report as JSON
use anyhow::Context;
use signal_engine::config::EngineSettings;
use signal_engine::data::csv_parser::HistoricalCsvLoader;
use signal_engine::signals::BacktestRunner;
use tracing::info;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .context("usage: backtest <candles.csv> [settings.json]")?;
    // Pair, timeframe and WVRS config come from the settings file when given
    let settings = match args.next() {
        Some(settings_path) => EngineSettings::from_json_file(&settings_path)
            .with_context(|| format!("loading settings {}", settings_path))?,
        None => EngineSettings::default(),
    };
    info!(pair = %settings.pair, timeframe = %settings.timeframe, "Starting backtest");

    let candles = HistoricalCsvLoader::load_candles_from_csv(&path, &settings.pair)
        .with_context(|| format!("loading {}", path))?;
    let report = BacktestRunner::new(settings.wvrs).run(&candles, settings.timeframe);

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
