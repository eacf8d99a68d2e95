// Live signal engine entry point
use signal_engine::config::EngineSettings;
use signal_engine::data::mock_source::MockMarketSource;
use signal_engine::services::SignalService;
use signal_engine::signals::{RandomSentiment, SignalComposer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // Optional first argument: path to a JSON settings file
    let settings = match std::env::args().nth(1) {
        Some(path) => EngineSettings::from_json_file(&path)?,
        None => EngineSettings::default(),
    };
    info!(pair = %settings.pair, timeframe = %settings.timeframe, "Starting signal engine");

    let source = MockMarketSource::new(&settings.pair, settings.mock_source.clone());
    let sentiment = match settings.mock_source.seed {
        Some(seed) => RandomSentiment::seeded(seed),
        None => RandomSentiment::new(),
    };
    let composer = SignalComposer::new(settings.clone(), Box::new(sentiment));
    let service = SignalService::new(settings, Box::new(source), composer);

    let handle = service.start(|_signal, line| println!("{}", line));

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    handle.stop().await;
    Ok(())
}
