// Long-running services built on the signal pipeline
pub mod signal_service;

pub use signal_service::{SignalService, SignalServiceHandle};
