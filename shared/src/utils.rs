use crate::models::AiSignal;

/// Renders the one-line signal announcement consumed by dashboards:
/// `[HH:MM:SS] – Actif: [PAIR] – Direction: [CALL] – Expiration: [N min] – Confiance: [N%]`.
///
/// The time is the signal timestamp in UTC.
pub fn format_signal_line(signal: &AiSignal) -> String {
    format!(
        "[{}] – Actif: [{}] – Direction: [{}] – Expiration: [{} min] – Confiance: [{}%]",
        signal.timestamp.format("%H:%M:%S"),
        signal.pair,
        signal.direction,
        signal.expiration,
        signal.confidence
    )
}
