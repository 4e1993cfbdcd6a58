use super::constants::DISPLAY_PRECISION;

/// Formats seconds for display. Stored values keep full precision.
pub fn format_seconds(seconds: f64) -> String {
    format!("{seconds:.prec$}", prec = DISPLAY_PRECISION)
}
