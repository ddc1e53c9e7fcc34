//! Provides shared formatting logic for display purposes.
//!
//! Small helpers used by the console views and run summaries to present
//! timestamps and elapsed times consistently.

use chrono::{DateTime, Local};

/// Formats a history timestamp as "YYYY-MM-DD HH:MM:SS".
pub fn format_timestamp(timestamp: &DateTime<Local>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Formats an elapsed time in milliseconds for run summaries.
///
/// Sub-second times stay in milliseconds, everything longer switches to
/// seconds with one decimal.
pub fn format_elapsed_ms(elapsed_ms: i64) -> String {
    if elapsed_ms < 1000 {
        format!("{} ms", elapsed_ms.max(0))
    } else {
        format!("{:.1} s", elapsed_ms as f64 / 1000.0)
    }
}
