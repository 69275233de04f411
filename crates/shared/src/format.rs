use chrono::{DateTime, Utc};

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Human-readable byte count using powers of 1024, at most two decimals with
/// trailing zeros trimmed.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rendered = format!("{value:.2}");
    let rendered = rendered.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", rendered, SIZE_UNITS[unit])
}

/// Time of day as `HH.MM`, the 24h dot-separated rendering used by the
/// transcript header and bubbles.
pub fn format_time(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%H.%M").to_string()
}
