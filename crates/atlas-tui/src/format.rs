//! Display formatting helpers.

use chrono::{DateTime, Local, Utc};

const SIZE_UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Human-readable byte size, e.g. `0 B`, `1.50 KB`, `2.00 GB` (base 1024).
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    let exponent = ((bytes as f64).ln() / 1024_f64.ln()).floor() as usize;
    let exponent = exponent.min(SIZE_UNITS.len() - 1);
    let value = bytes as f64 / 1024_f64.powi(exponent as i32);
    format!("{:.2} {}", value, SIZE_UNITS[exponent])
}

/// Local date and time, or `N/A`.
pub fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// Local date, or `N/A`.
pub fn format_date(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.with_timezone(&Local).format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// Optional text, or `N/A`.
pub fn or_na(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => "N/A".to_string(),
    }
}

/// Cut `text` to at most `max` characters, marking the cut with `…`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(max - 1).collect();
    out.push('…');
    out
}
