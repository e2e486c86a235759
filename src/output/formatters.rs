//! Reusable formatting utilities for CLI output

use chrono::{DateTime, Utc};

/// Format bytes as human-readable size
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Local date/time, "N/A" when absent
pub fn format_local_time(time: Option<DateTime<Utc>>) -> String {
    match time {
        Some(t) => t
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        None => "N/A".to_string(),
    }
}

/// Share of the quota in use, e.g. "12.5%"
pub fn format_usage(used: u64, quota: u64) -> String {
    if quota == 0 {
        return "N/A".to_string();
    }
    format!("{:.1}%", used as f64 * 100.0 / quota as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
    }

    #[test]
    fn test_format_local_time_absent() {
        assert_eq!(format_local_time(None), "N/A");
    }

    #[test]
    fn test_format_local_time_present() {
        let t = DateTime::from_timestamp(1_717_200_000, 0);
        let text = format_local_time(t);
        assert!(text.starts_with("2024-"));
    }

    #[test]
    fn test_format_usage() {
        assert_eq!(format_usage(1, 8), "12.5%");
        assert_eq!(format_usage(1, 0), "N/A");
    }
}
