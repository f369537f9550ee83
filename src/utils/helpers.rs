//! Helper functions
//!
//! Formatting for snapshot sizes, row counts and run timings shown in logs and
//! CLI output.
//!
//! # Example
//!
//! ```rust
//! use rowfarm::utils::Helpers;
//!
//! assert_eq!(Helpers::format_bytes(1024), "1.00 KB");
//! assert_eq!(Helpers::format_duration(1_234_000_000), "1.23s");
//! assert_eq!(Helpers::format_count(1_500_000), "1,500,000");
//! ```

use std::time::Duration;

/// Helper functions
pub struct Helpers;

impl Helpers {
    /// Format a byte count with a binary unit ("1.00 KB", "3.50 MB")
    pub fn format_bytes(bytes: u64) -> String {
        const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

        if bytes < 1024 {
            return format!("{} B", bytes);
        }
        let mut value = bytes as f64 / 1024.0;
        let mut unit = 0;
        while value >= 1024.0 && unit < UNITS.len() - 1 {
            value /= 1024.0;
            unit += 1;
        }
        format!("{:.2} {}", value, UNITS[unit])
    }

    /// Format nanoseconds as seconds, milliseconds or nanoseconds
    ///
    /// # Arguments
    /// * `nanos` - Duration in nanoseconds
    ///
    /// # Returns
    /// Formatted string (e.g., "1.23s", "500ms", "42ns")
    pub fn format_duration(nanos: u64) -> String {
        let duration = Duration::from_nanos(nanos);
        if duration.as_secs() >= 1 {
            format!("{:.2}s", duration.as_secs_f64())
        } else if duration.as_millis() >= 1 {
            format!("{}ms", duration.as_millis())
        } else {
            format!("{}ns", nanos)
        }
    }

    /// Same as [`Helpers::format_duration`] for a `Duration`
    pub fn format_duration_from(duration: Duration) -> String {
        Self::format_duration(u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX))
    }

    /// Group digits in thousands ("1,500,000")
    pub fn format_count(count: u64) -> String {
        let digits = count.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (idx, digit) in digits.chars().enumerate() {
            if idx > 0 && (digits.len() - idx) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(digit);
        }
        grouped
    }

    /// Throughput of `rows` over `elapsed`, zero for an empty interval
    pub fn rows_per_second(rows: u64, elapsed: Duration) -> f64 {
        let seconds = elapsed.as_secs_f64();
        if seconds > 0.0 {
            rows as f64 / seconds
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(Helpers::format_bytes(0), "0 B");
        assert_eq!(Helpers::format_bytes(1023), "1023 B");
        assert_eq!(Helpers::format_bytes(1024), "1.00 KB");
        assert_eq!(Helpers::format_bytes(1536 * 1024), "1.50 MB");
        assert_eq!(Helpers::format_bytes(1024 * 1024 * 1024), "1.00 GB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(Helpers::format_duration(1_000_000_000), "1.00s");
        assert_eq!(Helpers::format_duration(500_000_000), "500ms");
        assert_eq!(Helpers::format_duration(42), "42ns");
        assert_eq!(
            Helpers::format_duration_from(Duration::from_millis(2500)),
            "2.50s"
        );
    }

    #[test]
    fn test_format_count() {
        assert_eq!(Helpers::format_count(0), "0");
        assert_eq!(Helpers::format_count(999), "999");
        assert_eq!(Helpers::format_count(1000), "1,000");
        assert_eq!(Helpers::format_count(1_500_000), "1,500,000");
    }

    #[test]
    fn test_rows_per_second() {
        assert_eq!(Helpers::rows_per_second(300, Duration::from_secs(2)), 150.0);
        assert_eq!(Helpers::rows_per_second(300, Duration::ZERO), 0.0);
    }
}
