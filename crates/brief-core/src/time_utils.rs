use chrono::DateTime;

/// Returns the current Unix timestamp in milliseconds.
pub fn current_unix_timestamp_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
        .try_into()
        .unwrap_or(u64::MAX)
}

/// Returns the current Unix timestamp in seconds.
pub fn current_unix_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Formats a Unix timestamp (seconds) as a `YYYY-MM-DD` UTC calendar date.
pub fn unix_date_string(unix_seconds: u64) -> String {
    i64::try_from(unix_seconds)
        .ok()
        .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Returns today's UTC date as `YYYY-MM-DD`.
pub fn current_date_string() -> String {
    unix_date_string(current_unix_timestamp())
}

#[cfg(test)]
mod tests {
    use super::unix_date_string;

    #[test]
    fn unit_unix_date_string_formats_known_dates() {
        assert_eq!(unix_date_string(0), "1970-01-01");
        assert_eq!(unix_date_string(951_782_400), "2000-02-29");
        assert_eq!(unix_date_string(1_698_278_400), "2023-10-26");
    }
}
