//! Ledger event timestamps.
//!
//! Timestamps are Unix epoch microseconds (u64).

/// Current time in microseconds since the Unix epoch.
pub fn now_micros() -> u64 {
    chrono::Utc::now().timestamp_micros().max(0) as u64
}

/// Render a microsecond timestamp as RFC 3339.
pub fn micros_to_rfc3339(micros: u64) -> String {
    let secs = (micros / 1_000_000) as i64;
    let nsecs = ((micros % 1_000_000) * 1000) as u32;
    chrono::DateTime::from_timestamp(secs, nsecs)
        .unwrap_or(chrono::DateTime::UNIX_EPOCH)
        .to_rfc3339()
}
