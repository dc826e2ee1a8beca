//! Formatting helpers shared across both front-ends.

use chrono::{DateTime, Local, Utc};

/// Marker appended to truncated text.
pub const ELLIPSIS: &str = "...";

/// Placeholder for a timestamp that is missing or out of range.
pub const UNKNOWN_TIME: &str = "--:--:--";

/// Cut `input` to at most `max_chars` characters, appending [`ELLIPSIS`] when
/// anything was removed.
///
/// The cut lands on a character boundary, never inside a UTF-8 sequence.
/// Inputs at or under the limit come back unchanged. Re-truncating with the
/// same limit cuts at the same prefix, so the result is stable.
pub fn truncate(input: &str, max_chars: usize) -> String {
    match input.char_indices().nth(max_chars) {
        None => input.to_string(),
        Some((idx, _)) => format!("{}{}", &input[..idx], ELLIPSIS),
    }
}

/// Format a stored ISO-8601 timestamp as local time-of-day (`14:02:11`).
pub fn format_time_of_day(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(ts) => ts.with_timezone(&Local).format("%H:%M:%S").to_string(),
        None => UNKNOWN_TIME.to_string(),
    }
}

/// Format epoch milliseconds as a full local date-time.
pub fn format_epoch_millis(ms: i64) -> String {
    match DateTime::from_timestamp_millis(ms) {
        Some(ts) => ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
        None => format!("{} ms", ms),
    }
}

/// Group digits in threes: `1234567` becomes `1,234,567`.
pub fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
