//! Human readable rendering of elapsed time for operator messages.

use core::time::Duration;

/// Formats a whole number of seconds as `"X час Y мин Z сек"`.
///
/// Zero components are left out, except that the seconds component is always
/// present when nothing else is, so the result is never empty.
/// The hour word follows Russian plural rules for 1, 2-4 and everything else.
#[must_use]
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    let mut parts = Vec::with_capacity(3);
    if hours > 0 {
        parts.push(format!("{hours} {}", hour_word(hours)));
    }
    if minutes > 0 {
        parts.push(format!("{minutes} мин"));
    }
    if secs > 0 || parts.is_empty() {
        parts.push(format!("{secs} сек"));
    }

    parts.join(" ")
}

/// Same as [`format_duration`], truncating sub-second precision.
#[must_use]
pub fn format_elapsed(elapsed: Duration) -> String {
    format_duration(elapsed.as_secs())
}

const fn hour_word(hours: u64) -> &'static str {
    match hours {
        1 => "час",
        2..=4 => "часа",
        _ => "часов",
    }
}
