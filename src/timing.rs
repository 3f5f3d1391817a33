//! Countdown to the next expected database refresh.

use chrono::{DateTime, Local, TimeZone, Utc};

/// Seconds until the scraper is expected to refresh again. Negative when
/// the refresh is overdue.
pub fn seconds_until_next(last_updated: f64, now: DateTime<Utc>, interval: u64) -> i64 {
    let now_secs = now.timestamp_millis() as f64 / 1000.0;
    let since = (last_updated - now_secs).floor() as i64;
    since + interval as i64
}

/// Progress of the countdown as a percentage of the interval, 0 to 100
pub fn countdown_percent(seconds_left: i64, interval: u64) -> u16 {
    if interval == 0 {
        return 0;
    }
    let pct = seconds_left.max(0) as f64 * 100.0 / interval as f64;
    pct.round().clamp(0.0, 100.0) as u16
}

/// Gauge state for the countdown bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    pub percent: u16,
    pub label: String,
}

impl Countdown {
    /// Countdown for a board, "-" until a timestamp is known
    pub fn compute(last_updated: Option<f64>, now: DateTime<Utc>, interval: u64) -> Self {
        match last_updated {
            Some(ts) => {
                let left = seconds_until_next(ts, now, interval);
                Self {
                    percent: countdown_percent(left, interval),
                    label: format!("{}s", left),
                }
            }
            None => Self {
                percent: 0,
                label: "-".to_string(),
            },
        }
    }
}

/// Convert a UNIX timestamp in seconds to a UTC time
pub fn timestamp_to_utc(ts: f64) -> Option<DateTime<Utc>> {
    if !ts.is_finite() {
        return None;
    }
    let millis = (ts * 1000.0).round() as i64;
    Utc.timestamp_millis_opt(millis).single()
}

/// Local wall-clock time of an update, for the "Last update" line
pub fn format_local_time(ts: f64) -> String {
    match timestamp_to_utc(ts) {
        Some(utc) => utc.with_timezone(&Local).format("%H:%M:%S %Z").to_string(),
        None => "-".to_string(),
    }
}

/// How long ago an update happened, e.g. "1m 5s ago"
pub fn format_age(ts: f64, now: DateTime<Utc>) -> String {
    let Some(then) = timestamp_to_utc(ts) else {
        return "-".to_string();
    };
    match (now - then).to_std() {
        Ok(age) => {
            let secs = std::time::Duration::from_secs(age.as_secs());
            format!("{} ago", humantime::format_duration(secs))
        }
        Err(_) => "just now".to_string(),
    }
}
