//! Coarse relative ages ("5m ago") for post and comment timestamps.

use chrono::{Local, TimeZone};

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const MONTH: i64 = 30 * DAY;

/// Current unix time in seconds.
///
/// `web-time` maps to `Date.now()` in the browser and to `std::time` natively.
pub fn unix_now() -> i64 {
    web_time::SystemTime::now()
        .duration_since(web_time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Formats `ts` relative to `now`, both in unix seconds.
///
/// Missing or zero timestamps format as `""`. Anything older than 30 days is
/// shown as a local calendar date instead.
pub fn time_ago(ts: Option<i64>, now: i64) -> String {
    let ts = match ts {
        Some(ts) if ts != 0 => ts,
        _ => return String::new(),
    };
    let diff = now.saturating_sub(ts);
    if diff < MINUTE {
        format!("{diff}s ago")
    } else if diff < HOUR {
        format!("{}m ago", diff / MINUTE)
    } else if diff < DAY {
        format!("{}h ago", diff / HOUR)
    } else if diff < MONTH {
        format!("{}d ago", diff / DAY)
    } else {
        calendar_date(ts)
    }
}

fn calendar_date(ts: i64) -> String {
    match Local.timestamp_opt(ts, 0).single() {
        Some(dt) => dt.format("%-m/%-d/%Y").to_string(),
        None => String::new(),
    }
}
