//! Calendar-day key utilities.
//!
//! Every date in the store is a local calendar day rendered as `YYYY-MM-DD`.
//! Day keys sort lexicographically in chronological order, which the history
//! queries rely on.

use chrono::{Duration, Local, NaiveDate, NaiveTime};

/// Render a date as a day key (`YYYY-MM-DD`).
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Today's day key in local time.
pub fn today_key() -> String {
    day_key(Local::now().date_naive())
}

/// Parse a day key back into a date. `None` if the string is not `YYYY-MM-DD`.
pub fn parse_day_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, "%Y-%m-%d").ok()
}

/// The `count` most recent day keys, newest first, starting from today.
pub fn recent_day_keys(count: usize) -> Vec<String> {
    let today = Local::now().date_naive();
    (0..count)
        .map(|i| day_key(today - Duration::days(i as i64)))
        .collect()
}

/// Parse a reminder clock string (`"HH:MM"`, 24-hour).
pub fn parse_clock(clock: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(clock, "%H:%M").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_keys_round_trip() {
        let d = NaiveDate::from_ymd_opt(2026, 8, 26).unwrap();
        let key = day_key(d);
        assert_eq!(key, "2026-08-26");
        assert_eq!(parse_day_key(&key), Some(d));
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!(parse_day_key("2026/08/26").is_none());
        assert!(parse_day_key("not-a-date").is_none());
        assert!(parse_day_key("2026-13-01").is_none());
    }

    #[test]
    fn recent_days_are_newest_first() {
        let keys = recent_day_keys(3);
        assert_eq!(keys.len(), 3);
        assert_eq!(keys[0], today_key());
        assert!(keys[0] > keys[1] && keys[1] > keys[2]);
    }

    #[test]
    fn clock_parsing() {
        assert_eq!(
            parse_clock("08:00"),
            Some(NaiveTime::from_hms_opt(8, 0, 0).unwrap())
        );
        assert_eq!(
            parse_clock("23:59"),
            Some(NaiveTime::from_hms_opt(23, 59, 0).unwrap())
        );
        assert!(parse_clock("8am").is_none());
        assert!(parse_clock("25:00").is_none());
    }
}
