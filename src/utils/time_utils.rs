use chrono::{DateTime, NaiveDateTime, Utc};

pub struct TimeUtils;

impl TimeUtils {
    pub const MS_IN_S: i64 = 1000;
    pub const MS_IN_MIN: i64 = Self::MS_IN_S * 60;
    pub const MS_IN_3_MIN: i64 = Self::MS_IN_S * 60 * 3;
    pub const MS_IN_5_MIN: i64 = Self::MS_IN_S * 60 * 5;
    pub const MS_IN_15_MIN: i64 = Self::MS_IN_S * 60 * 15;
    pub const MS_IN_30_MIN: i64 = Self::MS_IN_S * 60 * 30;
    pub const MS_IN_H: i64 = Self::MS_IN_MIN * 60;
    pub const MS_IN_2_H: i64 = Self::MS_IN_MIN * 60 * 2;
    pub const MS_IN_4_H: i64 = Self::MS_IN_MIN * 60 * 4;
    pub const MS_IN_6_H: i64 = Self::MS_IN_MIN * 60 * 6;
    pub const MS_IN_8_H: i64 = Self::MS_IN_MIN * 60 * 8;
    pub const MS_IN_12_H: i64 = Self::MS_IN_MIN * 60 * 12;
    pub const MS_IN_D: i64 = Self::MS_IN_H * 24;
    pub const MS_IN_3_D: i64 = Self::MS_IN_H * 24 * 3;
    pub const MS_IN_W: i64 = Self::MS_IN_D * 7;
    pub const MS_IN_1_M: i64 = Self::MS_IN_D * 30;
    pub const STANDARD_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    /// Convert interval in milliseconds to a Binance-style shorthand (e.g. `30m`, `1h`).
    pub fn interval_to_string(interval_ms: i64) -> &'static str {
        match interval_ms {
            Self::MS_IN_S => "1s",
            Self::MS_IN_MIN => "1m",
            Self::MS_IN_3_MIN => "3m",
            Self::MS_IN_5_MIN => "5m",
            Self::MS_IN_15_MIN => "15m",
            Self::MS_IN_30_MIN => "30m",
            Self::MS_IN_H => "1h",
            Self::MS_IN_2_H => "2h",
            Self::MS_IN_4_H => "4h",
            Self::MS_IN_6_H => "6h",
            Self::MS_IN_8_H => "8h",
            Self::MS_IN_12_H => "12h",
            Self::MS_IN_D => "1d",
            Self::MS_IN_3_D => "3d",
            Self::MS_IN_W => "1w",
            Self::MS_IN_1_M => "1M",
            _ => "unknown",
        }
    }

    /// Inverse of `interval_to_string`
    pub fn interval_from_string(text: &str) -> Option<i64> {
        let ms = match text {
            "1s" => Self::MS_IN_S,
            "1m" => Self::MS_IN_MIN,
            "3m" => Self::MS_IN_3_MIN,
            "5m" => Self::MS_IN_5_MIN,
            "15m" => Self::MS_IN_15_MIN,
            "30m" => Self::MS_IN_30_MIN,
            "1h" => Self::MS_IN_H,
            "2h" => Self::MS_IN_2_H,
            "4h" => Self::MS_IN_4_H,
            "6h" => Self::MS_IN_6_H,
            "8h" => Self::MS_IN_8_H,
            "12h" => Self::MS_IN_12_H,
            "1d" => Self::MS_IN_D,
            "3d" => Self::MS_IN_3_D,
            "1w" => Self::MS_IN_W,
            "1M" => Self::MS_IN_1_M,
            _ => return None,
        };
        Some(ms)
    }
}

pub fn epoch_ms_to_utc(epoch_ms: i64) -> String {
    // Used for display purposes
    match DateTime::from_timestamp_millis(epoch_ms) {
        Some(dt) => dt.format(TimeUtils::STANDARD_TIME_FORMAT).to_string(),
        None => String::new(),
    }
}

pub fn now_timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn how_many_seconds_ago(past_timestamp_ms: i64) -> i64 {
    // How many seconds ago was the event described by `past_timestamp_ms` ?
    (now_timestamp_ms() - past_timestamp_ms) / 1000
}

/// Parse a timestamp cell into epoch milliseconds.
///
/// Accepts integer epoch seconds or milliseconds (values above 10^11 are taken as ms),
/// RFC 3339, and `%Y-%m-%d %H:%M:%S` (read as UTC).
pub fn parse_timestamp_ms(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Ok(value) = text.parse::<i64>() {
        return Some(if value.abs() >= 100_000_000_000 {
            value
        } else {
            value * TimeUtils::MS_IN_S
        });
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp_millis());
    }
    NaiveDateTime::parse_from_str(text, TimeUtils::STANDARD_TIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc().timestamp_millis())
}
