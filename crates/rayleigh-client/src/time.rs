use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};

use crate::error::{RayleighError, Result};

/// 查询区间的边界
///
/// 不带时区的时间按 UTC 处理。字符串在转换时才解析，解析失败返回 `InvalidDate`。
#[derive(Debug, Clone, PartialEq)]
pub enum TimeBound {
    /// 毫秒时间戳
    Millis(i64),
    DateTime(DateTime<Utc>),
    Text(String),
}

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// 解析常见的日期时间字符串
pub fn parse_datetime(input: &str) -> Result<DateTime<Utc>> {
    let s = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }

    Err(RayleighError::InvalidDate(input.to_string()))
}

impl TimeBound {
    /// 转换为毫秒时间戳
    pub fn to_millis(&self) -> Result<i64> {
        match self {
            TimeBound::Millis(ms) => Ok(*ms),
            TimeBound::DateTime(dt) => Ok(dt.timestamp_millis()),
            TimeBound::Text(s) => parse_datetime(s).map(|dt| dt.timestamp_millis()),
        }
    }
}

impl From<DateTime<Utc>> for TimeBound {
    fn from(dt: DateTime<Utc>) -> Self {
        TimeBound::DateTime(dt)
    }
}

impl From<DateTime<FixedOffset>> for TimeBound {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        TimeBound::DateTime(dt.with_timezone(&Utc))
    }
}

impl From<NaiveDateTime> for TimeBound {
    fn from(naive: NaiveDateTime) -> Self {
        TimeBound::DateTime(naive.and_utc())
    }
}

impl From<NaiveDate> for TimeBound {
    fn from(date: NaiveDate) -> Self {
        TimeBound::DateTime(date.and_time(chrono::NaiveTime::MIN).and_utc())
    }
}

impl From<i64> for TimeBound {
    fn from(ms: i64) -> Self {
        TimeBound::Millis(ms)
    }
}

impl From<&str> for TimeBound {
    fn from(s: &str) -> Self {
        TimeBound::Text(s.to_string())
    }
}

impl From<String> for TimeBound {
    fn from(s: String) -> Self {
        TimeBound::Text(s)
    }
}
