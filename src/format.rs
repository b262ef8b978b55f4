use chrono::{DateTime, Utc};

/// 已经是相对时间的字符串中会出现的标记
const RELATIVE_MARKERS: &[&str] = &["前", "天", "月"];

/// 格式化计数（如 28000 -> "2.8万"）
#[must_use]
pub fn format_number(n: u64) -> String {
    if n >= 100_000_000 {
        format!("{}亿", one_decimal(n as f64 / 100_000_000.0))
    } else if n >= 10_000 {
        format!("{}万", one_decimal(n as f64 / 10_000.0))
    } else if n >= 1_000 {
        format!("{}k", one_decimal(n as f64 / 1_000.0))
    } else {
        n.to_string()
    }
}

/// One fractional digit, with exact ties rounded up (1.25 -> "1.3").
///
/// `{:.1}` rounds exact ties to even. The fused multiply-add gives the exact
/// error of `value * 10`, which is zero only on a true `.5` tie.
fn one_decimal(value: f64) -> String {
    let scaled = value * 10.0;
    let exact = value.mul_add(10.0, -scaled) == 0.0;
    if exact && scaled.fract() == 0.5 {
        let tenths = scaled.floor() as u64 + 1;
        format!("{}.{}", tenths / 10, tenths % 10)
    } else {
        format!("{value:.1}")
    }
}

/// 格式化时间字符串为相对时间
///
/// Strings that already read as relative time ("5天前", "10月5日") are passed
/// through, as is anything that is not an RFC 3339 timestamp.
#[must_use]
pub fn format_time(input: &str) -> String {
    if RELATIVE_MARKERS.iter().any(|m| input.contains(m)) {
        return input.to_string();
    }

    match DateTime::parse_from_rfc3339(input) {
        Ok(time) => format_elapsed(time.with_timezone(&Utc), Utc::now()),
        Err(_) => input.to_string(),
    }
}

/// 格式化相对时间
#[must_use]
pub fn format_relative_time(time: DateTime<Utc>) -> String {
    format_elapsed(time, Utc::now())
}

pub(crate) fn format_elapsed(time: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - time).num_seconds().max(0);
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;
    let months = days / 30;
    let years = months / 12;

    if years > 0 {
        format!("{years}年前")
    } else if months > 0 {
        format!("{months}个月前")
    } else if days > 0 {
        format!("{days}天前")
    } else if hours > 0 {
        format!("{hours}小时前")
    } else if minutes > 0 {
        format!("{minutes}分钟前")
    } else {
        "刚刚".to_string()
    }
}

/// 格式化播放时间（如 "1:05"、"1:02:03"）
#[must_use]
pub fn format_clock(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}
