const DAY_MS: i64 = 86_400_000;

/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// UTC calendar day of a millisecond timestamp, formatted `YYYYMMDD`
pub fn day_key(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .unwrap_or_default()
        .format("%Y%m%d")
        .to_string()
}

/// Start of the UTC day containing `millis`
pub fn start_of_day(millis: i64) -> i64 {
    millis - millis.rem_euclid(DAY_MS)
}
