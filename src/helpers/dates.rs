//! Date rendering for API responses.

use chrono::{DateTime, Datelike, Duration, SecondsFormat, Timelike, Utc};

const THAI_MONTHS: [&str; 12] = [
    "มกราคม",
    "กุมภาพันธ์",
    "มีนาคม",
    "เมษายน",
    "พฤษภาคม",
    "มิถุนายน",
    "กรกฎาคม",
    "สิงหาคม",
    "กันยายน",
    "ตุลาคม",
    "พฤศจิกายน",
    "ธันวาคม",
];

/// Bangkok has no daylight saving time.
const BANGKOK_UTC_OFFSET_HOURS: i64 = 7;

/// Buddhist era years run 543 ahead of the Gregorian calendar.
const BUDDHIST_ERA_OFFSET: i32 = 543;

/// Renders `dt` in Bangkok time as `d MMMM yyyy HH:mm:ss` with Thai month
/// names and a Buddhist era year, e.g. `5 มกราคม 2568 14:03:09`.
pub fn thai_datetime(dt: DateTime<Utc>) -> String {
    let local = dt.naive_utc() + Duration::hours(BANGKOK_UTC_OFFSET_HOURS);

    format!(
        "{} {} {} {:02}:{:02}:{:02}",
        local.day(),
        THAI_MONTHS[local.month0() as usize],
        local.year() + BUDDHIST_ERA_OFFSET,
        local.hour(),
        local.minute(),
        local.second()
    )
}

/// RFC 3339 in UTC with millisecond precision and a `Z` suffix.
pub fn rfc3339_millis(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}
