use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::digits::to_persian_digits;

const G_DAYS_IN_MONTH: [i64; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
const J_DAYS_IN_MONTH: [i64; 12] = [31, 31, 31, 31, 31, 31, 30, 30, 30, 30, 30, 29];

/// Formats a parseable Gregorian date value as `YYYY-MM-DD`.
/// Anything that does not parse as a date yields an empty string.
pub fn format_gregorian(value: &Value) -> String {
    match parse_gregorian(value) {
        Some(d) => d.format("%Y-%m-%d").to_string(),
        None => String::new(),
    }
}

/// Converts a Gregorian date value to Solar Hijri `YYYY/MM/DD` with Persian
/// digits. Anything that does not parse as a date yields an empty string.
pub fn to_solar_hijri(value: &Value) -> String {
    let Some(date) = parse_gregorian(value) else {
        return String::new();
    };
    let (jy, jm, jd) = gregorian_to_jalali(&date);
    to_persian_digits(&format!("{jy:04}/{jm:02}/{jd:02}"))
}

fn parse_gregorian(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => parse_date_str(s.trim()),
        // Epoch milliseconds, the other shape date fields arrive in.
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| dt.date_naive()),
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    None
}

// 33-year-cycle arithmetic (the classic farsiweb conversion). Exact for the
// date range form submissions actually carry.
fn gregorian_to_jalali(date: &NaiveDate) -> (i64, u32, u32) {
    use chrono::Datelike;

    let gy = i64::from(date.year());
    let gm = date.month() as usize;
    let gd = i64::from(date.day());

    let gy2 = gy - 1600;
    let mut g_day_no = 365 * gy2 + (gy2 + 3) / 4 - (gy2 + 99) / 100 + (gy2 + 399) / 400;
    for days in &G_DAYS_IN_MONTH[..gm - 1] {
        g_day_no += days;
    }
    if gm > 2 && (gy % 4 == 0 && gy % 100 != 0 || gy % 400 == 0) {
        g_day_no += 1;
    }
    g_day_no += gd - 1;

    let mut j_day_no = g_day_no - 79;
    let j_np = j_day_no / 12053;
    j_day_no %= 12053;

    let mut jy = 979 + 33 * j_np + 4 * (j_day_no / 1461);
    j_day_no %= 1461;
    if j_day_no >= 366 {
        jy += (j_day_no - 1) / 365;
        j_day_no = (j_day_no - 1) % 365;
    }

    let mut jm = 0usize;
    while jm < 11 && j_day_no >= J_DAYS_IN_MONTH[jm] {
        j_day_no -= J_DAYS_IN_MONTH[jm];
        jm += 1;
    }
    (jy, jm as u32 + 1, j_day_no as u32 + 1)
}
