//! Header canonicalization and cell coercion for spreadsheet exports.
//!
//! Every coercion is total: input that cannot be interpreted yields an empty value
//! (`None`, `""`, or an empty list) instead of an error.

use crate::workflows::endorsement::domain::RestrictionCode;
use chrono::{DateTime, Duration, NaiveDate};

const TRUTHY: &[&str] = &["1", "true", "yes", "y", "checked"];
const EXCEL_SERIAL_RANGE: std::ops::RangeInclusive<i64> = 20_000..=80_000;

/// Lowercase, trim, strip quote characters and collapse internal whitespace.
pub fn header_key(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}', '"', '\''], "");
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.to_lowercase()
}

/// `header_key` with every non-alphanumeric character removed.
pub fn canonical_key(value: &str) -> String {
    header_key(value)
        .chars()
        .filter(|ch| ch.is_alphanumeric())
        .collect()
}

pub fn normalize_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }

    let date_part = trimmed
        .split(|ch: char| ch.is_whitespace() || ch == 'T')
        .next()
        .unwrap_or(trimmed);

    if let Some(iso) = date_part.get(..10) {
        if let Ok(date) = NaiveDate::parse_from_str(iso, "%Y-%m-%d") {
            return Some(date);
        }
    }

    if date_part.chars().all(|ch| ch.is_ascii_digit()) {
        if let Ok(serial) = date_part.parse::<i64>() {
            if EXCEL_SERIAL_RANGE.contains(&serial) {
                return excel_epoch()?.checked_add_signed(Duration::days(serial));
            }
        }
    }

    if let Some(date) = parse_day_month_year(date_part) {
        return Some(date);
    }

    parse_loose(trimmed)
}

fn excel_epoch() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1899, 12, 30)
}

/// `D/M/Y` or `M/D/Y`. A component above 12 is the day; otherwise month comes first.
fn parse_day_month_year(value: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = value.split(['/', '-', '.']).collect();
    let [first, second, year] = parts.as_slice() else {
        return None;
    };

    let is_short_number =
        |part: &str| (1..=2).contains(&part.len()) && part.chars().all(|ch| ch.is_ascii_digit());
    if !is_short_number(first) || !is_short_number(second) {
        return None;
    }
    if !(year.len() == 2 || year.len() == 4) || !year.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }

    let first: u32 = first.parse().ok()?;
    let second: u32 = second.parse().ok()?;
    let mut year: i32 = year.parse().ok()?;
    if year < 100 {
        year += if year < 70 { 2000 } else { 1900 };
    }

    let (month, day) = if first > 12 {
        (second, first)
    } else {
        (first, second)
    };

    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_loose(value: &str) -> Option<NaiveDate> {
    const FORMATS: &[&str] = &[
        "%B %d, %Y",
        "%b %d, %Y",
        "%B %d %Y",
        "%b %d %Y",
        "%d %B %Y",
        "%d %b %Y",
        "%Y/%m/%d",
        "%Y.%m.%d",
    ];

    FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

/// Eleven-digit local mobile number (`09XXXXXXXXX`) where the input allows it.
pub fn normalize_phone(value: &str) -> String {
    let trimmed = value.trim();
    let expanded = expand_scientific(trimmed).unwrap_or_else(|| trimmed.to_string());
    let mut digits: String = expanded.chars().filter(|ch| ch.is_ascii_digit()).collect();

    if digits.len() == 12 && digits.starts_with("63") && digits[2..].starts_with('9') {
        digits = format!("0{}", &digits[2..]);
    } else if digits.len() == 10 && digits.starts_with('9') {
        digits = format!("0{digits}");
    }

    digits.truncate(11);
    digits
}

/// Spreadsheets export long numbers as `9.17123E+09`; round them back to integers.
fn expand_scientific(value: &str) -> Option<String> {
    if !value.contains(['e', 'E']) {
        return None;
    }
    let number: f64 = value.parse().ok()?;
    if !number.is_finite() || number < 0.0 {
        return None;
    }
    Some(format!("{:.0}", number.round()))
}

pub fn normalize_year(value: &str) -> String {
    digits_truncated(value, 4)
}

pub fn normalize_zip(value: &str) -> String {
    digits_truncated(value, 4)
}

fn digits_truncated(value: &str, max: usize) -> String {
    value
        .chars()
        .filter(|ch| ch.is_ascii_digit())
        .take(max)
        .collect()
}

pub fn normalize_bool(value: &str) -> bool {
    let lowered = value.trim().to_lowercase();
    TRUTHY.contains(&lowered.as_str())
}

/// Split on `|`, else `;`, else `,`; trimmed, empties dropped.
pub fn normalize_list(value: &str) -> Vec<String> {
    let separator = if value.contains('|') {
        '|'
    } else if value.contains(';') {
        ';'
    } else {
        ','
    };

    value
        .split(separator)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Catalog restriction codes from free text such as `"B2 - Light goods; ce"`.
pub fn normalize_restriction_codes(value: &str) -> Vec<RestrictionCode> {
    let mut codes = Vec::new();
    for token in normalize_list(value) {
        let leading: String = token
            .trim()
            .chars()
            .take_while(|ch| ch.is_ascii_alphanumeric())
            .collect();
        if let Some(code) = RestrictionCode::from_code(&leading.to_ascii_uppercase()) {
            if !codes.contains(&code) {
                codes.push(code);
            }
        }
    }
    codes
}
