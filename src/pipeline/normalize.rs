//! Canonicalization of the date and time notation found in schedule
//! documents.
//!
//! Statements of facts and port logs mix military times ("1540 HRS"),
//! ranges ("1724-1830"), abbreviated month dates ("APR. 19, 2024") and
//! headings without a year ("OCT 21"). Everything here is a pure function
//! over one token; carrying a date heading across following lines is the
//! extraction prompt's job, not ours.

use chrono::{Datelike, NaiveDate, NaiveTime};

/// Strip a trailing HRS / HOURS marker (any case, optional period).
fn strip_hours_suffix(token: &str) -> &str {
    let trimmed = token.trim().trim_end_matches('.').trim_end();
    let upper = trimmed.to_ascii_uppercase();
    if let Some(stripped) = upper.strip_suffix("HOURS") {
        trimmed[..stripped.len()].trim_end()
    } else if let Some(stripped) = upper.strip_suffix("HRS") {
        trimmed[..stripped.len()].trim_end()
    } else {
        trimmed
    }
}

/// Parse a single time token into a canonical time.
///
/// Accepts military `HHMM` ("1540"), `HH:MM` and `HH:MM:SS`, with or
/// without an HRS/HOURS suffix. Returns `None` for anything else.
pub fn canonical_time(token: &str) -> Option<NaiveTime> {
    let cleaned = strip_hours_suffix(token);
    if cleaned.is_empty() {
        return None;
    }

    // Military HHMM
    if cleaned.len() == 4 && cleaned.bytes().all(|b| b.is_ascii_digit()) {
        let hour: u32 = cleaned[..2].parse().ok()?;
        let minute: u32 = cleaned[2..].parse().ok()?;
        return NaiveTime::from_hms_opt(hour, minute, 0);
    }

    NaiveTime::parse_from_str(cleaned, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(cleaned, "%H:%M"))
        .ok()
}

/// Parse a time token that may be a range ("1724-1830 HRS").
///
/// A single time yields `(start, None)`; the end is never defaulted to
/// the start. A range where either side fails to parse yields `None`.
pub fn canonical_time_range(token: &str) -> Option<(NaiveTime, Option<NaiveTime>)> {
    let cleaned = strip_hours_suffix(token);

    if let Some((left, right)) = cleaned.split_once(['-', '\u{2013}']) {
        let start = canonical_time(left)?;
        let end = canonical_time(right)?;
        return Some((start, Some(end)));
    }

    canonical_time(cleaned).map(|start| (start, None))
}

/// Repair a time string emitted without seconds.
///
/// `HH:MM` gains `:00`; a well-formed `HH:MM:SS` passes through
/// unchanged, so applying the repair twice is safe. Anything else is
/// unresolved.
pub fn repair_time(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.len() == 8 && NaiveTime::parse_from_str(trimmed, "%H:%M:%S").is_ok() {
        return Some(trimmed.to_string());
    }
    if trimmed.len() == 5 && NaiveTime::parse_from_str(trimmed, "%H:%M").is_ok() {
        return Some(format!("{trimmed}:00"));
    }
    None
}

fn month_from_name(name: &str) -> Option<u32> {
    let upper = name.trim_end_matches('.').to_ascii_uppercase();
    if upper.len() < 3 {
        return None;
    }
    let month = match &upper[..3] {
        "JAN" => 1,
        "FEB" => 2,
        "MAR" => 3,
        "APR" => 4,
        "MAY" => 5,
        "JUN" => 6,
        "JUL" => 7,
        "AUG" => 8,
        "SEP" => 9,
        "OCT" => 10,
        "NOV" => 11,
        "DEC" => 12,
        _ => return None,
    };
    Some(month)
}

/// Parse a date token into a canonical date.
///
/// Tries, in order: ISO `YYYY-MM-DD`, `DD/MM/YYYY`, `MM/DD/YYYY`,
/// month-name forms ("APR. 19, 2024", "19 APR 2024"), and month+day
/// with the year taken from `context` ("OCT 21"). Returns `None` when
/// nothing matches; callers decide the fallback.
pub fn canonical_date(token: &str, context: Option<NaiveDate>) -> Option<NaiveDate> {
    let cleaned = token.trim().trim_end_matches([':', '.']).trim();
    if cleaned.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(cleaned, "%Y-%m-%d") {
        return Some(date);
    }
    // DD/MM/YYYY preferred over MM/DD/YYYY: port documents in this domain
    // are predominantly day-first.
    if let Ok(date) = NaiveDate::parse_from_str(cleaned, "%d/%m/%Y") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(cleaned, "%m/%d/%Y") {
        return Some(date);
    }

    parse_month_name_date(cleaned, context)
}

/// Month-name forms: "APR. 19, 2024", "April 19 2024", "19 APR 2024",
/// "OCT 21" (year inferred from context).
fn parse_month_name_date(token: &str, context: Option<NaiveDate>) -> Option<NaiveDate> {
    let parts: Vec<&str> = token
        .split([' ', ',', '\t'])
        .filter(|p| !p.is_empty())
        .collect();

    let (month, day, year) = match parts.as_slice() {
        // "APR 19 2024" / "APR 19"
        [m, d] | [m, d, _] if month_from_name(m).is_some() => {
            let year = parts.get(2).and_then(|y| y.parse::<i32>().ok());
            (month_from_name(m)?, parse_day(d)?, year)
        }
        // "19 APR 2024" / "19 APR"
        [d, m] | [d, m, _] if month_from_name(m).is_some() => {
            let year = parts.get(2).and_then(|y| y.parse::<i32>().ok());
            (month_from_name(m)?, parse_day(d)?, year)
        }
        _ => return None,
    };

    let year = year.or_else(|| context.map(|c| c.year()))?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_day(token: &str) -> Option<u32> {
    let day: u32 = token.trim_end_matches(['.', ',']).parse().ok()?;
    (1..=31).contains(&day).then_some(day)
}
