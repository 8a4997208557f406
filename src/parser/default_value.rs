//! Best-effort interpretation of DEFAULT constraint SQL.
//!
//! SQL Server stores default definitions with extra wrapping, e.g. `((0))`,
//! `(N'abc')` or `(CONVERT([bit],(1)))`. This module peels that wrapping off
//! and converts simple literals into a typed [`DefaultValue`]. Anything it
//! does not understand yields `None`; callers keep the verbatim SQL anyway.

use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::ClrType;
use crate::util::starts_with_ci;

/// Typed default value inferred from a DEFAULT constraint
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Bool(bool),
    Byte(u8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Single(f32),
    Double(f64),
    Decimal(Decimal),
    String(String),
    Guid(Uuid),
    DateTime(NaiveDateTime),
    DateOnly(NaiveDate),
    TimeOnly(NaiveTime),
    DateTimeOffset(DateTime<FixedOffset>),
}

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

/// Dates written with a month name, e.g. `October 20, 2015`
const TEXTUAL_DATE_FORMATS: &[&str] = &["%B %d, %Y", "%B %d %Y", "%d %B %Y"];

const TWELVE_HOUR_FORMATS: &[&str] = &["%I:%M:%S%.f %p", "%I:%M:%S%.f%p", "%I:%M %p", "%I:%M%p"];

const DATE_TIME_OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f %:z",
];

/// Remove balanced parentheses wrapping the whole string, repeatedly.
///
/// `((5))` becomes `5`; `(a)+(b)` is left alone because its outer
/// parentheses do not enclose the whole expression.
pub fn strip_parentheses(sql: &str) -> &str {
    let mut current = sql.trim();
    while current.starts_with('(') && current.ends_with(')') && encloses_whole(current) {
        current = current[1..current.len() - 1].trim();
    }
    current
}

/// True when the first `(` is closed by the final `)`
fn encloses_whole(sql: &str) -> bool {
    let mut depth = 0usize;
    let mut in_string = false;
    let last = sql.len() - 1;
    for (i, c) in sql.char_indices() {
        match c {
            '\'' => in_string = !in_string,
            '(' if !in_string => depth += 1,
            ')' if !in_string => {
                depth = match depth.checked_sub(1) {
                    Some(d) => d,
                    None => return false,
                };
                if depth == 0 {
                    return i == last;
                }
            }
            _ => {}
        }
    }
    false
}

/// Interpret `default_value_sql` as a value of `clr_type`.
///
/// Never fails: unparseable input, `NULL` and unsupported shapes all give `None`.
pub fn try_parse_clr_default(clr_type: ClrType, default_value_sql: &str) -> Option<DefaultValue> {
    let mut sql = strip_parentheses(default_value_sql);
    if sql.is_empty() {
        return None;
    }

    if starts_with_ci(sql, "CONVERT") {
        let after_comma = &sql[sql.find(',')? + 1..];
        let inner = &after_comma[..after_comma.rfind(')')?];
        sql = strip_parentheses(inner);
    }

    if sql.eq_ignore_ascii_case("NULL") {
        return None;
    }

    if clr_type == ClrType::Bool {
        if let Ok(value) = sql.parse::<i32>() {
            return Some(DefaultValue::Bool(value != 0));
        }
    }

    if clr_type.is_numeric() {
        return parse_numeric(clr_type, sql);
    }

    let literal = unquote(sql)?;
    match clr_type {
        ClrType::String => Some(DefaultValue::String(literal.to_string())),
        ClrType::Bool => parse_bool(literal).map(DefaultValue::Bool),
        ClrType::Guid => Uuid::parse_str(literal.trim()).ok().map(DefaultValue::Guid),
        ClrType::DateTime => parse_date_time(literal).map(DefaultValue::DateTime),
        ClrType::DateOnly => parse_with(literal, DATE_FORMATS, NaiveDate::parse_from_str)
            .map(DefaultValue::DateOnly),
        ClrType::TimeOnly => parse_with(literal, TIME_FORMATS, NaiveTime::parse_from_str)
            .map(DefaultValue::TimeOnly),
        ClrType::DateTimeOffset => parse_date_time_offset(literal).map(DefaultValue::DateTimeOffset),
        _ => None,
    }
}

fn parse_numeric(clr_type: ClrType, sql: &str) -> Option<DefaultValue> {
    let text = sql.trim();
    let value = match clr_type {
        ClrType::Byte => DefaultValue::Byte(text.parse().ok()?),
        ClrType::Int16 => DefaultValue::Int16(text.parse().ok()?),
        ClrType::Int32 => DefaultValue::Int32(text.parse().ok()?),
        ClrType::Int64 => DefaultValue::Int64(text.parse().ok()?),
        ClrType::Single => DefaultValue::Single(text.parse().ok()?),
        ClrType::Double => DefaultValue::Double(text.parse().ok()?),
        ClrType::Decimal => DefaultValue::Decimal(Decimal::from_str(text).ok()?),
        _ => return None,
    };
    Some(value)
}

/// Body of `'...'` or `N'...'`, or `None` if `sql` is not a single string literal
fn unquote(sql: &str) -> Option<&str> {
    let start = if sql.starts_with('\'') {
        0
    } else if starts_with_ci(sql, "N'") {
        1
    } else {
        return None;
    };
    if !sql.ends_with('\'') || sql.len() < start + 2 {
        return None;
    }
    Some(&sql[start + 1..sql.len() - 1])
}

fn parse_bool(text: &str) -> Option<bool> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn parse_with<T, E>(
    text: &str,
    formats: &[&str],
    parse: fn(&str, &str) -> Result<T, E>,
) -> Option<T> {
    let text = text.trim();
    formats.iter().find_map(|fmt| parse(text, fmt).ok())
}

fn parse_date_time(text: &str) -> Option<NaiveDateTime> {
    parse_with(text, DATE_TIME_FORMATS, NaiveDateTime::parse_from_str)
        .or_else(|| {
            parse_with(text, DATE_FORMATS, NaiveDate::parse_from_str)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .or_else(|| parse_textual_date_time(text))
}

/// `October 20, 2015`, optionally followed by a clock time such as `11am`
/// or `11:30 PM`.
fn parse_textual_date_time(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    TEXTUAL_DATE_FORMATS.iter().find_map(|fmt| {
        let (date, rest) = NaiveDate::parse_and_remainder(text, fmt).ok()?;
        let rest = rest.trim();
        if rest.is_empty() {
            return date.and_hms_opt(0, 0, 0);
        }
        parse_clock_time(rest).map(|time| date.and_time(time))
    })
}

fn parse_clock_time(text: &str) -> Option<NaiveTime> {
    if let Some(time) = parse_with(text, TIME_FORMATS, NaiveTime::parse_from_str)
        .or_else(|| parse_with(text, TWELVE_HOUR_FORMATS, NaiveTime::parse_from_str))
    {
        return Some(time);
    }

    // Hour-only twelve-hour times (`11am`); chrono requires minutes.
    let lower = text.to_ascii_lowercase();
    let (hour, pm) = if let Some(hour) = lower.strip_suffix("am") {
        (hour, false)
    } else {
        (lower.strip_suffix("pm")?, true)
    };
    let hour: u32 = hour.trim().parse().ok()?;
    if !(1..=12).contains(&hour) {
        return None;
    }
    NaiveTime::from_hms_opt(hour % 12 + if pm { 12 } else { 0 }, 0, 0)
}

/// Offsets are required to be explicit; a bare date/time is taken as UTC.
fn parse_date_time_offset(text: &str) -> Option<DateTime<FixedOffset>> {
    let trimmed = text.trim();
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .or_else(|| parse_with(
            trimmed,
            DATE_TIME_OFFSET_FORMATS,
            DateTime::<FixedOffset>::parse_from_str,
        ))
        .or_else(|| {
            let utc = FixedOffset::east_opt(0)?;
            parse_date_time(trimmed).and_then(|naive| naive.and_local_timezone(utc).single())
        })
}
