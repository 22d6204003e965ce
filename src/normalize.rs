//! Value Normalizer: pure, total, side-effect-free canonicalization of
//! cell values for `value_mode = normalized` comparisons. Every routine
//! here is a parse-or-fall-through: there is no `Err` path, only `Some`/
//! `None`, because an unparseable value is meant to fall back to string
//! comparison rather than fail the whole `compare()` call.

use chrono::{Duration, NaiveDate};
use log::trace;

use crate::model::Cell;

const SPREADSHEET_EPOCH_YEAR: i32 = 1899;
const SPREADSHEET_EPOCH_MONTH: u32 = 12;
const SPREADSHEET_EPOCH_DAY: u32 = 30;

fn two_digit_year(raw: i32) -> i32 {
    if raw <= 50 {
        2000 + raw
    } else {
        1900 + raw
    }
}

fn parse_year(s: &str) -> Option<i32> {
    let y: i32 = s.parse().ok()?;
    if s.len() <= 2 {
        Some(two_digit_year(y))
    } else {
        Some(y)
    }
}

fn month_from_abbrev(s: &str) -> Option<u32> {
    Some(match s.to_ascii_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    })
}

/// ISO `YYYY-MM-DD[THH:MM:SS]`. Distinguished from the European numeric
/// form purely by the leading component being exactly 4 digits.
fn try_iso(s: &str) -> Option<NaiveDate> {
    let date_part = s.split('T').next().unwrap_or(s);
    let parts: Vec<&str> = date_part.split('-').collect();
    if parts.len() != 3 || parts[0].len() != 4 {
        return None;
    }
    if !parts[0].chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let y: i32 = parts[0].parse().ok()?;
    let m: u32 = parts[1].parse().ok()?;
    let d: u32 = parts[2].parse().ok()?;
    NaiveDate::from_ymd_opt(y, m, d)
}

/// US `M/D/Y[Y[YY]]`. `/` is taken as the unambiguous US-order marker;
/// there is no European `/`-delimited rule in this engine (see crate
/// docs on the `1/2/2024` ambiguity, which this engine resolves in favor
/// of US order and does not attempt to disambiguate further).
fn try_us(s: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = s.split('/').collect();
    if parts.len() != 3 {
        return None;
    }
    let m: u32 = parts[0].parse().ok()?;
    let d: u32 = parts[1].parse().ok()?;
    let y = parse_year(parts[2])?;
    NaiveDate::from_ymd_opt(y, m, d)
}

/// European `D-M-Y[Y[YY]]`, numeric month.
fn try_european_numeric(s: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = s.split('-').collect();
    if parts.len() != 3 || parts[0].len() == 4 {
        return None;
    }
    let d: u32 = parts[0].parse().ok()?;
    let m: u32 = parts[1].parse().ok()?;
    let y = parse_year(parts[2])?;
    NaiveDate::from_ymd_opt(y, m, d)
}

/// Text-month `D-MMM-Y[Y[YY]]`, English abbreviations, case-insensitive.
fn try_text_month(s: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = s.split('-').collect();
    if parts.len() != 3 {
        return None;
    }
    let d: u32 = parts[0].parse().ok()?;
    let m = month_from_abbrev(parts[1])?;
    let y = parse_year(parts[2])?;
    NaiveDate::from_ymd_opt(y, m, d)
}

/// 5-digit spreadsheet serial date against the 1899-12-30 epoch
/// (preserving the well-known Lotus/Excel leap-year off-by-one). Only
/// attempted when the caller opts in via `Options::serial_dates`, since
/// a column of 5-digit numeric identifiers would otherwise be
/// misinterpreted as dates.
fn try_serial(s: &str) -> Option<NaiveDate> {
    if s.len() != 5 || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let n: i64 = s.parse().ok()?;
    let epoch = NaiveDate::from_ymd_opt(
        SPREADSHEET_EPOCH_YEAR,
        SPREADSHEET_EPOCH_MONTH,
        SPREADSHEET_EPOCH_DAY,
    )?;
    epoch.checked_add_signed(Duration::days(n))
}

/// Parses `value` against every supported date rule and returns the
/// canonical `YYYY-MM-DD` form, or `None` if nothing matched. All parsing
/// is done against `chrono::NaiveDate` (no local-timezone lookup), so the
/// result is the same no matter what timezone the calling process is in.
pub fn normalize_date(value: &str, serial_dates: bool) -> Option<String> {
    let trimmed = value.trim();
    let parsed = try_iso(trimmed)
        .or_else(|| try_us(trimmed))
        .or_else(|| try_european_numeric(trimmed))
        .or_else(|| try_text_month(trimmed))
        .or_else(|| if serial_dates { try_serial(trimmed) } else { None });

    match parsed {
        Some(d) => Some(d.format("%Y-%m-%d").to_string()),
        None => {
            trace!("normalize_date: no rule matched for {trimmed:?}");
            None
        }
    }
}

fn round_to_10_decimals(n: f64) -> f64 {
    let factor = 1e10;
    (n * factor).round() / factor
}

/// Parses `value` as a locale-ambiguous number. Locale is detected from
/// the *relative* position of the last `,` and last `.`: whichever comes
/// later is the decimal separator, the other is a grouping separator and
/// is stripped. When only one kind of separator is present it is treated
/// as the decimal separator (the common case for a single in-place
/// separator). Strings containing any alphabetic character fail outright
/// — including scientific notation, which this engine does not attempt
/// to parse.
pub fn normalize_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.chars().any(|c| c.is_alphabetic()) {
        trace!("normalize_number: rejecting non-numeric input {trimmed:?}");
        return None;
    }

    let last_comma = trimmed.rfind(',');
    let last_dot = trimmed.rfind('.');
    let (decimal_sep, grouping_sep) = match (last_comma, last_dot) {
        (Some(c), Some(d)) if c > d => (',', '.'),
        (Some(_), Some(_)) => ('.', ','),
        (Some(_), None) => (',', '.'),
        (None, Some(_)) => ('.', ','),
        (None, None) => ('.', ','),
    };

    let mut canonical = String::with_capacity(trimmed.len());
    for c in trimmed.chars() {
        if c == grouping_sep {
            continue;
        } else if c == decimal_sep {
            canonical.push('.');
        } else {
            canonical.push(c);
        }
    }

    canonical.parse::<f64>().ok().map(round_to_10_decimals)
}

fn is_empty_cell(cell: &Cell) -> bool {
    cell.is_null() || cell.stringify().is_empty()
}

/// Value equality for a single comparison. `Null` equals only `Null` and
/// the empty string, independent of `value_mode`. Under `strict`, the
/// remaining comparison is string equality after lossless
/// stringification. Under `normalized`, date equality is tried first,
/// then numeric equality, then whitespace-trimmed string equality.
pub fn compare_values(a: &Cell, b: &Cell, normalized: bool, serial_dates: bool) -> bool {
    let a_empty = is_empty_cell(a);
    let b_empty = is_empty_cell(b);
    if a_empty || b_empty {
        return a_empty && b_empty;
    }

    let a_str = a.stringify();
    let b_str = b.stringify();

    if !normalized {
        return a_str == b_str;
    }

    if let (Some(da), Some(db)) = (
        normalize_date(&a_str, serial_dates),
        normalize_date(&b_str, serial_dates),
    ) {
        return da == db;
    }

    if let (Some(na), Some(nb)) = (normalize_number(&a_str), normalize_number(&b_str)) {
        return na == nb;
    }

    a_str.trim() == b_str.trim()
}

#[cfg(test)]
mod normalize_tests;
