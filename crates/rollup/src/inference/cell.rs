//! Per-cell coercion to numbers and timestamps.
//!
//! Every coercion returns a `Result` so callers can fold failures into
//! ratios or drop counts. Nothing here panics or logs on bad input.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::input::DataTable;

// =============================================================================
// LAZY STATIC PATTERNS
// =============================================================================

/// Unix epoch seconds (10 digits) or milliseconds (13 digits).
static EPOCH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{10}(\d{3})?$").unwrap());

/// Year-month without a day, e.g. `2024-03`.
static YEAR_MONTH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})-(\d{1,2})$").unwrap());

/// Every textual shape below carries a four-digit year.
static FOUR_DIGIT_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").unwrap());

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S%.f",
    "%d/%m/%Y %H:%M",
    "%d.%m.%Y %H:%M:%S%.f",
    "%d.%m.%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%b %d, %Y",
    "%b %d %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
];

/// What a cell was expected to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Number,
    Timestamp,
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellKind::Number => write!(f, "number"),
            CellKind::Timestamp => write!(f, "timestamp"),
        }
    }
}

/// Why a cell could not be coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseFailure {
    /// The cell holds a missing-value marker.
    #[error("missing value")]
    Missing,
    /// The cell holds text that is not a valid value of the expected kind.
    #[error("not a valid {0}")]
    Invalid(CellKind),
}

/// A timestamp produced by the lenient parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Temporal {
    pub datetime: NaiveDateTime,
    /// False when the source text was a bare date.
    pub has_time: bool,
}

impl Temporal {
    fn at_midnight(date: NaiveDate) -> Self {
        Self {
            datetime: date.and_time(NaiveTime::MIN),
            has_time: false,
        }
    }

    fn with_time(datetime: NaiveDateTime) -> Self {
        Self {
            datetime,
            has_time: true,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.datetime.date()
    }
}

/// Coerce a cell to a finite number.
///
/// Integers and floats (including exponent notation) parse; thousands
/// separators, currency symbols, `inf` and `nan` do not.
pub fn parse_number(raw: &str) -> Result<f64, ParseFailure> {
    if DataTable::is_null_value(raw) {
        return Err(ParseFailure::Missing);
    }
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ParseFailure::Invalid(CellKind::Number)),
    }
}

/// Coerce a cell to a timestamp using the lenient parser.
///
/// Offsets are discarded after parsing; the wall-clock time written in the
/// cell is what later derivations (hour, date, ...) see.
pub fn parse_timestamp(raw: &str) -> Result<Temporal, ParseFailure> {
    if DataTable::is_null_value(raw) {
        return Err(ParseFailure::Missing);
    }
    let value = raw.trim();
    let invalid = ParseFailure::Invalid(CellKind::Timestamp);

    if EPOCH.is_match(value) {
        return parse_epoch(value).ok_or(invalid);
    }
    if !FOUR_DIGIT_YEAR.is_match(value) {
        return Err(invalid);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(Temporal::with_time(dt.naive_local()));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Ok(Temporal::with_time(dt.naive_local()));
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Ok(Temporal::with_time(dt.naive_local()));
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Temporal::with_time(dt));
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Ok(Temporal::at_midnight(date));
        }
    }

    if let Some(caps) = YEAR_MONTH.captures(value) {
        let year = caps[1].parse::<i32>().ok();
        let month = caps[2].parse::<u32>().ok();
        if let Some(date) = year
            .zip(month)
            .and_then(|(y, m)| NaiveDate::from_ymd_opt(y, m, 1))
        {
            return Ok(Temporal::at_midnight(date));
        }
    }

    Err(invalid)
}

fn parse_epoch(value: &str) -> Option<Temporal> {
    let n: i64 = value.parse().ok()?;
    let dt = if value.len() == 13 {
        DateTime::from_timestamp_millis(n)?
    } else {
        DateTime::from_timestamp(n, 0)?
    };
    Some(Temporal::with_time(dt.naive_utc()))
}
