//! Grouping key derivation from the X column.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RollupError};
use crate::inference::{ColumnProfile, parse_number, parse_timestamp};
use crate::input::DataTable;
use crate::schema::KeyValue;

/// How the grouping key is derived from a time-like X column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivationMode {
    /// Use X as-is.
    #[default]
    None,
    /// Hour of day, 0 to 23.
    Hour,
    /// Calendar date.
    Date,
    /// Weekday label, Monday to Sunday.
    Weekday,
    /// ISO week number, 1 to 53.
    Week,
    /// Calendar year-month.
    Month,
}

impl DerivationMode {
    pub fn name(&self) -> &'static str {
        match self {
            DerivationMode::None => "none",
            DerivationMode::Hour => "hour",
            DerivationMode::Date => "date",
            DerivationMode::Weekday => "weekday",
            DerivationMode::Week => "week",
            DerivationMode::Month => "month",
        }
    }

    pub fn is_none(&self) -> bool {
        *self == DerivationMode::None
    }
}

impl fmt::Display for DerivationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for DerivationMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "raw" => Ok(DerivationMode::None),
            "hour" => Ok(DerivationMode::Hour),
            "date" | "day" => Ok(DerivationMode::Date),
            "weekday" | "dow" => Ok(DerivationMode::Weekday),
            "week" => Ok(DerivationMode::Week),
            "month" => Ok(DerivationMode::Month),
            _ => Err(format!(
                "Unknown derivation: {s}. Use none, hour, date, weekday, week, or month."
            )),
        }
    }
}

/// How X is read when no derivation is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BaseKind {
    Temporal,
    Numeric,
    Text,
}

/// Maps raw X cells to grouping keys.
#[derive(Debug, Clone, Copy)]
pub struct KeyDeriver {
    mode: DerivationMode,
    base: BaseKind,
}

impl KeyDeriver {
    /// Build a deriver for a profiled X column.
    ///
    /// Fails when a derivation is requested on a column that is not time-like.
    pub fn new(x: &ColumnProfile, mode: DerivationMode) -> Result<Self> {
        if !mode.is_none() && !x.is_time_like() {
            return Err(RollupError::DerivationRequiresTemporal {
                column: x.name.clone(),
                mode: mode.to_string(),
            });
        }

        let base = if x.is_time_like() {
            BaseKind::Temporal
        } else if x.is_numeric_like() {
            BaseKind::Numeric
        } else {
            BaseKind::Text
        };

        Ok(Self { mode, base })
    }

    pub fn mode(&self) -> DerivationMode {
        self.mode
    }

    /// Key for one raw cell, or `None` when the row must be dropped.
    pub fn derive(&self, raw: &str) -> Option<KeyValue> {
        if DataTable::is_null_value(raw) {
            return None;
        }

        let parsed = || parse_timestamp(raw).ok();
        match self.mode {
            DerivationMode::None => self.raw_key(raw),
            DerivationMode::Hour => parsed().map(|t| KeyValue::Number(f64::from(t.datetime.hour()))),
            DerivationMode::Date => parsed().map(|t| KeyValue::Date(t.date())),
            DerivationMode::Weekday => parsed().map(|t| KeyValue::Weekday(t.date().weekday())),
            DerivationMode::Week => {
                parsed().map(|t| KeyValue::Number(f64::from(t.date().iso_week().week())))
            }
            DerivationMode::Month => parsed().map(|t| KeyValue::Month {
                year: t.date().year(),
                month: t.date().month(),
            }),
        }
    }

    /// Cells that do not parse as the column's base kind have no key.
    fn raw_key(&self, raw: &str) -> Option<KeyValue> {
        match self.base {
            BaseKind::Temporal => parse_timestamp(raw).ok().map(|t| {
                if t.has_time {
                    KeyValue::Timestamp(t.datetime)
                } else {
                    KeyValue::Date(t.date())
                }
            }),
            BaseKind::Numeric => parse_number(raw).ok().map(KeyValue::Number),
            BaseKind::Text => Some(KeyValue::Text(raw.trim().to_string())),
        }
    }
}
